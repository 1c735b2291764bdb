//! The single pending edit of a grid session.

use serde::Serialize;

use crate::row::{CellKey, FieldPatch};

/// One pending change: which cell, the new field values, and the values
/// those fields held before the edit began.
///
/// Records are values. Amending the same cell produces a new record; the
/// `prior` side keeps the oldest value seen for every field so a revert
/// always lands on the pre-edit state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRecord<P: FieldPatch> {
    key: CellKey,
    fields: P,
    prior: P,
}

impl<P: FieldPatch> EditRecord<P> {
    pub fn new(key: CellKey, fields: P, prior: P) -> Self {
        Self { key, fields, prior }
    }

    pub fn key(&self) -> CellKey {
        self.key
    }

    pub fn fields(&self) -> &P {
        &self.fields
    }

    pub fn prior(&self) -> &P {
        &self.prior
    }

    pub fn matches(&self, key: &CellKey) -> bool {
        self.key == *key
    }

    /// A new record for the same cell with `fields` layered on top.
    ///
    /// `prior_of_new` holds the row's values for the fields `fields`
    /// touches, taken before applying them. Fields already present in the
    /// current prior keep their original values.
    pub fn amended(&self, fields: &P, prior_of_new: P) -> Self {
        let mut merged = self.fields.clone();
        merged.merge(fields);
        let mut prior = prior_of_new;
        prior.merge(&self.prior);
        Self {
            key: self.key,
            fields: merged,
            prior,
        }
    }
}
