//! The grid row abstraction.
//!
//! Both calendar grids are two-dimensional: one axis is the entity (a room
//! type or a rate plan), the other is the calendar day. A [`CalendarRow`] is
//! one cell of that grid (an "entity day"), and a [`FieldPatch`] is a sparse
//! set of new values for the editable fields of such a cell.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::calendar::DATE_FORMAT;
use crate::types::{CalendarDate, DbId};

/// Composite address of one grid cell: `(entity_id, date)`.
///
/// Orders by entity first, then by date, which is also the row order the
/// grid renders in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellKey {
    pub entity_id: DbId,
    pub date: CalendarDate,
}

impl CellKey {
    pub fn new(entity_id: DbId, date: CalendarDate) -> Self {
        Self { entity_id, date }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.entity_id, self.date.format(DATE_FORMAT))
    }
}

/// Sparse update of a row's editable fields. `None` fields are untouched.
pub trait FieldPatch:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// `true` when the patch touches no field at all.
    fn is_empty(&self) -> bool;

    /// Overlay `newer` on top of `self`; fields set in `newer` win.
    fn merge(&mut self, newer: &Self);

    /// Names of the touched fields, for logs and notifications.
    fn field_names(&self) -> Vec<&'static str>;
}

/// One entity-day of a calendar grid.
pub trait CalendarRow:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Patch: FieldPatch;

    /// Short grid name used in logs and routes (`"inventory"`, `"rates"`).
    const GRID: &'static str;

    fn entity_id(&self) -> DbId;

    fn date(&self) -> CalendarDate;

    fn key(&self) -> CellKey {
        CellKey::new(self.entity_id(), self.date())
    }

    /// Replace the patched fields and recompute every derived field in the
    /// same step.
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// The row's current values for the fields `patch` touches (plus any
    /// field derived from them), as a patch that restores them when applied.
    fn capture_fields(&self, patch: &Self::Patch) -> Self::Patch;
}
