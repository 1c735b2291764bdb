//! Rate plan grid: one row per rate plan per day.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::coerce::{coerce_amount, coerce_count, parse_cutoff};
use crate::error::CoreError;
use crate::row::{CalendarRow, FieldPatch};
use crate::types::{CalendarDate, DbId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDay {
    pub rate_plan_id: DbId,
    pub date: CalendarDate,
    pub base_rate: f64,
    pub extra_adult_charge: f64,
    pub min_stay: u32,
    pub max_stay: u32,
    #[serde(default, with = "cutoff_format")]
    pub cutoff_time: Option<NaiveTime>,
}

impl CalendarRow for RateDay {
    type Patch = RatePatch;

    const GRID: &'static str = "rates";

    fn entity_id(&self) -> DbId {
        self.rate_plan_id
    }

    fn date(&self) -> CalendarDate {
        self.date
    }

    fn apply_patch(&mut self, patch: &RatePatch) {
        if let Some(v) = patch.base_rate {
            self.base_rate = v;
        }
        if let Some(v) = patch.extra_adult_charge {
            self.extra_adult_charge = v;
        }
        if let Some(v) = patch.min_stay {
            self.min_stay = v;
        }
        if let Some(v) = patch.max_stay {
            self.max_stay = v;
        }
        if let Some(v) = patch.cutoff_time {
            self.cutoff_time = v;
        }
    }

    fn capture_fields(&self, patch: &RatePatch) -> RatePatch {
        RatePatch {
            base_rate: patch.base_rate.map(|_| self.base_rate),
            extra_adult_charge: patch.extra_adult_charge.map(|_| self.extra_adult_charge),
            min_stay: patch.min_stay.map(|_| self.min_stay),
            max_stay: patch.max_stay.map(|_| self.max_stay),
            cutoff_time: patch.cutoff_time.map(|_| self.cutoff_time),
        }
    }
}

// ---------------------------------------------------------------------------
// Field targeting
// ---------------------------------------------------------------------------

/// The editable columns of a rate row, used to target bulk updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateField {
    BaseRate,
    ExtraAdultCharge,
    MinStay,
    MaxStay,
    CutoffTime,
}

impl RateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateField::BaseRate => "baseRate",
            RateField::ExtraAdultCharge => "extraAdultCharge",
            RateField::MinStay => "minStay",
            RateField::MaxStay => "maxStay",
            RateField::CutoffTime => "cutoffTime",
        }
    }
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_adult_charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stay: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stay: Option<u32>,
    /// `Some(None)` clears the cutoff.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "cutoff_patch_format"
    )]
    pub cutoff_time: Option<Option<NaiveTime>>,
}

impl RatePatch {
    /// Build a single-field patch from raw cell input.
    ///
    /// Money and stay lengths are coerced (blank or negative becomes zero).
    /// A blank cutoff clears it; anything else must parse as `HH:MM`.
    pub fn from_field(field: RateField, raw: &str) -> Result<Self, CoreError> {
        let mut patch = Self::default();
        match field {
            RateField::BaseRate => patch.base_rate = Some(coerce_amount(raw)),
            RateField::ExtraAdultCharge => patch.extra_adult_charge = Some(coerce_amount(raw)),
            RateField::MinStay => patch.min_stay = Some(coerce_count(raw)),
            RateField::MaxStay => patch.max_stay = Some(coerce_count(raw)),
            RateField::CutoffTime if raw.trim().is_empty() => patch.cutoff_time = Some(None),
            RateField::CutoffTime => patch.cutoff_time = Some(Some(parse_cutoff(raw)?)),
        }
        Ok(patch)
    }
}

impl FieldPatch for RatePatch {
    fn is_empty(&self) -> bool {
        self.base_rate.is_none()
            && self.extra_adult_charge.is_none()
            && self.min_stay.is_none()
            && self.max_stay.is_none()
            && self.cutoff_time.is_none()
    }

    fn merge(&mut self, newer: &Self) {
        self.base_rate = newer.base_rate.or(self.base_rate);
        self.extra_adult_charge = newer.extra_adult_charge.or(self.extra_adult_charge);
        self.min_stay = newer.min_stay.or(self.min_stay);
        self.max_stay = newer.max_stay.or(self.max_stay);
        self.cutoff_time = newer.cutoff_time.or(self.cutoff_time);
    }

    fn field_names(&self) -> Vec<&'static str> {
        [
            (self.base_rate.is_some(), RateField::BaseRate),
            (self.extra_adult_charge.is_some(), RateField::ExtraAdultCharge),
            (self.min_stay.is_some(), RateField::MinStay),
            (self.max_stay.is_some(), RateField::MaxStay),
            (self.cutoff_time.is_some(), RateField::CutoffTime),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, field)| field.as_str())
        .collect()
    }
}

/// `Option<NaiveTime>` as `"HH:MM"` (or `null`).
mod cutoff_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::coerce::{parse_cutoff, CUTOFF_FORMAT};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_str(&t.format(CUTOFF_FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| parse_cutoff(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Patch flavour: an absent field is untouched, `null` clears the cutoff.
mod cutoff_patch_format {
    use chrono::NaiveTime;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Option<NaiveTime>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => super::cutoff_format::serialize(inner, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Option<NaiveTime>>, D::Error> {
        super::cutoff_format::deserialize(d).map(Some)
    }
}
