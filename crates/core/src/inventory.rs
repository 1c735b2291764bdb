//! Room inventory grid: one row per room type per day.

use serde::{Deserialize, Serialize};

use crate::coerce::coerce_count;
use crate::error::CoreError;
use crate::row::{CalendarRow, FieldPatch};
use crate::types::{CalendarDate, DbId};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Sell status of a room type on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Bookable, at least one room available.
    Open,
    /// Nothing left to sell.
    SoldOut,
    /// Stop-sell set by the property; stays closed until reopened explicitly.
    Closed,
}

/// Rooms that can still be sold: `max(0, total - sold - blocked)`.
pub fn available_rooms(total: u32, sold: u32, blocked: u32) -> u32 {
    total.saturating_sub(sold).saturating_sub(blocked)
}

/// Status implied by `requested` and the current availability. A closed day
/// stays closed; anything else follows availability.
pub fn derive_status(requested: RoomStatus, available: u32) -> RoomStatus {
    match requested {
        RoomStatus::Closed => RoomStatus::Closed,
        _ if available == 0 => RoomStatus::SoldOut,
        _ => RoomStatus::Open,
    }
}

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDay {
    pub room_id: DbId,
    pub date: CalendarDate,
    pub total: u32,
    pub sold: u32,
    pub blocked: u32,
    pub available: u32,
    pub status: RoomStatus,
}

impl InventoryDay {
    /// Build an open row, deriving `available` and `status` from the counts.
    pub fn new(room_id: DbId, date: CalendarDate, total: u32, sold: u32, blocked: u32) -> Self {
        let available = available_rooms(total, sold, blocked);
        Self {
            room_id,
            date,
            total,
            sold,
            blocked,
            available,
            status: derive_status(RoomStatus::Open, available),
        }
    }
}

impl CalendarRow for InventoryDay {
    type Patch = InventoryPatch;

    const GRID: &'static str = "inventory";

    fn entity_id(&self) -> DbId {
        self.room_id
    }

    fn date(&self) -> CalendarDate {
        self.date
    }

    fn apply_patch(&mut self, patch: &InventoryPatch) {
        if let Some(total) = patch.total {
            self.total = total;
        }
        self.available = available_rooms(self.total, self.sold, self.blocked);
        let requested = patch.status.unwrap_or(self.status);
        self.status = derive_status(requested, self.available);
    }

    fn capture_fields(&self, patch: &InventoryPatch) -> InventoryPatch {
        // Status is derived from total, so it is captured whenever anything is.
        InventoryPatch {
            total: patch.total.map(|_| self.total),
            status: (!patch.is_empty()).then_some(self.status),
        }
    }
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Editable inventory fields. `sold` and `blocked` come from reservations and
/// are never edited from the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RoomStatus>,
}

impl InventoryPatch {
    pub fn total(total: u32) -> Self {
        Self {
            total: Some(total),
            status: None,
        }
    }

    /// Total rooms from raw cell input, coerced to a non-negative count.
    pub fn total_from_input(raw: &str) -> Self {
        Self::total(coerce_count(raw))
    }

    pub fn status(status: RoomStatus) -> Self {
        Self {
            total: None,
            status: Some(status),
        }
    }

    /// Build a single-field patch from raw cell input.
    pub fn from_field(field: InventoryField, raw: &str) -> Result<Self, CoreError> {
        match field {
            InventoryField::Total => Ok(Self::total_from_input(raw)),
            InventoryField::Status => match RoomStatus::parse(raw)? {
                RoomStatus::SoldOut => Err(CoreError::Validation(
                    "Sold out is derived from availability and cannot be set directly".into(),
                )),
                status => Ok(Self::status(status)),
            },
        }
    }
}

/// The editable columns of an inventory row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InventoryField {
    Total,
    Status,
}

impl RoomStatus {
    /// Parse `open`, `sold_out` or `closed` (case-insensitive).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(RoomStatus::Open),
            "sold_out" => Ok(RoomStatus::SoldOut),
            "closed" => Ok(RoomStatus::Closed),
            other => Err(CoreError::Validation(format!("Unknown room status '{other}'"))),
        }
    }
}

impl FieldPatch for InventoryPatch {
    fn is_empty(&self) -> bool {
        self.total.is_none() && self.status.is_none()
    }

    fn merge(&mut self, newer: &Self) {
        if newer.total.is_some() {
            self.total = newer.total;
        }
        if newer.status.is_some() {
            self.status = newer.status;
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.total.is_some() {
            names.push("total");
        }
        if self.status.is_some() {
            names.push("status");
        }
        names
    }
}
