use serde::Serialize;
use stayline_core::calendar::DateWindow;
use stayline_core::edit::EditRecord;
use stayline_core::row::{CalendarRow, CellKey};
use stayline_core::types::{CalendarDate, DbId};

use crate::coordinator::CellState;

/// Point-in-time picture of a grid session, shaped for the rendering layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView<R: CalendarRow> {
    pub grid: &'static str,
    pub parent_id: DbId,
    pub window: Option<DateWindow>,
    pub active_date: Option<CalendarDate>,
    /// The lock flag.
    pub has_changes: bool,
    pub edit: Option<EditRecord<R::Patch>>,
    pub updating: Vec<CellKey>,
    /// Store revision; changes whenever the live collection was written.
    pub revision: u64,
    pub cells: Vec<GridCell<R>>,
}

/// One row plus how it may be interacted with.
#[derive(Debug, Clone, Serialize)]
pub struct GridCell<R: CalendarRow> {
    #[serde(flatten)]
    pub row: R,
    pub state: CellState,
}
