//! Remote paths per grid kind, and the [`CalendarBackend`] implementation.

use async_trait::async_trait;
use stayline_core::calendar::{DateWindow, DATE_FORMAT};
use stayline_core::inventory::InventoryDay;
use stayline_core::rates::RateDay;
use stayline_core::row::CalendarRow;
use stayline_core::types::{CalendarDate, DbId};
use stayline_grid::{BackendError, CalendarBackend};

use crate::api::CalendarApi;

/// A grid kind the calendar service exposes.
///
/// Reads are per property (`/properties/{id}/{grid}`); writes are per owning
/// entity (`/{entities}/{id}/{grid}[/{date}]`).
pub trait RemoteGrid: CalendarRow {
    /// Collection segment of the owning entity, e.g. `rooms`.
    const ENTITY_SEGMENT: &'static str;

    fn collection_path(parent_id: DbId) -> String {
        format!("/properties/{parent_id}/{}", Self::GRID)
    }

    fn range_path(entity_id: DbId) -> String {
        format!("/{}/{entity_id}/{}", Self::ENTITY_SEGMENT, Self::GRID)
    }

    fn cell_path(entity_id: DbId, date: CalendarDate) -> String {
        format!("{}/{}", Self::range_path(entity_id), date.format(DATE_FORMAT))
    }
}

impl RemoteGrid for InventoryDay {
    const ENTITY_SEGMENT: &'static str = "rooms";
}

impl RemoteGrid for RateDay {
    const ENTITY_SEGMENT: &'static str = "rate-plans";
}

#[async_trait]
impl<R: RemoteGrid> CalendarBackend<R> for CalendarApi {
    async fn fetch_calendar(
        &self,
        parent_id: DbId,
        window: DateWindow,
    ) -> Result<Vec<R>, BackendError> {
        self.fetch_rows::<R>(parent_id, window).await.map_err(|e| {
            tracing::warn!(grid = R::GRID, parent_id, error = %e, "Calendar fetch failed");
            BackendError::from(e)
        })
    }

    async fn persist_single(
        &self,
        entity_id: DbId,
        date: CalendarDate,
        fields: &R::Patch,
    ) -> Result<(), BackendError> {
        self.put_cell::<R>(entity_id, date, fields).await.map_err(|e| {
            tracing::warn!(grid = R::GRID, entity_id, %date, error = %e, "Cell update failed");
            BackendError::from(e)
        })
    }

    async fn persist_bulk(
        &self,
        entity_id: DbId,
        window: DateWindow,
        fields: &R::Patch,
    ) -> Result<(), BackendError> {
        self.put_range::<R>(entity_id, window, fields).await.map_err(|e| {
            tracing::warn!(grid = R::GRID, entity_id, error = %e, "Range update failed");
            BackendError::from(e)
        })
    }
}
