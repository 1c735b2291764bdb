//! The remote calendar service as seen by a grid session.

use async_trait::async_trait;
use stayline_core::calendar::DateWindow;
use stayline_core::row::CalendarRow;
use stayline_core::types::{CalendarDate, DbId};

use crate::error::BackendError;

/// Authoritative store of calendar rows for one grid kind.
///
/// Implementations: `stayline_client::CalendarApi` (HTTP) and
/// [`MemoryCalendar`](crate::memory::MemoryCalendar) (in process).
#[async_trait]
pub trait CalendarBackend<R: CalendarRow>: Send + Sync {
    /// Every row of `parent_id` (a property) inside `window`.
    async fn fetch_calendar(&self, parent_id: DbId, window: DateWindow)
        -> Result<Vec<R>, BackendError>;

    /// Persist one cell. Called at most once per Save.
    async fn persist_single(
        &self,
        entity_id: DbId,
        date: CalendarDate,
        fields: &R::Patch,
    ) -> Result<(), BackendError>;

    /// Persist the same fields for every day of `window` on one entity.
    async fn persist_bulk(
        &self,
        entity_id: DbId,
        window: DateWindow,
        fields: &R::Patch,
    ) -> Result<(), BackendError>;
}
