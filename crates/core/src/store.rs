//! Optimistic state store: the live collection a grid renders from.
//!
//! The store applies edits locally without waiting for the network. It has
//! exactly two write paths, [`apply_local_edit`](OptimisticStateStore::apply_local_edit)
//! and [`replace_all`](OptimisticStateStore::replace_all); nothing else writes
//! to the live collection. Every write bumps [`revision`](OptimisticStateStore::revision)
//! so the rendering layer can tell when to redraw.

use crate::collection::Calendar;
use crate::row::{CalendarRow, CellKey};
use crate::types::{CalendarDate, DbId};

#[derive(Debug, Clone)]
pub struct OptimisticStateStore<R: CalendarRow> {
    live: Calendar<R>,
    revision: u64,
}

impl<R: CalendarRow> Default for OptimisticStateStore<R> {
    fn default() -> Self {
        Self {
            live: Calendar::new(),
            revision: 0,
        }
    }
}

impl<R: CalendarRow> OptimisticStateStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `patch` to the row at `(entity_id, date)`, recomputing its
    /// derived fields. Returns `false` (and changes nothing) when the cell is
    /// not loaded. No other row is touched.
    pub fn apply_local_edit(&mut self, entity_id: DbId, date: CalendarDate, patch: &R::Patch) -> bool {
        let key = CellKey::new(entity_id, date);
        match self.live.get_mut(&key) {
            Some(row) => {
                row.apply_patch(patch);
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Swap in a whole new collection (after a fetch, cancel or bulk apply).
    pub fn replace_all(&mut self, collection: Calendar<R>) {
        self.live = collection;
        self.revision += 1;
    }

    pub fn collection(&self) -> &Calendar<R> {
        &self.live
    }

    pub fn row(&self, key: &CellKey) -> Option<&R> {
        self.live.get(key)
    }

    /// Monotonic write counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
