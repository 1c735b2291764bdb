//! Last-known-good copy of a grid, used to revert.
//!
//! Exactly one snapshot is live at a time. Capturing replaces the previous
//! one; restoring hands out a clone so the retained copy can never be mutated
//! through what the caller receives.

use crate::collection::Calendar;
use crate::row::{CalendarRow, CellKey};

#[derive(Debug, Clone)]
pub struct SnapshotGuard<R: CalendarRow> {
    snapshot: Option<Calendar<R>>,
}

impl<R: CalendarRow> Default for SnapshotGuard<R> {
    fn default() -> Self {
        Self { snapshot: None }
    }
}

impl<R: CalendarRow> SnapshotGuard<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retain an independent copy of `collection`, discarding any earlier one.
    pub fn capture(&mut self, collection: &Calendar<R>) {
        self.snapshot = Some(collection.clone());
    }

    /// An independent copy of the retained collection, if one was captured.
    pub fn restore(&self) -> Option<Calendar<R>> {
        self.snapshot.clone()
    }

    pub fn is_captured(&self) -> bool {
        self.snapshot.is_some()
    }

    /// The retained server-confirmed row for one cell.
    pub fn row(&self, key: &CellKey) -> Option<&R> {
        self.snapshot.as_ref().and_then(|s| s.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_date;
    use crate::inventory::{InventoryDay, InventoryPatch};
    use crate::store::OptimisticStateStore;

    #[test]
    fn restore_before_capture_is_none() {
        let guard: SnapshotGuard<InventoryDay> = SnapshotGuard::new();
        assert!(!guard.is_captured());
        assert!(guard.restore().is_none());
    }

    #[test]
    fn live_edits_do_not_leak_into_the_snapshot() {
        let date = parse_date("2024-09-01").unwrap();
        let mut store = OptimisticStateStore::new();
        store.replace_all(Calendar::from_rows(vec![InventoryDay::new(1, date, 20, 2, 0)]).unwrap());

        let mut guard = SnapshotGuard::new();
        guard.capture(store.collection());

        store.apply_local_edit(1, date, &InventoryPatch::total(5));

        let key = CellKey::new(1, date);
        assert_eq!(guard.row(&key).unwrap().total, 20);
        assert_eq!(guard.restore().unwrap().get(&key).unwrap().available, 18);
    }

    #[test]
    fn restored_copies_cannot_touch_the_snapshot() {
        let date = parse_date("2024-09-01").unwrap();
        let mut guard = SnapshotGuard::new();
        guard.capture(&Calendar::from_rows(vec![InventoryDay::new(1, date, 6, 0, 0)]).unwrap());

        let mut store = OptimisticStateStore::new();
        store.replace_all(guard.restore().unwrap());
        store.apply_local_edit(1, date, &InventoryPatch::total(1));

        assert_eq!(guard.row(&CellKey::new(1, date)).unwrap().total, 6);
    }

    #[test]
    fn capture_replaces_previous_snapshot() {
        let date = parse_date("2024-09-01").unwrap();
        let mut guard = SnapshotGuard::new();
        guard.capture(&Calendar::from_rows(vec![InventoryDay::new(1, date, 6, 0, 0)]).unwrap());
        guard.capture(&Calendar::from_rows(vec![InventoryDay::new(2, date, 9, 0, 0)]).unwrap());

        let restored = guard.restore().unwrap();
        assert_eq!(restored.len(), 1);
        assert!(restored.get(&CellKey::new(1, date)).is_none());
    }
}
