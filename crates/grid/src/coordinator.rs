//! Single-active-edit coordinator for one calendar grid session.
//!
//! # State machine
//!
//! ```text
//!            edit_cell (active column)        save()
//!   IDLE ───────────────────────────▶ EDITING ───────▶ SAVING
//!    ▲                                  │  ▲             │
//!    │            edit_cell (same cell) └──┘             │
//!    │                                                   │
//!    ├────────── success: confirm, clear edit ◀──────────┤
//!    ├────────── failure: revert prior, clear edit ◀─────┘
//!    │
//!    └────────── cancel(): restore snapshot (from any state)
//! ```
//!
//! The lock (`has_changes`) is derived from the presence of the edit record
//! and never stored. A generation counter is bumped by cancel, load and bulk
//! apply; a save compares the generation it was dispatched under when it
//! settles and discards its result if the session moved on.
//!
//! The session state sits behind a plain mutex that is only held between
//! awaits, never across one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use stayline_core::calendar::DateWindow;
use stayline_core::collection::Calendar;
use stayline_core::edit::EditRecord;
use stayline_core::notice::{NoticeKind, Notifier};
use stayline_core::row::{CalendarRow, CellKey, FieldPatch};
use stayline_core::snapshot::SnapshotGuard;
use stayline_core::store::OptimisticStateStore;
use stayline_core::types::{CalendarDate, DbId};
use stayline_core::updating::UpdatingSet;

use crate::backend::CalendarBackend;
use crate::error::GridError;
use crate::view::{GridCell, GridView};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How a cell may be interacted with right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    /// In the active column and nothing else is pending.
    Editable,
    /// The cell holding the pending edit.
    Editing,
    /// Another cell holds the pending edit.
    Locked,
    /// Outside the active date column.
    Inactive,
    /// A save for this cell is in flight.
    Updating,
    /// Not part of the loaded window.
    Missing,
}

/// Result of [`EditCoordinator::edit_cell`]. Rejections are reported, never
/// raised: the rendering layer already shows those cells read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// A new edit record was created and the grid is now locked.
    Started,
    /// The pending edit on the same cell was amended in place.
    Amended,
    /// The patch was empty.
    NoChange,
    /// The cell could not be edited in its current state.
    Ignored(CellState),
}

/// Result of [`EditCoordinator::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    NothingToSave,
    /// A save for this cell is already in flight.
    AlreadySaving(CellKey),
    Saved(CellKey),
    /// The backend rejected the change; the prior values were restored.
    Reverted { key: CellKey, message: String },
    /// The session was canceled or reloaded while the call was in flight.
    Superseded(CellKey),
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

pub(crate) struct SessionState<R: CalendarRow> {
    pub(crate) store: OptimisticStateStore<R>,
    pub(crate) snapshot: SnapshotGuard<R>,
    pub(crate) edit: Option<EditRecord<R::Patch>>,
    pub(crate) updating: UpdatingSet,
    pub(crate) window: Option<DateWindow>,
    pub(crate) active_date: Option<CalendarDate>,
    pub(crate) generation: u64,
    /// Generation a bulk apply is running under. Every cell reads as
    /// updating while it matches the current generation.
    pub(crate) bulk_generation: Option<u64>,
}

impl<R: CalendarRow> SessionState<R> {
    fn new() -> Self {
        Self {
            store: OptimisticStateStore::new(),
            snapshot: SnapshotGuard::new(),
            edit: None,
            updating: UpdatingSet::new(),
            window: None,
            active_date: None,
            generation: 0,
            bulk_generation: None,
        }
    }

    pub(crate) fn has_changes(&self) -> bool {
        self.edit.is_some()
    }

    pub(crate) fn bulk_in_flight(&self) -> bool {
        self.bulk_generation == Some(self.generation)
    }

    pub(crate) fn cell_state(&self, key: &CellKey) -> CellState {
        if !self.store.collection().contains(key) {
            CellState::Missing
        } else if self.updating.contains(key) || self.bulk_in_flight() {
            CellState::Updating
        } else if self.edit.as_ref().is_some_and(|e| e.matches(key)) {
            CellState::Editing
        } else if self.active_date != Some(key.date) {
            CellState::Inactive
        } else if self.has_changes() {
            CellState::Locked
        } else {
            CellState::Editable
        }
    }

    /// Install a freshly fetched collection as both live state and snapshot,
    /// dropping anything pending.
    pub(crate) fn reset_to(&mut self, collection: Calendar<R>, window: DateWindow) {
        self.snapshot.capture(&collection);
        self.store.replace_all(collection);
        self.edit = None;
        self.updating.clear();
        self.generation += 1;
        self.window = Some(window);
        if self.active_date.is_some_and(|d| !window.contains(d)) {
            self.active_date = None;
        }
    }
}

// ---------------------------------------------------------------------------
// EditCoordinator
// ---------------------------------------------------------------------------

/// Owns one grid session (one property, one grid kind).
///
/// Construct once per session and share it via `Arc`; every method takes
/// `&self`.
pub struct EditCoordinator<R: CalendarRow> {
    parent_id: DbId,
    pub(crate) backend: Arc<dyn CalendarBackend<R>>,
    pub(crate) notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState<R>>,
}

impl<R: CalendarRow> EditCoordinator<R> {
    pub fn new(
        parent_id: DbId,
        backend: Arc<dyn CalendarBackend<R>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            parent_id,
            backend,
            notifier,
            state: Mutex::new(SessionState::new()),
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, SessionState<R>> {
        // A panic while holding the lock leaves the data consistent enough
        // for a UI session; keep serving it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn parent_id(&self) -> DbId {
        self.parent_id
    }

    // ---- reads ----

    /// The lock flag: `true` while an edit is pending.
    pub fn has_changes(&self) -> bool {
        self.state().has_changes()
    }

    pub fn pending_edit(&self) -> Option<EditRecord<R::Patch>> {
        self.state().edit.clone()
    }

    pub fn cell_state(&self, entity_id: DbId, date: CalendarDate) -> CellState {
        self.state().cell_state(&CellKey::new(entity_id, date))
    }

    /// The live collection (cheap structural clone).
    pub fn collection(&self) -> Calendar<R> {
        self.state().store.collection().clone()
    }

    pub fn window(&self) -> Option<DateWindow> {
        self.state().window
    }

    pub fn active_date(&self) -> Option<CalendarDate> {
        self.state().active_date
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    pub fn is_loaded(&self) -> bool {
        self.state().window.is_some()
    }

    /// Everything the rendering layer needs to draw the grid.
    pub fn view(&self) -> GridView<R> {
        let st = self.state();
        let cells = st
            .store
            .collection()
            .rows()
            .map(|row| GridCell {
                state: st.cell_state(&row.key()),
                row: row.clone(),
            })
            .collect();
        GridView {
            grid: R::GRID,
            parent_id: self.parent_id,
            window: st.window,
            active_date: st.active_date,
            has_changes: st.has_changes(),
            edit: st.edit.clone(),
            updating: st.updating.iter().copied().collect(),
            revision: st.store.revision(),
            cells,
        }
    }

    // ---- load ----

    /// Fetch `window` from the backend and make it the session's
    /// server-confirmed state. Pending edits are dropped and any in-flight
    /// save will be discarded when it settles.
    pub async fn load(&self, window: DateWindow) -> Result<usize, GridError> {
        let collection = match self.fetch(window).await {
            Ok(collection) => collection,
            Err(err) => {
                tracing::error!(
                    grid = R::GRID,
                    parent_id = self.parent_id,
                    error = %err,
                    "Failed to load calendar"
                );
                self.notifier
                    .notify(&format!("Failed to load {} calendar", R::GRID), NoticeKind::Error);
                return Err(err);
            }
        };

        let count = collection.len();
        let mut st = self.state();
        st.reset_to(collection, window);
        tracing::info!(
            grid = R::GRID,
            parent_id = self.parent_id,
            from = %window.from(),
            to = %window.to(),
            rows = count,
            generation = st.generation,
            "Calendar loaded"
        );
        Ok(count)
    }

    pub(crate) async fn fetch(&self, window: DateWindow) -> Result<Calendar<R>, GridError> {
        let rows = self.backend.fetch_calendar(self.parent_id, window).await?;
        Ok(Calendar::from_rows(rows)?)
    }

    // ---- column selection ----

    /// Make `date` the editable column. Ignored (returns `false`) while an
    /// edit is pending or when the date is outside the loaded window.
    pub fn select_date(&self, date: CalendarDate) -> bool {
        let mut st = self.state();
        if st.has_changes() {
            tracing::debug!(grid = R::GRID, %date, "Column change ignored while an edit is pending");
            return false;
        }
        if !st.window.is_some_and(|w| w.contains(date)) {
            return false;
        }
        st.active_date = Some(date);
        true
    }

    /// Leave column-edit mode. Ignored while an edit is pending.
    pub fn clear_date_selection(&self) -> bool {
        let mut st = self.state();
        if st.has_changes() {
            return false;
        }
        st.active_date = None;
        true
    }

    // ---- editing ----

    /// Apply `fields` to a cell optimistically and record it as the pending
    /// edit.
    ///
    /// Only the active column is editable, and only one cell at a time:
    /// editing the same cell again amends the record, editing any other cell
    /// while an edit is pending is ignored.
    pub fn edit_cell(&self, entity_id: DbId, date: CalendarDate, fields: R::Patch) -> EditOutcome {
        if fields.is_empty() {
            return EditOutcome::NoChange;
        }
        let key = CellKey::new(entity_id, date);
        let mut guard = self.state();
        let st = &mut *guard;

        let state = st.cell_state(&key);
        if !matches!(state, CellState::Editable | CellState::Editing) {
            tracing::debug!(grid = R::GRID, cell = %key, ?state, "Edit ignored");
            return EditOutcome::Ignored(state);
        }

        let prior = match st.store.row(&key) {
            Some(row) => row.capture_fields(&fields),
            None => return EditOutcome::Ignored(CellState::Missing),
        };
        st.store.apply_local_edit(entity_id, date, &fields);

        match st.edit.take() {
            Some(current) => {
                let amended = current.amended(&fields, prior);
                tracing::debug!(
                    grid = R::GRID,
                    cell = %key,
                    fields = ?amended.fields().field_names(),
                    "Pending edit amended"
                );
                st.edit = Some(amended);
                EditOutcome::Amended
            }
            None => {
                tracing::debug!(
                    grid = R::GRID,
                    cell = %key,
                    fields = ?fields.field_names(),
                    "Edit started, grid locked"
                );
                st.edit = Some(EditRecord::new(key, fields, prior));
                EditOutcome::Started
            }
        }
    }

    // ---- save ----

    /// Persist the pending edit.
    ///
    /// On success the confirmed values stay, the edit clears and the
    /// snapshot is refreshed. On failure the prior values are reapplied in
    /// the same step that clears the edit, and an error notice is emitted.
    /// Failures are not retried.
    pub async fn save(&self) -> SaveOutcome {
        let (key, fields, prior, generation) = {
            let mut st = self.state();
            let Some(edit) = st.edit.clone() else {
                return SaveOutcome::NothingToSave;
            };
            let key = edit.key();
            if !st.updating.insert(key) {
                tracing::debug!(grid = R::GRID, cell = %key, "Save already in flight");
                return SaveOutcome::AlreadySaving(key);
            }
            (key, edit.fields().clone(), edit.prior().clone(), st.generation)
        };

        tracing::info!(
            grid = R::GRID,
            cell = %key,
            fields = ?fields.field_names(),
            generation,
            "Saving cell"
        );
        let result = self
            .backend
            .persist_single(key.entity_id, key.date, &fields)
            .await;

        let outcome = {
            let mut guard = self.state();
            let st = &mut *guard;

            if st.generation != generation {
                tracing::info!(
                    grid = R::GRID,
                    cell = %key,
                    dispatched = generation,
                    current = st.generation,
                    succeeded = result.is_ok(),
                    "Save settled after the session was reset; result discarded"
                );
                return SaveOutcome::Superseded(key);
            }

            let outcome = match result {
                Ok(()) => {
                    st.store.apply_local_edit(key.entity_id, key.date, &fields);
                    if st.edit.as_ref().is_some_and(|e| e.matches(&key)) {
                        st.edit = None;
                    }
                    st.snapshot.capture(st.store.collection());
                    tracing::info!(grid = R::GRID, cell = %key, "Cell saved");
                    SaveOutcome::Saved(key)
                }
                Err(err) => {
                    st.store.apply_local_edit(key.entity_id, key.date, &prior);
                    st.edit = None;
                    tracing::warn!(
                        grid = R::GRID,
                        cell = %key,
                        error = %err,
                        "Save rejected, prior values restored"
                    );
                    SaveOutcome::Reverted {
                        key,
                        message: err.user_message().to_string(),
                    }
                }
            };
            st.updating.remove(&key);
            outcome
        };

        match &outcome {
            SaveOutcome::Saved(_) => self
                .notifier
                .notify("Changes saved successfully", NoticeKind::Success),
            SaveOutcome::Reverted { message, .. } => {
                self.notifier.notify(message, NoticeKind::Error)
            }
            _ => {}
        }
        outcome
    }

    // ---- cancel ----

    /// Throw away every unsaved change: restore the snapshot, clear the edit
    /// and the in-flight set, and invalidate any save still in flight.
    ///
    /// Canceling twice in a row is a no-op the second time.
    pub fn cancel(&self) {
        let mut st = self.state();
        st.generation += 1;
        if let Some(snapshot) = st.snapshot.restore() {
            st.store.replace_all(snapshot);
        }
        let had_edit = st.edit.take().is_some();
        let in_flight = st.updating.len();
        st.updating.clear();
        tracing::info!(
            grid = R::GRID,
            parent_id = self.parent_id,
            had_edit,
            in_flight,
            generation = st.generation,
            "Changes canceled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryCalendar, RecordingNotifier};
    use assert_matches::assert_matches;
    use stayline_core::calendar::parse_date;
    use stayline_core::inventory::{InventoryDay, InventoryPatch, RoomStatus};

    fn d(s: &str) -> CalendarDate {
        parse_date(s).unwrap()
    }

    fn window() -> DateWindow {
        DateWindow::new(d("2024-05-01"), d("2024-05-03")).unwrap()
    }

    fn rows() -> Vec<InventoryDay> {
        let mut rows = Vec::new();
        for room in [1, 2] {
            for date in window().days() {
                rows.push(InventoryDay::new(room, date, 20, 2, 0));
            }
        }
        rows
    }

    async fn session() -> (
        Arc<EditCoordinator<InventoryDay>>,
        Arc<MemoryCalendar<InventoryDay>>,
        Arc<RecordingNotifier>,
    ) {
        let backend = Arc::new(MemoryCalendar::new(rows()));
        let notifier = Arc::new(RecordingNotifier::default());
        let coordinator = Arc::new(EditCoordinator::new(
            10,
            backend.clone() as Arc<dyn CalendarBackend<InventoryDay>>,
            notifier.clone() as Arc<dyn Notifier>,
        ));
        coordinator.load(window()).await.unwrap();
        (coordinator, backend, notifier)
    }

    #[tokio::test]
    async fn nothing_is_editable_until_a_column_is_selected() {
        let (coord, _, _) = session().await;
        assert_eq!(coord.cell_state(1, d("2024-05-01")), CellState::Inactive);
        assert_eq!(
            coord.edit_cell(1, d("2024-05-01"), InventoryPatch::total(5)),
            EditOutcome::Ignored(CellState::Inactive)
        );
        assert!(!coord.has_changes());
    }

    #[tokio::test]
    async fn select_date_outside_window_is_ignored() {
        let (coord, _, _) = session().await;
        assert!(!coord.select_date(d("2024-06-01")));
        assert_eq!(coord.active_date(), None);
        assert!(coord.select_date(d("2024-05-02")));
        assert_eq!(coord.active_date(), Some(d("2024-05-02")));
    }

    #[tokio::test]
    async fn edit_locks_every_other_cell() {
        let (coord, _, _) = session().await;
        coord.select_date(d("2024-05-01"));

        assert_eq!(
            coord.edit_cell(1, d("2024-05-01"), InventoryPatch::total(15)),
            EditOutcome::Started
        );
        assert!(coord.has_changes());
        assert_eq!(coord.cell_state(1, d("2024-05-01")), CellState::Editing);
        assert_eq!(coord.cell_state(2, d("2024-05-01")), CellState::Locked);
        assert_eq!(coord.cell_state(2, d("2024-05-02")), CellState::Inactive);
        assert_eq!(coord.cell_state(3, d("2024-05-01")), CellState::Missing);
    }

    #[tokio::test]
    async fn second_cell_edit_leaves_the_first_record_untouched() {
        let (coord, _, _) = session().await;
        coord.select_date(d("2024-05-01"));
        coord.edit_cell(1, d("2024-05-01"), InventoryPatch::total(15));
        let first = coord.pending_edit().unwrap();
        let before = coord.collection();

        assert_eq!(
            coord.edit_cell(2, d("2024-05-01"), InventoryPatch::total(1)),
            EditOutcome::Ignored(CellState::Locked)
        );
        assert_eq!(coord.pending_edit().unwrap(), first);
        assert_eq!(coord.collection(), before);
    }

    #[tokio::test]
    async fn column_cannot_change_while_editing() {
        let (coord, _, _) = session().await;
        coord.select_date(d("2024-05-01"));
        coord.edit_cell(1, d("2024-05-01"), InventoryPatch::total(15));
        assert!(!coord.select_date(d("2024-05-02")));
        assert!(!coord.clear_date_selection());
        assert_eq!(coord.active_date(), Some(d("2024-05-01")));
    }

    #[tokio::test]
    async fn same_cell_edit_amends_in_place() {
        let (coord, _, _) = session().await;
        coord.select_date(d("2024-05-01"));
        coord.edit_cell(1, d("2024-05-01"), InventoryPatch::total(15));
        assert_eq!(
            coord.edit_cell(1, d("2024-05-01"), InventoryPatch::total(7)),
            EditOutcome::Amended
        );
        let edit = coord.pending_edit().unwrap();
        assert_eq!(edit.fields().total, Some(7));
        assert_eq!(edit.prior().total, Some(20));
    }

    #[tokio::test]
    async fn empty_patch_changes_nothing() {
        let (coord, _, _) = session().await;
        coord.select_date(d("2024-05-01"));
        assert_eq!(
            coord.edit_cell(1, d("2024-05-01"), InventoryPatch::default()),
            EditOutcome::NoChange
        );
        assert!(!coord.has_changes());
    }

    #[tokio::test]
    async fn save_without_edit_is_a_no_op() {
        let (coord, backend, notifier) = session().await;
        assert_eq!(coord.save().await, SaveOutcome::NothingToSave);
        assert!(backend.writes().is_empty());
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn successful_save_unlocks_and_notifies() {
        let (coord, backend, notifier) = session().await;
        coord.select_date(d("2024-05-01"));
        coord.edit_cell(1, d("2024-05-01"), InventoryPatch::total(15));

        assert_matches!(coord.save().await, SaveOutcome::Saved(_));
        assert!(!coord.has_changes());
        assert_eq!(coord.cell_state(1, d("2024-05-01")), CellState::Editable);
        assert_eq!(backend.writes().len(), 1);
        assert_eq!(notifier.last().unwrap().1, NoticeKind::Success);

        // The confirmed value is now what cancel falls back to.
        coord.cancel();
        let row = coord.collection().get(&CellKey::new(1, d("2024-05-01"))).cloned().unwrap();
        assert_eq!(row.total, 15);
    }

    #[tokio::test]
    async fn rejected_save_reverts_and_surfaces_message() {
        let (coord, backend, notifier) = session().await;
        backend.reject_writes("Total cannot be below sold rooms");
        coord.select_date(d("2024-05-01"));
        coord.edit_cell(1, d("2024-05-01"), InventoryPatch::status(RoomStatus::Closed));

        let outcome = coord.save().await;
        assert_matches!(outcome, SaveOutcome::Reverted { ref message, .. } if message == "Total cannot be below sold rooms");
        assert!(!coord.has_changes());

        let row = coord.collection().get(&CellKey::new(1, d("2024-05-01"))).cloned().unwrap();
        assert_eq!(row.status, RoomStatus::Open);
        assert_eq!(
            notifier.last(),
            Some(("Total cannot be below sold rooms".to_string(), NoticeKind::Error))
        );
    }

    #[tokio::test]
    async fn double_save_is_ignored_while_in_flight() {
        let (coord, backend, _) = session().await;
        let gate = backend.pause_writes();
        coord.select_date(d("2024-05-01"));
        coord.edit_cell(1, d("2024-05-01"), InventoryPatch::total(15));

        let first = tokio::spawn({
            let coord = coord.clone();
            async move { coord.save().await }
        });
        gate.entered().await;

        assert_eq!(coord.cell_state(1, d("2024-05-01")), CellState::Updating);
        assert_matches!(coord.save().await, SaveOutcome::AlreadySaving(_));
        assert_eq!(
            coord.edit_cell(1, d("2024-05-01"), InventoryPatch::total(3)),
            EditOutcome::Ignored(CellState::Updating)
        );

        gate.release();
        assert_matches!(first.await.unwrap(), SaveOutcome::Saved(_));
        assert_eq!(backend.writes().len(), 1);
    }

    #[tokio::test]
    async fn load_failure_is_reported_and_leaves_session_unloaded() {
        let backend = Arc::new(MemoryCalendar::<InventoryDay>::new(rows()));
        backend.fail_fetches("maintenance window");
        let notifier = Arc::new(RecordingNotifier::default());
        let coord = EditCoordinator::new(
            10,
            backend.clone() as Arc<dyn CalendarBackend<InventoryDay>>,
            notifier.clone() as Arc<dyn Notifier>,
        );

        assert_matches!(coord.load(window()).await, Err(GridError::Backend(_)));
        assert!(!coord.is_loaded());
        assert_eq!(notifier.last().unwrap().1, NoticeKind::Error);
    }

    #[tokio::test]
    async fn reload_drops_pending_edit_and_keeps_column_if_still_visible() {
        let (coord, _, _) = session().await;
        coord.select_date(d("2024-05-02"));
        coord.edit_cell(1, d("2024-05-02"), InventoryPatch::total(1));

        coord.load(window()).await.unwrap();
        assert!(!coord.has_changes());
        assert_eq!(coord.active_date(), Some(d("2024-05-02")));

        let narrower = DateWindow::single(d("2024-05-01"));
        coord.load(narrower).await.unwrap();
        assert_eq!(coord.active_date(), None);
    }

    #[tokio::test]
    async fn view_reports_cell_states() {
        let (coord, _, _) = session().await;
        coord.select_date(d("2024-05-01"));
        coord.edit_cell(2, d("2024-05-01"), InventoryPatch::total(9));

        let view = coord.view();
        assert_eq!(view.grid, "inventory");
        assert!(view.has_changes);
        assert_eq!(view.cells.len(), 6);
        let editing: Vec<_> = view
            .cells
            .iter()
            .filter(|c| c.state == CellState::Editing)
            .map(|c| c.row.key())
            .collect();
        assert_eq!(editing, vec![CellKey::new(2, d("2024-05-01"))]);
    }
}
