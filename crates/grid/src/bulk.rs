//! Bulk apply: one value across a date range, for every entity in the grid.
//!
//! The local side is deliberately dumb. Cells in range get the value
//! optimistically so the grid reacts at once, one persistence call goes out
//! per entity, and then the whole window is refetched and trusted. No
//! per-call compensation is attempted; the refetch is the reconciliation.

use futures::future::join_all;
use serde::Serialize;
use stayline_core::calendar::DateWindow;
use stayline_core::error::CoreError;
use stayline_core::notice::NoticeKind;
use stayline_core::row::{CalendarRow, CellKey, FieldPatch};
use stayline_core::types::DbId;

use crate::coordinator::EditCoordinator;
use crate::error::{BackendError, GridError};

/// Summary of a finished bulk apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    /// Entities a persistence call was dispatched for.
    pub entities: usize,
    /// Entities whose call failed.
    pub failed: Vec<DbId>,
    /// Rows in the refetched collection.
    pub rows: usize,
}

impl BulkOutcome {
    pub fn succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<R: CalendarRow> EditCoordinator<R> {
    /// Write `fields` to every day of `range` for every loaded entity, then
    /// refetch the loaded window.
    ///
    /// Any failed call marks the whole operation failed (reported through the
    /// notifier and [`BulkOutcome::failed`]); calls that did go through are
    /// kept. While the calls are out every cell reads as
    /// [`CellState::Updating`](crate::CellState::Updating), so no single-cell
    /// edit can start. The pending edit and the lock are cleared no matter
    /// what. If the refetch itself fails the grid falls back to its snapshot
    /// and the error is returned.
    pub async fn bulk_apply(
        &self,
        range: DateWindow,
        fields: R::Patch,
    ) -> Result<BulkOutcome, GridError> {
        if fields.is_empty() {
            return Err(CoreError::Validation("Bulk update needs at least one field".into()).into());
        }

        let (entity_ids, loaded, generation) = {
            let mut guard = self.state();
            let st = &mut *guard;
            let Some(loaded) = st.window else {
                return Err(CoreError::Conflict(format!("{} calendar is not loaded", R::GRID)).into());
            };

            // Anything pending is superseded by the bulk write.
            st.generation += 1;
            st.bulk_generation = Some(st.generation);
            st.edit = None;
            st.updating.clear();

            let in_range: Vec<CellKey> = st
                .store
                .collection()
                .rows()
                .map(|row| row.key())
                .filter(|key| range.contains(key.date))
                .collect();
            for key in &in_range {
                st.store.apply_local_edit(key.entity_id, key.date, &fields);
                st.updating.insert(*key);
            }
            (st.store.collection().entity_ids(), loaded, st.generation)
        };

        tracing::info!(
            grid = R::GRID,
            parent_id = self.parent_id(),
            entities = entity_ids.len(),
            from = %range.from(),
            to = %range.to(),
            fields = ?fields.field_names(),
            "Bulk update dispatched"
        );

        let calls = entity_ids
            .iter()
            .map(|&entity_id| self.backend.persist_bulk(entity_id, range, &fields));
        let results = join_all(calls).await;

        let failures: Vec<(DbId, BackendError)> = entity_ids
            .iter()
            .copied()
            .zip(results)
            .filter_map(|(id, result)| result.err().map(|e| (id, e)))
            .collect();
        for (entity_id, err) in &failures {
            tracing::warn!(grid = R::GRID, entity_id, error = %err, "Bulk update call failed");
        }

        let refreshed = self.fetch(loaded).await;

        let rows = {
            let mut guard = self.state();
            let st = &mut *guard;
            st.edit = None;
            st.updating.clear();
            if st.bulk_generation == Some(generation) {
                st.bulk_generation = None;
            }
            match refreshed {
                Ok(collection) => {
                    let rows = collection.len();
                    if st.window == Some(loaded) {
                        st.reset_to(collection, loaded);
                    } else {
                        tracing::info!(grid = R::GRID, "Window changed during bulk update; refetch discarded");
                    }
                    Ok(rows)
                }
                Err(err) => {
                    if let Some(snapshot) = st.snapshot.restore() {
                        st.store.replace_all(snapshot);
                    }
                    st.generation += 1;
                    Err(err)
                }
            }
        };

        let rows = match rows {
            Ok(rows) => rows,
            Err(err) => {
                tracing::error!(grid = R::GRID, error = %err, "Refetch after bulk update failed");
                self.notifier.notify(
                    "Bulk update finished but the calendar could not be refreshed",
                    NoticeKind::Error,
                );
                return Err(err);
            }
        };

        let outcome = BulkOutcome {
            entities: entity_ids.len(),
            failed: failures.iter().map(|(id, _)| *id).collect(),
            rows,
        };

        if let Some((_, first)) = failures.first() {
            self.notifier.notify(
                &format!(
                    "Bulk update failed for {} of {} items: {}",
                    failures.len(),
                    outcome.entities,
                    first.user_message()
                ),
                NoticeKind::Error,
            );
        } else {
            tracing::info!(grid = R::GRID, entities = outcome.entities, rows, "Bulk update complete");
            self.notifier
                .notify("Bulk update applied successfully", NoticeKind::Success);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::CalendarBackend;
    use crate::coordinator::{CellState, EditOutcome};
    use crate::memory::{MemoryCalendar, RecordingNotifier};
    use assert_matches::assert_matches;
    use stayline_core::calendar::parse_date;
    use stayline_core::notice::Notifier;
    use stayline_core::rates::{RateDay, RateField, RatePatch};
    use stayline_core::types::CalendarDate;

    fn d(s: &str) -> CalendarDate {
        parse_date(s).unwrap()
    }

    fn loaded_window() -> DateWindow {
        DateWindow::new(d("2024-11-01"), d("2024-11-05")).unwrap()
    }

    fn rate_rows() -> Vec<RateDay> {
        let mut rows = Vec::new();
        for plan in [31, 32, 33] {
            for date in loaded_window().days() {
                rows.push(RateDay {
                    rate_plan_id: plan,
                    date,
                    base_rate: 100.0,
                    extra_adult_charge: 20.0,
                    min_stay: 1,
                    max_stay: 10,
                    cutoff_time: None,
                });
            }
        }
        rows
    }

    async fn session() -> (
        EditCoordinator<RateDay>,
        Arc<MemoryCalendar<RateDay>>,
        Arc<RecordingNotifier>,
    ) {
        let backend = Arc::new(MemoryCalendar::new(rate_rows()));
        let notifier = Arc::new(RecordingNotifier::default());
        let coord = EditCoordinator::new(
            5,
            backend.clone() as Arc<dyn CalendarBackend<RateDay>>,
            notifier.clone() as Arc<dyn Notifier>,
        );
        coord.load(loaded_window()).await.unwrap();
        (coord, backend, notifier)
    }

    #[tokio::test]
    async fn one_call_per_entity_and_refetch() {
        let (coord, backend, notifier) = session().await;
        let range = DateWindow::new(d("2024-11-02"), d("2024-11-03")).unwrap();
        let patch = RatePatch::from_field(RateField::BaseRate, "135").unwrap();

        let outcome = coord.bulk_apply(range, patch).await.unwrap();
        assert!(outcome.succeeded());
        assert_eq!(outcome.entities, 3);
        assert_eq!(outcome.rows, 15);
        assert_eq!(backend.writes().len(), 3);
        assert_eq!(backend.fetch_count(), 2);

        let cal = coord.collection();
        for row in cal.rows() {
            let expected = if range.contains(row.date) { 135.0 } else { 100.0 };
            assert_eq!(row.base_rate, expected, "row {}", row.key());
        }
        assert_eq!(notifier.last().unwrap().1, NoticeKind::Success);
    }

    #[tokio::test]
    async fn partial_failure_reports_failed_and_trusts_refetch() {
        let (coord, backend, notifier) = session().await;
        backend.reject_entity(32, "Rate plan is archived");
        let range = DateWindow::single(d("2024-11-04"));
        let patch = RatePatch::from_field(RateField::MinStay, "3").unwrap();

        let outcome = coord.bulk_apply(range, patch).await.unwrap();
        assert!(!outcome.succeeded());
        assert_eq!(outcome.failed, vec![32]);

        // The live grid equals the server, not the optimistic three-way patch.
        let fresh = backend.rows_in(loaded_window());
        let live: Vec<RateDay> = coord.collection().rows().cloned().collect();
        assert_eq!(live, fresh);
        let skipped = live
            .iter()
            .find(|r| r.rate_plan_id == 32 && r.date == d("2024-11-04"))
            .unwrap();
        assert_eq!(skipped.min_stay, 1);

        let (message, kind) = notifier.last().unwrap();
        assert_eq!(kind, NoticeKind::Error);
        assert!(message.contains("Rate plan is archived"));
    }

    #[tokio::test]
    async fn bulk_clears_pending_edit_and_lock() {
        let (coord, _, _) = session().await;
        coord.select_date(d("2024-11-01"));
        assert_eq!(
            coord.edit_cell(31, d("2024-11-01"), RatePatch::from_field(RateField::MaxStay, "4").unwrap()),
            EditOutcome::Started
        );

        coord
            .bulk_apply(
                DateWindow::single(d("2024-11-05")),
                RatePatch::from_field(RateField::ExtraAdultCharge, "30").unwrap(),
            )
            .await
            .unwrap();

        assert!(!coord.has_changes());
        assert_eq!(coord.cell_state(31, d("2024-11-01")), CellState::Editable);
        // The unsaved edit was never persisted, so the refetch drops it.
        let row = coord
            .collection()
            .get(&CellKey::new(31, d("2024-11-01")))
            .cloned()
            .unwrap();
        assert_eq!(row.max_stay, 10);
    }

    #[tokio::test]
    async fn refetch_failure_falls_back_to_snapshot() {
        let (coord, backend, notifier) = session().await;
        let before = coord.collection();
        backend.fail_fetches("gateway timeout");

        let result = coord
            .bulk_apply(
                DateWindow::single(d("2024-11-02")),
                RatePatch::from_field(RateField::BaseRate, "1").unwrap(),
            )
            .await;

        assert_matches!(result, Err(GridError::Backend(_)));
        assert_eq!(coord.collection(), before);
        assert!(!coord.has_changes());
        assert_eq!(notifier.last().unwrap().1, NoticeKind::Error);
    }

    #[tokio::test]
    async fn empty_patch_and_unloaded_grid_are_rejected() {
        let (coord, backend, _) = session().await;
        let result = coord
            .bulk_apply(DateWindow::single(d("2024-11-02")), RatePatch::default())
            .await;
        assert_matches!(result, Err(GridError::Core(CoreError::Validation(_))));

        let unloaded = EditCoordinator::new(
            6,
            backend.clone() as Arc<dyn CalendarBackend<RateDay>>,
            Arc::new(RecordingNotifier::default()) as Arc<dyn Notifier>,
        );
        let result = unloaded
            .bulk_apply(
                DateWindow::single(d("2024-11-02")),
                RatePatch::from_field(RateField::MinStay, "2").unwrap(),
            )
            .await;
        assert_matches!(result, Err(GridError::Core(CoreError::Conflict(_))));
    }
}
