//! In-process collaborators.
//!
//! [`MemoryCalendar`] stands in for the remote calendar service when no
//! service URL is configured and in tests. Writes can be paused with a
//! [`WriteGate`] to hold a save in flight, and failures can be injected per
//! call kind or per entity.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use stayline_core::calendar::DateWindow;
use stayline_core::notice::{NoticeKind, Notifier};
use stayline_core::row::{CalendarRow, CellKey};
use stayline_core::types::{CalendarDate, DbId};
use tokio::sync::{Notify, Semaphore};

use crate::backend::CalendarBackend;
use crate::error::BackendError;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// WriteGate
// ---------------------------------------------------------------------------

/// Holds persistence calls until released.
pub struct WriteGate {
    entered: Notify,
    release: Semaphore,
}

impl WriteGate {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }

    /// Resolves once a write has reached the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let one held write through.
    pub fn release(&self) {
        self.release.add_permits(1);
    }

    async fn pass(&self) -> Result<(), BackendError> {
        self.entered.notify_one();
        let permit = self
            .release
            .acquire()
            .await
            .map_err(|_| BackendError::Unavailable("write gate closed".into()))?;
        permit.forget();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryCalendar
// ---------------------------------------------------------------------------

/// A persistence call as the backend received it.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteCall<P> {
    Single { key: CellKey, fields: P },
    Bulk { entity_id: DbId, window: DateWindow, fields: P },
}

pub struct MemoryCalendar<R: CalendarRow> {
    rows: Mutex<BTreeMap<CellKey, R>>,
    writes: Mutex<Vec<WriteCall<R::Patch>>>,
    gate: Mutex<Option<Arc<WriteGate>>>,
    reject_all: Mutex<Option<String>>,
    reject_entities: Mutex<HashMap<DbId, String>>,
    fetch_failure: Mutex<Option<String>>,
    fetches: AtomicUsize,
}

impl<R: CalendarRow> MemoryCalendar<R> {
    pub fn new(rows: impl IntoIterator<Item = R>) -> Self {
        Self {
            rows: Mutex::new(rows.into_iter().map(|r| (r.key(), r)).collect()),
            writes: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
            reject_all: Mutex::new(None),
            reject_entities: Mutex::new(HashMap::new()),
            fetch_failure: Mutex::new(None),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Hold every following write at a gate until released.
    pub fn pause_writes(&self) -> Arc<WriteGate> {
        let gate = Arc::new(WriteGate::new());
        *lock(&self.gate) = Some(gate.clone());
        gate
    }

    /// Stop gating new writes. Writes already held stay held until released.
    pub fn resume_writes(&self) {
        *lock(&self.gate) = None;
    }

    /// Reject every following write with `message`.
    pub fn reject_writes(&self, message: impl Into<String>) {
        *lock(&self.reject_all) = Some(message.into());
    }

    pub fn accept_writes(&self) {
        *lock(&self.reject_all) = None;
        lock(&self.reject_entities).clear();
    }

    /// Reject writes touching `entity_id` only.
    pub fn reject_entity(&self, entity_id: DbId, message: impl Into<String>) {
        lock(&self.reject_entities).insert(entity_id, message.into());
    }

    pub fn fail_fetches(&self, message: impl Into<String>) {
        *lock(&self.fetch_failure) = Some(message.into());
    }

    /// Writes received so far, in arrival order.
    pub fn writes(&self) -> Vec<WriteCall<R::Patch>> {
        lock(&self.writes).clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Server-side rows inside `window`, in grid order.
    pub fn rows_in(&self, window: DateWindow) -> Vec<R> {
        lock(&self.rows)
            .values()
            .filter(|r| window.contains(r.date()))
            .cloned()
            .collect()
    }

    async fn admit(&self, call: WriteCall<R::Patch>, entity_id: DbId) -> Result<(), BackendError> {
        lock(&self.writes).push(call);
        let gate = lock(&self.gate).clone();
        if let Some(gate) = gate {
            gate.pass().await?;
        }
        if let Some(message) = lock(&self.reject_all).clone() {
            return Err(BackendError::Rejected(message));
        }
        if let Some(message) = lock(&self.reject_entities).get(&entity_id).cloned() {
            return Err(BackendError::Rejected(message));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: CalendarRow> CalendarBackend<R> for MemoryCalendar<R> {
    async fn fetch_calendar(
        &self,
        _parent_id: DbId,
        window: DateWindow,
    ) -> Result<Vec<R>, BackendError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.fetch_failure).clone() {
            return Err(BackendError::Unavailable(message));
        }
        Ok(self.rows_in(window))
    }

    async fn persist_single(
        &self,
        entity_id: DbId,
        date: CalendarDate,
        fields: &R::Patch,
    ) -> Result<(), BackendError> {
        let key = CellKey::new(entity_id, date);
        let call = WriteCall::Single {
            key,
            fields: fields.clone(),
        };
        self.admit(call, entity_id).await?;

        match lock(&self.rows).get_mut(&key) {
            Some(row) => {
                row.apply_patch(fields);
                Ok(())
            }
            None => Err(BackendError::Rejected(format!("No {} row for {key}", R::GRID))),
        }
    }

    async fn persist_bulk(
        &self,
        entity_id: DbId,
        window: DateWindow,
        fields: &R::Patch,
    ) -> Result<(), BackendError> {
        let call = WriteCall::Bulk {
            entity_id,
            window,
            fields: fields.clone(),
        };
        self.admit(call, entity_id).await?;

        let mut rows = lock(&self.rows);
        for date in window.days() {
            if let Some(row) = rows.get_mut(&CellKey::new(entity_id, date)) {
                row.apply_patch(fields);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Notifier that keeps every notice in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(String, NoticeKind)>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<(String, NoticeKind)> {
        lock(&self.notices).clone()
    }

    pub fn last(&self) -> Option<(String, NoticeKind)> {
        lock(&self.notices).last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        lock(&self.notices).push((message.to_string(), kind));
    }
}
