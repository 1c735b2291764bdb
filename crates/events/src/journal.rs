//! Notice journal service.
//!
//! [`NoticeJournal`] subscribes to the [`NoticeBus`](crate::bus::NoticeBus),
//! writes every notice to the log, and keeps the most recent ones in memory
//! so the console can show a notification history. It runs as a long-lived
//! background task and stops when cancelled or when the bus is dropped.

use std::collections::VecDeque;

use stayline_core::notice::NoticeKind;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use crate::bus::GridNotice;

/// Default number of notices retained.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 200;

pub struct NoticeJournal {
    capacity: usize,
    entries: RwLock<VecDeque<GridNotice>>,
}

impl NoticeJournal {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(VecDeque::new()),
        }
    }

    /// Run the journal loop until `cancel` fires or the bus closes.
    pub async fn run(
        &self,
        mut receiver: broadcast::Receiver<GridNotice>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notice journal cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(notice) => self.record(notice).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Notice journal lagged, some notices were not recorded");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Notice bus closed, journal shutting down");
                        break;
                    }
                },
            }
        }
    }

    /// Log and retain one notice, evicting the oldest past capacity.
    pub async fn record(&self, notice: GridNotice) {
        match notice.kind {
            NoticeKind::Success => tracing::info!(
                grid = notice.grid.as_deref(),
                property_id = notice.property_id,
                message = %notice.message,
                "Notice"
            ),
            NoticeKind::Error => tracing::warn!(
                grid = notice.grid.as_deref(),
                property_id = notice.property_id,
                message = %notice.message,
                "Error notice"
            ),
        }

        let mut entries = self.entries.write().await;
        entries.push_back(notice);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Up to `limit` notices, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<GridNotice> {
        self.entries
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }
}

impl Default for NoticeJournal {
    fn default() -> Self {
        Self::new(DEFAULT_JOURNAL_CAPACITY)
    }
}
