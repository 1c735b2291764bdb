//! In-process notice bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`NoticeBus`] is the central publish/subscribe hub for [`GridNotice`]s.
//! It is designed to be shared via `Arc<NoticeBus>` across the application.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stayline_core::notice::{NoticeKind, Notifier};
use stayline_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// GridNotice
// ---------------------------------------------------------------------------

/// A user-facing notification raised by a grid session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridNotice {
    pub message: String,
    pub kind: NoticeKind,

    /// Grid that raised the notice (`"inventory"`, `"rates"`).
    pub grid: Option<String>,

    /// Property the grid belongs to.
    pub property_id: Option<DbId>,

    pub timestamp: DateTime<Utc>,
}

impl GridNotice {
    pub fn new(message: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            message: message.into(),
            kind,
            grid: None,
            property_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the originating grid session.
    pub fn with_source(mut self, grid: impl Into<String>, property_id: DbId) -> Self {
        self.grid = Some(grid.into());
        self.property_id = Some(property_id);
        self
    }
}

// ---------------------------------------------------------------------------
// NoticeBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out notice bus.
///
/// # Usage
///
/// ```rust
/// use stayline_core::notice::NoticeKind;
/// use stayline_events::bus::{GridNotice, NoticeBus};
///
/// let bus = NoticeBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(GridNotice::new("Changes saved successfully", NoticeKind::Success));
/// ```
pub struct NoticeBus {
    sender: broadcast::Sender<GridNotice>,
}

impl NoticeBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed notices are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a notice to all current subscribers.
    ///
    /// If there are no active subscribers the notice is silently dropped.
    pub fn publish(&self, notice: GridNotice) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GridNotice> {
        self.sender.subscribe()
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier for NoticeBus {
    fn notify(&self, message: &str, kind: NoticeKind) {
        self.publish(GridNotice::new(message, kind));
    }
}

// ---------------------------------------------------------------------------
// SessionNotifier
// ---------------------------------------------------------------------------

/// Notification sink for one grid session: stamps every notice with the
/// grid name and property before publishing it on the shared bus.
pub struct SessionNotifier {
    bus: Arc<NoticeBus>,
    grid: &'static str,
    property_id: DbId,
}

impl SessionNotifier {
    pub fn new(bus: Arc<NoticeBus>, grid: &'static str, property_id: DbId) -> Self {
        Self {
            bus,
            grid,
            property_id,
        }
    }
}

impl Notifier for SessionNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        self.bus
            .publish(GridNotice::new(message, kind).with_source(self.grid, self.property_id));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = NoticeBus::default();
        let mut rx = bus.subscribe();

        bus.publish(GridNotice::new("Saved", NoticeKind::Success).with_source("rates", 42));

        let received = rx.recv().await.expect("should receive the notice");
        assert_eq!(received.message, "Saved");
        assert_eq!(received.kind, NoticeKind::Success);
        assert_eq!(received.grid.as_deref(), Some("rates"));
        assert_eq!(received.property_id, Some(42));
    }

    #[tokio::test]
    async fn session_notifier_stamps_source() {
        let bus = Arc::new(NoticeBus::default());
        let mut rx = bus.subscribe();
        let notifier = SessionNotifier::new(bus.clone(), "inventory", 7);

        notifier.notify("Failed to save changes", NoticeKind::Error);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, NoticeKind::Error);
        assert_eq!(received.grid.as_deref(), Some("inventory"));
        assert_eq!(received.property_id, Some(7));
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = NoticeBus::default();
        bus.notify("nobody listening", NoticeKind::Success);
    }

    #[test]
    fn notice_serializes_kind_lowercase() {
        let json = serde_json::to_value(GridNotice::new("x", NoticeKind::Error)).unwrap();
        assert_eq!(json["kind"], "error");
        assert!(json["grid"].is_null());
    }
}
