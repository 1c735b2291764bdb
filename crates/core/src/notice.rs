//! User-facing notifications (toast equivalents).

use serde::{Deserialize, Serialize};

/// Fallback shown when a save fails without a usable message.
pub const GENERIC_SAVE_ERROR: &str = "Failed to save changes. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        }
    }
}

/// Fire-and-forget notification sink.
///
/// Implementations must not block; nothing is returned to the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NoticeKind);
}
