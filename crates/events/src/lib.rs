//! Stayline notification infrastructure.
//!
//! - [`NoticeBus`]: in-process publish/subscribe hub for [`GridNotice`]s,
//!   backed by `tokio::sync::broadcast`. A [`SessionNotifier`] scopes the bus
//!   to one grid session and is what coordinators are handed as their
//!   notification sink.
//! - [`NoticeJournal`]: background service that logs every notice and keeps
//!   a bounded history for the console.

pub mod bus;
pub mod journal;

pub use bus::{GridNotice, NoticeBus, SessionNotifier};
pub use journal::NoticeJournal;
