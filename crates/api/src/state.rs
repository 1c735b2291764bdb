use std::sync::Arc;

use stayline_events::{NoticeBus, NoticeJournal};

use crate::config::ServerConfig;
use crate::session::SessionRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Grid sessions per property.
    pub sessions: Arc<SessionRegistry>,
    /// Bus every session publishes its notices on.
    pub notice_bus: Arc<NoticeBus>,
    /// Recent notices, fed from the bus by a background task.
    pub journal: Arc<NoticeJournal>,
}
