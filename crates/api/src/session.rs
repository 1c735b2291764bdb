//! Grid sessions per property.
//!
//! A [`PropertySession`] owns one [`EditCoordinator`] per grid kind. Sessions
//! are created on first load and live for the lifetime of the process; the
//! [`SessionRegistry`] hands them out to handlers.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use stayline_client::CalendarApi;
use stayline_core::error::CoreError;
use stayline_core::inventory::{InventoryDay, InventoryField, InventoryPatch};
use stayline_core::rates::{RateDay, RateField, RatePatch};
use stayline_core::row::CalendarRow;
use stayline_core::types::DbId;
use stayline_events::{NoticeBus, SessionNotifier};
use stayline_grid::{CalendarBackend, EditCoordinator};
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Source of calendar backends for new sessions.
pub trait BackendFactory: Send + Sync {
    /// Short name reported by the health check.
    fn kind(&self) -> &'static str;

    fn inventory(&self, property_id: DbId) -> Arc<dyn CalendarBackend<InventoryDay>>;

    fn rates(&self, property_id: DbId) -> Arc<dyn CalendarBackend<RateDay>>;
}

/// Every session talks to the same remote calendar service.
pub struct RemoteBackends {
    api: Arc<CalendarApi>,
}

impl RemoteBackends {
    pub fn new(api: CalendarApi) -> Self {
        Self { api: Arc::new(api) }
    }
}

impl BackendFactory for RemoteBackends {
    fn kind(&self) -> &'static str {
        "remote"
    }

    fn inventory(&self, _property_id: DbId) -> Arc<dyn CalendarBackend<InventoryDay>> {
        self.api.clone()
    }

    fn rates(&self, _property_id: DbId) -> Arc<dyn CalendarBackend<RateDay>> {
        self.api.clone()
    }
}

// ---------------------------------------------------------------------------
// Grid kinds
// ---------------------------------------------------------------------------

/// A grid kind served over HTTP: how raw cell input becomes a patch, and
/// where its coordinator lives in a session.
pub trait SessionGrid: CalendarRow {
    /// Column selector sent by the client.
    type Field: DeserializeOwned + Copy + Send + 'static;

    /// Entity name used in not-found errors.
    const LABEL: &'static str;

    fn patch_from_input(field: Self::Field, raw: &str) -> Result<Self::Patch, CoreError>;

    fn coordinator(session: &PropertySession) -> &EditCoordinator<Self>;
}

impl SessionGrid for InventoryDay {
    type Field = InventoryField;

    const LABEL: &'static str = "Inventory calendar";

    fn patch_from_input(field: InventoryField, raw: &str) -> Result<InventoryPatch, CoreError> {
        InventoryPatch::from_field(field, raw)
    }

    fn coordinator(session: &PropertySession) -> &EditCoordinator<Self> {
        &session.inventory
    }
}

impl SessionGrid for RateDay {
    type Field = RateField;

    const LABEL: &'static str = "Rate calendar";

    fn patch_from_input(field: RateField, raw: &str) -> Result<RatePatch, CoreError> {
        RatePatch::from_field(field, raw)
    }

    fn coordinator(session: &PropertySession) -> &EditCoordinator<Self> {
        &session.rates
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub struct PropertySession {
    pub inventory: EditCoordinator<InventoryDay>,
    pub rates: EditCoordinator<RateDay>,
}

impl PropertySession {
    fn new(property_id: DbId, backends: &dyn BackendFactory, bus: &Arc<NoticeBus>) -> Self {
        Self {
            inventory: EditCoordinator::new(
                property_id,
                backends.inventory(property_id),
                Arc::new(SessionNotifier::new(bus.clone(), InventoryDay::GRID, property_id)),
            ),
            rates: EditCoordinator::new(
                property_id,
                backends.rates(property_id),
                Arc::new(SessionNotifier::new(bus.clone(), RateDay::GRID, property_id)),
            ),
        }
    }
}

pub struct SessionRegistry {
    backends: Arc<dyn BackendFactory>,
    bus: Arc<NoticeBus>,
    sessions: RwLock<HashMap<DbId, Arc<PropertySession>>>,
}

impl SessionRegistry {
    pub fn new(backends: Arc<dyn BackendFactory>, bus: Arc<NoticeBus>) -> Self {
        Self {
            backends,
            bus,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backends.kind()
    }

    /// Session for `property_id`, created on first use.
    pub async fn open(&self, property_id: DbId) -> Arc<PropertySession> {
        if let Some(session) = self.sessions.read().await.get(&property_id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(property_id)
            .or_insert_with(|| {
                tracing::info!(property_id, backend = self.backends.kind(), "Opening grid session");
                Arc::new(PropertySession::new(property_id, self.backends.as_ref(), &self.bus))
            })
            .clone()
    }

    /// Session for `property_id` whose `R` grid has been loaded.
    pub async fn loaded<R: SessionGrid>(
        &self,
        property_id: DbId,
    ) -> Result<Arc<PropertySession>, CoreError> {
        let session = self.sessions.read().await.get(&property_id).cloned();
        match session {
            Some(session) if R::coordinator(&session).is_loaded() => Ok(session),
            _ => Err(CoreError::NotFound {
                entity: R::LABEL,
                id: property_id,
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
