#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use stayline_api::config::ServerConfig;
use stayline_api::router::build_app_router;
use stayline_api::session::{BackendFactory, SessionRegistry};
use stayline_api::state::AppState;
use stayline_core::calendar::parse_date;
use stayline_core::inventory::InventoryDay;
use stayline_core::rates::RateDay;
use stayline_core::types::{CalendarDate, DbId};
use stayline_events::{NoticeBus, NoticeJournal};
use stayline_grid::memory::MemoryCalendar;
use stayline_grid::CalendarBackend;

pub const PROPERTY_ID: DbId = 900;
pub const ROOMS: [DbId; 3] = [201, 202, 203];
pub const RATE_PLANS: [DbId; 2] = [31, 32];

pub fn date(raw: &str) -> CalendarDate {
    parse_date(raw).unwrap()
}

/// Five days, 2025-01-10 ..= 2025-01-14.
pub fn fixture_days() -> impl Iterator<Item = CalendarDate> {
    let start = date("2025-01-10");
    (0..5).map(move |d| start + Duration::days(d))
}

/// Backends shared by every session, so tests can steer them.
pub struct FixtureBackends {
    pub inventory: Arc<MemoryCalendar<InventoryDay>>,
    pub rates: Arc<MemoryCalendar<RateDay>>,
}

impl FixtureBackends {
    pub fn new() -> Self {
        let inventory = fixture_days()
            .flat_map(|d| ROOMS.iter().map(move |&room| InventoryDay::new(room, d, 20, 2, 0)))
            .collect::<Vec<_>>();
        let rates = fixture_days()
            .flat_map(|d| {
                RATE_PLANS.iter().map(move |&plan| RateDay {
                    rate_plan_id: plan,
                    date: d,
                    base_rate: 100.0,
                    extra_adult_charge: 20.0,
                    min_stay: 1,
                    max_stay: 7,
                    cutoff_time: None,
                })
            })
            .collect::<Vec<_>>();
        Self {
            inventory: Arc::new(MemoryCalendar::new(inventory)),
            rates: Arc::new(MemoryCalendar::new(rates)),
        }
    }
}

impl BackendFactory for FixtureBackends {
    fn kind(&self) -> &'static str {
        "fixture"
    }

    fn inventory(&self, _property_id: DbId) -> Arc<dyn CalendarBackend<InventoryDay>> {
        self.inventory.clone()
    }

    fn rates(&self, _property_id: DbId) -> Arc<dyn CalendarBackend<RateDay>> {
        self.rates.clone()
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        calendar_api_url: None,
        calendar_api_timeout_secs: 5,
        notice_journal_capacity: 50,
    }
}

pub struct TestApp {
    pub router: Router,
    pub backends: Arc<FixtureBackends>,
    pub state: AppState,
}

/// Full application router over fixture backends, with the same middleware
/// stack production uses.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let backends = Arc::new(FixtureBackends::new());
    let notice_bus = Arc::new(NoticeBus::default());

    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: Arc::new(SessionRegistry::new(backends.clone(), notice_bus.clone())),
        notice_bus,
        journal: Arc::new(NoticeJournal::new(config.notice_journal_capacity)),
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        backends,
        state,
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn send(&self, method: Method, uri: &str, body: Value) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_empty(&self, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// The cell of `view` for one entity and day.
pub fn cell<'a>(view: &'a Value, id_field: &str, entity_id: DbId, day: &str) -> &'a Value {
    view["cells"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c[id_field] == entity_id && c["date"] == day)
        .unwrap_or_else(|| panic!("no cell {entity_id}-{day}"))
}
