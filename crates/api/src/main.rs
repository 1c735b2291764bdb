use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stayline_api::config::ServerConfig;
use stayline_api::demo::DemoBackends;
use stayline_api::router::build_app_router;
use stayline_api::session::{BackendFactory, RemoteBackends, SessionRegistry};
use stayline_api::state::AppState;
use stayline_client::CalendarApi;
use stayline_events::{NoticeBus, NoticeJournal};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "stayline_api=debug,stayline_grid=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Calendar backends ---
    let backends: Arc<dyn BackendFactory> = match &config.calendar_api_url {
        Some(url) => {
            let api = CalendarApi::new(url.as_str(), Duration::from_secs(config.calendar_api_timeout_secs))
                .expect("Failed to build calendar API client");
            tracing::info!(%url, "Using remote calendar service");
            Arc::new(RemoteBackends::new(api))
        }
        None => {
            let today = chrono::Local::now().date_naive();
            tracing::warn!(%today, "CALENDAR_API_URL not set, serving seeded in-memory calendars");
            Arc::new(DemoBackends::new(today))
        }
    };

    // --- Notices ---
    let notice_bus = Arc::new(NoticeBus::default());
    let journal = Arc::new(NoticeJournal::new(config.notice_journal_capacity));
    let journal_cancel = CancellationToken::new();
    let journal_handle = tokio::spawn({
        let journal = Arc::clone(&journal);
        let receiver = notice_bus.subscribe();
        let cancel = journal_cancel.clone();
        async move { journal.run(receiver, cancel).await }
    });
    tracing::info!("Notice journal started");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: Arc::new(SessionRegistry::new(backends, Arc::clone(&notice_bus))),
        notice_bus,
        journal,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    journal_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), journal_handle).await;
    tracing::info!("Notice journal stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
