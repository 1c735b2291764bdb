use stayline_events::journal::DEFAULT_JOURNAL_CAPACITY;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the calendar service. `None` serves seeded in-memory
    /// calendars instead.
    pub calendar_api_url: Option<String>,
    /// Per-request timeout towards the calendar service (default: `15`).
    pub calendar_api_timeout_secs: u64,
    /// Notices kept for `GET /api/v1/notices`.
    pub notice_journal_capacity: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `CALENDAR_API_URL`          | unset (in-memory)       |
    /// | `CALENDAR_API_TIMEOUT_SECS` | `15`                    |
    /// | `NOTICE_JOURNAL_CAPACITY`   | `200`                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let calendar_api_url = std::env::var("CALENDAR_API_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let calendar_api_timeout_secs: u64 = std::env::var("CALENDAR_API_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("CALENDAR_API_TIMEOUT_SECS must be a valid u64");

        let notice_journal_capacity: usize = std::env::var("NOTICE_JOURNAL_CAPACITY")
            .map(|v| v.parse().expect("NOTICE_JOURNAL_CAPACITY must be a valid usize"))
            .unwrap_or(DEFAULT_JOURNAL_CAPACITY);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            calendar_api_url,
            calendar_api_timeout_secs,
            notice_journal_capacity,
        }
    }
}
