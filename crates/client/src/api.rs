//! REST client for the calendar service.
//!
//! Wraps the calendar HTTP API (window fetch, single-cell update, range
//! update) using [`reqwest`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stayline_core::calendar::{DateWindow, DATE_FORMAT};
use stayline_core::types::{CalendarDate, DbId};
use stayline_grid::BackendError;

use crate::grids::RemoteGrid;

/// HTTP client for one calendar service deployment.
pub struct CalendarApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the calendar REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Calendar API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl From<ClientError> for BackendError {
    /// 4xx answers are refusals worth showing to the user; everything else
    /// means the service is not usable right now.
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ApiError { status, body } if (400..500).contains(&status) => {
                BackendError::Rejected(error_message(&body).unwrap_or_default())
            }
            other => BackendError::Unavailable(other.to_string()),
        }
    }
}

/// `{ "data": T }` envelope used by every read endpoint.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Body of a range update.
#[derive(Debug, Serialize)]
struct RangeUpdate<'a, P: Serialize> {
    from: String,
    to: String,
    fields: &'a P,
}

impl CalendarApi {
    /// Create a client for a calendar service.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://calendar.internal:8080/v1`.
    /// * `timeout` - Per-request timeout.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch every row of a property's grid inside `window`.
    ///
    /// Sends `GET /properties/{id}/{grid}?from=..&to=..`.
    pub async fn fetch_rows<R: RemoteGrid>(
        &self,
        parent_id: DbId,
        window: DateWindow,
    ) -> Result<Vec<R>, ClientError> {
        let response = self
            .client
            .get(self.url(&R::collection_path(parent_id)))
            .query(&[
                ("from", window.from().format(DATE_FORMAT).to_string()),
                ("to", window.to().format(DATE_FORMAT).to_string()),
            ])
            .send()
            .await?;

        let envelope: DataEnvelope<Vec<R>> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }

    /// Update one cell.
    ///
    /// Sends `PUT /{entities}/{id}/{grid}/{date}` with the sparse field patch.
    pub async fn put_cell<R: RemoteGrid>(
        &self,
        entity_id: DbId,
        date: CalendarDate,
        fields: &R::Patch,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .put(self.url(&R::cell_path(entity_id, date)))
            .json(fields)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Update every day of `window` for one entity.
    ///
    /// Sends `PUT /{entities}/{id}/{grid}` with `{ from, to, fields }`.
    pub async fn put_range<R: RemoteGrid>(
        &self,
        entity_id: DbId,
        window: DateWindow,
        fields: &R::Patch,
    ) -> Result<(), ClientError> {
        let body = RangeUpdate {
            from: window.from().format(DATE_FORMAT).to_string(),
            to: window.to().format(DATE_FORMAT).to_string(),
            fields,
        };
        let response = self
            .client
            .put(self.url(&R::range_path(entity_id)))
            .json(&body)
            .send()
            .await?;

        Self::check_status(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ClientError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error body
/// (`{"message": ".."}` or `{"error": ".."}`).
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|field| value.get(*field).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}
