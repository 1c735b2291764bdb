use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use stayline_core::error::CoreError;
use stayline_grid::{BackendError, GridError};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`GridError`] and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `stayline_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A grid session error (domain or calendar service).
    #[error(transparent)]
    Grid(#[from] GridError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) | AppError::Grid(GridError::Core(core)) => classify_core_error(core),

            AppError::Grid(GridError::Backend(backend)) => match backend {
                BackendError::Rejected(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "REJECTED",
                    backend.user_message().to_string(),
                ),
                BackendError::Unavailable(msg) => {
                    tracing::warn!(error = %msg, "Calendar service unavailable");
                    (
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_UNAVAILABLE",
                        "Calendar service is unavailable".to_string(),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
