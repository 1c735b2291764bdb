//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope, the same shape the
//! calendar service itself answers with.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
