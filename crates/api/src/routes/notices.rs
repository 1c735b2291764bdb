use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use stayline_events::GridNotice;

use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub limit: Option<usize>,
}

/// GET /notices -- most recent notices, newest first.
async fn list_notices(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Json<DataResponse<Vec<GridNotice>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Json(DataResponse {
        data: state.journal.recent(limit).await,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/notices", get(list_notices))
}
