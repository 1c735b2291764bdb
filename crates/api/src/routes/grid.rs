//! Grid session handlers, generic over the grid kind.
//!
//! Every handler works for any [`SessionGrid`]; [`router`] mounts one copy
//! per kind under `/properties/{property_id}/{grid}`.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stayline_core::calendar::DateWindow;
use stayline_core::edit::EditRecord;
use stayline_core::row::{CellKey, FieldPatch};
use stayline_core::types::{CalendarDate, DbId};
use stayline_grid::{BulkOutcome, CellState, EditOutcome, GridView, SaveOutcome};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::session::SessionGrid;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct WindowRequest {
    pub from: CalendarDate,
    pub to: CalendarDate,
}

/// `date: null` clears the selection.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub date: Option<CalendarDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest<F> {
    pub entity_id: DbId,
    pub date: CalendarDate,
    pub field: F,
    /// Raw cell input: string, number or null.
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest<F> {
    pub from: CalendarDate,
    pub to: CalendarDate,
    pub field: F,
    #[serde(default)]
    pub value: Value,
}

/// Cell input as the text the user typed. Numbers are accepted as a
/// convenience for scripted clients.
fn raw_input(value: &Value) -> AppResult<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(AppError::BadRequest(
            "Cell value must be a string, a number or null".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectResponse {
    pub accepted: bool,
    pub active_date: Option<CalendarDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponse<P: FieldPatch> {
    /// `started`, `amended`, `no_change` or `ignored`.
    pub outcome: &'static str,
    /// State that caused an `ignored` outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_state: Option<CellState>,
    /// The pending edit after the call.
    pub edit: Option<EditRecord<P>>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// `nothing_to_save`, `already_saving`, `saved`, `reverted` or `superseded`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<CellKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<SaveOutcome> for SaveResponse {
    fn from(outcome: SaveOutcome) -> Self {
        let (status, key, message) = match outcome {
            SaveOutcome::NothingToSave => ("nothing_to_save", None, None),
            SaveOutcome::AlreadySaving(key) => ("already_saving", Some(key), None),
            SaveOutcome::Saved(key) => ("saved", Some(key), None),
            SaveOutcome::Reverted { key, message } => ("reverted", Some(key), Some(message)),
            SaveOutcome::Superseded(key) => ("superseded", Some(key), None),
        };
        Self {
            status,
            key,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /properties/{property_id}/{grid}/load
async fn load<R: SessionGrid>(
    State(state): State<AppState>,
    Path(property_id): Path<DbId>,
    Json(body): Json<WindowRequest>,
) -> AppResult<Json<DataResponse<GridView<R>>>> {
    let window = DateWindow::new(body.from, body.to)?;
    let session = state.sessions.open(property_id).await;
    let coordinator = R::coordinator(&session);

    coordinator.load(window).await?;

    Ok(Json(DataResponse {
        data: coordinator.view(),
    }))
}

/// GET /properties/{property_id}/{grid}
async fn view<R: SessionGrid>(
    State(state): State<AppState>,
    Path(property_id): Path<DbId>,
) -> AppResult<Json<DataResponse<GridView<R>>>> {
    let session = state.sessions.loaded::<R>(property_id).await?;
    Ok(Json(DataResponse {
        data: R::coordinator(&session).view(),
    }))
}

/// PUT /properties/{property_id}/{grid}/select
async fn select<R: SessionGrid>(
    State(state): State<AppState>,
    Path(property_id): Path<DbId>,
    Json(body): Json<SelectRequest>,
) -> AppResult<Json<DataResponse<SelectResponse>>> {
    let session = state.sessions.loaded::<R>(property_id).await?;
    let coordinator = R::coordinator(&session);

    let accepted = match body.date {
        Some(date) => coordinator.select_date(date),
        None => coordinator.clear_date_selection(),
    };

    Ok(Json(DataResponse {
        data: SelectResponse {
            accepted,
            active_date: coordinator.active_date(),
        },
    }))
}

/// PUT /properties/{property_id}/{grid}/edit
async fn edit<R: SessionGrid>(
    State(state): State<AppState>,
    Path(property_id): Path<DbId>,
    Json(body): Json<EditRequest<R::Field>>,
) -> AppResult<Json<DataResponse<EditResponse<R::Patch>>>> {
    let session = state.sessions.loaded::<R>(property_id).await?;
    let coordinator = R::coordinator(&session);

    let fields = R::patch_from_input(body.field, &raw_input(&body.value)?)?;
    let (outcome, cell_state) = match coordinator.edit_cell(body.entity_id, body.date, fields) {
        EditOutcome::Started => ("started", None),
        EditOutcome::Amended => ("amended", None),
        EditOutcome::NoChange => ("no_change", None),
        EditOutcome::Ignored(cell_state) => ("ignored", Some(cell_state)),
    };

    Ok(Json(DataResponse {
        data: EditResponse {
            outcome,
            cell_state,
            edit: coordinator.pending_edit(),
        },
    }))
}

/// POST /properties/{property_id}/{grid}/save
///
/// A rejected save is a normal outcome (`reverted`), not an HTTP error; the
/// notice carries the message to the user.
async fn save<R: SessionGrid>(
    State(state): State<AppState>,
    Path(property_id): Path<DbId>,
) -> AppResult<Json<DataResponse<SaveResponse>>> {
    let session = state.sessions.loaded::<R>(property_id).await?;
    let outcome = R::coordinator(&session).save().await;
    Ok(Json(DataResponse {
        data: outcome.into(),
    }))
}

/// POST /properties/{property_id}/{grid}/cancel
async fn cancel<R: SessionGrid>(
    State(state): State<AppState>,
    Path(property_id): Path<DbId>,
) -> AppResult<Json<DataResponse<GridView<R>>>> {
    let session = state.sessions.loaded::<R>(property_id).await?;
    let coordinator = R::coordinator(&session);
    coordinator.cancel();
    Ok(Json(DataResponse {
        data: coordinator.view(),
    }))
}

/// POST /properties/{property_id}/{grid}/bulk
async fn bulk<R: SessionGrid>(
    State(state): State<AppState>,
    Path(property_id): Path<DbId>,
    Json(body): Json<BulkRequest<R::Field>>,
) -> AppResult<Json<DataResponse<BulkOutcome>>> {
    let session = state.sessions.loaded::<R>(property_id).await?;
    let range = DateWindow::new(body.from, body.to)?;
    let fields = R::patch_from_input(body.field, &raw_input(&body.value)?)?;

    let outcome = R::coordinator(&session).bulk_apply(range, fields).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// Routes for one grid kind.
pub fn router<R: SessionGrid>() -> Router<AppState> {
    let base = format!("/properties/{{property_id}}/{}", R::GRID);
    Router::new()
        .route(&base, get(view::<R>))
        .route(&format!("{base}/load"), post(load::<R>))
        .route(&format!("{base}/select"), put(select::<R>))
        .route(&format!("{base}/edit"), put(edit::<R>))
        .route(&format!("{base}/save"), post(save::<R>))
        .route(&format!("{base}/cancel"), post(cancel::<R>))
        .route(&format!("{base}/bulk"), post(bulk::<R>))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_input_accepts_strings_numbers_and_null() {
        assert_eq!(raw_input(&json!("12")).unwrap(), "12");
        assert_eq!(raw_input(&json!(149.5)).unwrap(), "149.5");
        assert_eq!(raw_input(&Value::Null).unwrap(), "");
        assert!(matches!(raw_input(&json!([1])), Err(AppError::BadRequest(_))));
    }
}
