pub mod grid;
pub mod health;
pub mod notices;

use axum::Router;
use stayline_core::inventory::InventoryDay;
use stayline_core::rates::RateDay;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy (`{grid}` is `inventory` or `rates`):
///
/// ```text
/// /notices                                   recent notices (GET)
///
/// /properties/{property_id}/{grid}           grid view (GET)
/// /properties/{property_id}/{grid}/load      load a date window (POST)
/// /properties/{property_id}/{grid}/select    choose the editable column (PUT)
/// /properties/{property_id}/{grid}/edit      edit one cell (PUT)
/// /properties/{property_id}/{grid}/save      persist the pending edit (POST)
/// /properties/{property_id}/{grid}/cancel    discard local changes (POST)
/// /properties/{property_id}/{grid}/bulk      apply one value across a range (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(notices::router())
        .merge(grid::router::<InventoryDay>())
        .merge(grid::router::<RateDay>())
}
