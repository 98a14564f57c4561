pub mod health;
pub mod validation;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /validation/rules                                list registered rules
/// /validation/validate                             dry-run a schema (POST)
/// /validation/check                                run a single rule (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/validation", validation::router())
}
