//! Route definitions for the `/validation` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::validation;
use crate::state::AppState;

/// Routes mounted at `/validation`.
///
/// ```text
/// GET    /rules      -> list_rules
/// POST   /validate   -> validate     (dry-run)
/// POST   /check      -> check_rule
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rules", get(validation::list_rules))
        .route("/validate", post(validation::validate))
        .route("/check", post(validation::check_rule))
}
