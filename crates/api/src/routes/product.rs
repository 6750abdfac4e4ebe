//! Route definitions for the `/products` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::product;
use crate::state::AppState;

/// Routes mounted at `/products`.
///
/// ```text
/// GET /        -> list
/// GET /{id}    -> get_by_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(product::list))
        .route("/{id}", get(product::get_by_id))
}
