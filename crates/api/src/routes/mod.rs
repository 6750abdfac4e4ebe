pub mod health;
pub mod product;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /products   -> product::router()
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/products", product::router())
}
