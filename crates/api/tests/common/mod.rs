#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use marketsync_core::catalog::Product;
use marketsync_db::repositories::ProductRepo;
use sqlx::PgPool;
use tower::ServiceExt;

use marketsync_api::config::ServerConfig;
use marketsync_api::router::build_app_router;
use marketsync_api::state::AppState;

/// Build a test `ServerConfig` with a localhost CORS origin and a 30-second timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Build the full application router over `pool`, with the same middleware
/// stack the binary uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Send a GET request to `uri`.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn product(id: i64, name: &str, sale_price: i64, rating: f64, feedbacks: i64) -> Product {
    Product {
        id,
        name: name.to_string(),
        price: sale_price + 10_000,
        sale_price,
        rating,
        feedbacks,
    }
}

/// Insert a small fixed catalog:
///
/// | id | name   | sale_price | rating | feedbacks |
/// |----|--------|------------|--------|-----------|
/// | 1  | Alpha  | 50 000     | 4.90   | 10        |
/// | 2  | Bravo  | 150 000    | 4.10   | 300       |
/// | 3  | Cobalt | 90 000     | 3.20   | 0         |
/// | 4  | Delta  | 250 000    | 5.00   | 45        |
pub async fn seed_catalog(pool: &PgPool) {
    let products = vec![
        product(1, "Alpha", 50_000, 4.9, 10),
        product(2, "Bravo", 150_000, 4.1, 300),
        product(3, "Cobalt", 90_000, 3.2, 0),
        product(4, "Delta", 250_000, 5.0, 45),
    ];
    ProductRepo::upsert_batch(pool, &products).await.unwrap();
}

/// `nm_id` values of the `data` array, in response order.
pub fn ids(json: &serde_json::Value) -> Vec<i64> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["nm_id"].as_i64().unwrap())
        .collect()
}
