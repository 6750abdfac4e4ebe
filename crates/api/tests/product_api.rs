//! HTTP-level tests for the product listing and detail endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, ids, seed_catalog};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_defaults_to_highest_rating_first(pool: PgPool) {
    seed_catalog(&pool).await;
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/products").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(ids(&json), vec![4, 1, 2, 3]);
    assert_eq!(json["total"], 4);
    assert_eq!(json["limit"], 20);
    assert_eq!(json["offset"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_exposes_public_fields(pool: PgPool) {
    seed_catalog(&pool).await;
    let app = common::build_test_app(pool);

    let json = body_json(get(app, "/api/v1/products?ordering=name&limit=1").await).await;
    let first = &json["data"][0];

    assert_eq!(first["nm_id"], 1);
    assert_eq!(first["name"], "Alpha");
    assert_eq!(first["price_rub"], 600.0);
    assert_eq!(first["sale_price_rub"], 500.0);
    assert_eq!(first["rating"], 4.9);
    assert_eq!(first["feedbacks"], 10);
    assert!(first["updated_at"].is_string());
    assert!(first.get("id").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_on_sale_price_range(pool: PgPool) {
    seed_catalog(&pool).await;
    let app = common::build_test_app(pool);

    let json = body_json(
        get(app, "/api/v1/products?min_price=60000&max_price=200000&ordering=price").await,
    )
    .await;

    assert_eq!(ids(&json), vec![3, 2]);
    assert_eq!(json["total"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_on_rating_and_feedbacks(pool: PgPool) {
    seed_catalog(&pool).await;

    let app = common::build_test_app(pool.clone());
    let json = body_json(get(app, "/api/v1/products?min_rating=4.0&max_rating=4.95").await).await;
    assert_eq!(ids(&json), vec![1, 2]);

    let app = common::build_test_app(pool);
    let json =
        body_json(get(app, "/api/v1/products?min_feedbacks=20&ordering=-feedbacks").await).await;
    assert_eq!(ids(&json), vec![2, 4]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_supports_every_allowed_ordering(pool: PgPool) {
    seed_catalog(&pool).await;

    let cases = [
        ("price", vec![1, 3, 2, 4]),
        ("-price", vec![4, 2, 3, 1]),
        ("rating", vec![3, 2, 1, 4]),
        ("feedbacks", vec![3, 1, 4, 2]),
        ("-name", vec![4, 3, 2, 1]),
    ];
    for (ordering, expected) in cases {
        let app = common::build_test_app(pool.clone());
        let uri = format!("/api/v1/products?ordering={ordering}");
        let json = body_json(get(app, &uri).await).await;
        assert_eq!(ids(&json), expected, "ordering={ordering}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_ordering_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/products?ordering=updated_at").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn out_of_range_filters_are_rejected(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/products?min_rating=7").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/products?min_price=10&max_price=5").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/products?min_price=cheap").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_paginates_with_total_of_all_matches(pool: PgPool) {
    seed_catalog(&pool).await;
    let app = common::build_test_app(pool);

    let json = body_json(get(app, "/api/v1/products?ordering=name&limit=2&offset=1").await).await;

    assert_eq!(ids(&json), vec![2, 3]);
    assert_eq!(json["total"], 4);
    assert_eq!(json["limit"], 2);
    assert_eq!(json["offset"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_on_empty_table_is_empty(pool: PgPool) {
    let app = common::build_test_app(pool);

    let json = body_json(get(app, "/api/v1/products").await).await;

    assert!(json["data"].as_array().unwrap().is_empty());
    assert_eq!(json["total"], 0);
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_by_id_returns_enveloped_product(pool: PgPool) {
    seed_catalog(&pool).await;
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/products/2").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["nm_id"], 2);
    assert_eq!(json["data"]["name"], "Bravo");
    assert_eq!(json["data"]["sale_price_rub"], 1500.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_missing_product_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/products/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}
