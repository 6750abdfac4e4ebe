use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    marketsync_db::health_check(&pool).await.unwrap();

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0, "products should start empty");
}

/// Every read-side filter column carries an index.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_filter_columns_are_indexed(pool: PgPool) {
    let indexes: Vec<String> = sqlx::query_scalar(
        "SELECT indexname::text FROM pg_indexes WHERE tablename = 'products'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for expected in [
        "idx_products_price",
        "idx_products_sale_price",
        "idx_products_rating",
        "idx_products_feedbacks",
    ] {
        assert!(
            indexes.iter().any(|name| name == expected),
            "missing index {expected}, found {indexes:?}"
        );
    }
}

/// Negative values are rejected by the storage layer as well.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_check_constraints_reject_negative_values(pool: PgPool) {
    let result = sqlx::query(
        "INSERT INTO products (id, name, price, sale_price, rating, feedbacks) \
         VALUES (1, 'x', -1, 0, 0, 0)",
    )
    .execute(&pool)
    .await;

    let err = result.expect_err("negative price must violate a check constraint");
    let db_err = err.as_database_error().expect("should be a database error");
    assert_eq!(db_err.constraint(), Some("ck_products_price_non_negative"));
}
