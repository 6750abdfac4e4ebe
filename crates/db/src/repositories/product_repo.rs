//! Repository for the `products` table.
//!
//! Writes go through [`ProductRepo::upsert_batch`], which splits a batch
//! into creates and updates against the current table state and applies
//! both inside one transaction per chunk. Reads back the listing filters
//! and orderings defined in [`marketsync_core::listing`].

use std::collections::HashSet;

use marketsync_core::catalog::Product;
use marketsync_core::listing::{ProductFilter, ProductOrdering};
use marketsync_core::types::DbId;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::models::product::{ProductRow, UpsertOutcome};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, name, price, sale_price, rating::float8 AS rating, feedbacks, updated_at";

/// Maximum rows written per transaction.
///
/// Each chunk is its own atomic unit: when a batch spans several chunks
/// and chunk `k` fails, chunks before `k` stay committed. Callers that
/// need the whole batch to be atomic must keep it within this size.
pub const UPSERT_CHUNK_SIZE: usize = 500;

/// Column-oriented view of a product slice, bound as `UNNEST` arrays.
struct ProductColumns {
    ids: Vec<DbId>,
    names: Vec<String>,
    prices: Vec<i64>,
    sale_prices: Vec<i64>,
    ratings: Vec<f64>,
    feedbacks: Vec<i64>,
}

impl ProductColumns {
    fn from_products(products: &[&Product]) -> Self {
        Self {
            ids: products.iter().map(|p| p.id).collect(),
            names: products.iter().map(|p| p.name.clone()).collect(),
            prices: products.iter().map(|p| p.price).collect(),
            sale_prices: products.iter().map(|p| p.sale_price).collect(),
            ratings: products.iter().map(|p| p.rating).collect(),
            feedbacks: products.iter().map(|p| p.feedbacks).collect(),
        }
    }
}

/// Provides upsert and read operations for products.
pub struct ProductRepo;

impl ProductRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Create-or-update a batch of normalized products.
    ///
    /// Empty input is a no-op. Batches larger than [`UPSERT_CHUNK_SIZE`]
    /// are written chunk by chunk, each chunk in its own transaction.
    /// Ids must be distinct within a batch; `normalize_page` guarantees it.
    pub async fn upsert_batch(
        pool: &PgPool,
        products: &[Product],
    ) -> Result<UpsertOutcome, sqlx::Error> {
        let mut outcome = UpsertOutcome::default();

        for chunk in products.chunks(UPSERT_CHUNK_SIZE) {
            outcome += Self::upsert_chunk(pool, chunk).await?;
        }

        Ok(outcome)
    }

    /// Upsert one chunk atomically.
    ///
    /// Existing rows are locked before the split, so two runs touching the
    /// same ids serialize on those rows. Ids created by a concurrent run
    /// after the lookup are caught by `ON CONFLICT` and counted as updates.
    /// Inserts and updates are applied in ascending id order.
    async fn upsert_chunk(pool: &PgPool, chunk: &[Product]) -> Result<UpsertOutcome, sqlx::Error> {
        if chunk.is_empty() {
            return Ok(UpsertOutcome::default());
        }

        let ids: Vec<DbId> = chunk.iter().map(|p| p.id).collect();

        let mut tx = pool.begin().await?;

        let existing: HashSet<DbId> = Self::lock_existing_ids(&mut tx, &ids)
            .await?
            .into_iter()
            .collect();

        let (mut to_update, mut to_create): (Vec<&Product>, Vec<&Product>) =
            chunk.iter().partition(|p| existing.contains(&p.id));
        // Every write takes row locks in id order, so concurrent chunks
        // over overlapping ids queue instead of deadlocking.
        to_create.sort_unstable_by_key(|p| p.id);
        to_update.sort_unstable_by_key(|p| p.id);

        let mut outcome = Self::insert_many(&mut tx, &to_create).await?;
        outcome.updated += Self::update_many(&mut tx, &to_update).await?;

        tx.commit().await?;

        tracing::debug!(
            rows = chunk.len(),
            created = outcome.created,
            updated = outcome.updated,
            "Product chunk upserted",
        );
        Ok(outcome)
    }

    /// Select ids already present, locking their rows for the transaction.
    async fn lock_existing_ids(
        tx: &mut Transaction<'_, Postgres>,
        ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(&mut **tx)
        .await
    }

    /// Bulk-insert new products.
    async fn insert_many(
        tx: &mut Transaction<'_, Postgres>,
        products: &[&Product],
    ) -> Result<UpsertOutcome, sqlx::Error> {
        if products.is_empty() {
            return Ok(UpsertOutcome::default());
        }

        let cols = ProductColumns::from_products(products);
        // `xmax = 0` only holds for freshly inserted tuples.
        let inserted = sqlx::query_scalar::<_, bool>(
            "INSERT INTO products \
                (id, name, price, sale_price, rating, feedbacks, updated_at) \
             SELECT t.id, t.name, t.price, t.sale_price, t.rating::numeric(3, 2), \
                    t.feedbacks, NOW() \
             FROM UNNEST($1::bigint[], $2::text[], $3::bigint[], $4::bigint[], \
                         $5::float8[], $6::bigint[]) \
                  AS t(id, name, price, sale_price, rating, feedbacks) \
             ON CONFLICT (id) DO UPDATE SET \
                name = EXCLUDED.name, \
                price = EXCLUDED.price, \
                sale_price = EXCLUDED.sale_price, \
                rating = EXCLUDED.rating, \
                feedbacks = EXCLUDED.feedbacks, \
                updated_at = NOW() \
             RETURNING (xmax = 0)",
        )
        .bind(&cols.ids)
        .bind(&cols.names)
        .bind(&cols.prices)
        .bind(&cols.sale_prices)
        .bind(&cols.ratings)
        .bind(&cols.feedbacks)
        .fetch_all(&mut **tx)
        .await?;

        let created = inserted.iter().filter(|&&fresh| fresh).count() as u64;
        Ok(UpsertOutcome {
            created,
            updated: inserted.len() as u64 - created,
        })
    }

    /// Overwrite the mutable fields of existing products and refresh `updated_at`.
    async fn update_many(
        tx: &mut Transaction<'_, Postgres>,
        products: &[&Product],
    ) -> Result<u64, sqlx::Error> {
        if products.is_empty() {
            return Ok(0);
        }

        let cols = ProductColumns::from_products(products);
        let result = sqlx::query(
            "UPDATE products AS p SET \
                name = t.name, \
                price = t.price, \
                sale_price = t.sale_price, \
                rating = t.rating::numeric(3, 2), \
                feedbacks = t.feedbacks, \
                updated_at = NOW() \
             FROM UNNEST($1::bigint[], $2::text[], $3::bigint[], $4::bigint[], \
                         $5::float8[], $6::bigint[]) \
                  AS t(id, name, price, sale_price, rating, feedbacks) \
             WHERE p.id = t.id",
        )
        .bind(&cols.ids)
        .bind(&cols.names)
        .bind(&cols.prices)
        .bind(&cols.sale_prices)
        .bind(&cols.ratings)
        .bind(&cols.feedbacks)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Return which of the given ids are already stored.
    pub async fn find_existing_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        sqlx::query_scalar::<_, DbId>("SELECT id FROM products WHERE id = ANY($1) ORDER BY id")
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Find a single product by its marketplace id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProductRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List products matching `filter`, sorted by `ordering`.
    pub async fn list(
        pool: &PgPool,
        filter: &ProductFilter,
        ordering: ProductOrdering,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductRow>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM products"));
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY ")
            .push(ordering.order_clause())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        builder.build_query_as::<ProductRow>().fetch_all(pool).await
    }

    /// Count products matching `filter`.
    pub async fn count(pool: &PgPool, filter: &ProductFilter) -> Result<i64, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_filter(&mut builder, filter);
        builder.build_query_scalar::<i64>().fetch_one(pool).await
    }
}

/// Append a `WHERE` clause for every bound present in `filter`.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    let mut prefix = " WHERE ";

    if let Some(min) = filter.min_price {
        builder.push(prefix).push("sale_price >= ").push_bind(min);
        prefix = " AND ";
    }
    if let Some(max) = filter.max_price {
        builder.push(prefix).push("sale_price <= ").push_bind(max);
        prefix = " AND ";
    }
    if let Some(min) = filter.min_rating {
        builder.push(prefix).push("rating >= ").push_bind(min).push("::numeric");
        prefix = " AND ";
    }
    if let Some(max) = filter.max_rating {
        builder.push(prefix).push("rating <= ").push_bind(max).push("::numeric");
        prefix = " AND ";
    }
    if let Some(min) = filter.min_feedbacks {
        builder.push(prefix).push("feedbacks >= ").push_bind(min);
    }
}
