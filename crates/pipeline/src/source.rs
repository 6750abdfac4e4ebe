//! Seams between the orchestrator and its collaborators.
//!
//! Both traits are implemented by stateless types, so a single instance
//! can serve several concurrent runs.

use async_trait::async_trait;
use marketsync_core::catalog::{Product, RawItem};
use marketsync_db::models::product::UpsertOutcome;
use marketsync_db::repositories::ProductRepo;
use marketsync_db::DbPool;
use marketsync_marketplace::{FetchError, SearchApi};

/// Something that yields one page of raw search results.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(
        &self,
        query: &str,
        page: u32,
        region: i64,
    ) -> Result<Vec<RawItem>, FetchError>;
}

/// Something that persists a batch of normalized products.
#[async_trait]
pub trait ProductSink: Send + Sync {
    async fn upsert(&self, products: &[Product]) -> Result<UpsertOutcome, sqlx::Error>;
}

#[async_trait]
impl PageSource for SearchApi {
    async fn fetch_page(
        &self,
        query: &str,
        page: u32,
        region: i64,
    ) -> Result<Vec<RawItem>, FetchError> {
        SearchApi::fetch_page(self, query, page, region).await
    }
}

/// [`ProductSink`] backed by the `products` table.
#[derive(Clone)]
pub struct PgProductSink {
    pool: DbPool,
}

impl PgProductSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductSink for PgProductSink {
    async fn upsert(&self, products: &[Product]) -> Result<UpsertOutcome, sqlx::Error> {
        ProductRepo::upsert_batch(&self.pool, products).await
    }
}
