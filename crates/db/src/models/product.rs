//! Product row model and upsert accounting.
//!
//! Maps to the `products` table. `rating` is stored as `NUMERIC(3,2)` and
//! read back as `float8` (see `COLUMNS` in the repository).

use std::ops::AddAssign;

use marketsync_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductRow {
    pub id: DbId,
    pub name: String,
    pub price: i64,
    pub sale_price: i64,
    pub rating: f64,
    pub feedbacks: i64,
    pub updated_at: Timestamp,
}

/// How many rows an upsert created and how many it overwrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    pub created: u64,
    pub updated: u64,
}

impl UpsertOutcome {
    /// Total rows written.
    pub fn total(&self) -> u64 {
        self.created + self.updated
    }
}

impl AddAssign for UpsertOutcome {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
    }
}
