//! Raw marketplace items and their normalization into [`Product`].
//!
//! The search feed is loose: any field except the identifier may be
//! missing, zero or negative. [`normalize`] turns one raw item into a
//! complete canonical record with safe defaults, so downstream code never
//! deals with partial products.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Maximum stored length of a product name, in characters.
pub const MAX_NAME_LEN: usize = 512;

/// Upper bound of the marketplace rating scale.
pub const MAX_RATING: f64 = 5.0;

// ---------------------------------------------------------------------------
// Raw item
// ---------------------------------------------------------------------------

/// One item as returned by the marketplace search endpoint.
///
/// Field names follow the remote JSON. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawItem {
    pub id: Option<DbId>,
    pub name: Option<String>,
    /// Full price in minor currency units.
    #[serde(rename = "priceU")]
    pub price_u: Option<i64>,
    /// Discounted price in minor currency units.
    #[serde(rename = "salePriceU")]
    pub sale_price_u: Option<i64>,
    pub rating: Option<f64>,
    pub feedbacks: Option<i64>,
}

// ---------------------------------------------------------------------------
// Canonical product
// ---------------------------------------------------------------------------

/// A normalized product, ready to be upserted.
///
/// Every field is populated and every numeric field is non-negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: DbId,
    pub name: String,
    pub price: i64,
    pub sale_price: i64,
    pub rating: f64,
    pub feedbacks: i64,
}

/// Result of normalizing a whole page of raw items.
#[derive(Debug, Default)]
pub struct NormalizedPage {
    /// Products in first-seen order, one per distinct id.
    pub products: Vec<Product>,
    /// Items dropped because they carried no identifier.
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Map one raw item into a [`Product`].
///
/// Returns `None` when the item has no identifier; such items cannot be
/// keyed for upsert and are dropped by the caller.
pub fn normalize(raw: RawItem) -> Option<Product> {
    let id = raw.id?;

    let price = positive(raw.price_u).unwrap_or(0);
    // A zero or negative sale price means "no discount", same as absent.
    let sale_price = positive(raw.sale_price_u).unwrap_or(price);

    Some(Product {
        id,
        name: clean_name(raw.name.unwrap_or_default()),
        price,
        sale_price,
        rating: round_rating(raw.rating.unwrap_or(0.0)),
        feedbacks: raw.feedbacks.unwrap_or(0).max(0),
    })
}

/// Normalize a whole page of raw items.
///
/// Items without an id are skipped and counted. When the same id shows up
/// more than once, the last occurrence wins but keeps the position of the
/// first, so a batch never carries duplicate keys.
pub fn normalize_page(items: Vec<RawItem>) -> NormalizedPage {
    let mut products: Vec<Product> = Vec::with_capacity(items.len());
    let mut index_by_id: HashMap<DbId, usize> = HashMap::with_capacity(items.len());
    let mut skipped = 0;

    for raw in items {
        match normalize(raw) {
            Some(product) => match index_by_id.get(&product.id) {
                Some(&idx) => products[idx] = product,
                None => {
                    index_by_id.insert(product.id, products.len());
                    products.push(product);
                }
            },
            None => skipped += 1,
        }
    }

    NormalizedPage { products, skipped }
}

fn positive(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v > 0)
}

/// Drop NUL characters, which text columns reject, then truncate.
fn clean_name(name: String) -> String {
    let name = if name.contains('\0') {
        name.replace('\0', "")
    } else {
        name
    };
    truncate_name(name)
}

fn truncate_name(name: String) -> String {
    match name.char_indices().nth(MAX_NAME_LEN) {
        Some((byte_idx, _)) => name[..byte_idx].to_string(),
        None => name,
    }
}

fn round_rating(rating: f64) -> f64 {
    if !rating.is_finite() {
        return 0.0;
    }
    (rating.clamp(0.0, MAX_RATING) * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
