//! Handlers for the `/products` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use marketsync_core::error::CoreError;
use marketsync_core::types::{DbId, Timestamp};
use marketsync_db::models::product::ProductRow;
use marketsync_db::repositories::ProductRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::query::ProductListParams;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

/// Public view of a stored product. Prices are in whole currency units.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub nm_id: DbId,
    pub name: String,
    pub price_rub: f64,
    pub sale_price_rub: f64,
    pub rating: f64,
    pub feedbacks: i64,
    pub updated_at: Timestamp,
}

impl From<ProductRow> for ProductResponse {
    fn from(row: ProductRow) -> Self {
        Self {
            nm_id: row.id,
            name: row.name,
            price_rub: minor_to_major(row.price),
            sale_price_rub: minor_to_major(row.sale_price),
            rating: row.rating,
            feedbacks: row.feedbacks,
            updated_at: row.updated_at,
        }
    }
}

fn minor_to_major(amount: i64) -> f64 {
    amount as f64 / 100.0
}

/// GET /api/v1/products
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> AppResult<Json<ListResponse<ProductResponse>>> {
    let query = params.into_query()?;

    let rows = ProductRepo::list(
        &state.pool,
        &query.filter,
        query.ordering,
        query.limit,
        query.offset,
    )
    .await?;
    let total = ProductRepo::count(&state.pool, &query.filter).await?;

    Ok(Json(ListResponse {
        data: rows.into_iter().map(ProductResponse::from).collect(),
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// GET /api/v1/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProductResponse>>> {
    let row = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;
    Ok(Json(DataResponse { data: row.into() }))
}
