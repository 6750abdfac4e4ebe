//! Query parameter types for the product listing.

use marketsync_core::listing::{
    clamp_limit, clamp_offset, ProductFilter, ProductOrdering, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};
use serde::Deserialize;

use crate::error::AppResult;

/// `GET /api/v1/products` query string.
///
/// Fields are listed explicitly rather than flattened so numeric values
/// decode from the urlencoded form.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_feedbacks: Option<i64>,
    pub ordering: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Validated listing request ready for the repository.
#[derive(Debug)]
pub struct ProductListQuery {
    pub filter: ProductFilter,
    pub ordering: ProductOrdering,
    pub limit: i64,
    pub offset: i64,
}

impl ProductListParams {
    /// Check filters and ordering against the allow-list and clamp pagination.
    pub fn into_query(self) -> AppResult<ProductListQuery> {
        let filter = ProductFilter {
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            max_rating: self.max_rating,
            min_feedbacks: self.min_feedbacks,
        };
        filter.check()?;

        let ordering = ProductOrdering::parse(self.ordering.as_deref())?;

        Ok(ProductListQuery {
            filter,
            ordering,
            limit: clamp_limit(self.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT),
            offset: clamp_offset(self.offset),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use marketsync_core::error::CoreError;
    use marketsync_core::listing::SortField;

    use super::*;
    use crate::error::AppError;

    #[test]
    fn empty_params_use_defaults() {
        let query = ProductListParams::default().into_query().unwrap();
        assert_eq!(query.ordering, ProductOrdering::default());
        assert_eq!(query.limit, DEFAULT_LIST_LIMIT);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn pagination_is_clamped() {
        let params = ProductListParams {
            limit: Some(10_000),
            offset: Some(-5),
            ..Default::default()
        };
        let query = params.into_query().unwrap();
        assert_eq!(query.limit, MAX_LIST_LIMIT);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn ordering_outside_allow_list_is_rejected() {
        let params = ProductListParams {
            ordering: Some("-updated_at".into()),
            ..Default::default()
        };
        assert_matches!(
            params.into_query(),
            Err(AppError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn inverted_price_range_is_rejected() {
        let params = ProductListParams {
            min_price: Some(500),
            max_price: Some(100),
            ordering: Some("price".into()),
            ..Default::default()
        };
        assert_matches!(
            params.into_query(),
            Err(AppError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn ascending_ordering_is_parsed() {
        let params = ProductListParams {
            ordering: Some("name".into()),
            ..Default::default()
        };
        let query = params.into_query().unwrap();
        assert_eq!(query.ordering.field, SortField::Name);
        assert!(!query.ordering.descending);
    }
}
