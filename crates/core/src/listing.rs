//! Filter, ordering and pagination rules for the product listing.
//!
//! Only the fields named here can be filtered or sorted on. Callers pass
//! user input through [`ProductOrdering::parse`] and
//! [`ProductFilter::check`]; the repository layer turns the validated
//! values into SQL without ever interpolating user text.

use serde::Deserialize;
use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of products per page.
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Maximum number of products per page.
pub const MAX_LIST_LIMIT: i64 = 100;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Range filters over the stored product fields.
///
/// Price bounds apply to the sale price, in minor currency units.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductFilter {
    #[validate(range(min = 0))]
    pub min_price: Option<i64>,
    #[validate(range(min = 0))]
    pub max_price: Option<i64>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub min_rating: Option<f64>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub max_rating: Option<f64>,
    #[validate(range(min = 0))]
    pub min_feedbacks: Option<i64>,
}

impl ProductFilter {
    /// Validate field ranges and that every lower bound sits below its upper bound.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(CoreError::Validation(format!(
                    "min_price ({min}) must not exceed max_price ({max})"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_rating, self.max_rating) {
            if min > max {
                return Err(CoreError::Validation(format!(
                    "min_rating ({min}) must not exceed max_rating ({max})"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Fields the listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    Rating,
    Feedbacks,
    Name,
}

impl SortField {
    /// Column backing this field in the `products` table.
    pub fn column(self) -> &'static str {
        match self {
            SortField::Price => "price",
            SortField::Rating => "rating",
            SortField::Feedbacks => "feedbacks",
            SortField::Name => "name",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "price" => Some(SortField::Price),
            "rating" => Some(SortField::Rating),
            "feedbacks" => Some(SortField::Feedbacks),
            "name" => Some(SortField::Name),
            _ => None,
        }
    }
}

/// A validated sort key with direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductOrdering {
    pub field: SortField,
    pub descending: bool,
}

impl Default for ProductOrdering {
    /// Highest rated first.
    fn default() -> Self {
        Self {
            field: SortField::Rating,
            descending: true,
        }
    }
}

impl ProductOrdering {
    /// Parse an `ordering` parameter such as `price` or `-rating`.
    ///
    /// `None` or an empty string yields the default ordering. Any key
    /// outside the allow-list is a validation error.
    pub fn parse(raw: Option<&str>) -> Result<Self, CoreError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::default()),
            Some(raw) => raw,
        };

        let (descending, key) = match raw.strip_prefix('-') {
            Some(key) => (true, key),
            None => (false, raw),
        };

        let field = SortField::from_key(key).ok_or_else(|| {
            CoreError::Validation(format!(
                "Unsupported ordering '{raw}'; expected one of price, rating, feedbacks, name"
            ))
        })?;

        Ok(Self { field, descending })
    }

    /// SQL `ORDER BY` clause body. The primary key breaks ties so that
    /// pagination is stable.
    pub fn order_clause(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{} {direction}, id ASC", self.field.column())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_defaults_to_rating_descending() {
        assert_eq!(ProductOrdering::parse(None).unwrap(), ProductOrdering::default());
        assert_eq!(ProductOrdering::parse(Some("  ")).unwrap(), ProductOrdering::default());
        assert_eq!(
            ProductOrdering::default().order_clause(),
            "rating DESC, id ASC"
        );
    }

    #[test]
    fn ordering_parses_ascending_and_descending() {
        let asc = ProductOrdering::parse(Some("price")).unwrap();
        assert_eq!(asc.field, SortField::Price);
        assert!(!asc.descending);

        let desc = ProductOrdering::parse(Some("-feedbacks")).unwrap();
        assert_eq!(desc.field, SortField::Feedbacks);
        assert!(desc.descending);
        assert_eq!(desc.order_clause(), "feedbacks DESC, id ASC");
    }

    #[test]
    fn ordering_rejects_fields_outside_allow_list() {
        assert!(ProductOrdering::parse(Some("updated_at")).is_err());
        assert!(ProductOrdering::parse(Some("-sale_price; DROP TABLE products")).is_err());
        assert!(ProductOrdering::parse(Some("--name")).is_err());
    }

    #[test]
    fn filter_accepts_empty() {
        assert!(ProductFilter::default().check().is_ok());
    }

    #[test]
    fn filter_rejects_out_of_range_rating() {
        let filter = ProductFilter {
            min_rating: Some(6.0),
            ..Default::default()
        };
        assert!(filter.check().is_err());
    }

    #[test]
    fn filter_rejects_negative_price() {
        let filter = ProductFilter {
            min_price: Some(-1),
            ..Default::default()
        };
        assert!(filter.check().is_err());
    }

    #[test]
    fn filter_rejects_inverted_bounds() {
        let filter = ProductFilter {
            min_price: Some(500),
            max_price: Some(100),
            ..Default::default()
        };
        assert!(matches!(filter.check(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn clamp_limit_uses_default_when_none() {
        assert_eq!(clamp_limit(None, 20, 100), 20);
    }

    #[test]
    fn clamp_limit_respects_bounds() {
        assert_eq!(clamp_limit(Some(200), 20, 100), 100);
        assert_eq!(clamp_limit(Some(0), 20, 100), 1);
    }

    #[test]
    fn clamp_offset_floors_at_zero() {
        assert_eq!(clamp_offset(Some(-3)), 0);
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(40)), 40);
    }
}
