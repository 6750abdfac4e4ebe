//! Row types and DTOs mapped from database tables.

pub mod product;
