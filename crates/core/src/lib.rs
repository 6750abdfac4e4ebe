//! Domain types and pure logic shared by every marketsync crate.
//!
//! This crate has no I/O and no internal dependencies so the fetcher,
//! the repository layer and the read API can all build on it.

pub mod catalog;
pub mod error;
pub mod listing;
pub mod types;
