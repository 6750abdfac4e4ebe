//! Client for the marketplace product search endpoint.
//!
//! [`api::SearchApi`] fetches one page of search results, retrying
//! transient failures according to a [`retry::RetryPolicy`].

pub mod api;
pub mod retry;

pub use api::{FetchConfig, FetchError, SearchApi};
pub use retry::RetryPolicy;
