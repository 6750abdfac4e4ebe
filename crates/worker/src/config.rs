use std::time::Duration;

use anyhow::Context;
use marketsync_marketplace::api::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_SEARCH_URL};
use marketsync_marketplace::{FetchConfig, RetryPolicy};

/// Worker configuration loaded from environment variables.
///
/// | Env Var                  | Default                                   |
/// |--------------------------|-------------------------------------------|
/// | `DATABASE_URL`           | required                                  |
/// | `MARKETPLACE_SEARCH_URL` | the public search endpoint                |
/// | `FETCH_TIMEOUT_SECS`     | `20`                                      |
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub fetch: FetchConfig,
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let search_url =
            std::env::var("MARKETPLACE_SEARCH_URL").unwrap_or_else(|_| DEFAULT_SEARCH_URL.into());

        let timeout = match std::env::var("FETCH_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().with_context(|| {
                format!("FETCH_TIMEOUT_SECS must be a valid u64, got '{raw}'")
            })?),
            Err(_) => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            database_url,
            fetch: FetchConfig {
                search_url,
                timeout,
                retry: RetryPolicy::default(),
            },
        })
    }
}
