//! HTTP client for the marketplace search endpoint.
//!
//! Wraps a single `GET` against the search URL using [`reqwest`]. Each
//! call to [`SearchApi::fetch_page`] returns the raw items of one result
//! page, retrying transient failures (non-success status, transport
//! errors) with capped exponential backoff. A body that does not parse as
//! the expected shape fails immediately.

use std::time::Duration;

use marketsync_core::catalog::RawItem;
use serde::Deserialize;

use crate::retry::RetryPolicy;

/// Default search endpoint.
pub const DEFAULT_SEARCH_URL: &str = "https://search.wb.ru/exactmatch/ru/common/v4/search";

/// Results per page; the largest page the endpoint serves.
pub const PAGE_SIZE: u32 = 100;

/// Bound on a single request, connect to last body byte.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Browser user agent; the endpoint throttles obvious bots.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the search client.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status code.
    #[error("Marketplace returned HTTP {status}")]
    Status { status: u16 },

    /// The body could not be parsed as a search response.
    #[error("Malformed search response: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Every attempt failed with a transient error.
    #[error("Search request failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        /// Error of the final attempt.
        last: Box<FetchError>,
    },

    /// Pages are numbered from 1.
    #[error("Page number must be at least 1, got {0}")]
    InvalidPage(u32),
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Status { .. })
    }
}

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

/// Top-level search response. Items live under `data.products`.
#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<SearchData>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchData {
    #[serde(default)]
    products: Option<Vec<RawItem>>,
}

impl SearchResponse {
    fn into_items(self) -> Vec<RawItem> {
        self.data.and_then(|d| d.products).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Settings for [`SearchApi`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Full search URL.
    pub search_url: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// Backoff policy for transient failures.
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Stateless search client. Cheap to share across tasks.
pub struct SearchApi {
    client: reqwest::Client,
    config: FetchConfig,
}

impl SearchApi {
    /// Build a client with its own connection pool.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    ///
    /// The caller's client keeps its own timeout and user agent.
    pub fn with_client(client: reqwest::Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch one page of results for `query` in delivery region `region`.
    ///
    /// An absent or empty item list yields an empty vector. Transient
    /// failures are retried up to [`RetryPolicy::max_attempts`] times in
    /// total; once exhausted the result is [`FetchError::Exhausted`].
    pub async fn fetch_page(
        &self,
        query: &str,
        page: u32,
        region: i64,
    ) -> Result<Vec<RawItem>, FetchError> {
        if page == 0 {
            return Err(FetchError::InvalidPage(page));
        }

        let policy = &self.config.retry;
        let mut delays = policy.delays();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let err = match self.try_fetch(query, page, region).await {
                Ok(items) => {
                    tracing::debug!(page, attempt, items = items.len(), "Search page fetched");
                    return Ok(items);
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            let Some(delay) = delays.next() else {
                tracing::error!(
                    page,
                    attempt,
                    error = %err,
                    "Search request failed after all retries",
                );
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            };

            tracing::warn!(
                page,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Search request failed, retrying",
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Execute a single request and decode the body.
    async fn try_fetch(
        &self,
        query: &str,
        page: u32,
        region: i64,
    ) -> Result<Vec<RawItem>, FetchError> {
        let response = self
            .client
            .get(&self.config.search_url)
            .query(&search_params(query, page, region))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let parsed: SearchResponse =
            serde_json::from_slice(&body).map_err(FetchError::Malformed)?;
        Ok(parsed.into_items())
    }
}

/// Fixed query parameters plus the caller's query, page and region.
fn search_params(query: &str, page: u32, region: i64) -> Vec<(&'static str, String)> {
    vec![
        ("appType", "1".to_string()),
        ("curr", "rub".to_string()),
        ("dest", region.to_string()),
        ("query", query.to_string()),
        ("page", page.to_string()),
        ("limit", PAGE_SIZE.to_string()),
        ("sort", "popular".to_string()),
        ("resultset", "catalog".to_string()),
        ("spp", "0".to_string()),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
