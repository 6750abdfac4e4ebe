//! Page loop driving fetch → normalize → upsert.
//!
//! One page is in flight at a time. Between pages the orchestrator sleeps
//! for the configured delay; never after the last page. A fetch or storage
//! failure ends the run; pages already written stay written.
//!
//! Cancellation is checked at every page boundary and raced against the
//! inter-page delay and the in-flight fetch. An upsert that has started
//! always runs to completion so no transaction is abandoned half way.

use std::time::Duration;

use marketsync_core::catalog::{normalize_page, NormalizedPage};
use marketsync_marketplace::FetchError;
use tokio_util::sync::CancellationToken;

use crate::source::{PageSource, ProductSink};

/// Delivery region used when the caller does not pick one.
pub const DEFAULT_REGION: i64 = -1257786;

/// Pause between pages when the caller does not pick one.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Config & summary
// ---------------------------------------------------------------------------

/// Parameters of a single run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub query: String,
    /// Number of pages to walk, starting at 1.
    pub pages: u32,
    pub region: i64,
    /// Pause between consecutive pages.
    pub delay: Duration,
}

impl RunConfig {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            pages: 1,
            region: DEFAULT_REGION,
            delay: DEFAULT_PAGE_DELAY,
        }
    }

    fn check(&self) -> Result<(), PipelineError> {
        if self.query.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("query must not be empty".into()));
        }
        if self.pages == 0 {
            return Err(PipelineError::InvalidConfig("pages must be at least 1".into()));
        }
        Ok(())
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pages fetched and written.
    pub pages_completed: u32,
    /// Normalized products written.
    pub items: usize,
    pub created: u64,
    pub updated: u64,
    /// Raw items dropped for lack of an id.
    pub skipped: usize,
    /// An empty page ended the run before the requested page count.
    pub reached_end: bool,
    /// The run stopped because the cancellation token fired.
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal run errors. Each carries the page it happened on.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("page {page}: {source}")]
    Fetch {
        page: u32,
        #[source]
        source: FetchError,
    },

    #[error("page {page}: storage write failed: {source}")]
    Storage {
        page: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Page the run failed on, if the failure belongs to a page.
    pub fn page(&self) -> Option<u32> {
        match self {
            PipelineError::Fetch { page, .. } | PipelineError::Storage { page, .. } => Some(*page),
            PipelineError::InvalidConfig(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Fetching(u32),
    Normalizing(u32),
    Upserting(u32),
    Delaying(u32),
    Done,
}

fn transition(state: &mut RunState, next: RunState) {
    tracing::debug!(from = ?*state, to = ?next, "Run state change");
    *state = next;
}

/// Drives pages through a [`PageSource`] and a [`ProductSink`].
pub struct FetchOrchestrator<S, K> {
    source: S,
    sink: K,
}

impl<S: PageSource, K: ProductSink> FetchOrchestrator<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self { source, sink }
    }

    /// Process pages `1..=config.pages`.
    ///
    /// Returns the run summary on success or cancellation. An empty page
    /// means there are no further results and finishes the run early.
    pub async fn run(
        &self,
        config: &RunConfig,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, PipelineError> {
        config.check()?;

        let mut summary = RunSummary::default();
        let mut state = RunState::Idle;

        tracing::info!(
            query = %config.query,
            pages = config.pages,
            region = config.region,
            "Starting fetch run",
        );

        for page in 1..=config.pages {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            transition(&mut state, RunState::Fetching(page));
            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                result = self.source.fetch_page(&config.query, page, config.region) => Some(result),
            };
            let Some(fetched) = fetched else {
                tracing::info!(page, "Fetch cancelled");
                summary.cancelled = true;
                break;
            };
            let raw_items = fetched.map_err(|source| PipelineError::Fetch { page, source })?;

            if raw_items.is_empty() {
                tracing::info!(page, "Empty page, no more results");
                summary.pages_completed += 1;
                summary.reached_end = true;
                break;
            }

            transition(&mut state, RunState::Normalizing(page));
            let NormalizedPage { products, skipped } = normalize_page(raw_items);
            if skipped > 0 {
                tracing::warn!(page, skipped, "Dropped items without an id");
            }

            transition(&mut state, RunState::Upserting(page));
            let outcome = self
                .sink
                .upsert(&products)
                .await
                .map_err(|source| PipelineError::Storage { page, source })?;

            summary.pages_completed += 1;
            summary.items += products.len();
            summary.created += outcome.created;
            summary.updated += outcome.updated;
            summary.skipped += skipped;

            tracing::info!(
                page,
                items = products.len(),
                created = outcome.created,
                updated = outcome.updated,
                "Page processed",
            );

            if page < config.pages {
                transition(&mut state, RunState::Delaying(page));
                tokio::select! {
                    () = cancel.cancelled() => {
                        tracing::info!(page, "Cancelled during inter-page delay");
                        summary.cancelled = true;
                        break;
                    }
                    () = tokio::time::sleep(config.delay) => {}
                }
            }
        }

        transition(&mut state, RunState::Done);
        tracing::info!(
            pages = summary.pages_completed,
            items = summary.items,
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "Fetch run finished",
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
