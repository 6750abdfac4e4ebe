//! Fetch-normalize-upsert pipeline.
//!
//! [`orchestrator::FetchOrchestrator`] walks result pages one at a time,
//! pulling raw items from a [`PageSource`], normalizing them and writing
//! them to a [`ProductSink`].

pub mod orchestrator;
pub mod source;

pub use orchestrator::{FetchOrchestrator, PipelineError, RunConfig, RunSummary};
pub use source::{PageSource, PgProductSink, ProductSink};
