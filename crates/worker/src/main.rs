//! `fetch-products` -- pull marketplace search pages into the database.
//!
//! # Environment variables
//!
//! | Variable                 | Required | Default | Description                     |
//! |--------------------------|----------|---------|---------------------------------|
//! | `DATABASE_URL`           | yes      | --      | PostgreSQL connection string    |
//! | `MARKETPLACE_SEARCH_URL` | no       | public  | Search endpoint override        |
//! | `FETCH_TIMEOUT_SECS`     | no       | `20`    | Per-request timeout             |
//!
//! Exit status: 0 on success, 1 on a fatal error, 130 when interrupted.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketsync_marketplace::SearchApi;
use marketsync_pipeline::{FetchOrchestrator, PgProductSink, PipelineError, RunSummary};
use marketsync_worker::cli::FetchArgs;
use marketsync_worker::config::WorkerConfig;

const DEFAULT_LOG_FILTER: &str =
    "marketsync_worker=info,marketsync_pipeline=info,marketsync_marketplace=info";

/// Conventional status for a run stopped by SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = FetchArgs::parse();

    match run(args).await {
        Ok(summary) if summary.cancelled => {
            tracing::warn!(
                pages = summary.pages_completed,
                items = summary.items,
                "Interrupted; pages written so far are kept",
            );
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Ok(summary) => {
            tracing::info!(
                created = summary.created,
                updated = summary.updated,
                skipped = summary.skipped,
                "Done. {} products processed.",
                summary.items,
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<PipelineError>().and_then(PipelineError::page) {
                Some(page) => tracing::error!(page, error = %format!("{e:#}"), "Fetch run failed"),
                None => tracing::error!(error = %format!("{e:#}"), "Fetch run failed"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: FetchArgs) -> anyhow::Result<RunSummary> {
    let config = WorkerConfig::from_env()?;

    let pool = marketsync_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    marketsync_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    let api = SearchApi::new(config.fetch).context("Failed to build HTTP client")?;
    let orchestrator = FetchOrchestrator::new(api, PgProductSink::new(pool));

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    tracing::info!(
        query = %args.query,
        pages = args.pages,
        region = args.region,
        delay_secs = args.delay.as_secs_f64(),
        "Marketplace fetch",
    );

    let summary = orchestrator.run(&args.run_config(), &cancel).await?;
    Ok(summary)
}

/// Cancel the run on SIGINT (Ctrl-C) or SIGTERM.
///
/// The orchestrator notices at the next page boundary or during the
/// inter-page delay.
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), stopping after the current page"),
        () = terminate => tracing::info!("Received SIGTERM, stopping after the current page"),
    }
    cancel.cancel();
}
