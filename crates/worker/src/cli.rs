//! Command-line arguments of `fetch-products`.

use std::time::Duration;

use clap::Parser;
use marketsync_pipeline::orchestrator::{RunConfig, DEFAULT_REGION};

/// Fetch marketplace search results and upsert them into the products table.
#[derive(Debug, Parser)]
#[command(name = "fetch-products", version)]
pub struct FetchArgs {
    /// Search query sent to the marketplace
    #[arg(long)]
    pub query: String,

    /// Number of result pages to fetch, starting at page 1
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Delivery region code (the default is the home region)
    #[arg(
        long,
        visible_alias = "dest",
        default_value_t = DEFAULT_REGION,
        allow_negative_numbers = true
    )]
    pub region: i64,

    /// Pause between pages, in seconds
    #[arg(long, default_value = "1", value_parser = parse_delay)]
    pub delay: Duration,
}

impl FetchArgs {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            query: self.query.clone(),
            pages: self.pages,
            region: self.region,
            delay: self.delay,
        }
    }
}

fn parse_delay(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("delay must be a non-negative number of seconds, got {raw}"))
}
