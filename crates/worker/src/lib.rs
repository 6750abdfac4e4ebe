//! `marketsync-worker` library crate.
//!
//! Holds the command-line and environment configuration so the binary
//! entrypoint in `main.rs` stays thin and the parsing is testable.

pub mod cli;
pub mod config;
