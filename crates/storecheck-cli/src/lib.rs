//! storecheck CLI library
//!
//! Command-line interface over the `storecheck` library: scrape listings,
//! verify them against fixtures, record fixtures, and inspect configuration.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, FixturesArgs, RecordArgs, ScrapeArgs, ScrapeFormat, VerifyArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_entries, render_fixture_summary, ProgressReporter};
