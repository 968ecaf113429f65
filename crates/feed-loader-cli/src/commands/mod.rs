//! CLI command definitions and handlers.

pub mod cache;
pub mod fetch;

use clap::{Parser, Subcommand};

/// Feed Loader - Fetch and cache feed images
#[derive(Parser)]
#[command(name = "feed-loader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared fetch arguments (URLs, cache, output flags).
    #[command(flatten)]
    pub fetch: fetch::FetchArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Load image data for URLs or local files
    Fetch(fetch::FetchArgs),
    /// Manage the image data cache
    Cache(cache::CacheArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every load succeeded.
    Success = 0,
    /// At least one load failed.
    FailuresFound = 1,
    /// The command could not run.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
