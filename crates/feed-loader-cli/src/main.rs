//! Feed Loader CLI - Fetch and cache feed images.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::fetch::FetchArgs;
use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let exit_code = match cli.command {
        Some(Commands::Fetch(args)) => run_fetch(&FetchArgs::with_config(args, &config)),
        Some(Commands::Cache(ref args)) => match commands::cache::run(args, &config) {
            Ok(()) => ExitCode::Success,
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::Error
            }
        },
        None => {
            // Default behavior: run fetch with flattened args
            if cli.fetch.urls.is_empty() {
                eprintln!("error: No URLs specified. Use --help for usage information.");
                return ExitCode::Error.into();
            }
            run_fetch(&FetchArgs::with_config(cli.fetch, &config))
        }
    };

    exit_code.into()
}

fn run_fetch(args: &FetchArgs) -> ExitCode {
    match commands::fetch::run(args) {
        Ok(summary) => {
            info!(
                "Fetched {} image(s), {} failed",
                summary.succeeded, summary.failed
            );
            summary.exit_code
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}
