//! Cache command - inspect and manage the image data cache.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use feed_loader_adapters::{cache_key, default_cache_dir, DiskImageDataStore};
use url::Url;

use crate::config::AppConfig;

/// Arguments for the cache command
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,

    /// Custom cache directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,
}

/// Cache subcommands
#[derive(Subcommand)]
pub enum CacheCommand {
    /// Print cache directory path
    Path,
    /// List cached entries
    List,
    /// Remove every cached entry
    Clear,
    /// Remove the cached entry for one URL
    Remove {
        /// URL whose entry should be removed
        url: String,
    },
}

/// Run the cache command.
pub fn run(args: &CacheArgs, config: &AppConfig) -> Result<()> {
    let dir = args
        .cache_dir
        .clone()
        .or_else(|| config.cache.dir.clone())
        .unwrap_or_else(default_cache_dir);
    let store = DiskImageDataStore::new(dir);

    match &args.command {
        CacheCommand::Path => {
            println!("{}", store.root().display());
            Ok(())
        }
        CacheCommand::List => list_entries(&store),
        CacheCommand::Clear => clear_entries(&store),
        CacheCommand::Remove { url } => remove_entry(&store, url),
    }
}

fn list_entries(store: &DiskImageDataStore) -> Result<()> {
    let entries = store.entries()?;

    println!("Cache directory: {}", store.root().display());
    println!();

    for entry in &entries {
        println!("  {} ({} bytes)", entry.key, entry.bytes);
    }

    if !entries.is_empty() {
        println!();
    }
    let total = store.total_bytes()?;
    println!("{} entries, {total} bytes", entries.len());

    Ok(())
}

fn clear_entries(store: &DiskImageDataStore) -> Result<()> {
    let removed = store.clear()?;
    println!("Removed {removed} entries from {}", store.root().display());
    Ok(())
}

fn remove_entry(store: &DiskImageDataStore, url: &str) -> Result<()> {
    let url = Url::parse(url).with_context(|| format!("Invalid URL: {url}"))?;
    if store.delete(&url)? {
        println!("Removed {}", cache_key(&url));
    } else {
        println!("No cached entry for {url}");
    }
    Ok(())
}
