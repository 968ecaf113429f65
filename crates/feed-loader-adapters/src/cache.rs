//! On-disk image data cache.
//!
//! Payloads are stored one file per URL under
//! `<root>/<first two hex chars>/<sha256(url)>.bin`. Writes land in a
//! temporary sibling first and are renamed into place, so readers never see
//! a partial file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use feed_loader_core::{
    spawn_load, Completion, FeedImageDataCache, FeedImageDataLoader, FeedImageDataLoaderTask,
    TaskRegistry,
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Extension of committed cache entries.
const ENTRY_EXTENSION: &str = "bin";

/// Distinguishes concurrent temporary files within one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Errors reported by [`LocalFeedImageDataLoader`].
#[derive(Debug, Error)]
pub enum CacheLoadError {
    /// No entry is stored for the URL.
    #[error("no cached data for {0}")]
    NotFound(String),
    /// The entry exists but could not be read.
    #[error("cache I/O error: {0}")]
    Io(String),
}

/// A stored cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Hex SHA-256 of the URL.
    pub key: String,
    /// Payload size in bytes.
    pub bytes: u64,
}

/// Returns the default cache directory.
///
/// Uses `XDG_CACHE_HOME/feed-loader/images` or `~/.cache/feed-loader/images`.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feed-loader")
        .join("images")
}

/// Returns the hex SHA-256 of a URL, the cache key.
#[must_use]
pub fn cache_key(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// File-per-URL payload store.
#[derive(Debug, Clone)]
pub struct DiskImageDataStore {
    root: PathBuf,
}

impl DiskImageDataStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, url: &Url) -> PathBuf {
        let key = cache_key(url);
        self.root
            .join(&key[..2])
            .join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    /// Stores `data` for `url`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    pub fn insert(&self, data: &[u8], url: &Url) -> Result<()> {
        let path = self.entry_path(url);
        let dir = path
            .parent()
            .context("Cache entry path has no parent directory")?;
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;

        let temp = path.with_extension(format!(
            "tmp-{}-{}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&temp, data)
            .with_context(|| format!("Failed to write cache entry {}", temp.display()))?;
        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(e).with_context(|| format!("Failed to commit cache entry {}", path.display()));
        }

        debug!("Cached {} bytes for {url}", data.len());
        Ok(())
    }

    /// Reads the entry for `url`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CacheLoadError::Io`] if the entry exists but cannot be read.
    pub fn retrieve(&self, url: &Url) -> Result<Option<Vec<u8>>, CacheLoadError> {
        match fs::read(self.entry_path(url)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheLoadError::Io(e.to_string())),
        }
    }

    /// Removes the entry for `url`. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exists but cannot be removed.
    pub fn delete(&self, url: &Url) -> Result<bool> {
        let path = self.entry_path(url);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove cache entry {}", path.display()))
            }
        }
    }

    /// Lists committed entries, sorted by key.
    ///
    /// A missing root directory is an empty cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the root exists but cannot be read.
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        let shards = match fs::read_dir(&self.root) {
            Ok(shards) => shards,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read cache directory {}", self.root.display())
                })
            }
        };

        let mut entries = Vec::new();
        for shard in shards.flatten() {
            let shard_path = shard.path();
            if !shard_path.is_dir() {
                continue;
            }
            let files = match fs::read_dir(&shard_path) {
                Ok(files) => files,
                Err(e) => {
                    warn!("Failed to read cache shard {}: {e}", shard_path.display());
                    continue;
                }
            };
            for file in files.flatten() {
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                    continue;
                }
                let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let bytes = file.metadata().map(|m| m.len()).unwrap_or(0);
                entries.push(CacheEntry {
                    key: key.to_string(),
                    bytes,
                });
            }
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    /// Returns the summed size of all entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the entries cannot be listed.
    pub fn total_bytes(&self) -> Result<u64> {
        Ok(self.entries()?.iter().map(|e| e.bytes).sum())
    }

    /// Removes every entry. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be removed.
    pub fn clear(&self) -> Result<usize> {
        let count = self.entries()?.len();
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to clear cache directory {}", self.root.display())
                })
            }
        }
        debug!("Cleared {count} cache entries");
        Ok(count)
    }
}

/// Loads image data from a [`DiskImageDataStore`] and saves into it.
///
/// Reads run on a worker thread; cancelling only suppresses the callback.
pub struct LocalFeedImageDataLoader {
    store: Arc<DiskImageDataStore>,
    registry: Arc<TaskRegistry>,
}

impl LocalFeedImageDataLoader {
    /// Creates a loader over `store`.
    #[must_use]
    pub fn new(store: Arc<DiskImageDataStore>) -> Self {
        Self {
            store,
            registry: TaskRegistry::new(),
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &DiskImageDataStore {
        &self.store
    }
}

impl FeedImageDataLoader for LocalFeedImageDataLoader {
    fn load_image_data(&self, url: &Url, completion: Completion) -> Box<dyn FeedImageDataLoaderTask> {
        let store = Arc::clone(&self.store);
        let url = url.clone();
        Box::new(spawn_load(
            &self.registry,
            "feed-image-cache",
            completion,
            move |_| match store.retrieve(&url)? {
                Some(data) => {
                    debug!("Cache hit for {url}");
                    Ok(data)
                }
                None => Err(CacheLoadError::NotFound(url.to_string()).into()),
            },
        ))
    }
}

impl FeedImageDataCache for LocalFeedImageDataLoader {
    fn save(&self, data: &[u8], url: &Url) -> Result<()> {
        self.store.insert(data, url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_dir() {
        assert!(default_cache_dir().ends_with("feed-loader/images"));
    }

    #[test]
    fn test_cache_key_is_stable_hex() {
        let url = Url::parse("https://example.com/a.png").unwrap();
        let key = cache_key(&url);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, cache_key(&url));
    }

    #[test]
    fn test_entry_path_is_sharded() {
        let store = DiskImageDataStore::new("/tmp/cache");
        let url = Url::parse("https://example.com/a.png").unwrap();
        let key = cache_key(&url);
        let path = store.entry_path(&url);
        assert!(path.starts_with(Path::new("/tmp/cache").join(&key[..2])));
        assert!(path.ends_with(format!("{key}.bin")));
    }
}
