//! Filesystem adapter for `file://` image URLs.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use feed_loader_core::{
    spawn_load, Completion, FeedImageDataLoader, FeedImageDataLoaderTask, FetchResult,
    TaskRegistry,
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Extensions recognized as image files.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "tif"];

/// Errors reported by [`FileFeedImageDataLoader`].
#[derive(Debug, Error)]
pub enum FileLoadError {
    /// The URL is not a `file://` URL.
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    /// The URL does not name a local path.
    #[error("not a local file path: {0}")]
    InvalidPath(String),
    /// The file could not be read.
    #[error("file I/O error: {0}")]
    Io(String),
}

/// Loads image data from local files named by `file://` URLs.
///
/// Reads run on a worker thread; cancelling only suppresses the callback.
pub struct FileFeedImageDataLoader {
    registry: Arc<TaskRegistry>,
}

impl FileFeedImageDataLoader {
    /// Creates a new file loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: TaskRegistry::new(),
        }
    }
}

impl Default for FileFeedImageDataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedImageDataLoader for FileFeedImageDataLoader {
    fn load_image_data(&self, url: &Url, completion: Completion) -> Box<dyn FeedImageDataLoaderTask> {
        let url = url.clone();
        Box::new(spawn_load(
            &self.registry,
            "feed-image-file",
            completion,
            move |_| read_file(&url),
        ))
    }
}

fn read_file(url: &Url) -> FetchResult {
    if url.scheme() != "file" {
        return Err(FileLoadError::UnsupportedScheme(url.scheme().to_string()).into());
    }
    let path = url
        .to_file_path()
        .map_err(|()| FileLoadError::InvalidPath(url.to_string()))?;

    if !is_supported_image(&path) {
        warn!("Unrecognized image extension: {}", path.display());
    }

    let data = fs::read(&path)
        .map_err(|e| FileLoadError::Io(format!("{}: {e}", path.display())))?;
    debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Checks if a path has a recognized image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}
