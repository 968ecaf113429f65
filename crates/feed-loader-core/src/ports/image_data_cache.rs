//! Image data cache port.

use url::Url;

/// Port for persisting loaded image data keyed by URL.
pub trait FeedImageDataCache: Send + Sync {
    /// Stores `data` as the cached payload for `url`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be persisted.
    fn save(&self, data: &[u8], url: &Url) -> anyhow::Result<()>;
}
