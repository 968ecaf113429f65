//! Decorator that writes successful loads through to a cache.

use std::sync::Arc;

use tracing::warn;
use url::Url;

use crate::ports::{Completion, FeedImageDataCache, FeedImageDataLoader, FeedImageDataLoaderTask};

/// Saves every payload the decoratee delivers into `cache`.
///
/// Save failures are logged and do not affect the delivered result.
pub struct CachingFeedImageDataLoaderDecorator {
    decoratee: Arc<dyn FeedImageDataLoader>,
    cache: Arc<dyn FeedImageDataCache>,
}

impl CachingFeedImageDataLoaderDecorator {
    /// Wraps `decoratee` so its payloads are stored in `cache`.
    #[must_use]
    pub fn new(decoratee: Arc<dyn FeedImageDataLoader>, cache: Arc<dyn FeedImageDataCache>) -> Self {
        Self { decoratee, cache }
    }
}

impl FeedImageDataLoader for CachingFeedImageDataLoaderDecorator {
    fn load_image_data(&self, url: &Url, completion: Completion) -> Box<dyn FeedImageDataLoaderTask> {
        let cache = Arc::clone(&self.cache);
        let key = url.clone();

        self.decoratee.load_image_data(
            url,
            Box::new(move |result| {
                if let Ok(data) = &result {
                    if let Err(e) = cache.save(data, &key) {
                        warn!("Failed to cache image data for {key}: {e:#}");
                    }
                }
                completion(result);
            }),
        )
    }
}
