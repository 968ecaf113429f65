//! Routes requests to a backend by URL scheme.

use std::collections::HashMap;
use std::sync::Arc;

use feed_loader_core::{Completion, FeedImageDataLoader, FeedImageDataLoaderTask};
use tracing::trace;
use url::Url;

/// Dispatches each request to the loader registered for its scheme, or to
/// the default loader.
pub struct SchemeRoutingLoader {
    routes: HashMap<String, Arc<dyn FeedImageDataLoader>>,
    default: Arc<dyn FeedImageDataLoader>,
}

impl SchemeRoutingLoader {
    /// Creates a router sending every scheme to `default`.
    #[must_use]
    pub fn new(default: Arc<dyn FeedImageDataLoader>) -> Self {
        Self {
            routes: HashMap::new(),
            default,
        }
    }

    /// Sends `scheme` (case-insensitive) to `loader`.
    #[must_use]
    pub fn route(mut self, scheme: &str, loader: Arc<dyn FeedImageDataLoader>) -> Self {
        self.routes.insert(scheme.to_ascii_lowercase(), loader);
        self
    }
}

impl FeedImageDataLoader for SchemeRoutingLoader {
    fn load_image_data(&self, url: &Url, completion: Completion) -> Box<dyn FeedImageDataLoaderTask> {
        let loader = self.routes.get(url.scheme()).unwrap_or(&self.default);
        trace!("Routing {} request for {url}", url.scheme());
        loader.load_image_data(url, completion)
    }
}
