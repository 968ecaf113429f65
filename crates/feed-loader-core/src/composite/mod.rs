//! Loaders built from other loaders.

mod caching;
mod fallback;

pub use caching::CachingFeedImageDataLoaderDecorator;
pub use fallback::FallbackFeedImageDataLoader;
