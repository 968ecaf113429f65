//! Feed Loader Adapters - Image data backends for feed-loader.
//!
//! This crate provides adapters for:
//! - HTTP(S) image data
//! - On-disk caching of image data
//! - Local `file://` image data
//! - Routing requests by URL scheme

pub mod cache;
pub mod file;
pub mod remote;
pub mod router;

pub use cache::{
    cache_key, default_cache_dir, CacheEntry, CacheLoadError, DiskImageDataStore,
    LocalFeedImageDataLoader,
};
pub use file::{FileFeedImageDataLoader, FileLoadError};
pub use remote::{RemoteConfig, RemoteFeedImageDataLoader, RemoteLoadError};
pub use router::SchemeRoutingLoader;
