//! Test support utilities for feed-loader.
//!
//! Provides stub loaders, mocks of the core ports, and payload and feed
//! fixtures for testing loaders and presenters.
//!
//! # Example
//!
//! ```
//! use feed_loader_core::FeedImageDataLoader;
//! use feed_loader_test_support::{FeedImageBuilder, StubImageDataLoader, SyntheticImageBuilder};
//!
//! let loader = StubImageDataLoader::succeeding_with(SyntheticImageBuilder::red_png());
//! let _task = loader.load_image_data(
//!     &FeedImageBuilder::any_url(),
//!     Box::new(|result| assert!(result.is_ok())),
//! );
//! ```

mod builders;
mod loaders;
mod mocks;

pub use builders::{FeedImageBuilder, SyntheticImageBuilder, PNG_SIGNATURE};
pub use loaders::{ImageDataLoaderSpy, StubImageDataLoader, StubResponse};
pub use mocks::{
    FeedViewMessage, MockFeedImageView, MockFeedViews, MockImageDataCache, MockProgressSink,
    MockResultOutput,
};
