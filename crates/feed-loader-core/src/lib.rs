//! Feed Loader Core - Image data loading contract and headless presentation
//!
//! This crate contains the loader port every image backend implements, the
//! task registry that enforces at-most-once delivery under cancellation,
//! composite loaders, and the presenters that drive feed image cells.

pub mod composite;
pub mod domain;
pub mod ports;
pub mod presentation;
pub mod task;

pub use composite::{CachingFeedImageDataLoaderDecorator, FallbackFeedImageDataLoader};
pub use domain::{FeedImage, ImageDimensions, LoadOutcome, LoadStatus};
pub use ports::{
    Completion, FeedImageDataCache, FeedImageDataLoader, FeedImageDataLoaderTask, FetchResult,
    ProgressEvent, ProgressSink, ResultOutput,
};
pub use task::{spawn_load, Completer, TaskHandle, TaskRegistry};
