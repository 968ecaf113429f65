//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod image_data_cache;
mod image_data_loader;
mod progress;
mod result_output;

pub use image_data_cache::FeedImageDataCache;
pub use image_data_loader::{Completion, FeedImageDataLoader, FeedImageDataLoaderTask, FetchResult};
pub use progress::{ProgressEvent, ProgressSink};
pub use result_output::ResultOutput;
