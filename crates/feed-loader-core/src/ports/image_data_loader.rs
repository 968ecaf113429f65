//! Image data loader port.
//!
//! A loader fetches the raw bytes behind a URL without blocking the caller.
//! The returned task lets the caller withdraw interest before the result
//! arrives.
//!
//! Guarantees every implementation in this workspace upholds:
//!
//! - `load_image_data` returns immediately and never fails synchronously;
//!   every failure arrives through the completion as `Err`.
//! - The completion runs at most once, on a thread of the loader's choosing.
//! - Once [`FeedImageDataLoaderTask::cancel`] returns, the completion will not
//!   run unless delivery has already begun. A completion that started just
//!   before the cancel may still be running when it returns. Cancelling
//!   twice, or after completion, does nothing.

use std::sync::Arc;

use url::Url;

/// Outcome of one load: the payload, or an opaque backend error.
pub type FetchResult = anyhow::Result<Vec<u8>>;

/// Callback receiving the outcome of one load.
pub type Completion = Box<dyn FnOnce(FetchResult) + Send + 'static>;

/// Handle to one in-flight load, used only for cancellation.
pub trait FeedImageDataLoaderTask: Send + Sync {
    /// Withdraws interest in the result.
    ///
    /// Idempotent. Work already started may keep running, but its result is
    /// not delivered unless delivery has already begun.
    fn cancel(&self);
}

/// Port for loading image data from a backend.
pub trait FeedImageDataLoader: Send + Sync {
    /// Starts loading the data behind `url` and returns a cancellation handle.
    fn load_image_data(&self, url: &Url, completion: Completion) -> Box<dyn FeedImageDataLoaderTask>;
}

impl<T: FeedImageDataLoader + ?Sized> FeedImageDataLoader for Arc<T> {
    fn load_image_data(&self, url: &Url, completion: Completion) -> Box<dyn FeedImageDataLoaderTask> {
        (**self).load_image_data(url, completion)
    }
}

impl<T: FeedImageDataLoader + ?Sized> FeedImageDataLoader for Box<T> {
    fn load_image_data(&self, url: &Url, completion: Completion) -> Box<dyn FeedImageDataLoaderTask> {
        (**self).load_image_data(url, completion)
    }
}
