//! Primary-then-fallback loader composition.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;
use url::Url;

use crate::ports::{Completion, FeedImageDataLoader, FeedImageDataLoaderTask};
use crate::task::{TaskHandle, TaskRegistry};

/// Loads from `primary`, and from `fallback` when the primary fails.
///
/// When both fail the fallback's error is delivered.
pub struct FallbackFeedImageDataLoader {
    primary: Arc<dyn FeedImageDataLoader>,
    fallback: Arc<dyn FeedImageDataLoader>,
    registry: Arc<TaskRegistry>,
}

impl FallbackFeedImageDataLoader {
    /// Creates a new fallback composition.
    #[must_use]
    pub fn new(primary: Arc<dyn FeedImageDataLoader>, fallback: Arc<dyn FeedImageDataLoader>) -> Self {
        Self {
            primary,
            fallback,
            registry: TaskRegistry::new(),
        }
    }
}

impl FeedImageDataLoader for FallbackFeedImageDataLoader {
    fn load_image_data(&self, url: &Url, completion: Completion) -> Box<dyn FeedImageDataLoaderTask> {
        let (handle, completer) = self.registry.register(completion);
        let inner = Arc::new(InnerTasks::default());

        let fallback = Arc::clone(&self.fallback);
        let fallback_inner = Arc::clone(&inner);
        let fallback_url = url.clone();

        let primary_task = self.primary.load_image_data(
            url,
            Box::new(move |result| match result {
                Ok(data) => {
                    completer.complete(Ok(data));
                }
                Err(e) => {
                    if completer.is_cancelled() {
                        return;
                    }
                    debug!("Primary load failed for {fallback_url}: {e:#}");
                    let task = fallback.load_image_data(
                        &fallback_url,
                        Box::new(move |result| {
                            completer.complete(result);
                        }),
                    );
                    fallback_inner.track(task);
                }
            }),
        );
        inner.track(primary_task);

        Box::new(FallbackTask { handle, inner })
    }
}

/// Inner tasks of one fallback request.
///
/// A task tracked after the request was cancelled is cancelled on the spot.
#[derive(Default)]
struct InnerTasks {
    state: Mutex<InnerState>,
}

#[derive(Default)]
struct InnerState {
    cancelled: bool,
    tasks: Vec<Box<dyn FeedImageDataLoaderTask>>,
}

impl InnerTasks {
    fn track(&self, task: Box<dyn FeedImageDataLoaderTask>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.cancelled {
            drop(state);
            task.cancel();
        } else {
            state.tasks.push(task);
        }
    }

    fn cancel_all(&self) {
        let tasks = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.cancelled = true;
            std::mem::take(&mut state.tasks)
        };
        for task in tasks {
            task.cancel();
        }
    }
}

struct FallbackTask {
    handle: TaskHandle,
    inner: Arc<InnerTasks>,
}

impl FeedImageDataLoaderTask for FallbackTask {
    fn cancel(&self) {
        self.handle.cancel();
        self.inner.cancel_all();
    }
}
