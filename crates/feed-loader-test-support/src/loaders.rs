//! Deterministic loader doubles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use feed_loader_core::{
    spawn_load, Completer, Completion, FeedImageDataLoader, FeedImageDataLoaderTask, FetchResult,
    TaskHandle, TaskRegistry,
};
use url::Url;

/// Canned response of a stub loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubResponse {
    /// Deliver these bytes.
    Data(Vec<u8>),
    /// Deliver an error with this message.
    Error(String),
}

impl StubResponse {
    fn into_result(self) -> FetchResult {
        match self {
            Self::Data(data) => Ok(data),
            Self::Error(message) => Err(anyhow::anyhow!(message)),
        }
    }
}

/// Loader that answers every request with a preset response.
///
/// Without a delay the completion runs synchronously inside
/// `load_image_data`. With a delay it runs on a worker thread after sleeping,
/// so the caller has time to cancel.
pub struct StubImageDataLoader {
    default_response: StubResponse,
    responses: HashMap<Url, StubResponse>,
    delay: Option<Duration>,
    registry: Arc<TaskRegistry>,
    requested: Mutex<Vec<Url>>,
}

impl StubImageDataLoader {
    /// Stub delivering `data` for every URL.
    #[must_use]
    pub fn succeeding_with(data: Vec<u8>) -> Self {
        Self::answering(StubResponse::Data(data))
    }

    /// Stub failing every URL with `message`.
    #[must_use]
    pub fn failing_with(message: &str) -> Self {
        Self::answering(StubResponse::Error(message.to_string()))
    }

    fn answering(default_response: StubResponse) -> Self {
        Self {
            default_response,
            responses: HashMap::new(),
            delay: None,
            registry: TaskRegistry::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Overrides the response for one URL with a payload.
    #[must_use]
    pub fn with_data(mut self, url: Url, data: Vec<u8>) -> Self {
        self.responses.insert(url, StubResponse::Data(data));
        self
    }

    /// Overrides the response for one URL with a failure.
    #[must_use]
    pub fn with_failure(mut self, url: Url, message: &str) -> Self {
        self.responses
            .insert(url, StubResponse::Error(message.to_string()));
        self
    }

    /// Delivers every response from a worker thread after `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns every URL requested so far, in order.
    #[must_use]
    pub fn requested_urls(&self) -> Vec<Url> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of loads neither completed nor cancelled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.registry.in_flight()
    }
}

impl FeedImageDataLoader for StubImageDataLoader {
    fn load_image_data(&self, url: &Url, completion: Completion) -> Box<dyn FeedImageDataLoaderTask> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.clone());

        let response = self
            .responses
            .get(url)
            .unwrap_or(&self.default_response)
            .clone();

        match self.delay {
            None => {
                let (handle, completer) = self.registry.register(completion);
                completer.complete(response.into_result());
                Box::new(handle)
            }
            Some(delay) => Box::new(spawn_load(
                &self.registry,
                "feed-image-stub",
                completion,
                move |_| {
                    thread::sleep(delay);
                    response.into_result()
                },
            )),
        }
    }
}

/// Loader that records requests and completes them only when told to.
pub struct ImageDataLoaderSpy {
    registry: Arc<TaskRegistry>,
    messages: Mutex<Vec<(Url, Option<Completer>)>>,
    cancelled: Arc<Mutex<Vec<Url>>>,
}

impl ImageDataLoaderSpy {
    /// Creates a spy with no recorded requests.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: TaskRegistry::new(),
            messages: Mutex::new(Vec::new()),
            cancelled: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns every URL requested so far, in order.
    #[must_use]
    pub fn loaded_urls(&self) -> Vec<Url> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Returns one entry per `cancel()` call, in order.
    #[must_use]
    pub fn cancelled_urls(&self) -> Vec<Url> {
        self.cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Completes request `index` with `data`. Returns whether the completion ran.
    pub fn complete_with(&self, data: Vec<u8>, index: usize) -> bool {
        self.finish(index, Ok(data))
    }

    /// Fails request `index` with `message`. Returns whether the completion ran.
    pub fn complete_with_error(&self, message: &str, index: usize) -> bool {
        self.finish(index, Err(anyhow::anyhow!(message.to_string())))
    }

    fn finish(&self, index: usize, result: FetchResult) -> bool {
        let completer = self
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(index)
            .and_then(|(_, completer)| completer.take());
        completer.is_some_and(|c| c.complete(result))
    }
}

impl Default for ImageDataLoaderSpy {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedImageDataLoader for ImageDataLoaderSpy {
    fn load_image_data(&self, url: &Url, completion: Completion) -> Box<dyn FeedImageDataLoaderTask> {
        let (handle, completer) = self.registry.register(completion);
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((url.clone(), Some(completer)));

        Box::new(SpyTask {
            handle,
            url: url.clone(),
            cancelled: Arc::clone(&self.cancelled),
        })
    }
}

struct SpyTask {
    handle: TaskHandle,
    url: Url,
    cancelled: Arc<Mutex<Vec<Url>>>,
}

impl FeedImageDataLoaderTask for SpyTask {
    fn cancel(&self) {
        self.cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.url.clone());
        self.handle.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_stub_completes_synchronously() {
        let stub = StubImageDataLoader::succeeding_with(vec![1, 2, 3]);
        let (tx, rx) = mpsc::channel();

        let _task = stub.load_image_data(
            &url("https://a.com"),
            Box::new(move |r| tx.send(r.unwrap()).unwrap()),
        );

        assert_eq!(rx.try_recv().unwrap(), vec![1, 2, 3]);
        assert_eq!(stub.requested_urls(), vec![url("https://a.com")]);
    }

    #[test]
    fn test_stub_per_url_override() {
        let stub = StubImageDataLoader::succeeding_with(vec![1])
            .with_failure(url("https://b.com"), "decode error");
        let (tx, rx) = mpsc::channel();

        let _task = stub.load_image_data(
            &url("https://b.com"),
            Box::new(move |r| tx.send(r.map_err(|e| e.to_string())).unwrap()),
        );

        assert_eq!(rx.try_recv().unwrap(), Err("decode error".to_string()));
    }

    #[test]
    fn test_spy_completes_on_demand() {
        let spy = ImageDataLoaderSpy::new();
        let (tx, rx) = mpsc::channel();

        let _task = spy.load_image_data(
            &url("https://a.com"),
            Box::new(move |r| tx.send(r.unwrap()).unwrap()),
        );
        assert!(rx.try_recv().is_err());

        assert!(spy.complete_with(vec![9], 0));
        assert_eq!(rx.try_recv().unwrap(), vec![9]);
        assert!(!spy.complete_with(vec![9], 0));
    }

    #[test]
    fn test_spy_records_cancellations() {
        let spy = ImageDataLoaderSpy::new();
        let task = spy.load_image_data(&url("https://a.com"), Box::new(|_| {}));

        task.cancel();
        assert_eq!(spy.cancelled_urls(), vec![url("https://a.com")]);
        assert!(!spy.complete_with(vec![1], 0));
    }
}
