//! Mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use feed_loader_core::presentation::{
    FeedErrorView, FeedErrorViewModel, FeedImageView, FeedImageViewModel, FeedLoadingView,
    FeedLoadingViewModel, FeedView, FeedViewModel,
};
use feed_loader_core::{FeedImageDataCache, LoadOutcome, ProgressEvent, ProgressSink, ResultOutput};
use url::Url;

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures outcomes for later assertions.
pub struct MockResultOutput {
    outcomes: Arc<Mutex<Vec<LoadOutcome>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns all captured outcomes.
    #[must_use]
    pub fn outcomes(&self) -> Vec<LoadOutcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, outcome: &LoadOutcome) -> anyhow::Result<()> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Ok(mut c) = self.flush_count.lock() {
            *c += 1;
        }
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Started` events.
    #[must_use]
    pub fn started_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Started { .. }))
            .count()
    }

    /// Returns the number of `Completed` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Completed { .. }))
            .count()
    }

    /// Returns the number of `Completed` events reporting a failure.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Completed { outcome } if !outcome.is_success()))
            .count()
    }

    /// Returns whether a `Finished` event was received.
    #[must_use]
    pub fn has_finished(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::Finished { .. }))
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { succeeded, failed } => Some((*succeeded, *failed)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Mock implementation of `FeedImageDataCache` for testing.
///
/// Records every save; can be told to fail.
pub struct MockImageDataCache {
    saved: Arc<Mutex<Vec<(Url, Vec<u8>)>>>,
    failure: Option<String>,
}

impl MockImageDataCache {
    /// Creates a cache that accepts every save.
    #[must_use]
    pub fn new() -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// Creates a cache that rejects every save with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Returns every attempted save, in order.
    #[must_use]
    pub fn saved(&self) -> Vec<(Url, Vec<u8>)> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockImageDataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedImageDataCache for MockImageDataCache {
    fn save(&self, data: &[u8], url: &Url) -> anyhow::Result<()> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((url.clone(), data.to_vec()));
        match &self.failure {
            Some(message) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

/// Mock feed image view whose image type is the raw payload.
///
/// Captures every displayed view model.
pub struct MockFeedImageView {
    models: Arc<Mutex<Vec<FeedImageViewModel<Vec<u8>>>>>,
}

impl MockFeedImageView {
    /// Creates a view with no captured models.
    #[must_use]
    pub fn new() -> Self {
        Self {
            models: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns every displayed model, in order.
    #[must_use]
    pub fn models(&self) -> Vec<FeedImageViewModel<Vec<u8>>> {
        self.models
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the most recently displayed model.
    #[must_use]
    pub fn last(&self) -> Option<FeedImageViewModel<Vec<u8>>> {
        self.models().pop()
    }
}

impl Default for MockFeedImageView {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedImageView for MockFeedImageView {
    type Image = Vec<u8>;

    fn display(&self, model: FeedImageViewModel<Vec<u8>>) {
        self.models
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(model);
    }
}

/// Message captured by [`MockFeedViews`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedViewMessage {
    /// Feed view received entries.
    Display(FeedViewModel),
    /// Loading view received a state.
    Loading(FeedLoadingViewModel),
    /// Error view received a state.
    Error(FeedErrorViewModel),
}

/// Mock implementing all three feed views over one shared message log.
///
/// Clones share the log, so hand one clone to each presenter slot.
#[derive(Clone, Default)]
pub struct MockFeedViews {
    messages: Arc<Mutex<Vec<FeedViewMessage>>>,
}

impl MockFeedViews {
    /// Creates views with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every captured message, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<FeedViewMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, message: FeedViewMessage) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

impl FeedView for MockFeedViews {
    fn display(&self, model: FeedViewModel) {
        self.push(FeedViewMessage::Display(model));
    }
}

impl FeedLoadingView for MockFeedViews {
    fn display(&self, model: FeedLoadingViewModel) {
        self.push(FeedViewMessage::Loading(model));
    }
}

impl FeedErrorView for MockFeedViews {
    fn display(&self, model: FeedErrorViewModel) {
        self.push(FeedViewMessage::Error(model));
    }
}
