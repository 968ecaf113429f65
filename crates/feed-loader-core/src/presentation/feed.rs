//! Presenter for the feed list as a whole.

use crate::domain::FeedImage;

/// Message shown when the feed cannot be loaded.
const FEED_CONNECTION_ERROR: &str = "Couldn't connect to server";

/// Feed screen title.
const FEED_TITLE: &str = "My Feed";

/// Loaded feed contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedViewModel {
    /// Entries in display order.
    pub feed: Vec<FeedImage>,
}

/// Loading indicator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedLoadingViewModel {
    /// Whether the feed is being loaded.
    pub is_loading: bool,
}

/// Error banner state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedErrorViewModel {
    /// Message to show, or `None` to hide the banner.
    pub message: Option<String>,
}

impl FeedErrorViewModel {
    /// Hidden banner.
    #[must_use]
    pub const fn no_error() -> Self {
        Self { message: None }
    }

    /// Banner showing `message`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// Port for views that render the feed list.
pub trait FeedView: Send + Sync {
    /// Renders the feed entries.
    fn display(&self, model: FeedViewModel);
}

/// Port for views that render the loading indicator.
pub trait FeedLoadingView: Send + Sync {
    /// Renders the loading state.
    fn display(&self, model: FeedLoadingViewModel);
}

/// Port for views that render the error banner.
pub trait FeedErrorView: Send + Sync {
    /// Renders the error state.
    fn display(&self, model: FeedErrorViewModel);
}

/// Maps feed loading events onto the three feed views.
pub struct FeedPresenter {
    feed_view: Box<dyn FeedView>,
    loading_view: Box<dyn FeedLoadingView>,
    error_view: Box<dyn FeedErrorView>,
}

impl FeedPresenter {
    /// Creates a presenter driving the given views.
    #[must_use]
    pub fn new(
        feed_view: Box<dyn FeedView>,
        loading_view: Box<dyn FeedLoadingView>,
        error_view: Box<dyn FeedErrorView>,
    ) -> Self {
        Self {
            feed_view,
            loading_view,
            error_view,
        }
    }

    /// Screen title.
    #[must_use]
    pub const fn title() -> &'static str {
        FEED_TITLE
    }

    /// Hides the error banner and shows the loading indicator.
    pub fn did_start_loading_feed(&self) {
        self.error_view.display(FeedErrorViewModel::no_error());
        self.loading_view
            .display(FeedLoadingViewModel { is_loading: true });
    }

    /// Shows the loaded entries and stops the loading indicator.
    pub fn did_finish_loading_feed(&self, feed: Vec<FeedImage>) {
        self.feed_view.display(FeedViewModel { feed });
        self.loading_view
            .display(FeedLoadingViewModel { is_loading: false });
    }

    /// Shows the connection error and stops the loading indicator.
    pub fn did_finish_loading_feed_with_error(&self) {
        self.error_view
            .display(FeedErrorViewModel::error(FEED_CONNECTION_ERROR));
        self.loading_view
            .display(FeedLoadingViewModel { is_loading: false });
    }
}
