//! Presenter for a single feed image cell.

use crate::domain::FeedImage;

/// Everything a cell needs to render one feed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedImageViewModel<I> {
    /// Caption.
    pub description: Option<String>,
    /// Place name.
    pub location: Option<String>,
    /// Decoded image, once available.
    pub image: Option<I>,
    /// Whether a load is in flight.
    pub is_loading: bool,
    /// Whether the cell should offer a retry.
    pub should_retry: bool,
}

impl<I> FeedImageViewModel<I> {
    /// Returns whether the location label should be shown.
    #[must_use]
    pub const fn has_location(&self) -> bool {
        self.location.is_some()
    }
}

/// Port for views that render a feed image cell.
pub trait FeedImageView: Send + Sync {
    /// Decoded image type the view can draw.
    type Image;

    /// Renders the given state.
    fn display(&self, model: FeedImageViewModel<Self::Image>);
}

/// Maps image loading events onto [`FeedImageViewModel`]s.
///
/// `image_transformer` turns raw bytes into the view's image type and
/// returns `None` for undecodable data, which is shown as a retry state.
pub struct FeedImagePresenter<V, F> {
    view: V,
    image_transformer: F,
}

impl<V, F> FeedImagePresenter<V, F>
where
    V: FeedImageView,
    F: Fn(&[u8]) -> Option<V::Image>,
{
    /// Creates a presenter driving `view`.
    pub const fn new(view: V, image_transformer: F) -> Self {
        Self {
            view,
            image_transformer,
        }
    }

    /// Returns the driven view.
    pub const fn view(&self) -> &V {
        &self.view
    }

    /// Shows the loading state.
    pub fn did_start_loading_image_data(&self, model: &FeedImage) {
        self.view.display(FeedImageViewModel {
            description: model.description.clone(),
            location: model.location.clone(),
            image: None,
            is_loading: true,
            should_retry: false,
        });
    }

    /// Shows the decoded image, or the retry state when decoding fails.
    pub fn did_finish_loading_image_data(&self, data: &[u8], model: &FeedImage) {
        let image = (self.image_transformer)(data);
        let should_retry = image.is_none();
        self.view.display(FeedImageViewModel {
            description: model.description.clone(),
            location: model.location.clone(),
            image,
            is_loading: false,
            should_retry,
        });
    }

    /// Shows the retry state.
    pub fn did_finish_loading_image_data_with_error(&self, model: &FeedImage) {
        self.view.display(FeedImageViewModel {
            description: model.description.clone(),
            location: model.location.clone(),
            image: None,
            is_loading: false,
            should_retry: true,
        });
    }
}
