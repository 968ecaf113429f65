//! Glue between a feed image cell, a loader and a presenter.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::{FeedImagePresenter, FeedImageView};
use crate::domain::FeedImage;
use crate::ports::{FeedImageDataLoader, FeedImageDataLoaderTask};

/// Events a feed image cell raises as it scrolls in and out of view.
pub trait FeedImageCellControllerDelegate: Send + Sync {
    /// The cell became visible, or the user asked to retry.
    fn did_request_image(&self);

    /// The cell left the screen before its image arrived.
    fn did_cancel_image_request(&self);
}

/// Loads a cell's image on request and reports progress to the presenter.
///
/// At most one load is tracked per cell; a new request cancels the previous
/// one.
pub struct FeedImageDataLoaderPresentationAdapter<V, F> {
    model: FeedImage,
    loader: Arc<dyn FeedImageDataLoader>,
    presenter: Arc<FeedImagePresenter<V, F>>,
    task: Mutex<Option<Box<dyn FeedImageDataLoaderTask>>>,
}

impl<V, F> FeedImageDataLoaderPresentationAdapter<V, F> {
    /// Creates an adapter for `model`.
    #[must_use]
    pub fn new(
        model: FeedImage,
        loader: Arc<dyn FeedImageDataLoader>,
        presenter: Arc<FeedImagePresenter<V, F>>,
    ) -> Self {
        Self {
            model,
            loader,
            presenter,
            task: Mutex::new(None),
        }
    }
}

impl<V, F> FeedImageCellControllerDelegate for FeedImageDataLoaderPresentationAdapter<V, F>
where
    V: FeedImageView + 'static,
    F: Fn(&[u8]) -> Option<V::Image> + Send + Sync + 'static,
{
    fn did_request_image(&self) {
        self.presenter.did_start_loading_image_data(&self.model);

        let presenter = Arc::clone(&self.presenter);
        let model = self.model.clone();
        let task = self.loader.load_image_data(
            &self.model.url,
            Box::new(move |result| match result {
                Ok(data) => presenter.did_finish_loading_image_data(&data, &model),
                Err(e) => {
                    debug!("Image load failed for {}: {e:#}", model.url);
                    presenter.did_finish_loading_image_data_with_error(&model);
                }
            }),
        );

        let previous = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    fn did_cancel_image_request(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.cancel();
        }
    }
}
