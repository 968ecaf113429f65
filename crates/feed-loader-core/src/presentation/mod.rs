//! Headless presentation logic for the image feed.
//!
//! Presenters turn loader events into view models; views decide how to draw
//! them. Nothing here knows about a GUI toolkit.

mod adapter;
mod decode;
mod feed;
mod feed_image;

pub use adapter::{FeedImageCellControllerDelegate, FeedImageDataLoaderPresentationAdapter};
pub use decode::decode_image;
pub use feed::{
    FeedErrorView, FeedErrorViewModel, FeedLoadingView, FeedLoadingViewModel, FeedPresenter,
    FeedView, FeedViewModel,
};
pub use feed_image::{FeedImagePresenter, FeedImageView, FeedImageViewModel};
