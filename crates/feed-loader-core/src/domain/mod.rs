//! Core domain types for the feed image pipeline.

mod feed_image;
mod outcome;

pub use feed_image::FeedImage;
pub use outcome::{ImageDimensions, LoadOutcome, LoadStatus};
