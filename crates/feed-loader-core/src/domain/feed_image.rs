//! Feed image model.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// A single image entry in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedImage {
    /// Stable identifier of the entry.
    pub id: Uuid,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional place name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Where the image data lives.
    pub url: Url,
}

impl FeedImage {
    /// Creates a feed image with a fresh random id.
    #[must_use]
    pub fn new(description: Option<String>, location: Option<String>, url: Url) -> Self {
        Self {
            id: Uuid::new_v4(),
            description,
            location,
            url,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_assigns_distinct_ids() {
        let url = Url::parse("https://example.com/a.png").unwrap();
        let a = FeedImage::new(None, Some("Garth Pier".into()), url.clone());
        let b = FeedImage::new(None, Some("Garth Pier".into()), url);
        assert_ne!(a.id, b.id);
        assert_eq!(a.url, b.url);
    }
}
