//! Load outcome types reported by front ends.

use serde::{Deserialize, Serialize};

/// Reported outcome of loading one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadOutcome {
    /// Locator that was requested.
    pub url: String,
    /// Whether the load succeeded.
    pub status: LoadStatus,
    /// Payload size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    /// Hex SHA-256 of the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Decoded dimensions, when the payload is a recognizable image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<ImageDimensions>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Completion time (ISO 8601).
    pub timestamp: String,
}

impl LoadOutcome {
    /// Builds a successful outcome.
    #[must_use]
    pub fn success(
        url: impl Into<String>,
        bytes: usize,
        sha256: impl Into<String>,
        dimensions: Option<ImageDimensions>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status: LoadStatus::Success,
            bytes: Some(bytes),
            sha256: Some(sha256.into()),
            dimensions,
            error: None,
            timestamp: timestamp.into(),
        }
    }

    /// Builds a failed outcome.
    #[must_use]
    pub fn failure(
        url: impl Into<String>,
        error: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status: LoadStatus::Failure,
            bytes: None,
            sha256: None,
            dimensions: None,
            error: Some(error.into()),
            timestamp: timestamp.into(),
        }
    }

    /// Returns true for successful loads.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == LoadStatus::Success
    }
}

/// Load status.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Payload delivered.
    Success,
    /// Error delivered.
    Failure,
}

/// Image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// Creates new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}
