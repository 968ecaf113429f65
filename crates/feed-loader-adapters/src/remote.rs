//! HTTP adapter for loading image data.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use feed_loader_core::{
    spawn_load, Completer, Completion, FeedImageDataLoader, FeedImageDataLoaderTask, FetchResult,
    TaskRegistry,
};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Bytes read between cancellation checks.
const CHUNK_SIZE: usize = 16 * 1024;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors reported by [`RemoteFeedImageDataLoader`].
#[derive(Debug, Error)]
pub enum RemoteLoadError {
    /// The request could not be sent or the body could not be read.
    #[error("connectivity error: {0}")]
    Connectivity(String),
    /// The server answered, but not with image data.
    #[error("invalid data (HTTP {status})")]
    InvalidData {
        /// Response status code.
        status: u16,
    },
    /// The transfer was abandoned after the caller cancelled.
    #[error("transfer cancelled")]
    Cancelled,
}

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("feed-loader/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Loads image data over HTTP(S), one worker thread per request.
///
/// Only a `200 OK` response with a non-empty body counts as success.
/// Cancelling stops the transfer at the next chunk boundary.
pub struct RemoteFeedImageDataLoader {
    client: Client,
    registry: Arc<TaskRegistry>,
}

impl RemoteFeedImageDataLoader {
    /// Creates a loader with the given client settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;
        debug!(
            "HTTP loader ready (timeout {:?}, agent {})",
            config.timeout, config.user_agent
        );
        Ok(Self {
            client,
            registry: TaskRegistry::new(),
        })
    }

    /// Returns the number of requests neither completed nor cancelled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.registry.in_flight()
    }
}

impl FeedImageDataLoader for RemoteFeedImageDataLoader {
    fn load_image_data(&self, url: &Url, completion: Completion) -> Box<dyn FeedImageDataLoaderTask> {
        let client = self.client.clone();
        let url = url.clone();
        Box::new(spawn_load(
            &self.registry,
            "feed-image-http",
            completion,
            move |completer| fetch(&client, &url, completer),
        ))
    }
}

fn fetch(client: &Client, url: &Url, completer: &Completer) -> FetchResult {
    debug!("GET {url}");
    let mut response = client
        .get(url.clone())
        .send()
        .map_err(|e| RemoteLoadError::Connectivity(e.to_string()))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(RemoteLoadError::InvalidData {
            status: status.as_u16(),
        }
        .into());
    }

    let mut data = Vec::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        if completer.is_cancelled() {
            info!("Abandoning transfer of {url} after {} bytes", data.len());
            return Err(RemoteLoadError::Cancelled.into());
        }
        let read = response
            .read(&mut chunk)
            .map_err(|e| RemoteLoadError::Connectivity(e.to_string()))?;
        if read == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read]);
    }

    if data.is_empty() {
        return Err(RemoteLoadError::InvalidData {
            status: status.as_u16(),
        }
        .into());
    }

    debug!("Received {} bytes from {url}", data.len());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RemoteConfig::default();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.user_agent.starts_with("feed-loader/"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RemoteLoadError::InvalidData { status: 404 }.to_string(),
            "invalid data (HTTP 404)"
        );
        assert!(RemoteLoadError::Connectivity("refused".into())
            .to_string()
            .contains("refused"));
    }
}
