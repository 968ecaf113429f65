//! Progress reporting port for UI integration.

use crate::domain::LoadOutcome;

/// Events emitted while a batch of loads runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A load was started.
    Started {
        /// Requested locator.
        url: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total loads in batch, if known.
        total: Option<usize>,
    },
    /// A load finished, successfully or not.
    Completed {
        /// The reported outcome.
        outcome: LoadOutcome,
    },
    /// All loads have finished.
    Finished {
        /// Loads that delivered a payload.
        succeeded: usize,
        /// Loads that delivered an error.
        failed: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
