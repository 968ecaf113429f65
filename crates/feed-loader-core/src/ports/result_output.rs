//! Result output port for writing load outcomes.

use crate::domain::LoadOutcome;

/// Port for outputting load outcomes.
pub trait ResultOutput: Send + Sync {
    /// Writes a single outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, outcome: &LoadOutcome) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
