//! Error types for the mock-data crate.

use thiserror::Error;

/// Errors that can occur while generating a mock dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The requested history window is empty.
    #[error("history window must cover at least one day")]
    EmptyHistory,

    /// The requested history window is longer than supported.
    #[error("history window of {requested} days exceeds the maximum of {max} days")]
    HistoryTooLong {
        /// Number of days requested by the caller.
        requested: u32,
        /// Largest supported window.
        max: u32,
    },

    /// Failed to generate a staff name after the maximum number of retries.
    #[error("failed to generate a staff name after {max_attempts} attempts")]
    StaffNameGenerationFailed {
        /// Maximum number of attempts made.
        max_attempts: usize,
    },

    /// The anchor date cannot be moved back far enough for the history window.
    #[error("anchor date is too early for a {days} day history window")]
    AnchorOutOfRange {
        /// Number of days requested by the caller.
        days: u32,
    },
}
