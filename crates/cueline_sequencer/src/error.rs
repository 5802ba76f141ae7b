// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for track layout and evaluation.

use thiserror::Error;

/// Layout failure: the authored anchors place an entry before the end of
/// the accumulated timeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// Negative fill time computed for an entry
    #[error("Overlap detected at entry {index} ({name}): fill time {fill_time}")]
    Overlap {
        /// Position of the offending entry
        index: usize,
        /// Name of the offending entry's action
        name: String,
        /// The negative fill time that was computed
        fill_time: f32,
    },
}

/// Track errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    /// Layout could not be computed
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// No entry has an action with this name
    #[error("No entry named: {0}")]
    NotFound(String),

    /// The track has no entries to evaluate
    #[error("Track {0} has no entries")]
    NotReady(String),

    /// A construction input element was rejected
    #[error("Invalid entry spec: {0}")]
    InvalidEntrySpec(String),
}

/// Result type for track operations
pub type Result<T> = std::result::Result<T, TrackError>;
