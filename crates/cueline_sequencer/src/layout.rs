// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layout: converting anchors into absolute start and end times.

use crate::entry::TrackEntry;
use crate::error::LayoutError;

/// Absolute placement of one entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Start time on the track
    pub start_time: f32,
    /// End time on the track
    pub end_time: f32,
}

/// Result of laying out a list of entries
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    /// One placement per entry, in entry order
    pub placements: Vec<Placement>,
    /// Total track duration (end of the last entry)
    pub duration: f32,
}

/// Compute placements for every entry, in order.
///
/// Each entry is placed after the accumulated duration plus its fill
/// time. A negative fill time means the anchors overlap and is an error.
pub fn compute_layout(entries: &[TrackEntry]) -> Result<Layout, LayoutError> {
    let mut placements = Vec::with_capacity(entries.len());
    let mut track_duration = 0.0_f32;
    let mut previous_duration: Option<f32> = None;

    for (index, entry) in entries.iter().enumerate() {
        let duration = entry.action().duration();
        let fill_time = entry.anchor().fill_time(track_duration, previous_duration);
        if fill_time < 0.0 {
            return Err(LayoutError::Overlap {
                index,
                name: entry.name().to_string(),
                fill_time,
            });
        }

        let start_time = track_duration + fill_time;
        let end_time = start_time + duration;
        placements.push(Placement { start_time, end_time });

        track_duration = end_time;
        previous_duration = Some(duration);
    }

    tracing::trace!(entries = entries.len(), duration = track_duration, "Computed layout");

    Ok(Layout {
        placements,
        duration: track_duration,
    })
}
