// SPDX-License-Identifier: MIT OR Apache-2.0
//! Anchors: how an entry is placed relative to its predecessor or to the
//! start of the track.

use serde::{Deserialize, Serialize};

/// Reference point an entry's offset is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnchorType {
    /// Gap after the previous entry's end
    #[default]
    PreviousEnd,
    /// Offset from the previous entry's start
    PreviousStart,
    /// Absolute offset from the track's start
    TrackStart,
}

impl AnchorType {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::PreviousEnd => "PreviousEnd",
            Self::PreviousStart => "PreviousStart",
            Self::TrackStart => "TrackStart",
        }
    }
}

/// An offset paired with the reference point it is measured from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Offset in seconds, never negative
    pub offset: f32,
    /// Reference point
    pub kind: AnchorType,
}

impl Anchor {
    /// Create an anchor
    pub fn new(offset: f32, kind: AnchorType) -> Self {
        Self { offset, kind }
    }

    /// Directly after the previous entry
    pub fn after_previous() -> Self {
        Self::new(0.0, AnchorType::PreviousEnd)
    }

    /// At an absolute time on the track
    pub fn at(offset: f32) -> Self {
        Self::new(offset, AnchorType::TrackStart)
    }

    /// Check that the offset is usable for layout
    pub fn is_valid(&self) -> bool {
        self.offset.is_finite() && self.offset >= 0.0
    }

    /// Gap between the accumulated track duration and this entry's start.
    ///
    /// `previous_duration` is the duration of the preceding entry's action,
    /// if there is one.
    pub fn fill_time(&self, track_duration: f32, previous_duration: Option<f32>) -> f32 {
        match self.kind {
            AnchorType::PreviousEnd => self.offset,
            AnchorType::PreviousStart => match previous_duration {
                Some(duration) => self.offset - duration,
                None => self.offset,
            },
            AnchorType::TrackStart => self.offset - track_duration,
        }
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::after_previous()
    }
}
