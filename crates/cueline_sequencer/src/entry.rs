// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track entries: placed actions and the inputs they are built from.

use crate::action::TimedAction;
use crate::anchor::{Anchor, AnchorType};
use crate::error::TrackError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    /// Create a new random entry ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// One placed action within a track
#[derive(Debug)]
pub struct TrackEntry {
    /// Unique entry ID
    pub id: EntryId,
    action: Box<dyn TimedAction>,
    anchor: Anchor,
    start_time: f32,
    end_time: f32,
}

impl TrackEntry {
    /// Wrap an action with an anchor. Placement is zero until laid out.
    pub fn new(action: Box<dyn TimedAction>, anchor: Anchor) -> Self {
        Self {
            id: EntryId::new(),
            action,
            anchor,
            start_time: 0.0,
            end_time: 0.0,
        }
    }

    /// Name of the wrapped action
    pub fn name(&self) -> &str {
        self.action.name()
    }

    /// The wrapped action
    pub fn action(&self) -> &dyn TimedAction {
        self.action.as_ref()
    }

    pub(crate) fn action_mut(&mut self) -> &mut dyn TimedAction {
        self.action.as_mut()
    }

    /// Authored anchor
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub(crate) fn set_anchor(&mut self, anchor: Anchor) {
        self.anchor = anchor;
    }

    /// Absolute start time on the track
    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    /// Absolute end time on the track
    pub fn end_time(&self) -> f32 {
        self.end_time
    }

    pub(crate) fn place(&mut self, start_time: f32, end_time: f32) {
        self.start_time = start_time;
        self.end_time = end_time;
    }

    /// Check if a track time falls inside this entry (bounds inclusive)
    pub fn contains(&self, time: f32) -> bool {
        time >= self.start_time && time <= self.end_time
    }
}

/// Construction input for one entry
pub enum EntrySpec {
    /// A bare action, placed directly after the previous entry
    Action(Box<dyn TimedAction>),
    /// An action with an explicit offset; the anchor type defaults to
    /// [`AnchorType::TrackStart`] when omitted
    Anchored {
        /// Offset in seconds
        offset: f32,
        /// The action to place
        action: Box<dyn TimedAction>,
        /// Reference point for the offset
        anchor: Option<AnchorType>,
    },
}

impl EntrySpec {
    /// Place an action directly after the previous entry
    pub fn action(action: impl TimedAction + 'static) -> Self {
        Self::Action(Box::new(action))
    }

    /// Place an action at an absolute track time
    pub fn at(offset: f32, action: impl TimedAction + 'static) -> Self {
        Self::Anchored {
            offset,
            action: Box::new(action),
            anchor: None,
        }
    }

    /// Place an action with an explicit anchor
    pub fn anchored(offset: f32, action: impl TimedAction + 'static, anchor: AnchorType) -> Self {
        Self::Anchored {
            offset,
            action: Box::new(action),
            anchor: Some(anchor),
        }
    }

    /// Validate the input and turn it into an unplaced entry
    pub fn into_entry(self) -> Result<TrackEntry, TrackError> {
        let (action, anchor) = match self {
            Self::Action(action) => (action, Anchor::after_previous()),
            Self::Anchored { offset, action, anchor } => {
                (action, Anchor::new(offset, anchor.unwrap_or(AnchorType::TrackStart)))
            }
        };

        if !anchor.is_valid() {
            return Err(TrackError::InvalidEntrySpec(format!(
                "{}: offset {} must be a non-negative number",
                action.name(),
                anchor.offset
            )));
        }
        let duration = action.duration();
        if !duration.is_finite() || duration < 0.0 {
            return Err(TrackError::InvalidEntrySpec(format!(
                "{}: duration {} must be a non-negative number",
                action.name(),
                duration
            )));
        }

        Ok(TrackEntry::new(action, anchor))
    }
}
