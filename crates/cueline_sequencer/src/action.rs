// SPDX-License-Identifier: MIT OR Apache-2.0
//! The capability contract every sequenced action satisfies.
//!
//! A [`Track`](crate::Track) never looks inside the actions it places; it
//! only asks for a name and a duration, and tells each action which local
//! time to show. Leaf actions and nested tracks both implement
//! [`TimedAction`], so tracks compose to any depth.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transition signal delivered alongside a local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Signal {
    /// Ordinary time update
    #[default]
    None,
    /// Fresh entry into the action, as if starting it
    Init,
}

impl Signal {
    /// Check if this is an initialization signal
    pub fn is_init(&self) -> bool {
        matches!(self, Signal::Init)
    }
}

/// A unit with a fixed duration that can be evaluated at any local time
pub trait TimedAction {
    /// Stable identifying name, used for lookups within a track
    fn name(&self) -> &str;

    /// Fixed duration in seconds (never negative)
    fn duration(&self) -> f32;

    /// Evaluate at a time relative to the action's own start.
    ///
    /// Must be idempotent for repeated calls with the same arguments and
    /// must not reenter the track that owns this action.
    fn set_local_time(&mut self, local_time: f32, signal: Signal);

    /// Whether the action is still driven to its end value when a track
    /// is initialized somewhere past it.
    fn is_open_ended(&self) -> bool {
        true
    }

    /// Human-readable one-line description, indented by `depth`
    fn render(&self, depth: usize) -> String {
        format!("{}{} dur: {:.2}", indent(depth), self.name(), self.duration())
    }
}

impl fmt::Debug for dyn TimedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedAction")
            .field("name", &self.name())
            .field("duration", &self.duration())
            .finish()
    }
}

pub(crate) fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// An action that does nothing but occupy time.
///
/// Remembers the last local time it was given, which makes it handy as a
/// spacer and as a probe in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Wait {
    name: String,
    duration: f32,
    open_ended: bool,
    local_time: Option<f32>,
}

impl Wait {
    /// Create a wait of the given duration (negative durations clamp to 0)
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
            open_ended: true,
            local_time: None,
        }
    }

    /// Set open-endedness
    pub fn with_open_ended(mut self, open_ended: bool) -> Self {
        self.open_ended = open_ended;
        self
    }

    /// Last local time applied, if any
    pub fn local_time(&self) -> Option<f32> {
        self.local_time
    }
}

impl TimedAction for Wait {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn set_local_time(&mut self, local_time: f32, _signal: Signal) {
        self.local_time = Some(local_time);
    }

    fn is_open_ended(&self) -> bool {
        self.open_ended
    }
}

/// An action that forwards every evaluation to a closure
pub struct Callback<F>
where
    F: FnMut(f32, Signal),
{
    name: String,
    duration: f32,
    open_ended: bool,
    func: F,
}

impl<F> Callback<F>
where
    F: FnMut(f32, Signal),
{
    /// Create a callback action
    pub fn new(name: impl Into<String>, duration: f32, func: F) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
            open_ended: true,
            func,
        }
    }

    /// Set open-endedness
    pub fn with_open_ended(mut self, open_ended: bool) -> Self {
        self.open_ended = open_ended;
        self
    }
}

impl<F> TimedAction for Callback<F>
where
    F: FnMut(f32, Signal),
{
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn set_local_time(&mut self, local_time: f32, signal: Signal) {
        (self.func)(local_time, signal);
    }

    fn is_open_ended(&self) -> bool {
        self.open_ended
    }
}
