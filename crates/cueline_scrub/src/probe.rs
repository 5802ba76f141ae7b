// SPDX-License-Identifier: MIT OR Apache-2.0
//! Probe leaves that record every evaluation they receive.

use cueline_sequencer::{LeafDocument, Signal, TimedAction};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// One evaluation delivered to a leaf
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Leaf name
    pub name: String,
    /// Local time it was evaluated at
    pub local_time: f32,
    /// Transition signal
    pub signal: Signal,
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.signal {
            Signal::Init => write!(f, "{} <- {:.3} (init)", self.name, self.local_time),
            Signal::None => write!(f, "{} <- {:.3}", self.name, self.local_time),
        }
    }
}

/// Shared, ordered record of dispatches
#[derive(Debug, Clone, Default)]
pub struct DispatchLog(Arc<Mutex<Vec<Dispatch>>>);

impl DispatchLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, dispatch: Dispatch) {
        self.0.lock().push(dispatch);
    }

    /// Take every dispatch recorded so far
    pub fn take(&self) -> Vec<Dispatch> {
        std::mem::take(&mut *self.0.lock())
    }

    /// Number of dispatches per leaf, in first-seen order
    pub fn counts(dispatches: &[Dispatch]) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        for dispatch in dispatches {
            *counts.entry(dispatch.name.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Leaf factory for [`TrackDocument::build_with`](cueline_sequencer::TrackDocument::build_with)
    pub fn probe_for(&self, leaf: &LeafDocument) -> Box<dyn TimedAction> {
        Box::new(Probe {
            name: leaf.name.clone(),
            duration: leaf.duration,
            open_ended: leaf.open_ended,
            log: self.clone(),
        })
    }
}

/// Leaf action that records its evaluations
#[derive(Debug)]
pub struct Probe {
    name: String,
    duration: f32,
    open_ended: bool,
    log: DispatchLog,
}

impl TimedAction for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn set_local_time(&mut self, local_time: f32, signal: Signal) {
        tracing::trace!("{} evaluated at {:.3} ({:?})", self.name, local_time, signal);
        self.log.push(Dispatch {
            name: self.name.clone(),
            local_time,
            signal,
        });
    }

    fn is_open_ended(&self) -> bool {
        self.open_ended
    }
}
