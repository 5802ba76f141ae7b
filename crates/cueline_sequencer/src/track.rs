// SPDX-License-Identifier: MIT OR Apache-2.0
//! The composite track: anchored layout plus scrub-safe time application.
//!
//! A [`Track`] owns an ordered list of entries. Layout is computed once at
//! construction and again whenever an anchor changes. Every call to
//! [`Track::evaluate_at`] compares the new time with the previously queried
//! one so that entries crossed between two calls still see their start or
//! end value, whichever direction time moved in.

use crate::action::{indent, Signal, TimedAction};
use crate::anchor::{Anchor, AnchorType};
use crate::entry::{EntryId, EntrySpec, TrackEntry};
use crate::error::{LayoutError, Result, TrackError};
use crate::layout::compute_layout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Counter for generated track names
static TRACK_NUM: AtomicUsize = AtomicUsize::new(1);

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

/// A sequence of timed actions that is itself a timed action
#[derive(Debug)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    name: String,
    entries: Vec<TrackEntry>,
    duration: f32,
    open_ended: bool,
    /// Time of the previous evaluation, used for crossing detection
    last_queried_time: f32,
    /// Entry evaluated by the previous call, by identity
    current_entry: Option<EntryId>,
}

impl Track {
    /// Create a named track from construction inputs.
    ///
    /// Invalid inputs are logged and skipped. Fails if the resulting
    /// anchors overlap.
    pub fn new(name: impl Into<String>, specs: impl IntoIterator<Item = EntrySpec>) -> Result<Self> {
        let name = name.into();
        let mut entries = Vec::new();
        for spec in specs {
            match spec.into_entry() {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Track {}: skipping entry: {}", name, e),
            }
        }

        let mut track = Self {
            id: TrackId::new(),
            name,
            entries,
            duration: 0.0,
            open_ended: true,
            last_queried_time: 0.0,
            current_entry: None,
        };
        track.relayout()?;
        track.last_queried_time = track.duration;
        Ok(track)
    }

    /// Create a track with a generated `Track-N` name
    pub fn unnamed(specs: impl IntoIterator<Item = EntrySpec>) -> Result<Self> {
        let num = TRACK_NUM.fetch_add(1, Ordering::Relaxed);
        Self::new(format!("Track-{num}"), specs)
    }

    /// Set open-endedness of the track as a whole
    pub fn with_open_ended(mut self, open_ended: bool) -> Self {
        self.open_ended = open_ended;
        self
    }

    /// Track name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total duration (end of the last entry, 0 when empty)
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Get entry count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the track has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get all entries in evaluation order
    pub fn entries(&self) -> &[TrackEntry] {
        &self.entries
    }

    /// Get the entry at an index
    pub fn entry(&self, index: usize) -> Option<&TrackEntry> {
        self.entries.get(index)
    }

    /// Find the first entry whose action has this name
    pub fn entry_by_name(&self, name: &str) -> Option<&TrackEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Time of the previous evaluation
    pub fn last_queried_time(&self) -> f32 {
        self.last_queried_time
    }

    /// Entry evaluated by the previous call, if any
    pub fn current_entry(&self) -> Option<&TrackEntry> {
        let id = self.current_entry?;
        self.entries.iter().find(|e| e.id == id)
    }

    /// Forget scrubbing state, as if playback starts over from the end
    pub fn reset(&mut self) {
        self.last_queried_time = self.duration;
        self.current_entry = None;
    }

    /// Recompute every placement from the current anchors.
    ///
    /// Placements are only written back if the whole layout succeeds.
    fn relayout(&mut self) -> std::result::Result<(), LayoutError> {
        let layout = compute_layout(&self.entries)?;
        for (entry, placement) in self.entries.iter_mut().zip(&layout.placements) {
            entry.place(placement.start_time, placement.end_time);
        }
        self.duration = layout.duration;
        tracing::debug!("Track {} laid out: {} entries, duration {:.2}", self.name, self.entries.len(), self.duration);
        Ok(())
    }

    /// Change the anchor of the first entry named `name` and lay out the
    /// whole track again.
    ///
    /// On failure the track is left exactly as it was.
    pub fn set_entry_anchor(&mut self, name: &str, offset: f32, kind: AnchorType) -> Result<()> {
        let Some(index) = self.entries.iter().position(|e| e.name() == name) else {
            tracing::warn!("Track {}: no entry named {}", self.name, name);
            return Err(TrackError::NotFound(name.to_string()));
        };

        let anchor = Anchor::new(offset, kind);
        if !anchor.is_valid() {
            return Err(TrackError::InvalidEntrySpec(format!(
                "{name}: offset {offset} must be a non-negative number"
            )));
        }

        let previous = self.entries[index].anchor();
        self.entries[index].set_anchor(anchor);
        if let Err(e) = self.relayout() {
            self.entries[index].set_anchor(previous);
            return Err(e.into());
        }
        Ok(())
    }

    /// Start time of the first entry named `name`
    pub fn start_time_of(&self, name: &str) -> Option<f32> {
        self.lookup(name).map(TrackEntry::start_time)
    }

    /// End time of the first entry named `name`
    pub fn end_time_of(&self, name: &str) -> Option<f32> {
        self.lookup(name).map(TrackEntry::end_time)
    }

    /// Start time of an entry by identity
    pub fn start_time_of_entry(&self, id: EntryId) -> Option<f32> {
        let found = self.entries.iter().find(|e| e.id == id);
        if found.is_none() {
            tracing::warn!("Track {}: entry {:?} not found", self.name, id);
        }
        found.map(TrackEntry::start_time)
    }

    fn lookup(&self, name: &str) -> Option<&TrackEntry> {
        let found = self.entry_by_name(name);
        if found.is_none() {
            tracing::warn!("Track {}: no entry named {}", self.name, name);
        }
        found
    }

    /// Apply a track time.
    ///
    /// Entries fully passed since the previous call are driven to their
    /// end value, the entry containing `t` is evaluated at its local time,
    /// and an entry whose start was crossed going backwards is snapped to
    /// its start. Scanning stops at the first entry that contains `t` or
    /// starts after it, so a long backward jump only snaps that one entry.
    ///
    /// [`Signal::Init`] resets the scrubbing state first.
    pub fn evaluate_at(&mut self, t: f32, signal: Signal) -> Result<()> {
        if self.entries.is_empty() {
            tracing::warn!("Track {}: no entries to evaluate", self.name);
            return Err(TrackError::NotReady(self.name.clone()));
        }
        // Before the start of the track
        if t.is_nan() || t < 0.0 {
            return Ok(());
        }

        if signal.is_init() {
            self.reset();
        }
        let prev_t = self.last_queried_time;
        let prev_entry = self.current_entry;
        let mut current = None;

        for entry in &mut self.entries {
            let start = entry.start_time();
            let end = entry.end_time();

            if t < start {
                if prev_t > start {
                    tracing::trace!("{}: crossed start going backwards", entry.name());
                    entry.action_mut().set_local_time(0.0, Signal::None);
                }
                break;
            } else if entry.contains(t) {
                let signal = if prev_t < start || prev_entry != Some(entry.id) {
                    Signal::Init
                } else {
                    signal
                };
                entry.action_mut().set_local_time(t - start, signal);
                current = Some(entry.id);
                break;
            } else if prev_t < end || (signal.is_init() && entry.action().is_open_ended()) {
                tracing::trace!("{}: crossed end", entry.name());
                let duration = entry.action().duration();
                entry.action_mut().set_local_time(duration, Signal::None);
            }
        }

        self.current_entry = current;
        self.last_queried_time = t;
        Ok(())
    }

    /// Nested listing of the track and every entry's placement
    pub fn render(&self, depth: usize) -> String {
        let mut lines = vec![format!("{}{} dur: {:.2}", indent(depth), self.name, self.duration)];
        for entry in &self.entries {
            let placement = format!(" start: {:.2} end: {:.2}", entry.start_time(), entry.end_time());
            let rendered = entry.action().render(depth + 1);
            match rendered.split_once('\n') {
                Some((head, rest)) => lines.push(format!("{head}{placement}\n{rest}")),
                None => lines.push(format!("{rendered}{placement}")),
            }
        }
        lines.join("\n")
    }
}

impl TimedAction for Track {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn set_local_time(&mut self, local_time: f32, signal: Signal) {
        // NotReady is already logged
        let _ = self.evaluate_at(local_time, signal);
    }

    fn is_open_ended(&self) -> bool {
        self.open_ended
    }

    fn render(&self, depth: usize) -> String {
        Track::render(self, depth)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Wait;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<(String, f32, Signal)>>>;

    /// Leaf that records every evaluation into a shared log
    struct Recorder {
        name: String,
        duration: f32,
        open_ended: bool,
        log: Log,
    }

    impl TimedAction for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn duration(&self) -> f32 {
            self.duration
        }

        fn set_local_time(&mut self, local_time: f32, signal: Signal) {
            self.log.borrow_mut().push((self.name.clone(), local_time, signal));
        }

        fn is_open_ended(&self) -> bool {
            self.open_ended
        }
    }

    fn recorder(log: &Log, name: &str, duration: f32) -> Recorder {
        Recorder {
            name: name.to_string(),
            duration,
            open_ended: true,
            log: Rc::clone(log),
        }
    }

    fn drain(log: &Log) -> Vec<(String, f32, Signal)> {
        log.borrow_mut().drain(..).collect()
    }

    fn call(name: &str, t: f32, signal: Signal) -> (String, f32, Signal) {
        (name.to_string(), t, signal)
    }

    /// a [0,2], b [2,5], c [5,6]
    fn abc(log: &Log) -> Track {
        Track::new(
            "abc",
            vec![
                EntrySpec::action(recorder(log, "a", 2.0)),
                EntrySpec::action(recorder(log, "b", 3.0)),
                EntrySpec::action(recorder(log, "c", 1.0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_basic_sequencing() {
        let log = Log::default();
        let track = abc(&log);
        assert_eq!(track.duration(), 6.0);
        assert_eq!(track.start_time_of("b"), Some(2.0));
        assert_eq!(track.end_time_of("b"), Some(5.0));
        assert_eq!(track.start_time_of("c"), Some(5.0));
        assert_eq!(track.last_queried_time(), 6.0);
    }

    #[test]
    fn test_absolute_anchoring() {
        let track = Track::new(
            "abs",
            vec![
                EntrySpec::action(Wait::new("a", 3.0)),
                EntrySpec::anchored(10.0, Wait::new("b", 2.0), AnchorType::TrackStart),
            ],
        )
        .unwrap();
        assert_eq!(track.start_time_of("b"), Some(10.0));
        assert_eq!(track.end_time_of("b"), Some(12.0));
        assert_eq!(track.duration(), 12.0);
    }

    #[test]
    fn test_overlap_rejected_at_construction() {
        let result = Track::new(
            "bad",
            vec![
                EntrySpec::action(Wait::new("a", 5.0)),
                EntrySpec::anchored(2.0, Wait::new("b", 1.0), AnchorType::PreviousStart),
            ],
        );
        assert!(matches!(
            result,
            Err(TrackError::Layout(LayoutError::Overlap { index: 1, .. }))
        ));
    }

    #[test]
    fn test_invalid_spec_skipped() {
        let track = Track::new(
            "skip",
            vec![
                EntrySpec::action(Wait::new("a", 1.0)),
                EntrySpec::at(-2.0, Wait::new("bad", 1.0)),
                EntrySpec::action(Wait::new("c", 1.0)),
            ],
        )
        .unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.start_time_of("c"), Some(1.0));
        assert_eq!(track.start_time_of("bad"), None);
    }

    #[test]
    fn test_generated_names_are_unique() {
        let first = Track::unnamed(vec![EntrySpec::action(Wait::new("a", 1.0))]).unwrap();
        let second = Track::unnamed(vec![EntrySpec::action(Wait::new("a", 1.0))]).unwrap();
        assert!(first.name().starts_with("Track-"));
        assert_ne!(first.name(), second.name());
    }

    #[test]
    fn test_positional_and_identity_access() {
        let log = Log::default();
        let track = abc(&log);
        let b = track.entry(1).unwrap();
        assert_eq!(b.name(), "b");
        assert_eq!(track.start_time_of_entry(b.id), Some(2.0));
        assert_eq!(track.start_time_of_entry(EntryId::new()), None);
        assert!(track.entry(3).is_none());
    }

    #[test]
    fn test_empty_track_not_ready() {
        let mut track = Track::new("empty", Vec::new()).unwrap();
        assert_eq!(track.duration(), 0.0);
        assert_eq!(
            track.evaluate_at(0.0, Signal::None),
            Err(TrackError::NotReady("empty".to_string()))
        );
    }

    #[test]
    fn test_negative_time_dispatches_nothing() {
        let log = Log::default();
        let mut track = abc(&log);
        track.evaluate_at(-1.0, Signal::None).unwrap();
        assert!(drain(&log).is_empty());
        assert!(track.current_entry().is_none());
    }

    #[test]
    fn test_first_evaluation_initializes() {
        let log = Log::default();
        let mut track = abc(&log);
        track.evaluate_at(0.5, Signal::None).unwrap();
        assert_eq!(drain(&log), vec![call("a", 0.5, Signal::Init)]);
        assert_eq!(track.current_entry().map(TrackEntry::name), Some("a"));
    }

    #[test]
    fn test_forward_crossing_fires_end_value_once() {
        let log = Log::default();
        let mut track = Track::new("one", vec![EntrySpec::action(recorder(&log, "a", 2.0))]).unwrap();

        track.evaluate_at(1.9, Signal::None).unwrap();
        drain(&log);

        track.evaluate_at(2.1, Signal::None).unwrap();
        assert_eq!(drain(&log), vec![call("a", 2.0, Signal::None)]);

        track.evaluate_at(2.2, Signal::None).unwrap();
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn test_backward_crossing_fires_start_value() {
        let log = Log::default();
        let mut track = Track::new("one", vec![EntrySpec::at(2.0, recorder(&log, "b", 2.0))]).unwrap();

        track.evaluate_at(2.1, Signal::None).unwrap();
        drain(&log);

        track.evaluate_at(1.9, Signal::None).unwrap();
        assert_eq!(drain(&log), vec![call("b", 0.0, Signal::None)]);
        assert!(track.current_entry().is_none());
    }

    #[test]
    fn test_entering_next_entry_forces_init() {
        let log = Log::default();
        let mut track = abc(&log);
        track.evaluate_at(1.0, Signal::None).unwrap();
        drain(&log);

        track.evaluate_at(3.0, Signal::None).unwrap();
        assert_eq!(
            drain(&log),
            vec![call("a", 2.0, Signal::None), call("b", 1.0, Signal::Init)]
        );
    }

    #[test]
    fn test_different_entry_forces_init_without_crossing_start() {
        let log = Log::default();
        let mut track = Track::new(
            "gap",
            vec![
                EntrySpec::action(recorder(&log, "a", 1.0)),
                EntrySpec::anchored(2.0, recorder(&log, "b", 2.0), AnchorType::PreviousEnd),
                EntrySpec::anchored(1.0, recorder(&log, "c", 1.0), AnchorType::PreviousEnd),
            ],
        )
        .unwrap();
        // Past everything: no entry is current
        track.evaluate_at(7.5, Signal::None).unwrap();
        drain(&log);

        // Coming from later than b's start, but b was not current
        track.evaluate_at(4.0, Signal::None).unwrap();
        assert_eq!(drain(&log), vec![call("b", 1.0, Signal::Init)]);

        // Same entry again keeps the raw signal
        track.evaluate_at(4.5, Signal::None).unwrap();
        assert_eq!(drain(&log), vec![call("b", 1.5, Signal::None)]);
    }

    #[test]
    fn test_repeated_time_is_idempotent() {
        let log = Log::default();
        let mut track = abc(&log);
        track.evaluate_at(2.5, Signal::None).unwrap();
        drain(&log);

        track.evaluate_at(3.0, Signal::None).unwrap();
        let first = drain(&log);
        track.evaluate_at(3.0, Signal::None).unwrap();
        let second = drain(&log);

        assert_eq!(first, vec![call("b", 1.0, Signal::None)]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_large_forward_jump_finalizes_every_passed_entry() {
        let log = Log::default();
        let mut track = abc(&log);
        track.evaluate_at(0.5, Signal::None).unwrap();
        drain(&log);

        track.evaluate_at(5.5, Signal::None).unwrap();
        assert_eq!(
            drain(&log),
            vec![
                call("a", 2.0, Signal::None),
                call("b", 3.0, Signal::None),
                call("c", 0.5, Signal::Init),
            ]
        );
    }

    #[test]
    fn test_large_backward_jump_snaps_only_first_entry() {
        // Known asymmetry: only the first entry starting after t is snapped
        let log = Log::default();
        let mut track = Track::new(
            "gaps",
            vec![
                EntrySpec::action(recorder(&log, "a", 1.0)),
                EntrySpec::anchored(1.0, recorder(&log, "b", 1.0), AnchorType::PreviousEnd),
                EntrySpec::anchored(1.0, recorder(&log, "c", 1.0), AnchorType::PreviousEnd),
            ],
        )
        .unwrap();
        track.evaluate_at(5.5, Signal::None).unwrap();
        drain(&log);

        track.evaluate_at(1.5, Signal::None).unwrap();
        assert_eq!(drain(&log), vec![call("b", 0.0, Signal::None)]);
    }

    #[test]
    fn test_init_past_open_ended_entry_drives_end_value() {
        let log = Log::default();
        let mut closed = recorder(&log, "closed", 1.0);
        closed.open_ended = false;
        let mut track = Track::new(
            "init",
            vec![
                EntrySpec::action(recorder(&log, "open", 1.0)),
                EntrySpec::action(closed),
                EntrySpec::action(recorder(&log, "last", 2.0)),
            ],
        )
        .unwrap();
        track.evaluate_at(1.0, Signal::None).unwrap();
        drain(&log);

        track.evaluate_at(3.0, Signal::Init).unwrap();
        assert_eq!(
            drain(&log),
            vec![call("open", 1.0, Signal::None), call("last", 1.0, Signal::Init)]
        );
    }

    #[test]
    fn test_anchor_mutation_reflows_downstream() {
        let track_entries = ["a", "b", "c", "d"]
            .into_iter()
            .map(|name| EntrySpec::action(Wait::new(name, 1.0)));
        let mut track = Track::new("chain", track_entries).unwrap();
        assert_eq!(track.duration(), 4.0);

        track.set_entry_anchor("b", 2.0, AnchorType::PreviousEnd).unwrap();
        assert_eq!(track.start_time_of("a"), Some(0.0));
        assert_eq!(track.end_time_of("a"), Some(1.0));
        assert_eq!(track.start_time_of("b"), Some(3.0));
        assert_eq!(track.start_time_of("c"), Some(4.0));
        assert_eq!(track.start_time_of("d"), Some(5.0));
        assert_eq!(track.duration(), 6.0);
    }

    #[test]
    fn test_anchor_mutation_unknown_name() {
        let mut track = Track::new("one", vec![EntrySpec::action(Wait::new("a", 1.0))]).unwrap();
        let result = track.set_entry_anchor("missing", 1.0, AnchorType::TrackStart);
        assert_eq!(result, Err(TrackError::NotFound("missing".to_string())));
        assert_eq!(track.duration(), 1.0);
    }

    #[test]
    fn test_anchor_mutation_overlap_leaves_track_unchanged() {
        let mut track = Track::new(
            "two",
            vec![
                EntrySpec::action(Wait::new("a", 5.0)),
                EntrySpec::action(Wait::new("b", 1.0)),
            ],
        )
        .unwrap();
        let result = track.set_entry_anchor("b", 2.0, AnchorType::PreviousStart);
        assert!(matches!(result, Err(TrackError::Layout(_))));
        assert_eq!(track.entry(1).unwrap().anchor(), Anchor::after_previous());
        assert_eq!(track.start_time_of("b"), Some(5.0));
        assert_eq!(track.duration(), 6.0);
    }

    #[test]
    fn test_duplicate_names_first_match_wins() {
        let mut track = Track::new(
            "dups",
            vec![
                EntrySpec::action(Wait::new("x", 1.0)),
                EntrySpec::action(Wait::new("x", 2.0)),
            ],
        )
        .unwrap();
        assert_eq!(track.start_time_of("x"), Some(0.0));

        track.set_entry_anchor("x", 1.0, AnchorType::TrackStart).unwrap();
        assert_eq!(track.entry(0).unwrap().start_time(), 1.0);
        assert_eq!(track.entry(1).unwrap().start_time(), 2.0);
    }

    #[test]
    fn test_nested_track_dispatch() {
        let log = Log::default();
        let inner = Track::new(
            "inner",
            vec![
                EntrySpec::action(recorder(&log, "x", 1.0)),
                EntrySpec::action(recorder(&log, "y", 1.0)),
            ],
        )
        .unwrap();
        let mut outer = Track::new(
            "outer",
            vec![
                EntrySpec::action(recorder(&log, "a", 1.0)),
                EntrySpec::action(inner),
            ],
        )
        .unwrap();
        assert_eq!(outer.duration(), 3.0);

        outer.evaluate_at(0.5, Signal::None).unwrap();
        drain(&log);

        outer.evaluate_at(2.5, Signal::None).unwrap();
        assert_eq!(
            drain(&log),
            vec![
                call("a", 1.0, Signal::None),
                call("x", 1.0, Signal::None),
                call("y", 0.5, Signal::Init),
            ]
        );
    }

    #[test]
    fn test_render() {
        let inner = Track::new("inner", vec![EntrySpec::action(Wait::new("x", 1.0))]).unwrap();
        let outer = Track::new(
            "outer",
            vec![
                EntrySpec::action(Wait::new("a", 1.0)),
                EntrySpec::action(inner),
            ],
        )
        .unwrap();
        let expected = "outer dur: 2.00\n  a dur: 1.00 start: 0.00 end: 1.00\n  inner dur: 1.00 start: 1.00 end: 2.00\n    x dur: 1.00 start: 0.00 end: 1.00";
        assert_eq!(outer.render(0), expected);
        assert_eq!(outer.to_string(), expected);
    }
}
