// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline sequencing engine for Cueline.
//!
//! This crate composes independently playable timed actions into one
//! scrubbable composite:
//! - Anchored layout (after previous end, from previous start, absolute)
//! - Time application that detects entry/exit crossings in any direction
//! - Nesting, since a track is itself a timed action
//! - Playback control and declarative track documents
//!
//! ## Architecture
//!
//! The sequencer is built on:
//! - The [`TimedAction`] capability contract
//! - A pure layout pass over an indexed entry list
//! - A stateful [`Track`] that remembers the previous query time

pub mod action;
pub mod anchor;
pub mod document;
pub mod entry;
pub mod error;
pub mod layout;
pub mod playback;
pub mod track;

pub use action::{Callback, Signal, TimedAction, Wait};
pub use anchor::{Anchor, AnchorType};
pub use document::{ActionDocument, DocumentError, EntryDocument, LeafDocument, TrackDocument};
pub use entry::{EntryId, EntrySpec, TrackEntry};
pub use error::{LayoutError, Result, TrackError};
pub use layout::{compute_layout, Layout, Placement};
pub use playback::{PlaybackController, PlaybackState};
pub use track::{Track, TrackId};
