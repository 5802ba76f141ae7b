// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declarative track descriptions.
//!
//! A [`TrackDocument`] is the serialized form of a track: its entries,
//! their anchors, and the leaf actions they hold. Documents are stored as
//! RON and turned into live [`Track`]s with [`TrackDocument::build`].

use crate::action::{TimedAction, Wait};
use crate::anchor::AnchorType;
use crate::entry::EntrySpec;
use crate::error::TrackError;
use crate::track::Track;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current document format version
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Document errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// RON could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON could not be written
    #[error("Serialization error: {0}")]
    Serialization(#[from] ron::Error),

    /// Document was written by a newer format
    #[error("Document version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the document
        found: u32,
        /// Newest version this build understands
        supported: u32,
    },

    /// Building the track failed
    #[error(transparent)]
    Track(#[from] TrackError),
}

fn default_version() -> u32 {
    DOCUMENT_FORMAT_VERSION
}

fn default_true() -> bool {
    true
}

/// Serialized form of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDocument {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Track name, generated when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the track is open-ended when nested
    #[serde(default = "default_true")]
    pub open_ended: bool,
    /// Entries in evaluation order
    #[serde(default)]
    pub entries: Vec<EntryDocument>,
}

/// Serialized form of one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDocument {
    /// Offset in seconds
    #[serde(default)]
    pub offset: Option<f32>,
    /// Reference point for the offset
    #[serde(default)]
    pub anchor: Option<AnchorType>,
    /// What the entry plays
    pub action: ActionDocument,
}

/// Serialized action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionDocument {
    /// A leaf action
    Leaf(LeafDocument),
    /// A nested track
    Track(TrackDocument),
}

/// Serialized leaf action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafDocument {
    /// Action name
    pub name: String,
    /// Duration in seconds
    pub duration: f32,
    /// Open-endedness
    #[serde(default = "default_true")]
    pub open_ended: bool,
}

impl LeafDocument {
    fn is_valid(&self) -> bool {
        self.duration.is_finite() && self.duration >= 0.0
    }
}

impl TrackDocument {
    /// Create an empty document
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION,
            name: Some(name.into()),
            open_ended: true,
            entries: Vec::new(),
        }
    }

    /// Append an entry
    pub fn with_entry(mut self, offset: Option<f32>, anchor: Option<AnchorType>, action: ActionDocument) -> Self {
        self.entries.push(EntryDocument { offset, anchor, action });
        self
    }

    /// Append a leaf placed directly after the previous entry
    pub fn with_leaf(self, name: impl Into<String>, duration: f32) -> Self {
        let leaf = LeafDocument {
            name: name.into(),
            duration,
            open_ended: true,
        };
        self.with_entry(None, None, ActionDocument::Leaf(leaf))
    }

    /// Parse a document from RON
    pub fn from_ron(text: &str) -> Result<Self, DocumentError> {
        let document: TrackDocument = ron::from_str(text)?;
        document.check_version()?;
        Ok(document)
    }

    /// Write the document as pretty RON
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    fn check_version(&self) -> Result<(), DocumentError> {
        if self.version > DOCUMENT_FORMAT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: self.version,
                supported: DOCUMENT_FORMAT_VERSION,
            });
        }
        if let Some(nested) = self.entries.iter().find_map(|e| match &e.action {
            ActionDocument::Track(track) => track.check_version().err(),
            ActionDocument::Leaf(_) => None,
        }) {
            return Err(nested);
        }
        Ok(())
    }

    /// Build a track whose leaves are [`Wait`] actions
    pub fn build(&self) -> Result<Track, DocumentError> {
        self.build_with(&mut |leaf: &LeafDocument| -> Box<dyn TimedAction> {
            Box::new(Wait::new(leaf.name.clone(), leaf.duration).with_open_ended(leaf.open_ended))
        })
    }

    /// Build a track, creating leaves with `make_leaf`.
    ///
    /// Leaves with unusable durations are logged and skipped.
    pub fn build_with<F>(&self, make_leaf: &mut F) -> Result<Track, DocumentError>
    where
        F: FnMut(&LeafDocument) -> Box<dyn TimedAction>,
    {
        let mut specs = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let action: Box<dyn TimedAction> = match &entry.action {
                ActionDocument::Leaf(leaf) if !leaf.is_valid() => {
                    tracing::warn!("Skipping leaf {}: invalid duration {}", leaf.name, leaf.duration);
                    continue;
                }
                ActionDocument::Leaf(leaf) => make_leaf(leaf),
                ActionDocument::Track(nested) => Box::new(nested.build_with(make_leaf)?),
            };
            let spec = match (entry.offset, entry.anchor) {
                (None, None) => EntrySpec::Action(action),
                (offset, anchor) => EntrySpec::Anchored {
                    offset: offset.unwrap_or(0.0),
                    action,
                    anchor,
                },
            };
            specs.push(spec);
        }

        let track = match &self.name {
            Some(name) => Track::new(name.clone(), specs)?,
            None => Track::unnamed(specs)?,
        };
        Ok(track.with_open_ended(self.open_ended))
    }
}
