// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scrub session configuration.
//!
//! A session names the track document to load, how logging is filtered,
//! the frame rate used for playback steps, and the script of steps to run.

use cueline_sequencer::AnchorType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// One step of a scrub script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScrubStep {
    /// Evaluate at a time with a fresh start
    Init(f32),
    /// Jump to a time
    Seek(f32),
    /// Play forward for a number of seconds
    Play(f32),
    /// Play backward for a number of seconds
    Reverse(f32),
    /// Re-anchor an entry by name
    SetAnchor {
        /// Entry name
        name: String,
        /// New offset
        offset: f32,
        /// New reference point
        anchor: AnchorType,
    },
    /// Print the track layout
    Render,
}

/// Scrub session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubConfig {
    /// Format version
    pub version: u32,
    /// Extra tracing directive, e.g. `cueline_sequencer=trace`
    pub log_filter: String,
    /// Frames per second for playback steps
    pub frame_rate: f32,
    /// Whether playback wraps at the ends
    pub looping: bool,
    /// Track document, relative to the config file
    pub document: PathBuf,
    /// Steps to run, in order
    pub script: Vec<ScrubStep>,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            log_filter: "cueline_sequencer=info".to_string(),
            frame_rate: 30.0,
            looping: false,
            document: PathBuf::from("track.ron"),
            script: vec![ScrubStep::Render, ScrubStep::Init(0.0), ScrubStep::Play(1.0)],
        }
    }
}

impl ScrubConfig {
    /// Parse a config from RON text
    pub fn from_ron(text: &str) -> std::io::Result<Self> {
        let config: ScrubConfig = ron::from_str(text).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        // Version check
        if config.version > CONFIG_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Config version {} is newer than supported version {}",
                    config.version, CONFIG_FORMAT_VERSION
                ),
            ));
        }
        if !(config.frame_rate.is_finite() && config.frame_rate > 0.0) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Frame rate must be positive, got {}", config.frame_rate),
            ));
        }

        Ok(config)
    }

    /// Load a config from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Save the config to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, content)
    }

    /// Resolve the document path against the directory of the config file
    pub fn document_path(&self, config_path: &Path) -> PathBuf {
        match config_path.parent() {
            Some(dir) if self.document.is_relative() => dir.join(&self.document),
            _ => self.document.clone(),
        }
    }
}
