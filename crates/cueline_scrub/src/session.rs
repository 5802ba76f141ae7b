// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runs a scrub script against a track built from a document.

use crate::config::{ScrubConfig, ScrubStep};
use crate::probe::{Dispatch, DispatchLog};
use cueline_sequencer::{DocumentError, LeafDocument, PlaybackController, Track, TrackDocument, TrackError};
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum ScrubError {
    /// Reading or writing a file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The track document is unusable
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// The track rejected an operation
    #[error("Track error: {0}")]
    Track(#[from] TrackError),

}

/// What one script step did
#[derive(Debug, Clone)]
pub struct StepReport {
    /// The step that ran
    pub step: ScrubStep,
    /// Playback time after the step
    pub time: f32,
    /// Leaf evaluations caused by the step
    pub dispatches: Vec<Dispatch>,
    /// Layout listing, for render steps
    pub rendered: Option<String>,
}

/// A track under scripted control
pub struct Session {
    track: Track,
    playback: PlaybackController,
    log: DispatchLog,
    frame_rate: f32,
}

impl Session {
    /// Build the track with probe leaves
    pub fn new(config: &ScrubConfig, document: &TrackDocument) -> Result<Self, ScrubError> {
        let log = DispatchLog::new();
        let probes = log.clone();
        let track = document.build_with(&mut |leaf: &LeafDocument| probes.probe_for(leaf))?;

        let mut playback = PlaybackController::new();
        playback.looping = config.looping;

        tracing::info!("Loaded track {} ({:.2}s, {} entries)", track.name(), track.duration(), track.len());

        Ok(Self {
            track,
            playback,
            log,
            frame_rate: config.frame_rate,
        })
    }

    /// The track being driven
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Run every step in order
    pub fn run(&mut self, script: &[ScrubStep]) -> Result<Vec<StepReport>, ScrubError> {
        script.iter().map(|step| self.run_step(step)).collect()
    }

    /// Run a single step
    pub fn run_step(&mut self, step: &ScrubStep) -> Result<StepReport, ScrubError> {
        let mut rendered = None;
        match step {
            ScrubStep::Init(time) => {
                recoverable(self.playback.restart_at(*time, &mut self.track))?;
            }
            ScrubStep::Seek(time) => {
                recoverable(self.playback.seek(*time, &mut self.track))?;
            }
            ScrubStep::Play(seconds) => {
                self.playback.play();
                self.advance(*seconds)?;
            }
            ScrubStep::Reverse(seconds) => {
                self.playback.play_reverse();
                self.advance(*seconds)?;
            }
            ScrubStep::SetAnchor { name, offset, anchor } => {
                recoverable(self.track.set_entry_anchor(name, *offset, *anchor))?;
            }
            ScrubStep::Render => {
                rendered = Some(self.track.render(0));
            }
        }

        Ok(StepReport {
            step: step.clone(),
            time: self.playback.time,
            dispatches: self.log.take(),
            rendered,
        })
    }

    /// Step playback frame by frame, then pause
    fn advance(&mut self, seconds: f32) -> Result<(), ScrubError> {
        let frame = 1.0 / self.frame_rate;
        let mut elapsed = 0.0_f32;
        while seconds - elapsed > 1e-6 && self.playback.is_playing() {
            let delta = frame.min(seconds - elapsed);
            recoverable(self.playback.update(delta, &mut self.track))?;
            elapsed += delta;
        }
        self.playback.pause();
        Ok(())
    }
}

/// Keep going on lookup and empty-track conditions; stop on layout failures
fn recoverable(result: cueline_sequencer::Result<()>) -> Result<(), ScrubError> {
    match result {
        Ok(()) | Err(TrackError::NotFound(_) | TrackError::NotReady(_)) => Ok(()),
        Err(TrackError::InvalidEntrySpec(reason)) => {
            tracing::warn!("Ignoring step: {}", reason);
            Ok(())
        }
        Err(e @ TrackError::Layout(_)) => Err(e.into()),
    }
}
