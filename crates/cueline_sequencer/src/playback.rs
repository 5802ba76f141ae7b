// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback controller that drives a track from a frame loop or a scrub
//! slider.

use crate::action::Signal;
use crate::error::Result;
use crate::track::Track;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
    /// Playing in reverse
    Reverse,
}

/// Playback controller for a track
#[derive(Debug, Clone)]
pub struct PlaybackController {
    /// Current playback time
    pub time: f32,
    /// Playback state
    pub state: PlaybackState,
    /// Playback speed multiplier
    pub speed: f32,
    /// Whether playback wraps around at the ends
    pub looping: bool,
    /// Loop start point (for loop range)
    pub loop_start: Option<f32>,
    /// Loop end point (for loop range)
    pub loop_end: Option<f32>,
    /// Next evaluation starts the track afresh
    needs_init: bool,
}

impl PlaybackController {
    /// Create a new playback controller
    pub fn new() -> Self {
        Self {
            time: 0.0,
            state: PlaybackState::Stopped,
            speed: 1.0,
            looping: false,
            loop_start: None,
            loop_end: None,
            needs_init: true,
        }
    }

    /// Advance playback by `delta_time` and apply the new time to the track
    pub fn update(&mut self, delta_time: f32, track: &mut Track) -> Result<()> {
        match self.state {
            PlaybackState::Playing => {
                self.time += delta_time * self.speed;
                self.check_bounds(track);
            }
            PlaybackState::Reverse => {
                self.time -= delta_time * self.speed;
                self.check_bounds_reverse(track);
            }
            PlaybackState::Paused | PlaybackState::Stopped => return Ok(()),
        }

        let result = self.apply(track);
        // Stopped at an end: the next play starts afresh
        if self.state == PlaybackState::Stopped {
            self.needs_init = true;
        }
        result
    }

    /// Apply the current time to the track without advancing
    pub fn apply(&mut self, track: &mut Track) -> Result<()> {
        let signal = if self.needs_init { Signal::Init } else { Signal::None };
        self.needs_init = false;
        track.evaluate_at(self.time, signal)
    }

    /// Check and handle end of track
    fn check_bounds(&mut self, track: &Track) {
        let end_time = self.loop_end.unwrap_or(track.duration());

        if self.time >= end_time {
            if self.looping || self.loop_end.is_some() {
                let start = self.loop_start.unwrap_or(0.0);
                self.time = start + (self.time - end_time);
            } else {
                self.time = end_time;
                self.state = PlaybackState::Stopped;
                tracing::info!("Playback reached end of {}", track.name());
            }
        }
    }

    /// Check and handle reverse playback bounds
    fn check_bounds_reverse(&mut self, track: &Track) {
        let start_time = self.loop_start.unwrap_or(0.0);

        if self.time <= start_time {
            if self.looping || self.loop_start.is_some() {
                let end = self.loop_end.unwrap_or(track.duration());
                self.time = end - (start_time - self.time);
            } else {
                self.time = start_time;
                self.state = PlaybackState::Stopped;
                tracing::info!("Playback reached start of {}", track.name());
            }
        }
    }

    /// Play from current position.
    ///
    /// The first evaluation after construction or [`stop`](Self::stop)
    /// initializes the track.
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing || self.state == PlaybackState::Reverse {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop and reset to beginning
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = self.loop_start.unwrap_or(0.0);
        self.needs_init = true;
    }

    /// Toggle play/pause
    pub fn toggle_playback(&mut self) {
        match self.state {
            PlaybackState::Playing | PlaybackState::Reverse => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.play(),
        }
    }

    /// Play in reverse
    pub fn play_reverse(&mut self) {
        self.state = PlaybackState::Reverse;
    }

    /// Scrub to a specific time and apply it
    pub fn seek(&mut self, time: f32, track: &mut Track) -> Result<()> {
        self.time = time.max(0.0);
        self.apply(track)
    }

    /// Jump to a time and initialize the track there
    pub fn restart_at(&mut self, time: f32, track: &mut Track) -> Result<()> {
        self.time = time.max(0.0);
        self.needs_init = true;
        self.apply(track)
    }

    /// Set loop range
    pub fn set_loop_range(&mut self, start: f32, end: f32) {
        self.loop_start = Some(start);
        self.loop_end = Some(end);
    }

    /// Clear loop range
    pub fn clear_loop_range(&mut self) {
        self.loop_start = None;
        self.loop_end = None;
    }

    /// Is currently playing (forward or reverse)
    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing | PlaybackState::Reverse)
    }

    /// Get current frame number at a frame rate
    pub fn current_frame(&self, frame_rate: f32) -> u32 {
        (self.time * frame_rate) as u32
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}
