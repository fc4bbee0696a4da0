// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The piano session.
//!
//! Ties live input, the recorder and the playback transport together
//! and owns the two modes: interactive (play and record) and prepared
//! (load and play back). Switching mode discards the state of the mode
//! being left, so after the first switch it must be confirmed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::audio::NotePlayer;
use crate::config::PianoConfig;
use crate::control::{KeySink, KeyboardInput};
use crate::music::Pitch;
use crate::playback::{PlaybackSpeed, PlaybackState, Transport, TransportEvent};
use crate::recording::{load_file, LoadError, Recorder, Recording, SaveError};

/// Shown when a file fails validation
pub const INVALID_FILE_NOTICE: &str = "Invalid file format or incorrect timing!";

/// Shown when a file is not JSON at all
pub const PARSE_ERROR_NOTICE: &str = "Error parsing the file!";

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Play live and record
    #[default]
    Interactive,
    /// Load a recording and play it back
    Prepared,
}

impl Mode {
    /// Question asked before switching into this mode
    pub fn confirmation_prompt(self) -> &'static str {
        match self {
            Mode::Prepared => {
                "Do you really want to switch to prepared mode? All unsaved recordings will be deleted."
            }
            Mode::Interactive => {
                "Do you really want to switch to interactive mode? All loaded files will not be saved."
            }
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Interactive => write!(f, "Interactive"),
            Mode::Prepared => write!(f, "Prepared"),
        }
    }
}

/// Result of asking for a mode change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSwitch {
    /// Already in that mode
    Unchanged,
    /// Switched immediately
    Switched,
    /// Waiting on [`Session::confirm_mode_switch`] or [`Session::cancel_mode_switch`]
    NeedsConfirmation,
}

/// Message shown to the user until dismissed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    /// Notice text
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(m) | Notice::Error(m) => m,
        }
    }
}

/// Session error types
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("nothing to export")]
    NothingToExport,

    #[error("not available in {0} mode")]
    WrongMode(Mode),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Elapsed recording time, shown as `m:ss`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingClock {
    seconds: u64,
}

impl RecordingClock {
    /// Clock for an elapsed duration, counting whole seconds
    pub fn new(elapsed: Duration) -> Self {
        Self {
            seconds: elapsed.as_secs(),
        }
    }

    /// The indicator dot blinks once per second
    pub fn dot_visible(&self) -> bool {
        self.seconds % 2 == 0
    }
}

impl fmt::Display for RecordingClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.seconds / 60, self.seconds % 60)
    }
}

/// Sounds and records live presses
struct Performer {
    player: Arc<dyn NotePlayer>,
    recorder: Recorder,
}

impl KeySink for Performer {
    fn key_pressed(&mut self, pitch: Pitch, now: Instant) {
        self.player.play_note(pitch);
        self.recorder.press(pitch, now);
    }

    fn key_released(&mut self, pitch: Pitch, now: Instant) {
        self.recorder.release(pitch, now);
    }
}

/// One run of the piano
pub struct Session {
    mode: Mode,
    first_switch: bool,
    pending_switch: Option<Mode>,
    performer: Performer,
    input: KeyboardInput,
    export_enabled: bool,
    transport: Transport,
    loaded: Option<Recording>,
    default_speed: PlaybackSpeed,
    recording_name: String,
    recordings_dir: PathBuf,
    notice: Option<Notice>,
}

impl Session {
    /// Create a session in interactive mode.
    ///
    /// Returns the receiver for playback events.
    pub fn new(
        config: &PianoConfig,
        player: Arc<dyn NotePlayer>,
        runtime: Handle,
    ) -> Result<(Self, UnboundedReceiver<TransportEvent>)> {
        let keymap = config.keymap()?;
        let (transport, events) = Transport::new(Arc::clone(&player), runtime);
        let default_speed = config.speed();
        transport.set_speed(default_speed);

        let session = Self {
            mode: Mode::default(),
            first_switch: true,
            pending_switch: None,
            performer: Performer {
                player,
                recorder: Recorder::new(),
            },
            input: KeyboardInput::new(keymap, config.release_mode()),
            export_enabled: false,
            transport,
            loaded: None,
            default_speed,
            recording_name: config.recording_name.clone(),
            recordings_dir: config.recordings_dir.clone(),
            notice: None,
        };
        Ok((session, events))
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Ask to switch mode
    pub fn request_mode(&mut self, mode: Mode) -> ModeSwitch {
        if mode == self.mode {
            self.pending_switch = None;
            return ModeSwitch::Unchanged;
        }
        if self.first_switch {
            self.apply_mode(mode);
            return ModeSwitch::Switched;
        }
        self.pending_switch = Some(mode);
        ModeSwitch::NeedsConfirmation
    }

    /// Mode waiting for confirmation
    pub fn pending_switch(&self) -> Option<Mode> {
        self.pending_switch
    }

    /// Apply the pending switch. Returns whether a switch happened.
    pub fn confirm_mode_switch(&mut self) -> bool {
        match self.pending_switch.take() {
            Some(mode) => {
                self.apply_mode(mode);
                true
            }
            None => false,
        }
    }

    /// Drop the pending switch
    pub fn cancel_mode_switch(&mut self) {
        self.pending_switch = None;
    }

    fn apply_mode(&mut self, mode: Mode) {
        match self.mode {
            Mode::Interactive => self.reset_interactive(),
            Mode::Prepared => self.reset_prepared(),
        }
        info!(from = %self.mode, to = %mode, "mode switched");
        self.mode = mode;
        self.first_switch = false;
    }

    fn reset_interactive(&mut self) {
        self.performer.recorder.reset();
        self.input.reset();
        self.export_enabled = false;
    }

    fn reset_prepared(&mut self) {
        self.transport.unload();
        self.transport.set_speed(self.default_speed);
        self.loaded = None;
    }

    // Live input

    /// Computer key pressed
    pub fn key_down(&mut self, key: char, repeat: bool, now: Instant) -> Option<Pitch> {
        self.input.key_down(key, repeat, now, &mut self.performer)
    }

    /// Computer key released
    pub fn key_up(&mut self, key: char, now: Instant) -> Option<Pitch> {
        self.input.key_up(key, now, &mut self.performer)
    }

    /// On-screen key clicked
    pub fn pointer_down(&mut self, pitch: Pitch, now: Instant) -> bool {
        self.input.pointer_down(pitch, now, &mut self.performer)
    }

    /// On-screen key let go
    pub fn pointer_up(&mut self, pitch: Pitch, now: Instant) -> bool {
        self.input.pointer_up(pitch, now, &mut self.performer)
    }

    /// Auto-release idle keys
    pub fn expire_keys(&mut self, now: Instant) -> Vec<Pitch> {
        self.input.expire(now, &mut self.performer)
    }

    /// Live input state
    pub fn input(&self) -> &KeyboardInput {
        &self.input
    }

    /// Switch key release detection
    pub fn input_mut(&mut self) -> &mut KeyboardInput {
        &mut self.input
    }

    // Recording

    /// Recorder state
    pub fn recorder(&self) -> &Recorder {
        &self.performer.recorder
    }

    /// Start capturing. Returns false outside interactive mode.
    pub fn start_recording(&mut self, now: Instant) -> bool {
        if self.mode != Mode::Interactive || self.performer.recorder.is_recording() {
            return false;
        }
        self.performer.recorder.start(now);
        self.export_enabled = false;
        true
    }

    /// Stop capturing. Export becomes available if anything was played.
    pub fn stop_recording(&mut self) -> bool {
        if !self.performer.recorder.is_recording() {
            return false;
        }
        self.performer.recorder.stop();
        self.export_enabled = self.performer.recorder.note_count() > 0;
        true
    }

    /// Whether [`Session::export`] would write a file
    pub fn can_export(&self) -> bool {
        self.export_enabled
    }

    /// Write the recording to the recordings directory
    pub fn export(&mut self) -> Result<PathBuf, SessionError> {
        if self.mode != Mode::Interactive {
            return Err(SessionError::WrongMode(self.mode));
        }
        if !self.export_enabled {
            return Err(SessionError::NothingToExport);
        }

        let (_, path) = self
            .performer
            .recorder
            .export_to(self.recording_name.as_str(), &self.recordings_dir)?;
        self.notice = Some(Notice::Info(format!("Saved {}", path.display())));
        Ok(path)
    }

    /// Recording time, while recording
    pub fn recording_clock(&self, now: Instant) -> Option<RecordingClock> {
        let recorder = &self.performer.recorder;
        recorder
            .is_recording()
            .then(|| RecordingClock::new(recorder.elapsed(now)))
    }

    // Playback

    /// Load a recording for playback.
    ///
    /// On failure the previous recording stays loaded and a notice is raised.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        if self.mode != Mode::Prepared {
            return Err(SessionError::WrongMode(self.mode));
        }

        let path = path.as_ref();
        match load_file(path) {
            Ok(recording) => {
                self.transport.load(&recording);
                info!(path = %path.display(), notes = recording.len(), "loaded for playback");
                self.loaded = Some(recording);
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "load failed");
                let message = match &e {
                    e if e.is_syntax_error() => PARSE_ERROR_NOTICE.to_string(),
                    LoadError::Io(io) => format!("Could not read {}: {}", path.display(), io),
                    _ => INVALID_FILE_NOTICE.to_string(),
                };
                self.notice = Some(Notice::Error(message));
                Err(e.into())
            }
        }
    }

    /// Recording loaded for playback
    pub fn loaded(&self) -> Option<&Recording> {
        self.loaded.as_ref()
    }

    /// Play/pause
    pub fn toggle_playback(&self) {
        self.transport.toggle();
    }

    /// Stop and rewind
    pub fn stop_playback(&self) {
        self.transport.stop();
    }

    /// Nudge playback speed
    pub fn adjust_speed(&self, delta: f64) -> PlaybackSpeed {
        let speed = self.transport.speed().nudged(delta);
        self.transport.set_speed(speed);
        speed
    }

    /// Current playback speed
    pub fn speed(&self) -> PlaybackSpeed {
        self.transport.speed()
    }

    /// Playback state
    pub fn playback_state(&self) -> PlaybackState {
        self.transport.state()
    }

    /// Playback progress (0.0 - 1.0)
    pub fn progress(&self) -> f64 {
        self.transport.progress()
    }

    // Notices

    /// Current notice
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Show a notice
    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Clear the notice
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}
