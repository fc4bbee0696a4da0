// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Live key capture into a recording.
//!
//! The recorder turns key-down/key-up events into [`NoteEvent`]s whose
//! offsets are measured from the moment recording started. Re-press
//! suppression belongs to the input layer; the recorder records every
//! press it is given.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::file::SaveError;
use super::note::{NoteEvent, Recording};
use crate::music::Pitch;

/// Recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    /// Not recording
    #[default]
    Idle,
    /// Actively recording
    Recording,
}

/// Key recorder
#[derive(Debug, Default)]
pub struct Recorder {
    /// Current state
    state: RecordingState,
    /// Notes in key-down order
    notes: Vec<NoteEvent>,
    /// Session start
    started_at: Option<Instant>,
}

impl Recorder {
    /// Create an idle recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Check if recording
    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    /// Get recorded notes
    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    /// Get number of recorded notes
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Time since recording started, or zero when idle
    pub fn elapsed(&self, now: Instant) -> Duration {
        match (self.state, self.started_at) {
            (RecordingState::Recording, Some(start)) => now.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    /// Start a new recording. Ignored while already recording.
    pub fn start(&mut self, now: Instant) {
        if self.is_recording() {
            return;
        }

        self.notes.clear();
        self.started_at = Some(now);
        self.state = RecordingState::Recording;
        info!("recording started");
    }

    /// Stop recording. Keys still held stay as zero-length notes.
    pub fn stop(&mut self) {
        if !self.is_recording() {
            return;
        }

        self.state = RecordingState::Idle;
        info!(notes = self.notes.len(), "recording stopped");
    }

    /// Discard everything and return to idle
    pub fn reset(&mut self) {
        self.notes.clear();
        self.started_at = None;
        self.state = RecordingState::Idle;
    }

    /// Record a key-down
    pub fn press(&mut self, pitch: Pitch, now: Instant) {
        let Some(start) = self.active_start() else {
            return;
        };

        let offset = now.saturating_duration_since(start);
        self.notes.push(NoteEvent::open(pitch, offset));
        debug!(%pitch, midi = pitch.midi_number(), offset_ms = offset.as_millis() as u64, "note pressed");
    }

    /// Record a key-up, closing the most recent open note for `pitch`
    pub fn release(&mut self, pitch: Pitch, now: Instant) {
        let Some(start) = self.active_start() else {
            return;
        };

        let offset = now.saturating_duration_since(start);
        if let Some(note) = self
            .notes
            .iter_mut()
            .rev()
            .find(|n| n.pitch == pitch && n.is_open())
        {
            note.hold = offset.saturating_sub(note.start_offset);
            debug!(%pitch, hold_ms = note.hold.as_millis() as u64, "note released");
        }
    }

    /// Snapshot the buffer as a finished recording
    pub fn export(&self, name: impl Into<String>) -> Recording {
        Recording::from_notes(name, self.notes.clone())
    }

    /// Snapshot the buffer and write it into `dir`
    pub fn export_to(
        &self,
        name: impl Into<String>,
        dir: impl AsRef<Path>,
    ) -> Result<(Recording, PathBuf), SaveError> {
        let recording = self.export(name);
        let path = recording.save(dir)?;
        Ok((recording, path))
    }

    fn active_start(&self) -> Option<Instant> {
        if self.is_recording() {
            self.started_at
        } else {
            None
        }
    }
}
