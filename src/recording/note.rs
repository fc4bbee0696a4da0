// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recorded note events and recordings.

use std::time::Duration;

use crate::music::Pitch;

/// A recorded key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// Key that was pressed
    pub pitch: Pitch,
    /// Time since recording start
    pub start_offset: Duration,
    /// How long the key was held (zero while still held)
    pub hold: Duration,
}

impl NoteEvent {
    /// Create a note event
    pub fn new(pitch: Pitch, start_offset: Duration, hold: Duration) -> Self {
        Self {
            pitch,
            start_offset,
            hold,
        }
    }

    /// Create an open (not yet released) note event
    pub fn open(pitch: Pitch, start_offset: Duration) -> Self {
        Self::new(pitch, start_offset, Duration::ZERO)
    }

    /// Whether the key has not been released yet
    pub fn is_open(&self) -> bool {
        self.hold.is_zero()
    }

    /// Offset at which the note ends
    pub fn end_offset(&self) -> Duration {
        self.start_offset + self.hold
    }
}

/// A named, time-bounded sequence of note events.
///
/// Notes are ordered by key-down time, not by release time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    /// Recording name (also used for the file name)
    pub name: String,
    /// Total length, at least the end of the last-ending note
    pub total_duration: Duration,
    /// Notes in key-down order
    pub notes: Vec<NoteEvent>,
}

impl Recording {
    /// Build a recording whose total duration covers every note
    pub fn from_notes(name: impl Into<String>, notes: Vec<NoteEvent>) -> Self {
        let total_duration = covered_duration(&notes);
        Self {
            name: name.into(),
            total_duration,
            notes,
        }
    }

    /// Number of notes
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Whether there are no notes
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Latest end offset over all notes, or zero for no notes
pub fn covered_duration(notes: &[NoteEvent]) -> Duration {
    notes
        .iter()
        .map(NoteEvent::end_offset)
        .max()
        .unwrap_or(Duration::ZERO)
}

/// Convert a duration to fractional milliseconds
pub fn duration_to_millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Convert non-negative fractional milliseconds to a duration.
///
/// Rounds to the nearest nanosecond so that values written by
/// [`duration_to_millis`] convert back exactly.
pub fn millis_to_duration(millis: f64) -> Duration {
    Duration::from_nanos((millis * 1_000_000.0).round().max(0.0) as u64)
}
