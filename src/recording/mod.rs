// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recording and file exchange.
//!
//! This module provides:
//! - Live capture of key presses into note events
//! - The JSON recording file format
//! - Validation of untrusted recording files

pub mod capture;
pub mod file;
pub mod note;
pub mod validate;

pub use capture::{Recorder, RecordingState};
pub use file::{file_name_for, NoteRecord, RecordingFile, SaveError};
pub use note::{NoteEvent, Recording};
pub use validate::{load_file, parse_recording, LoadError};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_export_then_load_round_trip() {
        let t0 = Instant::now();
        let mut recorder = Recorder::new();
        recorder.start(t0);

        let steps: [(&str, u64, u64); 4] = [
            ("C3", 0, 500),
            ("E3", 600, 300),
            ("G#4", 650, 1234),
            ("B5", 2000, 1),
        ];
        for (name, start, _) in steps {
            let pitch = name.parse().unwrap();
            recorder.press(pitch, t0 + Duration::from_micros(start * 1000 + 7));
        }
        for (name, start, hold) in steps {
            let pitch = name.parse().unwrap();
            recorder.release(pitch, t0 + Duration::from_micros((start + hold) * 1000 + 7));
        }
        recorder.stop();

        let dir = tempfile::tempdir().unwrap();
        let (exported, path) = recorder.export_to("Round Trip", dir.path()).unwrap();
        let loaded = load_file(&path).unwrap();

        assert_eq!(loaded, exported);
        assert_eq!(loaded.notes.len(), 4);
    }

    #[test]
    fn test_state_default() {
        assert_eq!(Recorder::new().state(), RecordingState::Idle);
    }
}
