// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Loading and validating recordings from untrusted text.
//!
//! Every failure is a [`LoadError`]; nothing here panics on bad input.
//! The variants exist for diagnostics only. Callers that just need to
//! tell the user "this file is not a valid recording" can rely on every
//! format variant sharing the same message prefix.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::error::Category;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::file::RecordingFile;
use super::note::{covered_duration, duration_to_millis, millis_to_duration, NoteEvent, Recording};
use crate::music::Pitch;

/// Reasons a recording is rejected
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid recording format: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid recording format: {0}")]
    Shape(&'static str),

    #[error("invalid recording format: total duration {0} is negative")]
    NegativeTotalDuration(f64),

    #[error("invalid recording format: no notes")]
    EmptyNotes,

    #[error("invalid recording format: note {index} starts before the note preceding it")]
    OutOfOrder { index: usize },

    #[error("invalid recording format: note {index} has unknown key {key:?}")]
    UnknownPitch { index: usize, key: String },

    #[error("invalid recording format: note {index} has a negative start time")]
    NegativeStart { index: usize },

    #[error("invalid recording format: note {index} has a negative duration")]
    NegativeHold { index: usize },

    #[error("invalid recording format: notes end at {end_ms}ms, after the total duration {total_ms}ms")]
    Coverage { end_ms: f64, total_ms: f64 },

    #[error("failed to read recording: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// Whether the file was read but its content is not a valid recording
    pub fn is_format_error(&self) -> bool {
        !matches!(self, LoadError::Io(_))
    }

    /// Whether the text is not JSON at all, as opposed to JSON of the wrong shape
    pub fn is_syntax_error(&self) -> bool {
        match self {
            LoadError::Parse(e) => matches!(e.classify(), Category::Syntax | Category::Eof),
            _ => false,
        }
    }
}

/// Parse and validate a recording document
pub fn parse_recording(text: &str) -> Result<Recording, LoadError> {
    let result = parse_document(text).and_then(validate);

    if let Err(ref e) = result {
        warn!(error = %e, "rejected recording");
    }
    result
}

/// Read a recording file from disk and validate it
pub fn load_file(path: impl AsRef<Path>) -> Result<Recording, LoadError> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_recording(&text)
}

/// Parse the document, insisting on JSON objects where records are expected.
///
/// Serde would otherwise accept a positional array in place of a struct.
fn parse_document(text: &str) -> Result<RecordingFile, LoadError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(LoadError::Shape("document is not an object"));
    }
    if let Some(Value::Array(notes)) = value.get("notes") {
        if notes.iter().any(|n| !n.is_object()) {
            return Err(LoadError::Shape("note is not an object"));
        }
    }
    Ok(RecordingFile::deserialize(value)?)
}

/// Validate a parsed document and convert it into a [`Recording`]
pub fn validate(file: RecordingFile) -> Result<Recording, LoadError> {
    if file.duration < 0.0 {
        return Err(LoadError::NegativeTotalDuration(file.duration));
    }
    if file.notes.is_empty() {
        return Err(LoadError::EmptyNotes);
    }

    // Non-decreasing start times; the loader never re-sorts
    if let Some(index) = file
        .notes
        .windows(2)
        .position(|w| w[1].start_time < w[0].start_time)
    {
        return Err(LoadError::OutOfOrder { index: index + 1 });
    }

    let mut notes = Vec::with_capacity(file.notes.len());

    for (index, record) in file.notes.iter().enumerate() {
        let pitch: Pitch = record.key.parse().map_err(|_| LoadError::UnknownPitch {
            index,
            key: record.key.clone(),
        })?;
        if record.start_time < 0.0 {
            return Err(LoadError::NegativeStart { index });
        }
        if record.duration < 0.0 {
            return Err(LoadError::NegativeHold { index });
        }

        notes.push(NoteEvent::new(
            pitch,
            millis_to_duration(record.start_time),
            millis_to_duration(record.duration),
        ));
    }

    // Compared at nanosecond resolution, the same rounding export used
    let total_duration = millis_to_duration(file.duration);
    let end = covered_duration(&notes);
    if end > total_duration {
        return Err(LoadError::Coverage {
            end_ms: duration_to_millis(end),
            total_ms: file.duration,
        });
    }

    Ok(Recording {
        name: file.name,
        total_duration,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const VALID: &str = r#"{
        "name": "My Song",
        "duration": 900,
        "notes": [
            { "key": "C3", "startTime": 0, "duration": 500 },
            { "key": "E3", "startTime": 600, "duration": 300 }
        ]
    }"#;

    #[test]
    fn test_parse_valid() {
        let recording = parse_recording(VALID).unwrap();
        assert_eq!(recording.name, "My Song");
        assert_eq!(recording.total_duration, Duration::from_millis(900));
        assert_eq!(recording.notes.len(), 2);
        assert_eq!(recording.notes[1].pitch.to_string(), "E3");
        assert_eq!(recording.notes[1].start_offset, Duration::from_millis(600));
        assert_eq!(recording.notes[1].hold, Duration::from_millis(300));
    }

    #[test]
    fn test_fractional_millis() {
        let text = r#"{"name":"f","duration":12.75,"notes":[{"key":"A4","startTime":1.25,"duration":11.5}]}"#;
        let recording = parse_recording(text).unwrap();
        assert_eq!(recording.notes[0].start_offset, Duration::from_micros(1250));
        assert_eq!(recording.total_duration, Duration::from_micros(12750));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let text = r#"{"name":"x","duration":10,"bpm":120,"notes":[{"key":"C4","startTime":0,"duration":10,"velocity":3}]}"#;
        assert!(parse_recording(text).is_ok());
    }

    #[test]
    fn test_rejects_unparsable_text() {
        for text in ["", "not json", "{\"name\": \"x\""] {
            assert!(matches!(parse_recording(text), Err(LoadError::Parse(_))), "{text:?}");
        }
        for text in ["[]", "null", "42", r#"["x", 10, []]"#] {
            assert!(matches!(parse_recording(text), Err(LoadError::Shape(_))), "{text:?}");
        }
    }

    #[test]
    fn test_syntax_errors_distinguished_from_type_errors() {
        for text in ["", "not json", "{\"name\": \"x\""] {
            assert!(parse_recording(text).unwrap_err().is_syntax_error(), "{text:?}");
        }
        for text in [
            r#"{"name":1,"duration":10,"notes":[{"key":"C4","startTime":0,"duration":1}]}"#,
            r#"{"name":"x","duration":10,"notes":[{"key":"C4","startTime":"0","duration":1}]}"#,
            r#"{"name":"x","duration":10,"notes":[]}"#,
        ] {
            assert!(!parse_recording(text).unwrap_err().is_syntax_error(), "{text}");
        }
    }

    #[test]
    fn test_rejects_wrong_types() {
        let cases = [
            r#"{"name":1,"duration":10,"notes":[{"key":"C4","startTime":0,"duration":1}]}"#,
            r#"{"name":"x","duration":"10","notes":[{"key":"C4","startTime":0,"duration":1}]}"#,
            r#"{"name":"x","duration":10,"notes":{}}"#,
            r#"{"name":"x","duration":10,"notes":[{"key":4,"startTime":0,"duration":1}]}"#,
            r#"{"name":"x","duration":10,"notes":[{"key":"C4","startTime":null,"duration":1}]}"#,
            r#"{"duration":10,"notes":[{"key":"C4","startTime":0,"duration":1}]}"#,
        ];
        for text in cases {
            assert!(matches!(parse_recording(text), Err(LoadError::Parse(_))), "{text}");
        }
    }

    #[test]
    fn test_rejects_positional_notes() {
        let text = r#"{"name":"x","duration":10,"notes":[["C4", 0, 1]]}"#;
        assert!(matches!(parse_recording(text), Err(LoadError::Shape(_))));

        let text = r#"{"name":"x","duration":10,"notes":[5]}"#;
        assert!(matches!(parse_recording(text), Err(LoadError::Shape(_))));
    }

    #[test]
    fn test_rejects_empty_notes() {
        let text = r#"{"name":"x","duration":10,"notes":[]}"#;
        assert!(matches!(parse_recording(text), Err(LoadError::EmptyNotes)));
    }

    #[test]
    fn test_rejects_unknown_pitch() {
        let text = r#"{"name":"x","duration":10,"notes":[{"key":"C4","startTime":0,"duration":1},{"key":"C6","startTime":1,"duration":1}]}"#;
        match parse_recording(text) {
            Err(LoadError::UnknownPitch { index, key }) => {
                assert_eq!(index, 1);
                assert_eq!(key, "C6");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_negative_values() {
        let total = r#"{"name":"x","duration":-1,"notes":[{"key":"C4","startTime":0,"duration":0}]}"#;
        assert!(matches!(parse_recording(total), Err(LoadError::NegativeTotalDuration(_))));

        let start = r#"{"name":"x","duration":10,"notes":[{"key":"C4","startTime":-5,"duration":1}]}"#;
        assert!(matches!(parse_recording(start), Err(LoadError::NegativeStart { index: 0 })));

        let hold = r#"{"name":"x","duration":10,"notes":[{"key":"C4","startTime":0,"duration":-1}]}"#;
        assert!(matches!(parse_recording(hold), Err(LoadError::NegativeHold { index: 0 })));
    }

    #[test]
    fn test_rejects_out_of_order() {
        let text = r#"{"name":"x","duration":1000,"notes":[
            {"key":"C4","startTime":500,"duration":1},
            {"key":"D4","startTime":100,"duration":1}
        ]}"#;
        assert!(matches!(parse_recording(text), Err(LoadError::OutOfOrder { index: 1 })));
    }

    #[test]
    fn test_equal_start_times_allowed() {
        let text = r#"{"name":"chord","duration":100,"notes":[
            {"key":"C4","startTime":0,"duration":100},
            {"key":"E4","startTime":0,"duration":100},
            {"key":"G4","startTime":0,"duration":100}
        ]}"#;
        assert_eq!(parse_recording(text).unwrap().len(), 3);
    }

    #[test]
    fn test_rejects_coverage_violation() {
        let text = r#"{"name":"x","duration":800,"notes":[
            {"key":"C3","startTime":0,"duration":500},
            {"key":"E3","startTime":600,"duration":300}
        ]}"#;
        match parse_recording(text) {
            Err(LoadError::Coverage { end_ms, total_ms }) => {
                assert_eq!(end_ms, 900.0);
                assert_eq!(total_ms, 800.0);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_coverage_uses_longest_note() {
        // Last note ends early but the first one rings past the total
        let text = r#"{"name":"x","duration":500,"notes":[
            {"key":"C3","startTime":0,"duration":1000},
            {"key":"E3","startTime":100,"duration":10}
        ]}"#;
        assert!(matches!(parse_recording(text), Err(LoadError::Coverage { .. })));
    }

    #[test]
    fn test_nanosecond_take_reloads() {
        use crate::recording::Recorder;
        use std::time::Instant;

        let t0 = Instant::now();
        let pressed = t0 + Duration::from_nanos(77_886_501_365);
        let c3: Pitch = "C3".parse().unwrap();

        let mut recorder = Recorder::new();
        recorder.start(t0);
        recorder.press(c3, pressed);
        recorder.release(c3, pressed + Duration::from_nanos(3_280_387_012));
        recorder.stop();

        let recording = recorder.export("Take");
        let reloaded = parse_recording(&recording.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, recording);
    }

    #[test]
    fn test_sub_millisecond_offsets_reload() {
        use crate::recording::Recorder;
        use std::time::Instant;

        // Odd nanosecond offsets whose millisecond sums do not add exactly in f64
        let t0 = Instant::now();
        let mut recorder = Recorder::new();
        recorder.start(t0);
        let mut offset: u64 = 0;
        for i in 0..200u64 {
            let pitch = Pitch::ALL[(i % Pitch::COUNT as u64) as usize];
            offset += 13_337_421 + i * 7_919;
            recorder.press(pitch, t0 + Duration::from_nanos(offset));
            recorder.release(pitch, t0 + Duration::from_nanos(offset + 99_999_937 + i * 101));
        }
        recorder.stop();

        let recording = recorder.export("Run");
        let reloaded = parse_recording(&recording.to_json().unwrap()).unwrap();
        assert_eq!(reloaded.notes, recording.notes);
        assert_eq!(reloaded.total_duration, recording.total_duration);
    }

    #[test]
    fn test_all_format_errors_share_message_prefix() {
        let texts = [
            "garbage",
            r#"{"name":"x","duration":10,"notes":[]}"#,
            r#"{"name":"x","duration":10,"notes":[{"key":"Q","startTime":0,"duration":1}]}"#,
        ];
        for text in texts {
            let err = parse_recording(text).unwrap_err();
            assert!(err.is_format_error());
            assert!(err.to_string().starts_with("invalid recording format"));
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
        assert!(!err.is_format_error());
    }
}
