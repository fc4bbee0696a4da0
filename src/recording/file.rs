// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recording file format.
//!
//! Recordings are stored as a small JSON document:
//!
//! ```json
//! {
//!   "name": "My Song",
//!   "duration": 900,
//!   "notes": [
//!     { "key": "C3", "startTime": 0, "duration": 500 },
//!     { "key": "E3", "startTime": 600, "duration": 300 }
//!   ]
//! }
//! ```
//!
//! All times are milliseconds. The wire types here are deliberately
//! loose (`String` keys, `f64` times) so that the validator can report
//! exactly which rule a file breaks.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::note::{duration_to_millis, NoteEvent, Recording};

/// File extension for recordings
pub const EXTENSION: &str = "json";

/// Fallback file stem when a recording name is blank
const FALLBACK_STEM: &str = "recording";

/// Errors writing a recording
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to serialize recording: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level recording document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingFile {
    /// Recording name
    pub name: String,
    /// Total duration in milliseconds
    pub duration: f64,
    /// Notes in key-down order
    pub notes: Vec<NoteRecord>,
}

/// One note in a recording document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    /// Pitch name, e.g. `"C#4"`
    pub key: String,
    /// Start offset in milliseconds
    pub start_time: f64,
    /// Hold duration in milliseconds
    pub duration: f64,
}

impl From<&NoteEvent> for NoteRecord {
    fn from(note: &NoteEvent) -> Self {
        Self {
            key: note.pitch.to_string(),
            start_time: duration_to_millis(note.start_offset),
            duration: duration_to_millis(note.hold),
        }
    }
}

impl From<&Recording> for RecordingFile {
    fn from(recording: &Recording) -> Self {
        Self {
            name: recording.name.clone(),
            duration: duration_to_millis(recording.total_duration),
            notes: recording.notes.iter().map(NoteRecord::from).collect(),
        }
    }
}

impl Recording {
    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(&RecordingFile::from(self))?)
    }

    /// File name derived from the recording name
    pub fn file_name(&self) -> String {
        file_name_for(&self.name)
    }

    /// Write the recording into `dir`, returning the written path
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf, SaveError> {
        let path = dir.as_ref().join(self.file_name());
        let json = self.to_json()?;
        fs::write(&path, json).map_err(|source| SaveError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), notes = self.notes.len(), "recording saved");
        Ok(path)
    }
}

/// Derive a file name from a recording name.
///
/// Characters that are not allowed in file names on common platforms
/// are replaced with `_`.
pub fn file_name_for(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if stem.is_empty() {
        format!("{}.{}", FALLBACK_STEM, EXTENSION)
    } else {
        format!("{}.{}", stem, EXTENSION)
    }
}
