// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for the piano.
//!
//! Read from YAML or TOML, chosen by file extension. Every field has a
//! default so an empty file is a valid configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::control::{Keymap, ReleaseMode};
use crate::playback::PlaybackSpeed;

/// Piano settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PianoConfig {
    /// Name written into exported recordings
    pub recording_name: String,
    /// Where exports are written
    pub recordings_dir: PathBuf,
    /// Directory holding C3.wav, C4.wav and C5.wav
    pub samples_dir: PathBuf,
    /// Playback speed when prepared mode starts
    pub default_speed: f64,
    /// Auto-release delay for terminals without key-up events (0 disables)
    pub release_timeout_ms: u64,
    /// Simultaneous sample voices
    pub max_voices: usize,
    /// Log file used while the terminal UI is running
    pub log_file: PathBuf,
    /// Key to pitch overrides, e.g. `q: C3`. Empty keeps the default layout.
    pub keymap: BTreeMap<String, String>,
}

impl Default for PianoConfig {
    fn default() -> Self {
        Self {
            recording_name: "My Song".to_string(),
            recordings_dir: PathBuf::from("."),
            samples_dir: PathBuf::from("samples"),
            default_speed: 1.0,
            release_timeout_ms: 250,
            max_voices: 32,
            log_file: PathBuf::from("keys.log"),
            keymap: BTreeMap::new(),
        }
    }
}

impl PianoConfig {
    /// Load from a `.yaml`, `.yml` or `.toml` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = match extension(path).as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml(&contents),
            Some("toml") => Self::from_toml(&contents),
            _ => bail!("Unsupported config format: {:?} (expected .yaml, .yml or .toml)", path),
        };
        config.with_context(|| format!("Invalid config file: {:?}", path))
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Save to a file, format chosen by extension (YAML when unknown)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = match extension(path).as_deref() {
            Some("toml") => self.to_toml()?,
            _ => self.to_yaml()?,
        };
        fs::write(path, text).with_context(|| format!("Failed to write config file: {:?}", path))
    }

    /// Validate and build the keymap
    pub fn keymap(&self) -> Result<Keymap> {
        if self.keymap.is_empty() {
            return Ok(Keymap::default());
        }
        Keymap::from_entries(&self.keymap).context("Invalid keymap")
    }

    /// Starting playback speed, clamped to the supported range
    pub fn speed(&self) -> PlaybackSpeed {
        PlaybackSpeed::new(self.default_speed)
    }

    /// Key release detection implied by `release_timeout_ms`
    pub fn release_mode(&self) -> ReleaseMode {
        match self.release_timeout_ms {
            0 => ReleaseMode::Explicit,
            ms => ReleaseMode::Timeout(Duration::from_millis(ms)),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
