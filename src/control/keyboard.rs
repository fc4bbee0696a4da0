// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Computer keyboard as a piano.
//!
//! [`Keymap`] turns characters into pitches. [`KeyboardInput`] tracks
//! which pitches are held, drops OS auto-repeat and duplicate presses,
//! and forwards real presses and releases to a [`KeySink`].
//!
//! Many terminals never report key releases. In
//! [`ReleaseMode::Timeout`] a held key is released once no press or
//! repeat has been seen for the timeout; call [`KeyboardInput::expire`]
//! from the UI tick.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::trace;

use crate::music::{Pitch, PitchParseError};

/// Default key layout: two rows per octave and a half, lowest key first
pub const DEFAULT_LAYOUT: [(char, &str); 29] = [
    ('q', "C3"),
    ('2', "C#3"),
    ('w', "D3"),
    ('3', "D#3"),
    ('e', "E3"),
    ('r', "F3"),
    ('5', "F#3"),
    ('t', "G3"),
    ('6', "G#3"),
    ('y', "A3"),
    ('7', "A#3"),
    ('u', "B3"),
    ('i', "C4"),
    ('9', "C#4"),
    ('o', "D4"),
    ('0', "D#4"),
    ('p', "E4"),
    ('z', "F4"),
    ('s', "F#4"),
    ('x', "G4"),
    ('d', "G#4"),
    ('c', "A4"),
    ('f', "A#4"),
    ('v', "B4"),
    ('b', "C5"),
    ('h', "C#5"),
    ('n', "D5"),
    ('j', "D#5"),
    ('m', "E5"),
];

/// Invalid keymap entry
#[derive(Debug, Error, PartialEq)]
pub enum KeymapError {
    #[error("keymap key {0:?} must be a single character")]
    NotSingleChar(String),

    #[error("keymap entry for {key:?}: {source}")]
    UnknownPitch {
        key: char,
        #[source]
        source: PitchParseError,
    },
}

/// Character to pitch table. Lookups ignore case.
#[derive(Debug, Clone, PartialEq)]
pub struct Keymap {
    keys: HashMap<char, Pitch>,
}

impl Keymap {
    /// An empty keymap
    pub fn empty() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Build from text entries such as `("q", "C3")`
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, KeymapError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut keymap = Self::empty();
        for (key, pitch) in entries {
            let key = key.as_ref();
            let mut chars = key.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Err(KeymapError::NotSingleChar(key.to_string()));
            };
            let pitch = pitch
                .as_ref()
                .parse()
                .map_err(|source| KeymapError::UnknownPitch { key: c, source })?;
            keymap.insert(c, pitch);
        }
        Ok(keymap)
    }

    /// Bind a key
    pub fn insert(&mut self, key: char, pitch: Pitch) {
        self.keys.insert(normalize(key), pitch);
    }

    /// Pitch bound to `key`
    pub fn pitch_for(&self, key: char) -> Option<Pitch> {
        self.keys.get(&normalize(key)).copied()
    }

    /// First key (alphabetically) bound to `pitch`, for labels
    pub fn key_for(&self, pitch: Pitch) -> Option<char> {
        self.keys
            .iter()
            .filter(|(_, p)| **p == pitch)
            .map(|(c, _)| *c)
            .min()
    }

    /// Number of bound keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if no keys are bound
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self::empty();
        for (key, name) in DEFAULT_LAYOUT {
            if let Ok(pitch) = name.parse() {
                keymap.insert(key, pitch);
            }
        }
        keymap
    }
}

fn normalize(key: char) -> char {
    key.to_lowercase().next().unwrap_or(key)
}

/// Receives deduplicated note presses and releases
pub trait KeySink {
    /// A pitch went down
    fn key_pressed(&mut self, pitch: Pitch, now: Instant);
    /// A pitch came up
    fn key_released(&mut self, pitch: Pitch, now: Instant);
}

/// How key releases are detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// The terminal reports releases
    Explicit,
    /// Release a key after it has been idle this long
    Timeout(Duration),
}

impl Default for ReleaseMode {
    fn default() -> Self {
        ReleaseMode::Timeout(Duration::from_millis(250))
    }
}

/// Held-key tracker
#[derive(Debug)]
pub struct KeyboardInput {
    keymap: Keymap,
    mode: ReleaseMode,
    /// Held pitches with the last time a key press refreshed them.
    /// Pointer holds have no deadline.
    held: BTreeMap<Pitch, Option<Instant>>,
}

impl KeyboardInput {
    /// Create input over `keymap`
    pub fn new(keymap: Keymap, mode: ReleaseMode) -> Self {
        Self {
            keymap,
            mode,
            held: BTreeMap::new(),
        }
    }

    /// Active keymap
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Release detection mode
    pub fn release_mode(&self) -> ReleaseMode {
        self.mode
    }

    /// Switch release detection (e.g. once the terminal reports releases)
    pub fn set_release_mode(&mut self, mode: ReleaseMode) {
        self.mode = mode;
    }

    /// Handle a key press. Returns the pitch if a new note started.
    pub fn key_down(
        &mut self,
        key: char,
        repeat: bool,
        now: Instant,
        sink: &mut impl KeySink,
    ) -> Option<Pitch> {
        let pitch = self.keymap.pitch_for(key)?;

        if let Some(seen) = self.held.get_mut(&pitch) {
            // Legacy terminals report holding a key as repeated presses
            if seen.is_some() {
                *seen = Some(now);
            }
            return None;
        }
        if repeat {
            return None;
        }

        self.held.insert(pitch, Some(now));
        sink.key_pressed(pitch, now);
        Some(pitch)
    }

    /// Handle a key release. Returns the pitch if a note ended.
    pub fn key_up(&mut self, key: char, now: Instant, sink: &mut impl KeySink) -> Option<Pitch> {
        let pitch = self.keymap.pitch_for(key)?;
        self.release(pitch, now, sink)
    }

    /// Handle a click or touch on an on-screen key
    pub fn pointer_down(&mut self, pitch: Pitch, now: Instant, sink: &mut impl KeySink) -> bool {
        if self.held.contains_key(&pitch) {
            return false;
        }
        self.held.insert(pitch, None);
        sink.key_pressed(pitch, now);
        true
    }

    /// Handle the end of a click or touch
    pub fn pointer_up(&mut self, pitch: Pitch, now: Instant, sink: &mut impl KeySink) -> bool {
        self.release(pitch, now, sink).is_some()
    }

    /// Release keys idle longer than the timeout. Returns released pitches.
    pub fn expire(&mut self, now: Instant, sink: &mut impl KeySink) -> Vec<Pitch> {
        let ReleaseMode::Timeout(timeout) = self.mode else {
            return Vec::new();
        };

        let stale: Vec<Pitch> = self
            .held
            .iter()
            .filter_map(|(pitch, seen)| {
                let seen = (*seen)?;
                (now.saturating_duration_since(seen) >= timeout).then_some(*pitch)
            })
            .collect();

        for pitch in &stale {
            trace!(%pitch, "auto-release");
            self.release(*pitch, now, sink);
        }
        stale
    }

    /// Check if a pitch is held
    pub fn is_held(&self, pitch: Pitch) -> bool {
        self.held.contains_key(&pitch)
    }

    /// Held pitches, lowest first
    pub fn held(&self) -> impl Iterator<Item = Pitch> + '_ {
        self.held.keys().copied()
    }

    /// Forget all held keys without reporting releases
    pub fn reset(&mut self) {
        self.held.clear();
    }

    fn release(&mut self, pitch: Pitch, now: Instant, sink: &mut impl KeySink) -> Option<Pitch> {
        self.held.remove(&pitch)?;
        sink.key_released(pitch, now);
        Some(pitch)
    }
}

impl Default for KeyboardInput {
    fn default() -> Self {
        Self::new(Keymap::default(), ReleaseMode::default())
    }
}
