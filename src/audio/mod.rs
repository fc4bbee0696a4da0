// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio for the keyboard.
//!
//! This module provides:
//! - The [`NotePlayer`] trait the rest of the crate sounds notes through
//! - A silent player for hosts without audio
//! - A sample player: three recorded C samples pitch-shifted per key,
//!   mixed into a cpal output stream

pub mod bank;
pub mod mixer;
pub mod output;

pub use bank::{Sample, SampleBank};
pub use mixer::Mixer;
pub use output::{list_devices, AudioConfig, AudioOutput};

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info};

use crate::music::Pitch;

/// Something that can sound a note.
///
/// Fire-and-forget: implementations must return quickly and never
/// report completion.
pub trait NotePlayer: Send + Sync {
    /// Start sounding `pitch`
    fn play_note(&self, pitch: Pitch);

    /// Sound a note given by name. Unknown names are ignored.
    fn play_named(&self, name: &str) {
        match name.parse::<Pitch>() {
            Ok(pitch) => self.play_note(pitch),
            Err(e) => debug!(error = %e, "ignoring note"),
        }
    }
}

/// Player used when no audio output is available
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPlayer;

impl NotePlayer for SilentPlayer {
    fn play_note(&self, _pitch: Pitch) {}
}

/// Plays pitch-shifted samples through a shared [`Mixer`]
pub struct SamplePlayer {
    /// Base samples, one per octave
    bank: SampleBank,
    /// Mixer shared with the audio callback
    mixer: Arc<Mutex<Mixer>>,
    /// Output sample rate
    output_rate: u32,
}

impl SamplePlayer {
    /// Create a player that renders into `mixer` at `output_rate`
    pub fn new(bank: SampleBank, mixer: Arc<Mutex<Mixer>>, output_rate: u32) -> Self {
        Self {
            bank,
            mixer,
            output_rate,
        }
    }

    /// Open the default output device and start mixing.
    ///
    /// The returned [`AudioOutput`] owns the stream and must be kept
    /// alive for as long as notes should be audible.
    pub fn start(bank: SampleBank, max_voices: usize) -> Result<(Self, AudioOutput), AudioError> {
        let mixer = Arc::new(Mutex::new(Mixer::new(max_voices)));

        let callback_mixer = Arc::clone(&mixer);
        let output = AudioOutput::new(move |buffer, channels| {
            if let Ok(mut mixer) = callback_mixer.lock() {
                mixer.render(buffer, channels);
            }
        })?;

        info!(
            sample_rate = output.sample_rate(),
            channels = output.channels(),
            "audio output started"
        );
        let player = Self::new(bank, mixer, output.sample_rate());
        Ok((player, output))
    }

    /// Number of voices currently sounding
    pub fn active_voices(&self) -> usize {
        self.mixer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active_voices()
    }
}

impl NotePlayer for SamplePlayer {
    fn play_note(&self, pitch: Pitch) {
        let (octave, _) = pitch.sample_offset();
        let Some(sample) = self.bank.get(octave) else {
            debug!(%pitch, "no sample for octave");
            return;
        };

        let rate = pitch.playback_rate() * sample.sample_rate as f64 / self.output_rate as f64;
        self.mixer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .trigger(sample, rate);
    }
}

/// Audio error types
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio initialization failed: {0}")]
    InitFailed(String),

    #[error("audio stream failed: {0}")]
    StreamFailed(String),

    #[error("no audio device available")]
    NoDevice,

    #[error("failed to load sample {path:?}: {source}")]
    SampleLoadFailed {
        path: std::path::PathBuf,
        #[source]
        source: hound::Error,
    },
}
