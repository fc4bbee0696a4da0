// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Base samples, one per octave.
//!
//! Each octave is rendered from a single recording of its C
//! (`C3.wav`, `C4.wav`, `C5.wav`), decoded once at startup.

use std::path::Path;
use std::sync::Arc;

use hound::{SampleFormat, WavReader};
use tracing::{info, warn};

use super::AudioError;
use crate::music::Octave;

/// A decoded mono sample
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Mono frames in -1.0..=1.0
    pub frames: Vec<f32>,
    /// Sample rate the frames were recorded at
    pub sample_rate: u32,
}

impl Sample {
    /// Create a sample from mono frames
    pub fn new(frames: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            frames,
            sample_rate,
        }
    }

    /// Decode a WAV file, mixing all channels down to mono
    pub fn load_wav(path: &Path) -> Result<Self, AudioError> {
        let load_err = |source| AudioError::SampleLoadFailed {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = WavReader::open(path).map_err(load_err)?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(load_err)?,
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(load_err)?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let frames = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        Ok(Self::new(frames, spec.sample_rate))
    }

    /// Length in frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the sample has no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Base samples indexed by octave
#[derive(Debug, Clone, Default)]
pub struct SampleBank {
    samples: [Option<Arc<Sample>>; 3],
}

impl SampleBank {
    /// Load `C3.wav`, `C4.wav` and `C5.wav` from `dir`.
    ///
    /// Missing or unreadable files are logged; their octaves stay silent.
    pub fn load_dir(dir: impl AsRef<Path>) -> Self {
        let mut bank = Self::default();
        for octave in Octave::ALL {
            let path = dir.as_ref().join(format!("C{}.wav", octave.number()));
            match Sample::load_wav(&path) {
                Ok(sample) => {
                    info!(path = %path.display(), frames = sample.len(), "sample loaded");
                    bank.insert(octave, sample);
                }
                Err(e) => warn!(error = %e, "octave {} will be silent", octave.number()),
            }
        }
        bank
    }

    /// Set the sample for an octave
    pub fn insert(&mut self, octave: Octave, sample: Sample) {
        self.samples[slot(octave)] = Some(Arc::new(sample));
    }

    /// Sample for an octave
    pub fn get(&self, octave: Octave) -> Option<Arc<Sample>> {
        self.samples[slot(octave)].clone()
    }

    /// Number of octaves with a sample
    pub fn loaded(&self) -> usize {
        self.samples.iter().flatten().count()
    }

    /// Whether no octave has a sample
    pub fn is_empty(&self) -> bool {
        self.loaded() == 0
    }
}

fn slot(octave: Octave) -> usize {
    (octave.number() - 3) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_wav_mixes_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("C4.wav");
        write_wav(&path, 2, &[16384, 0, -16384, -16384]);

        let sample = Sample::load_wav(&path).unwrap();
        assert_eq!(sample.sample_rate, 22_050);
        assert_eq!(sample.len(), 2);
        assert!((sample.frames[0] - 0.25).abs() < 1e-6);
        assert!((sample.frames[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_load_dir_with_missing_octaves() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("C3.wav"), 1, &[0, 100, 200]);
        write_wav(&dir.path().join("C5.wav"), 1, &[0, 100]);

        let bank = SampleBank::load_dir(dir.path());
        assert_eq!(bank.loaded(), 2);
        assert!(bank.get(Octave::Three).is_some());
        assert!(bank.get(Octave::Four).is_none());
        assert_eq!(bank.get(Octave::Five).unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Sample::load_wav(&dir.path().join("nope.wav")).unwrap_err();
        assert!(matches!(err, AudioError::SampleLoadFailed { .. }));
        assert!(SampleBank::load_dir(dir.path()).is_empty());
    }
}
