// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Voice mixing for sample playback.

use std::sync::Arc;

use super::bank::Sample;

/// Default output gain per voice
const VOICE_GAIN: f32 = 0.5;

/// A sample being played back at some rate
#[derive(Debug, Clone)]
struct Voice {
    sample: Arc<Sample>,
    /// Read position in source frames
    position: f64,
    /// Source frames advanced per output frame
    step: f64,
}

impl Voice {
    /// Next output value, or `None` once the sample has run out
    fn next_frame(&mut self) -> Option<f32> {
        let frames = &self.sample.frames;
        let index = self.position as usize;
        let current = *frames.get(index)?;
        let following = frames.get(index + 1).copied().unwrap_or(0.0);
        let frac = (self.position - index as f64) as f32;

        self.position += self.step;
        Some(current + (following - current) * frac)
    }
}

/// Sums active voices into an interleaved output buffer
#[derive(Debug)]
pub struct Mixer {
    voices: Vec<Voice>,
    max_voices: usize,
    gain: f32,
}

impl Mixer {
    /// Create a mixer holding at most `max_voices` voices
    pub fn new(max_voices: usize) -> Self {
        let max_voices = max_voices.max(1);
        Self {
            voices: Vec::with_capacity(max_voices),
            max_voices,
            gain: VOICE_GAIN,
        }
    }

    /// Set output gain (0.0 - 1.0)
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    /// Start a voice. `step` is source frames per output frame.
    ///
    /// When full, the oldest voice is dropped.
    pub fn trigger(&mut self, sample: Arc<Sample>, step: f64) {
        if self.voices.len() >= self.max_voices {
            self.voices.remove(0);
        }
        self.voices.push(Voice {
            sample,
            position: 0.0,
            step,
        });
    }

    /// Number of voices still sounding
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Stop every voice
    pub fn clear(&mut self) {
        self.voices.clear();
    }

    /// Add all voices into `buffer` (interleaved, `channels` wide)
    pub fn render(&mut self, buffer: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in buffer.chunks_mut(channels) {
            let mut value = 0.0f32;
            self.voices.retain_mut(|voice| match voice.next_frame() {
                Some(v) => {
                    value += v;
                    true
                }
                None => false,
            });

            let value = (value * self.gain).clamp(-1.0, 1.0);
            for sample in frame.iter_mut() {
                *sample += value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Arc<Sample> {
        Arc::new(Sample::new((0..len).map(|i| i as f32 / len as f32).collect(), 44_100))
    }

    #[test]
    fn test_voice_runs_out() {
        let mut mixer = Mixer::new(4);
        mixer.trigger(ramp(4), 1.0);

        let mut buffer = vec![0.0; 16];
        mixer.render(&mut buffer, 2);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_stereo_duplicates_mono() {
        let mut mixer = Mixer::new(4);
        mixer.set_gain(1.0);
        mixer.trigger(Arc::new(Sample::new(vec![0.25, 0.5], 44_100)), 1.0);

        let mut buffer = vec![0.0; 4];
        mixer.render(&mut buffer, 2);
        assert_eq!(buffer, vec![0.25, 0.25, 0.5, 0.5]);
    }

    #[test]
    fn test_step_shifts_pitch() {
        let mut mixer = Mixer::new(4);
        mixer.set_gain(1.0);
        mixer.trigger(Arc::new(Sample::new(vec![0.0, 0.2, 0.4, 0.6], 44_100)), 2.0);

        let mut buffer = vec![0.0; 2];
        mixer.render(&mut buffer, 1);
        assert!((buffer[1] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_interpolates_between_frames() {
        let mut mixer = Mixer::new(1);
        mixer.set_gain(1.0);
        mixer.trigger(Arc::new(Sample::new(vec![0.0, 1.0], 44_100)), 0.5);

        let mut buffer = vec![0.0; 2];
        mixer.render(&mut buffer, 1);
        assert!((buffer[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_voice_limit_drops_oldest() {
        let mut mixer = Mixer::new(2);
        mixer.trigger(ramp(100), 1.0);
        mixer.trigger(ramp(10), 1.0);
        mixer.trigger(ramp(100), 1.0);
        assert_eq!(mixer.active_voices(), 2);

        // The short voice survived the cap and finishes first
        let mut buffer = vec![0.0; 20];
        mixer.render(&mut buffer, 1);
        assert_eq!(mixer.active_voices(), 1);
    }

    #[test]
    fn test_output_is_clamped() {
        let mut mixer = Mixer::new(8);
        mixer.set_gain(1.0);
        for _ in 0..8 {
            mixer.trigger(Arc::new(Sample::new(vec![1.0; 4], 44_100)), 1.0);
        }
        let mut buffer = vec![0.0; 4];
        mixer.render(&mut buffer, 1);
        assert!(buffer.iter().all(|&s| s <= 1.0));
    }
}
