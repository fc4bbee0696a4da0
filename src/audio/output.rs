// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio output via cpal.
//!
//! Opens the default device at its preferred format and hands each
//! buffer to a fill callback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use tracing::error;

use super::AudioError;

/// Format the output stream was opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of output channels
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
        }
    }
}

impl From<&StreamConfig> for AudioConfig {
    fn from(config: &StreamConfig) -> Self {
        Self {
            sample_rate: config.sample_rate.0,
            channels: config.channels,
        }
    }
}

/// Audio output stream
pub struct AudioOutput {
    /// cpal stream, stops when dropped
    _stream: Stream,
    /// Device name, for logging
    device_name: String,
    config: AudioConfig,
}

impl AudioOutput {
    /// Open the default output device.
    ///
    /// `callback` receives a zeroed interleaved buffer and the channel count.
    pub fn new<F>(mut callback: F) -> Result<Self, AudioError>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let device_name = device_label(&device);

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::InitFailed(format!("Failed to get default config: {}", e)))?;
        if supported.sample_format() != SampleFormat::F32 {
            return Err(AudioError::InitFailed(format!(
                "unsupported sample format {:?}",
                supported.sample_format()
            )));
        }

        let stream_config: StreamConfig = supported.into();
        let config = AudioConfig::from(&stream_config);
        let channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    data.fill(0.0);
                    callback(data, channels);
                },
                move |err| {
                    error!(error = %err, "audio stream error");
                },
                None,
            )
            .map_err(|e| AudioError::StreamFailed(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamFailed(format!("Failed to start stream: {}", e)))?;

        Ok(Self {
            _stream: stream,
            device_name,
            config,
        })
    }

    /// Format the stream was opened with
    pub fn config(&self) -> AudioConfig {
        self.config
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Output channel count
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Name of the device in use
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

fn device_label(device: &Device) -> String {
    device.name().unwrap_or_else(|_| "unknown".to_string())
}

/// List available audio output devices
pub fn list_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.output_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

/// Get default device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().map(|d| device_label(&d))
}
