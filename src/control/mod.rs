// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyboard input.
//!
//! This module provides:
//! - The piano keymap and held-key tracking
//! - Command shortcuts for recording, playback and mode changes

pub mod keyboard;
pub mod shortcuts;

pub use keyboard::{KeySink, Keymap, KeymapError, KeyboardInput, ReleaseMode, DEFAULT_LAYOUT};
pub use shortcuts::{format_shortcut, KeyBinding, Shortcut, Shortcuts};

use crate::session::Mode;

/// Action that can be triggered by a shortcut
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    /// Ask to switch mode
    SwitchMode(Mode),

    // Recording
    /// Begin capturing notes
    StartRecording,
    /// Stop capturing notes
    StopRecording,
    /// Write the recording to disk
    Export,

    // Playback
    /// Prompt for a recording to load
    OpenFile,
    /// Toggle play/pause
    TogglePlay,
    /// Stop and rewind
    Stop,
    /// Change speed by delta
    AdjustSpeed(f64),

    /// Quit application
    Quit,
}

impl ControlAction {
    /// Check if this action only applies in interactive mode
    pub fn is_recording(&self) -> bool {
        matches!(
            self,
            ControlAction::StartRecording | ControlAction::StopRecording | ControlAction::Export
        )
    }

    /// Check if this action only applies in prepared mode
    pub fn is_playback(&self) -> bool {
        matches!(
            self,
            ControlAction::OpenFile
                | ControlAction::TogglePlay
                | ControlAction::Stop
                | ControlAction::AdjustSpeed(_)
        )
    }

    /// Whether the action is available in `mode`
    pub fn available_in(&self, mode: Mode) -> bool {
        match mode {
            Mode::Interactive => !self.is_playback(),
            Mode::Prepared => !self.is_recording(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_action_categories() {
        assert!(ControlAction::Export.is_recording());
        assert!(!ControlAction::Export.is_playback());
        assert!(ControlAction::AdjustSpeed(0.1).is_playback());
        assert!(!ControlAction::Quit.is_recording());
    }

    #[test]
    fn test_available_in_mode() {
        assert!(ControlAction::StartRecording.available_in(Mode::Interactive));
        assert!(!ControlAction::StartRecording.available_in(Mode::Prepared));
        assert!(ControlAction::TogglePlay.available_in(Mode::Prepared));
        assert!(!ControlAction::TogglePlay.available_in(Mode::Interactive));
        assert!(ControlAction::SwitchMode(Mode::Prepared).available_in(Mode::Interactive));
    }
}
