// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Command shortcuts.
//!
//! Maps function keys and control chords to [`ControlAction`]s. Plain
//! characters are left to the piano keymap.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyModifiers};

use super::ControlAction;
use crate::session::Mode;

/// A keyboard shortcut definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    /// Key code
    pub code: KeyCode,
    /// Required modifiers
    pub modifiers: KeyModifiers,
}

impl Shortcut {
    /// Create a new shortcut
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a shortcut with no modifiers
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Create a shortcut with Ctrl modifier
    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// A shortcut bound to an action
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub shortcut: Shortcut,
    pub action: ControlAction,
    /// Description for help display
    pub description: &'static str,
    /// Category for grouping in help
    pub category: &'static str,
}

/// Shortcut table
#[derive(Debug, Clone)]
pub struct Shortcuts {
    bindings: HashMap<Shortcut, KeyBinding>,
}

impl Shortcuts {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Create the table with default bindings
    pub fn with_defaults() -> Self {
        let mut shortcuts = Self::new();
        let defaults = [
            (Shortcut::key(KeyCode::F(1)), ControlAction::SwitchMode(Mode::Interactive), "Interactive mode", "Mode"),
            (Shortcut::key(KeyCode::F(2)), ControlAction::SwitchMode(Mode::Prepared), "Prepared mode", "Mode"),
            (Shortcut::key(KeyCode::F(5)), ControlAction::StartRecording, "Record", "Recording"),
            (Shortcut::key(KeyCode::F(6)), ControlAction::StopRecording, "Stop recording", "Recording"),
            (Shortcut::key(KeyCode::F(7)), ControlAction::Export, "Export", "Recording"),
            (Shortcut::ctrl('o'), ControlAction::OpenFile, "Open recording", "Playback"),
            (Shortcut::key(KeyCode::Char(' ')), ControlAction::TogglePlay, "Play/Pause", "Playback"),
            (Shortcut::key(KeyCode::Esc), ControlAction::Stop, "Stop", "Playback"),
            (Shortcut::key(KeyCode::Up), ControlAction::AdjustSpeed(0.1), "Faster", "Playback"),
            (Shortcut::key(KeyCode::Down), ControlAction::AdjustSpeed(-0.1), "Slower", "Playback"),
            (Shortcut::key(KeyCode::F(10)), ControlAction::Quit, "Quit", "General"),
            (Shortcut::ctrl('c'), ControlAction::Quit, "Quit", "General"),
        ];

        for (shortcut, action, description, category) in defaults {
            shortcuts.add(KeyBinding {
                shortcut,
                action,
                description,
                category,
            });
        }
        shortcuts
    }

    /// Add a binding, replacing any on the same shortcut
    pub fn add(&mut self, binding: KeyBinding) {
        self.bindings.insert(binding.shortcut.clone(), binding);
    }

    /// Action for a key event. Shift is ignored so Shift+F5 still records.
    pub fn action_for(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<ControlAction> {
        let shortcut = Shortcut::new(code, modifiers & !KeyModifiers::SHIFT);
        self.bindings.get(&shortcut).map(|b| b.action)
    }

    /// Bindings grouped by category, sorted for display
    pub fn bindings_by_category(&self) -> Vec<(&'static str, Vec<&KeyBinding>)> {
        let mut grouped: HashMap<&'static str, Vec<&KeyBinding>> = HashMap::new();
        for binding in self.bindings.values() {
            grouped.entry(binding.category).or_default().push(binding);
        }

        let mut grouped: Vec<_> = grouped.into_iter().collect();
        grouped.sort_by_key(|(category, _)| *category);
        for (_, bindings) in grouped.iter_mut() {
            bindings.sort_by_key(|b| format_shortcut(&b.shortcut));
        }
        grouped
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Format a shortcut for display
pub fn format_shortcut(shortcut: &Shortcut) -> String {
    let key = match shortcut.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        _ => "?".to_string(),
    };

    if shortcut.modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl+{}", key)
    } else {
        key
    }
}
