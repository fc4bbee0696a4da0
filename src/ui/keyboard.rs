// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! On-screen piano keyboard widget.

use std::collections::BTreeSet;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Widget},
};

use crate::control::Keymap;
use crate::music::{Pitch, PitchClass};

/// Columns per white key, including the gap to its right
const WHITE_WIDTH: u16 = 4;
/// Columns per black key
const BLACK_WIDTH: u16 = 3;

/// Number of white keys across the three octaves
pub const WHITE_KEYS: u16 = 21;

/// Width needed to draw every key
pub const KEYBOARD_WIDTH: u16 = WHITE_KEYS * WHITE_WIDTH;

/// Screen area of each key, black keys first so they win hit tests
pub fn key_rects(area: Rect) -> Vec<(Pitch, Rect)> {
    let black_height = (area.height * 3 / 5).max(1);
    let mut black = Vec::new();
    let mut white = Vec::new();

    let mut white_index: u16 = 0;
    for pitch in Pitch::ALL {
        if pitch.class().is_sharp() {
            // Straddles the boundary after the previous white key
            let x = area.x + white_index * WHITE_WIDTH - 2;
            let rect = Rect::new(x, area.y, BLACK_WIDTH, black_height);
            black.push((pitch, rect.intersection(area)));
        } else {
            let x = area.x + white_index * WHITE_WIDTH;
            let rect = Rect::new(x, area.y, WHITE_WIDTH - 1, area.height);
            white.push((pitch, rect.intersection(area)));
            white_index += 1;
        }
    }

    black.extend(white);
    black
}

/// Key under a screen position
pub fn key_at(area: Rect, column: u16, row: u16) -> Option<Pitch> {
    key_rects(area)
        .into_iter()
        .find(|(_, rect)| {
            column >= rect.x
                && column < rect.x + rect.width
                && row >= rect.y
                && row < rect.y + rect.height
        })
        .map(|(pitch, _)| pitch)
}

/// Piano keyboard with highlighted keys and key labels
pub struct KeyboardWidget<'a> {
    keymap: &'a Keymap,
    active: &'a BTreeSet<Pitch>,
    block: Option<Block<'a>>,
}

impl<'a> KeyboardWidget<'a> {
    /// Create a new keyboard widget
    pub fn new(keymap: &'a Keymap, active: &'a BTreeSet<Pitch>) -> Self {
        Self {
            keymap,
            active,
            block: None,
        }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn key_style(&self, pitch: Pitch) -> Style {
        let lit = self.active.contains(&pitch);
        match (pitch.class().is_sharp(), lit) {
            (false, false) => Style::default().bg(Color::White).fg(Color::Black),
            (true, false) => Style::default().bg(Color::Black).fg(Color::Gray),
            (false, true) => Style::default().bg(Color::Cyan).fg(Color::Black),
            (true, true) => Style::default().bg(Color::Blue).fg(Color::White),
        }
    }
}

impl Widget for KeyboardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block.clone() {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };
        if area.width == 0 || area.height < 2 {
            return;
        }

        // White keys first so black keys paint over them
        for (pitch, rect) in key_rects(area).into_iter().rev() {
            if rect.is_empty() {
                continue;
            }
            let style = self.key_style(pitch);
            buf.set_style(rect, style);

            let bottom = rect.y + rect.height - 1;
            if let Some(key) = self.keymap.key_for(pitch) {
                let label = key.to_uppercase().to_string();
                buf.set_string(rect.x + 1, bottom, label, style.add_modifier(Modifier::BOLD));
            }
            if pitch.class() == PitchClass::C && rect.height > 2 {
                let octave = pitch.octave().number().to_string();
                buf.set_string(rect.x, bottom - 1, format!("C{}", octave), style);
            }
        }
    }
}
