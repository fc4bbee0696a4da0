// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recording and playback panels.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Gauge, Paragraph, Widget},
};

use crate::playback::{PlaybackSpeed, PlaybackState};
use crate::session::RecordingClock;

/// Playback panel: state, speed and progress
pub struct PlaybackWidget<'a> {
    state: PlaybackState,
    speed: PlaybackSpeed,
    progress: f64,
    title: Option<&'a str>,
    block: Option<Block<'a>>,
}

impl<'a> PlaybackWidget<'a> {
    /// Create a new playback widget
    pub fn new(state: PlaybackState, speed: PlaybackSpeed, progress: f64) -> Self {
        Self {
            state,
            speed,
            progress,
            title: None,
            block: None,
        }
    }

    /// Name of the loaded recording
    pub fn title(mut self, title: Option<&'a str>) -> Self {
        self.title = title;
        self
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

/// Indicator text and style for a playback state
pub fn state_indicator(state: PlaybackState) -> (&'static str, Style) {
    match state {
        PlaybackState::Playing => (
            "▶ PLAY",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        PlaybackState::Paused => ("⏸ PAUSE", Style::default().fg(Color::Yellow)),
        PlaybackState::Stopped => ("■ STOP", Style::default().fg(Color::Yellow)),
    }
}

impl Widget for PlaybackWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(10), // State
                Constraint::Length(8),  // Speed
                Constraint::Length(24), // Name
                Constraint::Min(10),    // Progress
            ])
            .split(area);

        let (indicator, style) = state_indicator(self.state);
        Paragraph::new(indicator).style(style).render(chunks[0], buf);

        Paragraph::new(self.speed.to_string())
            .style(Style::default().fg(Color::Magenta))
            .render(chunks[1], buf);

        let (name, name_style) = match self.title {
            Some(name) => (name, Style::default().fg(Color::White)),
            None => ("Ctrl+O to open", Style::default().fg(Color::DarkGray)),
        };
        Paragraph::new(name).style(name_style).render(chunks[2], buf);

        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
            .ratio(self.progress.clamp(0.0, 1.0))
            .render(chunks[3], buf);
    }
}

/// Recording panel: record indicator, clock and export availability
pub struct RecorderWidget<'a> {
    clock: Option<RecordingClock>,
    notes: usize,
    can_export: bool,
    block: Option<Block<'a>>,
}

impl<'a> RecorderWidget<'a> {
    /// Create a new recorder widget. `clock` is `None` when idle.
    pub fn new(clock: Option<RecordingClock>, notes: usize, can_export: bool) -> Self {
        Self {
            clock,
            notes,
            can_export,
            block: None,
        }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn line(&self) -> Line<'static> {
        let mut spans = match self.clock {
            Some(clock) => {
                let dot = if clock.dot_visible() { "●" } else { "○" };
                vec![Span::styled(
                    format!("{} {}", dot, clock),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )]
            }
            None => vec![Span::styled("Record", Style::default().fg(Color::White))],
        };

        spans.push(Span::styled(
            format!("  {} notes", self.notes),
            Style::default().fg(Color::Cyan),
        ));

        let export_style = if self.can_export {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled("  F7 Export", export_style));
        Line::from(spans)
    }
}

impl Widget for RecorderWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = self.line();
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        Paragraph::new(line).render(area, buf);
    }
}
