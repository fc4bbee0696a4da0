// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal UI for the piano.
//!
//! Provides a ratatui-based terminal interface with an on-screen
//! keyboard, recording and playback panels, prompts and notices.

mod keyboard;
mod transport;

pub use keyboard::{key_at, key_rects, KeyboardWidget, KEYBOARD_WIDTH};
pub use transport::{state_indicator, PlaybackWidget, RecorderWidget};

use std::collections::{BTreeSet, HashMap};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::control::{format_shortcut, ControlAction, ReleaseMode, Shortcuts};
use crate::music::Pitch;
use crate::playback::TransportEvent;
use crate::session::{Mode, ModeSwitch, Notice, Session};

/// Status line messages disappear after this long
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// A modal prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Waiting for y/n on a mode switch
    ConfirmSwitch(Mode),
    /// Typing a path to open
    OpenFile(String),
}

/// Display state not owned by the session
#[derive(Debug, Default)]
pub struct UiState {
    /// Keys lit by playback, until the given instant
    pub lit: HashMap<Pitch, Instant>,
    /// Open prompt
    pub prompt: Option<Prompt>,
    /// Status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
    /// On-screen keyboard area from the last draw, for mouse hits
    pub keyboard_area: Rect,
    /// Key held with the mouse
    pub mouse_key: Option<Pitch>,
}

impl UiState {
    /// Set a status message that will be displayed temporarily
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_time = Some(Instant::now());
    }

    /// Clear expired status message and playback highlights
    pub fn clear_expired(&mut self, now: Instant) {
        if let Some(time) = self.status_time {
            if now.saturating_duration_since(time) > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_time = None;
            }
        }
        self.lit.retain(|_, until| *until > now);
    }

    /// Apply a playback event
    pub fn apply(&mut self, event: TransportEvent, now: Instant) {
        match event {
            TransportEvent::NoteStarted { pitch, hold } => {
                self.lit.insert(pitch, now + hold);
            }
            TransportEvent::Finished => self.set_status("Playback finished"),
            TransportEvent::StateChanged(_) | TransportEvent::Progress(_) => {}
        }
    }
}

/// Terminal UI application
pub struct App {
    session: Session,
    events: UnboundedReceiver<TransportEvent>,
    shortcuts: Shortcuts,
    ui: UiState,
    /// Terminal handle
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Whether the terminal reports key releases
    enhanced_keys: bool,
    /// Target frame rate
    frame_rate: u32,
    /// Whether to continue running
    running: bool,
}

impl App {
    /// Take over the terminal
    pub fn new(session: Session, events: UnboundedReceiver<TransportEvent>) -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let enhanced_keys = matches!(supports_keyboard_enhancement(), Ok(true));
        if enhanced_keys {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let mut app = Self {
            session,
            events,
            shortcuts: Shortcuts::with_defaults(),
            ui: UiState::default(),
            terminal,
            enhanced_keys,
            frame_rate: 60,
            running: true,
        };
        if enhanced_keys {
            app.session.input_mut().set_release_mode(ReleaseMode::Explicit);
        }
        info!(key_release_events = enhanced_keys, "terminal ready");
        Ok(app)
    }

    /// Start in prepared mode with `path` loaded
    pub fn open(&mut self, path: &str) {
        self.session.request_mode(Mode::Prepared);
        self.load(path);
    }

    /// Run until quit
    pub fn run(&mut self) -> Result<()> {
        while self.running {
            let now = Instant::now();
            while let Ok(event) = self.events.try_recv() {
                self.ui.apply(event, now);
            }
            self.session.expire_keys(now);
            self.ui.clear_expired(now);

            self.draw()?;
            if let Some(event) = self.poll_event()? {
                self.handle_event(event);
            }
        }
        Ok(())
    }

    /// Poll for events with timeout
    fn poll_event(&self) -> io::Result<Option<Event>> {
        let timeout = Duration::from_millis(1000 / self.frame_rate as u64);
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let now = Instant::now();

        if key.kind == KeyEventKind::Release {
            if let KeyCode::Char(c) = key.code {
                self.session.key_up(c, now);
            }
            return;
        }

        if self.session.notice().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.session.dismiss_notice();
            }
            return;
        }

        if let Some(prompt) = self.ui.prompt.take() {
            self.handle_prompt(prompt, key);
            return;
        }

        if let Some(action) = self.shortcuts.action_for(key.code, key.modifiers) {
            if action.available_in(self.session.mode()) {
                self.perform(action, now);
            }
            return;
        }

        if let KeyCode::Char(c) = key.code {
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                self.session.key_down(c, key.kind == KeyEventKind::Repeat, now);
            }
        }
    }

    fn handle_prompt(&mut self, prompt: Prompt, key: KeyEvent) {
        match prompt {
            Prompt::ConfirmSwitch(mode) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.session.confirm_mode_switch();
                    self.ui.set_status(format!("{} mode", mode));
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.session.cancel_mode_switch();
                }
                _ => self.ui.prompt = Some(Prompt::ConfirmSwitch(mode)),
            },
            Prompt::OpenFile(mut path) => match key.code {
                KeyCode::Enter => self.load(path.trim()),
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    path.pop();
                    self.ui.prompt = Some(Prompt::OpenFile(path));
                }
                KeyCode::Char(c) => {
                    path.push(c);
                    self.ui.prompt = Some(Prompt::OpenFile(path));
                }
                _ => self.ui.prompt = Some(Prompt::OpenFile(path)),
            },
        }
    }

    fn perform(&mut self, action: ControlAction, now: Instant) {
        debug!(?action, "action");
        match action {
            ControlAction::SwitchMode(mode) => match self.session.request_mode(mode) {
                ModeSwitch::NeedsConfirmation => self.ui.prompt = Some(Prompt::ConfirmSwitch(mode)),
                ModeSwitch::Switched => self.ui.set_status(format!("{} mode", mode)),
                ModeSwitch::Unchanged => {}
            },
            ControlAction::StartRecording => {
                if self.session.start_recording(now) {
                    self.ui.set_status("Recording");
                }
            }
            ControlAction::StopRecording => {
                if self.session.stop_recording() {
                    self.ui.set_status("Recording stopped");
                }
            }
            ControlAction::Export => {
                if let Err(e) = self.session.export() {
                    warn!(error = %e, "export failed");
                    self.session.set_notice(Notice::Error(format!("Export failed: {}", e)));
                }
            }
            ControlAction::OpenFile => self.ui.prompt = Some(Prompt::OpenFile(String::new())),
            ControlAction::TogglePlay => self.session.toggle_playback(),
            ControlAction::Stop => self.session.stop_playback(),
            ControlAction::AdjustSpeed(delta) => {
                let speed = self.session.adjust_speed(delta);
                self.ui.set_status(format!("Speed {}", speed));
            }
            ControlAction::Quit => self.running = false,
        }
    }

    fn load(&mut self, path: &str) {
        if self.session.load(path).is_ok() {
            self.ui.lit.clear();
            self.ui.set_status(format!("Loaded {}", path));
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let now = Instant::now();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(pitch) = key_at(self.ui.keyboard_area, mouse.column, mouse.row) {
                    self.session.pointer_down(pitch, now);
                    self.ui.mouse_key = Some(pitch);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(pitch) = self.ui.mouse_key.take() {
                    self.session.pointer_up(pitch, now);
                }
            }
            _ => {}
        }
    }

    /// Draw the UI
    fn draw(&mut self) -> io::Result<()> {
        let Self {
            terminal,
            session,
            shortcuts,
            ui,
            enhanced_keys,
            ..
        } = self;
        let now = Instant::now();

        terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: header, keyboard, panel, footer
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1), // Header
                    Constraint::Length(9), // Keyboard
                    Constraint::Length(3), // Mode panel
                    Constraint::Min(0),    // Padding
                    Constraint::Length(1), // Status bar
                ])
                .split(area);

            render_header(frame, chunks[0], session, *enhanced_keys, now);
            ui.keyboard_area = render_keyboard(frame, chunks[1], session, ui, now);
            render_panel(frame, chunks[2], session, now);
            render_status_bar(frame, chunks[4], session.mode(), shortcuts, ui);

            if let Some(prompt) = &ui.prompt {
                render_prompt(frame, area, prompt);
            }
            if let Some(notice) = session.notice() {
                render_notice(frame, area, notice);
            }
        })?;

        Ok(())
    }

    /// Cleanup terminal on drop
    fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
        }
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Render the header line
fn render_header(frame: &mut Frame, area: Rect, session: &Session, enhanced_keys: bool, now: Instant) {
    let mode_style = |mode: Mode| {
        if session.mode() == mode {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let mut spans = vec![
        Span::styled(" KEYS ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(" F1 Interactive ", mode_style(Mode::Interactive)),
        Span::raw(" "),
        Span::styled(" F2 Prepared ", mode_style(Mode::Prepared)),
        Span::raw("  "),
    ];
    match session.mode() {
        Mode::Interactive => {
            if let Some(clock) = session.recording_clock(now) {
                spans.push(Span::styled(
                    format!("REC {}", clock),
                    Style::default().fg(Color::Red),
                ));
            }
        }
        Mode::Prepared => spans.push(Span::styled(
            session.speed().to_string(),
            Style::default().fg(Color::Magenta),
        )),
    }
    if !enhanced_keys {
        spans.push(Span::styled("  (auto key release)", Style::default().fg(Color::DarkGray)));
    }
    let line = Line::from(spans);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the keyboard, returning the area keys were drawn in
fn render_keyboard(
    frame: &mut Frame,
    area: Rect,
    session: &Session,
    ui: &UiState,
    now: Instant,
) -> Rect {
    let mut active: BTreeSet<Pitch> = session.input().held().collect();
    active.extend(ui.lit.iter().filter(|(_, until)| **until > now).map(|(p, _)| *p));

    let width = (KEYBOARD_WIDTH + 2).min(area.width);
    let x = area.x + (area.width - width) / 2;
    let area = Rect::new(x, area.y, width, area.height);

    let block = Block::default().borders(Borders::ALL).title(" Keyboard ");
    let inner = block.inner(area);
    frame.render_widget(
        KeyboardWidget::new(session.input().keymap(), &active).block(block),
        area,
    );
    inner
}

/// Render the panel for the current mode
fn render_panel(frame: &mut Frame, area: Rect, session: &Session, now: Instant) {
    match session.mode() {
        Mode::Interactive => {
            let widget = RecorderWidget::new(
                session.recording_clock(now),
                session.recorder().note_count(),
                session.can_export(),
            )
            .block(Block::default().borders(Borders::ALL).title(" Recorder "));
            frame.render_widget(widget, area);
        }
        Mode::Prepared => {
            let widget = PlaybackWidget::new(
                session.playback_state(),
                session.speed(),
                session.progress(),
            )
            .title(session.loaded().map(|r| r.name.as_str()))
            .block(Block::default().borders(Borders::ALL).title(" Playback "));
            frame.render_widget(widget, area);
        }
    }
}

/// Shortcut hints for the footer
fn footer_hints(mode: Mode, shortcuts: &Shortcuts) -> String {
    let hints: Vec<String> = shortcuts
        .bindings_by_category()
        .into_iter()
        .flat_map(|(_, bindings)| bindings)
        .filter(|b| b.action.available_in(mode) && !matches!(b.action, ControlAction::SwitchMode(_)))
        .map(|b| format!("{}: {}", format_shortcut(&b.shortcut), b.description))
        .collect();
    format!(" {}", hints.join(" | "))
}

/// Render status bar
fn render_status_bar(frame: &mut Frame, area: Rect, mode: Mode, shortcuts: &Shortcuts, ui: &UiState) {
    let text = if let Some(ref msg) = ui.status_message {
        Span::styled(msg.as_str(), Style::default().fg(Color::Yellow))
    } else {
        Span::styled(footer_hints(mode, shortcuts), Style::default().fg(Color::DarkGray))
    };

    frame.render_widget(Paragraph::new(text), area);
}

/// Centered box of the given size
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// Render a modal prompt
fn render_prompt(frame: &mut Frame, area: Rect, prompt: &Prompt) {
    let (title, lines) = match prompt {
        Prompt::ConfirmSwitch(mode) => (
            " Switch mode ",
            vec![
                Line::from(mode.confirmation_prompt()),
                Line::from(""),
                Line::from(Span::styled("y: Yes   n: No", Style::default().fg(Color::DarkGray))),
            ],
        ),
        Prompt::OpenFile(path) => (
            " Open recording ",
            vec![
                Line::from(format!("{}▏", path)),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter: Open   Esc: Cancel",
                    Style::default().fg(Color::DarkGray),
                )),
            ],
        ),
    };

    let popup = centered(area, 60, 7);
    frame.render_widget(Clear, popup);
    let block = Block::default().borders(Borders::ALL).title(title);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        popup,
    );
}

/// Render a notice
fn render_notice(frame: &mut Frame, area: Rect, notice: &Notice) {
    let (title, color) = match notice {
        Notice::Info(_) => (" Notice ", Color::Cyan),
        Notice::Error(_) => (" Error ", Color::Red),
    };

    let popup = centered(area, 50, 5);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color));
    let lines = vec![
        Line::from(notice.message().to_string()),
        Line::from(Span::styled("Enter: OK", Style::default().fg(Color::DarkGray))),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_state_status() {
        let mut state = UiState::default();
        assert!(state.status_message.is_none());

        state.set_status("Test message");
        assert_eq!(state.status_message, Some("Test message".to_string()));

        state.clear_expired(Instant::now() + Duration::from_secs(4));
        assert!(state.status_message.is_none());
    }

    #[test]
    fn test_playback_highlight_expires() {
        let mut state = UiState::default();
        let now = Instant::now();
        let c3: Pitch = "C3".parse().unwrap();

        state.apply(
            TransportEvent::NoteStarted {
                pitch: c3,
                hold: Duration::from_millis(500),
            },
            now,
        );
        state.clear_expired(now + Duration::from_millis(400));
        assert!(state.lit.contains_key(&c3));
        state.clear_expired(now + Duration::from_millis(500));
        assert!(state.lit.is_empty());
    }

    #[test]
    fn test_finished_sets_status() {
        let mut state = UiState::default();
        state.apply(TransportEvent::Finished, Instant::now());
        assert_eq!(state.status_message.as_deref(), Some("Playback finished"));
    }

    #[test]
    fn test_footer_hints_follow_mode() {
        let shortcuts = Shortcuts::with_defaults();
        let interactive = footer_hints(Mode::Interactive, &shortcuts);
        assert!(interactive.contains("F5: Record"));
        assert!(!interactive.contains("Play/Pause"));

        let prepared = footer_hints(Mode::Prepared, &shortcuts);
        assert!(prepared.contains("Space: Play/Pause"));
        assert!(!prepared.contains("F7"));
    }

    #[test]
    fn test_centered() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered(area, 60, 7);
        assert_eq!(popup, Rect::new(20, 16, 60, 7));

        // Never larger than the screen
        let tiny = centered(Rect::new(0, 0, 10, 3), 60, 7);
        assert!(tiny.width <= 10 && tiny.height <= 3);
    }
}
