// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note-by-note playback scheduling.
//!
//! [`PlaybackScheduler`] is the timing model for replaying a recording.
//! It never sleeps and never reads the clock: callers pass `now` in and
//! get back how long to wait before the next note. Only one timer is
//! ever live. Every arm hands out a fresh [`TimerToken`], and a token
//! that is not the current one is ignored by [`PlaybackScheduler::fire`],
//! so cancelled or superseded timers can never trigger a note.
//!
//! Timing is anchored rather than ticked: each delay is computed from
//! the anchor to the note's scaled offset, so a late callback does not
//! push every following note later.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::speed::PlaybackSpeed;
use crate::music::Pitch;
use crate::recording::{NoteEvent, Recording};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not playing, cursor at the start
    #[default]
    Stopped,
    /// Timer armed for the note under the cursor
    Playing,
    /// Cursor held, no timer armed
    Paused,
}

/// Identifies one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// A timer the host must arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Armed {
    /// Pass back to [`PlaybackScheduler::fire`] when the timer expires
    pub token: TimerToken,
    /// How long to wait
    pub delay: Duration,
}

/// What happens after a note fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Arm another timer
    Armed(Armed),
    /// The last note has played and playback stopped
    Finished,
}

/// A note triggered by a timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fired {
    /// Pitch to sound
    pub pitch: Pitch,
    /// How long to show the key held, already scaled by speed
    pub hold: Duration,
    /// Index of the note in the sequence
    pub index: usize,
    /// Fraction of notes played so far
    pub progress: f64,
    /// Follow-up timer, if any
    pub next: Next,
}

/// Where the playback timeline was at a given instant
#[derive(Debug, Clone, Copy)]
struct Anchor {
    at: Instant,
    position: Duration,
}

impl Anchor {
    fn position_at(&self, now: Instant) -> Duration {
        self.position + now.saturating_duration_since(self.at)
    }
}

/// Playback state machine over a loaded note sequence
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    /// Loaded notes, never mutated during playback
    notes: Vec<NoteEvent>,
    /// Index of the next note to play
    cursor: usize,
    /// Speed factor
    speed: PlaybackSpeed,
    /// Current state
    state: PlaybackState,
    /// Timeline anchor while playing
    anchor: Option<Anchor>,
    /// The one live timer
    armed: Option<TimerToken>,
    /// Source of timer tokens
    next_token: u64,
    /// Progress fraction shown to the user
    progress: f64,
}

impl PlaybackScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the note sequence and reset to the start
    pub fn load(&mut self, recording: &Recording) {
        self.notes = recording.notes.clone();
        self.stop();
        info!(name = %recording.name, notes = self.notes.len(), "recording loaded");
    }

    /// Drop the note sequence
    pub fn unload(&mut self) {
        self.notes.clear();
        self.stop();
    }

    /// Loaded notes
    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    /// Index of the next note to play
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Check if playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Current speed
    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// Fraction of notes played (0.0 - 1.0)
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Token of the live timer, if one is armed
    pub fn armed(&self) -> Option<TimerToken> {
        self.armed
    }

    /// Start or resume playback from the cursor.
    ///
    /// Returns the timer to arm, or `None` if nothing is loaded or
    /// playback is already running.
    pub fn play(&mut self, now: Instant) -> Option<Armed> {
        if self.notes.is_empty() || self.is_playing() {
            return None;
        }

        // Re-anchor on the cursor note: time spent paused is not replayed.
        // The offset is scaled by speed; at 1.0x this is the recorded startTime.
        let position = self.speed.scale(self.notes[self.cursor].start_offset);
        self.anchor = Some(Anchor { at: now, position });
        self.state = PlaybackState::Playing;
        info!(cursor = self.cursor, speed = self.speed.factor(), "playback started");

        match self.schedule_next(now) {
            Next::Armed(armed) => Some(armed),
            Next::Finished => None,
        }
    }

    /// Pause, keeping the cursor. Returns whether anything changed.
    pub fn pause(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }

        self.armed = None;
        self.anchor = None;
        self.state = PlaybackState::Paused;
        info!(cursor = self.cursor, "playback paused");
        true
    }

    /// Play if not playing, pause if playing
    pub fn toggle(&mut self, now: Instant) -> Option<Armed> {
        if self.is_playing() {
            self.pause();
            None
        } else {
            self.play(now)
        }
    }

    /// Stop and rewind to the first note
    pub fn stop(&mut self) {
        self.armed = None;
        self.anchor = None;
        self.cursor = 0;
        self.progress = 0.0;
        if self.state != PlaybackState::Stopped {
            info!("playback stopped");
        }
        self.state = PlaybackState::Stopped;
    }

    /// Change speed. While playing, timing is re-anchored at the new speed.
    pub fn set_speed(&mut self, factor: impl Into<PlaybackSpeed>, now: Instant) -> Option<Armed> {
        self.speed = factor.into();
        if self.pause() {
            self.play(now)
        } else {
            None
        }
    }

    /// Handle an expired timer.
    ///
    /// Returns `None` when `token` is not the live timer.
    pub fn fire(&mut self, token: TimerToken, now: Instant) -> Option<Fired> {
        if !self.is_playing() || self.armed != Some(token) {
            debug!(?token, "ignoring stale timer");
            return None;
        }
        self.armed = None;

        let index = self.cursor;
        let note = self.notes[index];
        self.cursor += 1;
        self.progress = self.cursor as f64 / self.notes.len() as f64;

        Some(Fired {
            pitch: note.pitch,
            hold: self.speed.scale(note.hold),
            index,
            progress: self.progress,
            next: self.schedule_next(now),
        })
    }

    /// Arm the timer for the note under the cursor, or finish
    fn schedule_next(&mut self, now: Instant) -> Next {
        let (Some(note), Some(anchor)) = (self.notes.get(self.cursor), self.anchor) else {
            self.finish();
            return Next::Finished;
        };

        let target = self.speed.scale(note.start_offset);
        let delay = target.saturating_sub(anchor.position_at(now));

        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.armed = Some(token);

        Next::Armed(Armed { token, delay })
    }

    /// Reached the end: rewind but leave the progress bar full
    fn finish(&mut self) {
        self.armed = None;
        self.anchor = None;
        self.cursor = 0;
        self.state = PlaybackState::Stopped;
        info!("playback finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn two_notes() -> Recording {
        Recording::from_notes(
            "Two",
            vec![
                NoteEvent::new("C3".parse().unwrap(), ms(0), ms(500)),
                NoteEvent::new("E3".parse().unwrap(), ms(600), ms(300)),
            ],
        )
    }

    fn loaded(recording: &Recording) -> PlaybackScheduler {
        let mut scheduler = PlaybackScheduler::new();
        scheduler.load(recording);
        scheduler
    }

    /// Fire every timer exactly on time, returning (pitch, fire time)
    fn run_to_end(
        scheduler: &mut PlaybackScheduler,
        t0: Instant,
        first: Armed,
    ) -> Vec<(String, Duration)> {
        let mut now = t0;
        let mut armed = first;
        let mut played = Vec::new();
        loop {
            now += armed.delay;
            let fired = scheduler.fire(armed.token, now).expect("live timer");
            played.push((fired.pitch.to_string(), now - t0));
            match fired.next {
                Next::Armed(next) => armed = next,
                Next::Finished => return played,
            }
        }
    }

    #[test]
    fn test_scheduler_creation() {
        let scheduler = PlaybackScheduler::new();
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
        assert_eq!(scheduler.cursor(), 0);
        assert_eq!(scheduler.progress(), 0.0);
    }

    #[test]
    fn test_play_empty_is_noop() {
        let mut scheduler = PlaybackScheduler::new();
        assert!(scheduler.play(Instant::now()).is_none());
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_normal_speed_timing() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());

        let first = scheduler.play(t0).unwrap();
        assert_eq!(first.delay, Duration::ZERO);

        let played = run_to_end(&mut scheduler, t0, first);
        assert_eq!(
            played,
            vec![("C3".to_string(), ms(0)), ("E3".to_string(), ms(600))]
        );
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
        assert_eq!(scheduler.progress(), 1.0);
        assert_eq!(scheduler.cursor(), 0);
    }

    #[test]
    fn test_double_speed_timing() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());
        scheduler.set_speed(2.0, t0);

        let first = scheduler.play(t0).unwrap();
        let played = run_to_end(&mut scheduler, t0, first);
        assert_eq!(played[1], ("E3".to_string(), ms(300)));
    }

    #[test]
    fn test_hold_scaled_by_speed() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());
        scheduler.set_speed(0.5, t0);

        let first = scheduler.play(t0).unwrap();
        let fired = scheduler.fire(first.token, t0).unwrap();
        assert_eq!(fired.hold, ms(1000));
        assert_eq!(fired.progress, 0.5);
        assert_eq!(fired.next, Next::Armed(Armed { token: scheduler.armed().unwrap(), delay: ms(1200) }));
    }

    #[test]
    fn test_late_callback_does_not_shift_following_notes() {
        let t0 = Instant::now();
        let recording = Recording::from_notes(
            "Three",
            vec![
                NoteEvent::new("C4".parse().unwrap(), ms(0), ms(10)),
                NoteEvent::new("D4".parse().unwrap(), ms(100), ms(10)),
                NoteEvent::new("E4".parse().unwrap(), ms(200), ms(10)),
            ],
        );
        let mut scheduler = loaded(&recording);
        let first = scheduler.play(t0).unwrap();
        let fired = scheduler.fire(first.token, t0).unwrap();
        let Next::Armed(second) = fired.next else { panic!("expected timer") };

        // Second callback runs 30ms late
        let fired = scheduler.fire(second.token, t0 + ms(130)).unwrap();
        let Next::Armed(third) = fired.next else { panic!("expected timer") };
        assert_eq!(third.delay, ms(70));
    }

    #[test]
    fn test_overdue_notes_fire_immediately() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());
        let first = scheduler.play(t0).unwrap();

        let fired = scheduler.fire(first.token, t0 + ms(5000)).unwrap();
        let Next::Armed(next) = fired.next else { panic!("expected timer") };
        assert_eq!(next.delay, Duration::ZERO);
    }

    #[test]
    fn test_pause_invalidates_timer() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());
        let first = scheduler.play(t0).unwrap();
        let fired = scheduler.fire(first.token, t0).unwrap();
        let Next::Armed(second) = fired.next else { panic!("expected timer") };

        assert!(scheduler.pause());
        assert_eq!(scheduler.state(), PlaybackState::Paused);
        assert!(scheduler.fire(second.token, t0 + ms(600)).is_none());
        assert_eq!(scheduler.cursor(), 1);
    }

    #[test]
    fn test_pause_resume_fires_second_note_once() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());
        let first = scheduler.play(t0).unwrap();
        let fired = scheduler.fire(first.token, t0).unwrap();
        let Next::Armed(stale) = fired.next else { panic!("expected timer") };

        scheduler.pause();
        let resumed = scheduler.play(t0 + ms(5000)).unwrap();

        // Timeline resumes at the cursor note
        assert_eq!(resumed.delay, Duration::ZERO);
        assert!(scheduler.fire(stale.token, t0 + ms(5000)).is_none());

        let fired = scheduler.fire(resumed.token, t0 + ms(5000)).unwrap();
        assert_eq!(fired.pitch.to_string(), "E3");
        assert_eq!(fired.next, Next::Finished);
        assert!(scheduler.fire(resumed.token, t0 + ms(5001)).is_none());
    }

    #[test]
    fn test_resume_keeps_spacing_at_other_speeds() {
        let t0 = Instant::now();
        let recording = Recording::from_notes(
            "Three",
            vec![
                NoteEvent::new("C4".parse().unwrap(), ms(0), ms(10)),
                NoteEvent::new("D4".parse().unwrap(), ms(1000), ms(10)),
                NoteEvent::new("E4".parse().unwrap(), ms(2000), ms(10)),
            ],
        );
        let mut scheduler = loaded(&recording);
        scheduler.set_speed(2.0, t0);
        let first = scheduler.play(t0).unwrap();
        scheduler.fire(first.token, t0).unwrap();
        scheduler.pause();

        let resumed = scheduler.play(t0 + ms(100)).unwrap();
        assert_eq!(resumed.delay, Duration::ZERO);
        let fired = scheduler.fire(resumed.token, t0 + ms(100)).unwrap();
        let Next::Armed(third) = fired.next else { panic!("expected timer") };
        assert_eq!(third.delay, ms(500));
    }

    #[test]
    fn test_stop_rewinds() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());
        let first = scheduler.play(t0).unwrap();
        scheduler.fire(first.token, t0).unwrap();

        scheduler.stop();
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
        assert_eq!(scheduler.cursor(), 0);
        assert_eq!(scheduler.progress(), 0.0);
        assert!(scheduler.armed().is_none());
    }

    #[test]
    fn test_set_speed_while_playing_rearms() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());
        let first = scheduler.play(t0).unwrap();
        scheduler.fire(first.token, t0).unwrap();
        let old = scheduler.armed().unwrap();

        let rearmed = scheduler.set_speed(3.0, t0 + ms(100)).unwrap();
        assert_eq!(scheduler.speed().factor(), 2.0);
        assert_ne!(rearmed.token, old);
        assert!(scheduler.fire(old, t0 + ms(600)).is_none());
        assert!(scheduler.is_playing());
    }

    #[test]
    fn test_set_speed_while_stopped_only_stores() {
        let mut scheduler = loaded(&two_notes());
        assert!(scheduler.set_speed(0.1, Instant::now()).is_none());
        assert_eq!(scheduler.speed().factor(), 0.5);
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_toggle() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());
        assert!(scheduler.toggle(t0).is_some());
        assert!(scheduler.is_playing());
        assert!(scheduler.toggle(t0).is_none());
        assert_eq!(scheduler.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_play_while_playing_is_noop() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());
        let first = scheduler.play(t0).unwrap();
        assert!(scheduler.play(t0).is_none());
        assert_eq!(scheduler.armed(), Some(first.token));
    }

    #[test]
    fn test_load_resets() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());
        let first = scheduler.play(t0).unwrap();
        scheduler.fire(first.token, t0).unwrap();

        scheduler.load(&two_notes());
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
        assert_eq!(scheduler.cursor(), 0);
        assert!(scheduler.armed().is_none());

        scheduler.unload();
        assert!(scheduler.notes().is_empty());
        assert!(scheduler.play(t0).is_none());
    }

    #[test]
    fn test_replay_after_finish_starts_over() {
        let t0 = Instant::now();
        let mut scheduler = loaded(&two_notes());
        let first = scheduler.play(t0).unwrap();
        run_to_end(&mut scheduler, t0, first);

        let t1 = t0 + ms(10_000);
        let again = scheduler.play(t1).unwrap();
        let played = run_to_end(&mut scheduler, t1, again);
        assert_eq!(played.len(), 2);
        assert_eq!(played[0].0, "C3");
    }
}
