// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tokio driver for [`PlaybackScheduler`].
//!
//! Each armed timer becomes one spawned sleep task. When it wakes it
//! fires the scheduler, sounds the note and spawns its successor. The
//! clock is `tokio::time::Instant`, so paused-time tests drive playback
//! deterministically.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::scheduler::{Armed, Next, PlaybackScheduler, PlaybackState};
use super::speed::PlaybackSpeed;
use crate::audio::NotePlayer;
use crate::music::Pitch;
use crate::recording::Recording;

/// Something the UI should react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportEvent {
    /// A note was sounded; show the key held for `hold`
    NoteStarted { pitch: Pitch, hold: Duration },
    /// Fraction of notes played
    Progress(f64),
    /// Play/pause/stop state changed
    StateChanged(PlaybackState),
    /// The last note played
    Finished,
}

/// A spawned timer task, aborted when dropped
#[derive(Debug)]
struct ScheduledTask(JoinHandle<()>);

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct TransportInner {
    scheduler: Mutex<PlaybackScheduler>,
    task: Mutex<Option<ScheduledTask>>,
    player: Arc<dyn NotePlayer>,
    events: UnboundedSender<TransportEvent>,
    runtime: Handle,
}

/// Plays a loaded recording in real time
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl Transport {
    /// Create a transport that sounds notes through `player`.
    ///
    /// Timer tasks are spawned on `runtime`.
    pub fn new(
        player: Arc<dyn NotePlayer>,
        runtime: Handle,
    ) -> (Self, UnboundedReceiver<TransportEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let inner = TransportInner {
            scheduler: Mutex::new(PlaybackScheduler::new()),
            task: Mutex::new(None),
            player,
            events,
            runtime,
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            rx,
        )
    }

    /// Replace the note sequence, cancelling playback
    pub fn load(&self, recording: &Recording) {
        self.inner.cancel();
        self.inner.scheduler().load(recording);
        self.inner.emit(TransportEvent::StateChanged(PlaybackState::Stopped));
        self.inner.emit(TransportEvent::Progress(0.0));
    }

    /// Drop the note sequence, cancelling playback
    pub fn unload(&self) {
        self.inner.cancel();
        self.inner.scheduler().unload();
        self.inner.emit(TransportEvent::StateChanged(PlaybackState::Stopped));
        self.inner.emit(TransportEvent::Progress(0.0));
    }

    /// Start or resume playback
    pub fn play(&self) {
        let armed = self.inner.scheduler().play(now());
        if let Some(armed) = armed {
            self.inner.emit(TransportEvent::StateChanged(PlaybackState::Playing));
            self.inner.arm(armed);
        }
    }

    /// Pause, keeping the position
    pub fn pause(&self) {
        let paused = self.inner.scheduler().pause();
        if paused {
            self.inner.cancel();
            self.inner.emit(TransportEvent::StateChanged(PlaybackState::Paused));
        }
    }

    /// Play when not playing, pause when playing
    pub fn toggle(&self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Stop and rewind
    pub fn stop(&self) {
        self.inner.cancel();
        self.inner.scheduler().stop();
        self.inner.emit(TransportEvent::StateChanged(PlaybackState::Stopped));
        self.inner.emit(TransportEvent::Progress(0.0));
    }

    /// Change playback speed, re-timing the pending note if playing
    pub fn set_speed(&self, factor: impl Into<PlaybackSpeed>) {
        let armed = self.inner.scheduler().set_speed(factor, now());
        if let Some(armed) = armed {
            self.inner.arm(armed);
        }
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.inner.scheduler().state()
    }

    /// Check if playing
    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Current speed
    pub fn speed(&self) -> PlaybackSpeed {
        self.inner.scheduler().speed()
    }

    /// Fraction of notes played
    pub fn progress(&self) -> f64 {
        self.inner.scheduler().progress()
    }

    /// Number of loaded notes
    pub fn note_count(&self) -> usize {
        self.inner.scheduler().notes().len()
    }
}

impl TransportInner {
    fn scheduler(&self) -> MutexGuard<'_, PlaybackScheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: TransportEvent) {
        // Receiver gone means nobody is watching; playback carries on
        let _ = self.events.send(event);
    }

    fn cancel(&self) {
        self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Spawn the one task for `armed`, replacing any previous one.
    ///
    /// Does nothing unless `armed` is still the scheduler's live timer.
    fn arm(self: &Arc<Self>, armed: Armed) {
        trace!(delay_ms = armed.delay.as_millis() as u64, "arming timer");
        let weak: Weak<Self> = Arc::downgrade(self);

        // Held across spawn so a zero-delay task cannot store its successor first
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if self.scheduler().armed() != Some(armed.token) {
            // Paused, stopped or re-armed while this callback was running
            trace!("timer superseded");
            return;
        }
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(armed.delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.on_timer(armed);
            }
        });
        *task = Some(ScheduledTask(handle));
    }

    fn on_timer(self: &Arc<Self>, armed: Armed) {
        let fired = self.scheduler().fire(armed.token, now());
        let Some(fired) = fired else {
            return;
        };

        debug!(pitch = %fired.pitch, midi = fired.pitch.midi_number(), index = fired.index, "note fired");
        self.player.play_note(fired.pitch);
        self.emit(TransportEvent::NoteStarted {
            pitch: fired.pitch,
            hold: fired.hold,
        });
        self.emit(TransportEvent::Progress(fired.progress));

        match fired.next {
            Next::Armed(next) => self.arm(next),
            Next::Finished => {
                let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
                if self.scheduler().armed().is_none() {
                    task.take();
                }
                drop(task);
                self.emit(TransportEvent::StateChanged(PlaybackState::Stopped));
                self.emit(TransportEvent::Finished);
            }
        }
    }
}
