// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recording playback.
//!
//! This module provides:
//! - Speed control clamped to 0.5x - 2.0x
//! - A clock-free scheduler state machine
//! - A tokio transport that drives the scheduler in real time

pub mod scheduler;
pub mod speed;
pub mod transport;

pub use scheduler::{Armed, Fired, Next, PlaybackScheduler, PlaybackState, TimerToken};
pub use speed::PlaybackSpeed;
pub use transport::{Transport, TransportEvent};
