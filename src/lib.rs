// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! KEYS - terminal virtual piano with recorder and playback.

pub mod audio;
pub mod config;
pub mod control;
pub mod music;
pub mod playback;
pub mod recording;
pub mod session;
pub mod ui;
