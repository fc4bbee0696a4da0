// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music primitives for the keyboard.

pub mod pitch;

pub use pitch::{Octave, Pitch, PitchClass, PitchParseError};
