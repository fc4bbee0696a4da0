// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch names for the three-octave keyboard.
//!
//! A [`Pitch`] is one of 36 fixed symbols: the twelve chromatic pitch
//! classes (sharps only) in octaves 3, 4 and 5. The text form (`"C#4"`)
//! is what appears in recording files, so parsing is exact and
//! case-sensitive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semitone offset type
pub type Semitones = u8;

/// Pitch class (sharps only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    /// All pitch classes in chromatic order
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Semitones above C (0-11)
    pub fn semitone(self) -> Semitones {
        self as Semitones
    }

    /// Symbol used in the text form
    pub fn symbol(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    /// Whether this class sits on a black key
    pub fn is_sharp(self) -> bool {
        matches!(
            self,
            PitchClass::Cs | PitchClass::Ds | PitchClass::Fs | PitchClass::Gs | PitchClass::As
        )
    }

    fn from_symbol(s: &str) -> Option<Self> {
        PitchClass::ALL.iter().copied().find(|pc| pc.symbol() == s)
    }
}

/// Octave of the keyboard range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Octave {
    Three,
    Four,
    Five,
}

impl Octave {
    /// All octaves, low to high
    pub const ALL: [Octave; 3] = [Octave::Three, Octave::Four, Octave::Five];

    /// Octave number as written in pitch names
    pub fn number(self) -> u8 {
        match self {
            Octave::Three => 3,
            Octave::Four => 4,
            Octave::Five => 5,
        }
    }

    fn from_digit(c: char) -> Option<Self> {
        match c {
            '3' => Some(Octave::Three),
            '4' => Some(Octave::Four),
            '5' => Some(Octave::Five),
            _ => None,
        }
    }
}

/// Error returned when a string is not one of the 36 pitch names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown pitch name: {0:?}")]
pub struct PitchParseError(pub String);

/// One key of the 36-key keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pitch {
    // Field order gives ascending pitch ordering
    octave: Octave,
    class: PitchClass,
}

impl Pitch {
    /// Number of pitches on the keyboard
    pub const COUNT: usize = 36;

    /// All 36 pitches in ascending order
    pub const ALL: [Pitch; Pitch::COUNT] = {
        let mut all = [Pitch::new(PitchClass::C, Octave::Three); Pitch::COUNT];
        let mut i = 0;
        while i < Pitch::COUNT {
            let octave = match i / 12 {
                0 => Octave::Three,
                1 => Octave::Four,
                _ => Octave::Five,
            };
            all[i] = Pitch::new(PitchClass::ALL[i % 12], octave);
            i += 1;
        }
        all
    };

    /// Create a pitch
    pub const fn new(class: PitchClass, octave: Octave) -> Self {
        Self { octave, class }
    }

    /// Pitch class
    pub fn class(self) -> PitchClass {
        self.class
    }

    /// Octave
    pub fn octave(self) -> Octave {
        self.octave
    }

    /// MIDI note number (C4 = 60)
    pub fn midi_number(self) -> u8 {
        (self.octave.number() + 1) * 12 + self.class.semitone()
    }

    /// Base sample octave and semitone shift used to render this pitch.
    ///
    /// Each octave has one recorded sample of its C; every other pitch
    /// is that sample shifted up by the pitch-class offset.
    pub fn sample_offset(self) -> (Octave, Semitones) {
        (self.octave, self.class.semitone())
    }

    /// Playback-rate multiplier applied to the base sample
    pub fn playback_rate(self) -> f64 {
        2f64.powf(self.class.semitone() as f64 / 12.0)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class.symbol(), self.octave.number())
    }
}

impl FromStr for Pitch {
    type Err = PitchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PitchParseError(s.to_string());
        let mut chars = s.chars();
        let digit = chars.next_back().ok_or_else(err)?;
        let octave = Octave::from_digit(digit).ok_or_else(err)?;
        let class = PitchClass::from_symbol(chars.as_str()).ok_or_else(err)?;
        Ok(Pitch::new(class, octave))
    }
}

impl TryFrom<String> for Pitch {
    type Error = PitchParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pitch> for String {
    fn from(pitch: Pitch) -> Self {
        pitch.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_pitches_distinct_and_ordered() {
        let names: HashSet<String> = Pitch::ALL.iter().map(|p| p.to_string()).collect();
        assert_eq!(names.len(), 36);

        let midi: Vec<u8> = Pitch::ALL.iter().map(|p| p.midi_number()).collect();
        assert_eq!(midi, (48..84).collect::<Vec<u8>>());
        assert!(Pitch::ALL.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Pitch::ALL[0].to_string(), "C3");
        assert_eq!(Pitch::ALL[35].to_string(), "B5");
    }

    #[test]
    fn test_parse_round_trip() {
        for pitch in Pitch::ALL {
            assert_eq!(pitch.to_string().parse::<Pitch>(), Ok(pitch));
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        for bad in ["", "C", "H4", "C6", "C2", "c4", "Db4", "C#", "C#44", " C4", "E#4"] {
            assert!(bad.parse::<Pitch>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_sample_offset() {
        let fs4: Pitch = "F#4".parse().unwrap();
        assert_eq!(fs4.sample_offset(), (Octave::Four, 6));

        let c5: Pitch = "C5".parse().unwrap();
        assert_eq!(c5.sample_offset(), (Octave::Five, 0));
        assert_eq!(c5.playback_rate(), 1.0);

        let b3: Pitch = "B3".parse().unwrap();
        assert_eq!(b3.sample_offset(), (Octave::Three, 11));
    }

    #[test]
    fn test_midi_number() {
        let a4: Pitch = "A4".parse().unwrap();
        assert_eq!(a4.midi_number(), 69);

        let c3: Pitch = "C3".parse().unwrap();
        assert_eq!(c3.midi_number(), 48);
    }

    #[test]
    fn test_octave_up_doubles_rate() {
        let rate = Pitch::new(PitchClass::B, Octave::Four).playback_rate();
        assert!(rate < 2.0 && rate > 1.88);
    }

    #[test]
    fn test_serde_as_string() {
        let pitch: Pitch = serde_json::from_str("\"G#3\"").unwrap();
        assert_eq!(pitch, Pitch::new(PitchClass::Gs, Octave::Three));
        assert_eq!(serde_json::to_string(&pitch).unwrap(), "\"G#3\"");
        assert!(serde_json::from_str::<Pitch>("\"X9\"").is_err());
    }
}
