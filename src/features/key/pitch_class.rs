//! Pitch classes and their names

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pitch class names, index 0 = C ascending by semitone
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One of the 12 equal-tempered pitch classes
///
/// Serializes as its name (e.g. `"C#"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PitchClass {
    /// C
    #[default]
    C,
    /// C♯ / D♭
    #[serde(rename = "C#")]
    CSharp,
    /// D
    D,
    /// D♯ / E♭
    #[serde(rename = "D#")]
    DSharp,
    /// E
    E,
    /// F
    F,
    /// F♯ / G♭
    #[serde(rename = "F#")]
    FSharp,
    /// G
    G,
    /// G♯ / A♭
    #[serde(rename = "G#")]
    GSharp,
    /// A
    A,
    /// A♯ / B♭
    #[serde(rename = "A#")]
    ASharp,
    /// B
    B,
}

impl PitchClass {
    /// All pitch classes in index order
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Pitch class for an index, wrapping modulo 12
    ///
    /// # Example
    ///
    /// ```
    /// use sonority_dsp::PitchClass;
    ///
    /// assert_eq!(PitchClass::from_index(9), PitchClass::A);
    /// assert_eq!(PitchClass::from_index(13), PitchClass::CSharp);
    /// ```
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    /// Semitone index, 0 = C
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name in sharp notation ("C", "C#", ...)
    pub fn name(self) -> &'static str {
        PITCH_CLASS_NAMES[self.index()]
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for (i, pc) in PitchClass::ALL.iter().enumerate() {
            assert_eq!(pc.index(), i);
            assert_eq!(PitchClass::from_index(i), *pc);
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(PitchClass::C.name(), "C");
        assert_eq!(PitchClass::FSharp.to_string(), "F#");
        assert_eq!(PitchClass::B.name(), "B");
    }

    #[test]
    fn test_serializes_as_name() {
        assert_eq!(serde_json::to_string(&PitchClass::CSharp).unwrap(), "\"C#\"");
        assert_eq!(serde_json::to_string(&PitchClass::A).unwrap(), "\"A\"");
        let pc: PitchClass = serde_json::from_str("\"G#\"").unwrap();
        assert_eq!(pc, PitchClass::GSharp);
    }
}
