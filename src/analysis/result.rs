//! Analysis result types

use serde::{Deserialize, Serialize};

use crate::features::key::PitchClass;

/// Analysis flags
///
/// Degenerate input is reported through sentinel values plus these flags
/// rather than as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisFlag {
    /// No loudness block passed the absolute gate (`lufs` is -∞)
    Silent,
    /// No periodicity in the onset signal (`bpm` is 0)
    NoPeriodicity,
    /// Key confidence below the configured threshold (atonal/ambiguous)
    WeakTonality,
    /// Linear and constant-Q chroma chose different pitch classes
    ChromaDisagreement,
}

/// Complete analysis result
///
/// Field names match the JSON response of the analysis service:
///
/// ```json
/// {"bpm":120.2,"key":"A","key_confidence":0.93,"lufs":-23.0,"duration":30.0,"tuning":0.01,"flags":[]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Tempo in BPM (0.0 when no periodicity was found)
    pub bpm: f32,

    /// Dominant pitch class, serialized by name ("C", "C#", ...)
    pub key: PitchClass,

    /// Key confidence (0.0-1.0), a relative-dominance score
    pub key_confidence: f32,

    /// Integrated loudness in LUFS
    ///
    /// `-inf` for silence; serialized as `null` since JSON has no infinity.
    #[serde(with = "lufs_serde")]
    pub lufs: f32,

    /// Duration in seconds (`samples / sample_rate`)
    pub duration: f32,

    /// Tuning offset from A4 = reference in semitones, in [-0.5, 0.5)
    pub tuning: f32,

    /// Degenerate-signal flags
    pub flags: Vec<AnalysisFlag>,
}

impl AnalysisResult {
    /// Whether `flag` was raised
    pub fn has_flag(&self, flag: AnalysisFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Key name in sharp notation
    pub fn key_name(&self) -> &'static str {
        self.key.name()
    }
}

mod lufs_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(lufs: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        if lufs.is_finite() {
            serializer.serialize_some(lufs)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::NEG_INFINITY))
    }
}
