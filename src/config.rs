//! Configuration parameters for audio analysis

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Analysis configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // STFT parameters
    /// Frame size for STFT (default: 2048)
    /// Shared by tempo, linear chroma and tuning so their timelines line up
    pub frame_size: usize,

    /// Hop size for STFT (default: 512)
    pub hop_size: usize,

    // BPM detection
    /// Minimum BPM to consider (default: 30.0)
    pub min_bpm: f32,

    /// Maximum BPM to consider (default: 300.0)
    pub max_bpm: f32,

    /// Onset strength smoothing window in frames (default: 3)
    pub onset_smoothing_frames: usize,

    /// Optional tempo prior center in BPM (default: None = unweighted)
    ///
    /// When set, lag strengths are weighted by a log-normal prior centered on
    /// this tempo with a one-octave standard deviation.
    pub tempo_prior_bpm: Option<f32>,

    // Key detection
    /// Reference frequency of A4 in Hz (default: 440.0)
    pub reference_frequency: f32,

    /// Lowest frequency folded into the linear chroma (default: 65.41 Hz, C2)
    /// Notes within half a semitone of either bound are still folded
    pub chroma_min_frequency: f32,

    /// Highest frequency folded into the linear chroma (default: 4186.0 Hz, C8)
    pub chroma_max_frequency: f32,

    /// Lowest constant-Q bin center (default: 65.406 Hz, C2)
    pub cqt_min_frequency: f32,

    /// Number of constant-Q octaves (default: 7)
    pub cqt_octaves: usize,

    /// Constant-Q filter scale (default: 2.0)
    /// Values above 1.0 narrow each bin below the semitone spacing
    pub cqt_filter_scale: f32,

    /// Evaluate the constant-Q transform on every Nth STFT frame center (default: 4)
    pub cqt_frame_stride: usize,

    /// Key confidence below which `WeakTonality` is flagged (default: 0.2)
    pub weak_tonality_threshold: f32,

    // Tuning
    /// Lowest peak frequency used for tuning (default: 150.0 Hz)
    pub tuning_min_frequency: f32,

    /// Highest peak frequency used for tuning (default: 4000.0 Hz)
    pub tuning_max_frequency: f32,

    /// Peak threshold relative to the frame maximum (default: 0.1)
    pub tuning_peak_threshold: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            min_bpm: 30.0,
            max_bpm: 300.0,
            onset_smoothing_frames: 3,
            tempo_prior_bpm: None,
            reference_frequency: 440.0,
            chroma_min_frequency: 65.41,
            chroma_max_frequency: 4186.0,
            cqt_min_frequency: 65.406,
            cqt_octaves: 7,
            cqt_filter_scale: 2.0,
            cqt_frame_stride: 4,
            weak_tonality_threshold: 0.2,
            tuning_min_frequency: 150.0,
            tuning_max_frequency: 4000.0,
            tuning_peak_threshold: 0.1,
        }
    }
}

impl AnalysisConfig {
    /// Check that the parameters are mutually consistent
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` naming the first offending parameter.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.frame_size < 4 || self.frame_size % 2 != 0 {
            return Err(invalid(format!(
                "frame_size must be an even number >= 4, got {}",
                self.frame_size
            )));
        }

        if self.hop_size == 0 || self.hop_size > self.frame_size {
            return Err(invalid(format!(
                "hop_size must be in 1..={}, got {}",
                self.frame_size, self.hop_size
            )));
        }

        if !(self.min_bpm > 0.0 && self.max_bpm > self.min_bpm) {
            return Err(invalid(format!(
                "Invalid BPM range: [{:.1}, {:.1}]",
                self.min_bpm, self.max_bpm
            )));
        }

        if let Some(prior) = self.tempo_prior_bpm {
            if !(prior > 0.0 && prior.is_finite()) {
                return Err(invalid(format!("tempo_prior_bpm must be > 0, got {}", prior)));
            }
        }

        let positive = [
            ("reference_frequency", self.reference_frequency),
            ("chroma_min_frequency", self.chroma_min_frequency),
            ("cqt_min_frequency", self.cqt_min_frequency),
            ("cqt_filter_scale", self.cqt_filter_scale),
            ("tuning_min_frequency", self.tuning_min_frequency),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(invalid(format!("{} must be > 0, got {}", name, value)));
            }
        }

        if self.chroma_max_frequency <= self.chroma_min_frequency {
            return Err(invalid(format!(
                "Invalid chroma range: [{:.1}, {:.1}] Hz",
                self.chroma_min_frequency, self.chroma_max_frequency
            )));
        }

        if self.tuning_max_frequency <= self.tuning_min_frequency {
            return Err(invalid(format!(
                "Invalid tuning range: [{:.1}, {:.1}] Hz",
                self.tuning_min_frequency, self.tuning_max_frequency
            )));
        }

        if self.cqt_octaves == 0 || self.cqt_frame_stride == 0 {
            return Err(invalid(
                "cqt_octaves and cqt_frame_stride must be > 0".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.tuning_peak_threshold) {
            return Err(invalid(format!(
                "tuning_peak_threshold must be in [0, 1), got {}",
                self.tuning_peak_threshold
            )));
        }

        if !(0.0..=1.0).contains(&self.weak_tonality_threshold) {
            return Err(invalid(format!(
                "weak_tonality_threshold must be in [0, 1], got {}",
                self.weak_tonality_threshold
            )));
        }

        Ok(())
    }
}

fn invalid(msg: String) -> AnalysisError {
    AnalysisError::InvalidInput(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_frame_and_hop() {
        let config = AnalysisConfig {
            frame_size: 2047,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            hop_size: 4096,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_bpm_range() {
        let config = AnalysisConfig {
            min_bpm: 180.0,
            max_bpm: 60.0,
            ..AnalysisConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("BPM range"));
    }

    #[test]
    fn test_invalid_reference() {
        let config = AnalysisConfig {
            reference_frequency: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            tempo_prior_bpm: Some(-1.0),
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"hop_size": 256}"#).unwrap();
        assert_eq!(config.hop_size, 256);
        assert_eq!(config.frame_size, 2048);
        assert!(config.validate().is_ok());
    }
}
