//! Key detection from chroma profiles
//!
//! The key is the dominant pitch class of the time-averaged chroma profile;
//! its confidence is the share of the profile energy held by that class.
//! Two profiles (linear and constant-Q) are reconciled into one estimate.

use super::pitch_class::PitchClass;
use crate::features::chroma::{ChromaPair, ChromaProfile};

/// Added to the profile sum so silent profiles give zero confidence
const CONFIDENCE_EPSILON: f32 = 1e-6;

/// Dominant pitch class with a relative-dominance confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEstimate {
    /// Dominant pitch class
    pub pitch_class: PitchClass,

    /// `max / (sum + 1e-6)` of the profile, in [0, 1]
    pub confidence: f32,
}

/// Dominant pitch class of a chroma profile
///
/// Ties go to the lowest pitch-class index. An all-zero profile yields C with
/// confidence 0.
///
/// # Example
///
/// ```
/// use sonority_dsp::features::chroma::ChromaProfile;
/// use sonority_dsp::features::key::dominant_pitch_class;
/// use sonority_dsp::PitchClass;
///
/// let mut values = [0.0f32; 12];
/// values[9] = 0.9;
/// values[4] = 0.1;
/// let estimate = dominant_pitch_class(&ChromaProfile(values));
/// assert_eq!(estimate.pitch_class, PitchClass::A);
/// assert!((estimate.confidence - 0.9).abs() < 1e-4);
/// ```
pub fn dominant_pitch_class(profile: &ChromaProfile) -> KeyEstimate {
    let values = profile.values();
    let mut best = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = i;
        }
    }

    let sum = profile.sum();
    let confidence = (values[best] / (sum + CONFIDENCE_EPSILON)).clamp(0.0, 1.0);

    KeyEstimate {
        pitch_class: PitchClass::from_index(best),
        confidence,
    }
}

/// Reconcile the linear and constant-Q estimates into one key
///
/// The pitch class comes from the profile with the higher confidence; exactly
/// equal confidences keep the constant-Q pitch class. The reported confidence
/// is the mean of both confidences regardless of which profile won.
pub fn reconcile(pair: &ChromaPair) -> KeyEstimate {
    let linear = dominant_pitch_class(&pair.linear);
    let constant_q = dominant_pitch_class(&pair.constant_q);

    let pitch_class = if linear.confidence > constant_q.confidence {
        linear.pitch_class
    } else {
        constant_q.pitch_class
    };
    let confidence = 0.5 * (linear.confidence + constant_q.confidence);

    log::debug!(
        "Key: linear {} ({:.3}), constant-Q {} ({:.3}) -> {} ({:.3})",
        linear.pitch_class,
        linear.confidence,
        constant_q.pitch_class,
        constant_q.confidence,
        pitch_class,
        confidence
    );

    KeyEstimate {
        pitch_class,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(entries: &[(usize, f32)]) -> ChromaProfile {
        let mut values = [0.0f32; 12];
        for &(i, v) in entries {
            values[i] = v;
        }
        ChromaProfile(values)
    }

    #[test]
    fn test_dominant_single_class() {
        let estimate = dominant_pitch_class(&profile(&[(2, 1.0)]));
        assert_eq!(estimate.pitch_class, PitchClass::D);
        assert!(estimate.confidence > 0.999);
    }

    #[test]
    fn test_dominant_tie_picks_lowest_index() {
        let estimate = dominant_pitch_class(&profile(&[(7, 0.5), (4, 0.5)]));
        assert_eq!(estimate.pitch_class, PitchClass::E);
        assert!((estimate.confidence - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_dominant_silent_profile() {
        let estimate = dominant_pitch_class(&ChromaProfile::default());
        assert_eq!(estimate.pitch_class, PitchClass::C);
        assert_eq!(estimate.confidence, 0.0);
    }

    #[test]
    fn test_reconcile_higher_confidence_wins() {
        let pair = ChromaPair {
            linear: profile(&[(9, 0.6), (4, 0.4)]),
            constant_q: profile(&[(4, 0.9), (9, 0.1)]),
        };
        let estimate = reconcile(&pair);
        assert_eq!(estimate.pitch_class, PitchClass::E);
        // Mean of 0.6 and 0.9
        assert!((estimate.confidence - 0.75).abs() < 1e-4);
    }

    #[test]
    fn test_reconcile_tie_prefers_constant_q() {
        let pair = ChromaPair {
            linear: profile(&[(0, 1.0)]),
            constant_q: profile(&[(5, 1.0)]),
        };
        assert_eq!(reconcile(&pair).pitch_class, PitchClass::F);
    }

    #[test]
    fn test_reconcile_silence() {
        let pair = ChromaPair {
            linear: ChromaProfile::default(),
            constant_q: ChromaProfile::default(),
        };
        let estimate = reconcile(&pair);
        assert_eq!(estimate.pitch_class, PitchClass::C);
        assert_eq!(estimate.confidence, 0.0);
    }
}
