//! Chroma profile extraction
//!
//! Folds magnitude spectra into 12 pitch classes (index 0 = C) and averages
//! them over time. Two front ends share the same folding and normalization:
//!
//! - **Linear**: each STFT bin is assigned to the pitch class nearest its
//!   reassigned frequency, when that frequency lies in `[fmin, fmax]`; bin power
//!   `|X|²` is summed per class. Reassignment moves every bin of a partial's
//!   main lobe onto the partial's own frequency, so low notes land on their
//!   pitch class even where bins are wider than a semitone.
//! - **Constant-Q**: bins are semitone aligned, so bin `k` belongs to pitch class
//!   `pc(fmin) + k` (mod 12).
//!
//! Each frame is L∞-normalized before averaging, so the profile lies in [0, 1].
//!
//! # Reference
//!
//! Müller, M., & Ewert, S. (2011). Chroma Toolbox: MATLAB Implementations for
//! Extracting Variants of Chroma-Based Audio Features. *ISMIR*.

use super::normalization::{mean_profile, normalize_max};
use crate::error::AnalysisError;
use crate::features::spectral::{FrequencyScale, ReassignedSpectrogram, Spectrogram};

/// Pitch class of A
const A_PITCH_CLASS: f32 = 9.0;

/// Half a semitone as a frequency ratio
const HALF_SEMITONE: f32 = 1.029_302_2;

/// Time-averaged 12-bin pitch-class profile (index 0 = C)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChromaProfile(pub [f32; 12]);

impl ChromaProfile {
    /// Profile values, index 0 = C
    pub fn values(&self) -> &[f32; 12] {
        &self.0
    }

    /// Sum of all pitch-class values
    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }
}

/// Chroma profiles from both front ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromaPair {
    /// Profile from the linear-frequency STFT
    pub linear: ChromaProfile,

    /// Profile from the constant-Q transform
    pub constant_q: ChromaProfile,
}

/// Nearest pitch class (0 = C) of `frequency`, with A4 tuned to `reference_hz`
pub fn pitch_class_index(frequency: f32, reference_hz: f32) -> usize {
    let semitones_from_c = 12.0 * (frequency / reference_hz).log2() + A_PITCH_CLASS;
    (semitones_from_c.round() as i64).rem_euclid(12) as usize
}

/// Linear-frequency chroma profile
///
/// The range bounds are widened by half a semitone, so a note sitting exactly
/// on `min_frequency` or `max_frequency` is folded.
///
/// # Arguments
///
/// * `stft` - Linear STFT magnitudes with reassigned bin frequencies
/// * `reference_hz` - Frequency of A4 (default: 440.0)
/// * `min_frequency` / `max_frequency` - Folded frequency range (default: 65.41-4186 Hz)
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a non-positive reference or an
/// empty frequency range.
pub fn linear_chroma(
    stft: &ReassignedSpectrogram,
    reference_hz: f32,
    min_frequency: f32,
    max_frequency: f32,
) -> Result<ChromaProfile, AnalysisError> {
    if !(reference_hz > 0.0) || !(max_frequency > min_frequency) {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid linear chroma parameters: reference={}, range=[{}, {}]",
            reference_hz, min_frequency, max_frequency
        )));
    }

    let low = min_frequency / HALF_SEMITONE;
    let high = max_frequency * HALF_SEMITONE;

    log::debug!(
        "Linear chroma: {} frames, {} bins, folding [{:.1}, {:.1}] Hz",
        stft.spectrogram.n_frames(),
        stft.spectrogram.n_bins(),
        low,
        high
    );

    Ok(fold_frames(&stft.spectrogram, |t, bin| {
        let frequency = stft.frequencies[t][bin];
        (frequency >= low && frequency <= high).then(|| pitch_class_index(frequency, reference_hz))
    }))
}

/// Constant-Q chroma profile
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the spectrogram is not a
/// constant-Q spectrogram with 12 bins per octave.
pub fn cqt_chroma(cqt: &Spectrogram, reference_hz: f32) -> Result<ChromaProfile, AnalysisError> {
    let min_frequency = match cqt.scale {
        FrequencyScale::ConstantQ {
            min_frequency,
            bins_per_octave: 12,
        } => min_frequency,
        _ => {
            return Err(AnalysisError::InvalidInput(
                "Constant-Q chroma requires 12 bins per octave".to_string(),
            ))
        }
    };

    let first_class = pitch_class_index(min_frequency, reference_hz);
    log::debug!(
        "Constant-Q chroma: {} frames, {} bins, bin 0 is pitch class {}",
        cqt.n_frames(),
        cqt.n_bins(),
        first_class
    );

    Ok(fold_frames(cqt, |_, bin| Some((first_class + bin) % 12)))
}

/// Sum bin power per pitch class; `class_of(frame, bin)` picks the class
fn fold_frames<F>(spectrogram: &Spectrogram, class_of: F) -> ChromaProfile
where
    F: Fn(usize, usize) -> Option<usize>,
{
    let frames: Vec<[f32; 12]> = spectrogram
        .frames
        .iter()
        .enumerate()
        .map(|(t, frame)| {
            let mut chroma = [0.0f32; 12];
            for (bin, &magnitude) in frame.iter().enumerate() {
                if let Some(pc) = class_of(t, bin) {
                    chroma[pc] += magnitude * magnitude;
                }
            }
            normalize_max(&mut chroma);
            chroma
        })
        .collect();

    ChromaProfile(mean_profile(&frames))
}
