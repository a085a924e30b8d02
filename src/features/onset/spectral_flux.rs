//! Spectral flux onset strength
//!
//! Computes frame-to-frame positive spectral change, emphasizing increases in
//! magnitude (onsets) over decays.
//!
//! Algorithm:
//! 1. Log-compress magnitudes: `L = ln(1 + γ·|X|)` with γ = 100
//! 2. Half-wave rectified difference summed across bins:
//!    `flux[t] = Σ_k max(0, L[t][k] - L[t-1][k])`, `flux[0] = 0`
//! 3. Centered moving average over `smoothing_frames` frames
//!
//! # Reference
//!
//! Bello, J. P., Daudet, L., Abdallah, S., Duxbury, C., Davies, M., & Sandler, M. B. (2005).
//! A Tutorial on Onset Detection in Music Signals.
//! *IEEE Transactions on Speech and Audio Processing*, 13(5), 1035-1047.

use crate::error::AnalysisError;
use crate::features::spectral::Spectrogram;

/// Log compression gain applied before differencing
const LOG_COMPRESSION: f32 = 100.0;

/// Compute the onset strength curve of a magnitude spectrogram
///
/// # Arguments
///
/// * `spectrogram` - Linear STFT magnitudes (n_frames × n_bins)
/// * `smoothing_frames` - Moving-average window in frames (0 or 1 disables smoothing)
///
/// # Returns
///
/// One non-negative value per frame (same length as the frame sequence).
/// Silent input yields an all-zero curve.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if frames have inconsistent lengths.
pub fn onset_strength(
    spectrogram: &Spectrogram,
    smoothing_frames: usize,
) -> Result<Vec<f32>, AnalysisError> {
    let frames = &spectrogram.frames;
    if frames.is_empty() {
        return Ok(Vec::new());
    }

    let n_bins = frames[0].len();
    for (i, frame) in frames.iter().enumerate() {
        if frame.len() != n_bins {
            return Err(AnalysisError::InvalidInput(format!(
                "Inconsistent frame lengths: frame 0 has {} bins, frame {} has {} bins",
                n_bins,
                i,
                frame.len()
            )));
        }
    }

    log::debug!(
        "Computing onset strength: {} frames, {} bins per frame",
        frames.len(),
        n_bins
    );

    let mut flux = Vec::with_capacity(frames.len());
    flux.push(0.0f32);

    let compress = |m: f32| (LOG_COMPRESSION * m).ln_1p();
    for pair in frames.windows(2) {
        let value: f32 = pair[0]
            .iter()
            .zip(pair[1].iter())
            .map(|(&prev, &curr)| (compress(curr) - compress(prev)).max(0.0))
            .sum();
        flux.push(value);
    }

    Ok(smooth_moving_average(&flux, smoothing_frames))
}

/// Centered moving average
///
/// Edges average over the part of the window that lies inside the signal, so a
/// constant signal stays constant.
pub fn smooth_moving_average(signal: &[f32], window: usize) -> Vec<f32> {
    if window <= 1 || signal.is_empty() {
        return signal.to_vec();
    }

    let before = (window - 1) / 2;
    let after = window - 1 - before;

    (0..signal.len())
        .map(|i| {
            let start = i.saturating_sub(before);
            let end = (i + after + 1).min(signal.len());
            signal[start..end].iter().sum::<f32>() / (end - start) as f32
        })
        .collect()
}
