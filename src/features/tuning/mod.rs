//! Tuning offset estimation
//!
//! Estimates how far the recording's pitch grid sits from equal temperament at
//! the reference A4, in fractional semitones within [-0.5, 0.5).
//!
//! # Algorithm
//!
//! 1. In each STFT frame, pick local magnitude maxima within the frequency range
//!    and above `threshold × frame max`
//! 2. Read each peak's frequency from the reassigned STFT, which resolves a
//!    stationary partial well below one bin
//! 3. Deviation from the nearest semitone: `d = p - round(p)` where
//!    `p = 12·log2(f / reference)`
//! 4. Magnitude-weighted circular mean of `2π·d`; a resultant shorter than
//!    `MIN_TUNING_CONCENTRATION` means no consistent tuning and yields 0
//!
//! # Reference
//!
//! Hainsworth, S., & Macleod, M. (2003). Time-frequency reassignment: a review
//! and analysis. *Cambridge University Engineering Department Technical Report*.

use std::f32::consts::PI;

use crate::error::AnalysisError;
use crate::features::spectral::{FrequencyScale, ReassignedSpectrogram};

const EPSILON: f32 = 1e-10;

/// Minimum resultant length of the deviation circular mean
///
/// Below this the deviations are too scattered (noise, atonal material) and the
/// tuning is reported as 0.
pub const MIN_TUNING_CONCENTRATION: f32 = 0.2;

/// Estimate the tuning offset of a linear STFT in semitones
///
/// # Arguments
///
/// * `stft` - Linear STFT magnitudes with reassigned bin frequencies
/// * `reference_hz` - Frequency of A4 (default: 440.0)
/// * `min_frequency` / `max_frequency` - Peak search range (default: 150-4000 Hz)
/// * `threshold` - Peak threshold relative to the frame maximum (default: 0.1)
///
/// # Returns
///
/// Offset in [-0.5, 0.5); 0.0 when there are no peaks or they disagree.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `reference_hz` is not positive.
pub fn estimate_tuning(
    stft: &ReassignedSpectrogram,
    reference_hz: f32,
    min_frequency: f32,
    max_frequency: f32,
    threshold: f32,
) -> Result<f32, AnalysisError> {
    if !(reference_hz > 0.0) {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid reference frequency: {}",
            reference_hz
        )));
    }

    let spectrogram = &stft.spectrogram;
    let FrequencyScale::Linear { frame_size } = spectrogram.scale else {
        return Ok(0.0);
    };

    let bin_hz = spectrogram.sample_rate as f32 / frame_size as f32;
    let first_bin = ((min_frequency / bin_hz).ceil() as usize).max(1);
    let last_bin =
        ((max_frequency / bin_hz).floor() as usize).min(spectrogram.n_bins().saturating_sub(2));

    let mut sum_cos = 0.0f64;
    let mut sum_sin = 0.0f64;
    let mut total_weight = 0.0f64;
    let mut n_peaks = 0usize;

    if first_bin <= last_bin {
        for (frame, frequencies) in spectrogram.frames.iter().zip(&stft.frequencies) {
            let frame_max = frame[first_bin..=last_bin]
                .iter()
                .copied()
                .fold(0.0f32, f32::max);
            if frame_max < EPSILON {
                continue;
            }
            let floor = threshold * frame_max;

            for k in first_bin..=last_bin {
                let m = frame[k];
                if m <= floor || m <= frame[k - 1] || m < frame[k + 1] {
                    continue;
                }

                let frequency = frequencies[k];
                if !(frequency > 0.0) {
                    continue;
                }
                let deviation = semitone_deviation(frequency, reference_hz);
                let angle = 2.0 * PI as f64 * deviation as f64;

                sum_cos += m as f64 * angle.cos();
                sum_sin += m as f64 * angle.sin();
                total_weight += m as f64;
                n_peaks += 1;
            }
        }
    }

    if n_peaks == 0 || total_weight <= EPSILON as f64 {
        log::debug!("Tuning: no spectral peaks, assuming 0");
        return Ok(0.0);
    }

    let concentration = ((sum_cos * sum_cos + sum_sin * sum_sin).sqrt() / total_weight) as f32;
    if concentration < MIN_TUNING_CONCENTRATION {
        log::debug!(
            "Tuning: {} peaks with concentration {:.3}, assuming 0",
            n_peaks,
            concentration
        );
        return Ok(0.0);
    }

    let tuning = wrap_semitone((sum_sin.atan2(sum_cos) / (2.0 * std::f64::consts::PI)) as f32);

    log::debug!(
        "Tuning: {:+.3} semitones from {} peaks (concentration {:.3})",
        tuning,
        n_peaks,
        concentration
    );

    Ok(tuning)
}

/// Signed distance in semitones from `frequency` to the nearest equal-tempered pitch
fn semitone_deviation(frequency: f32, reference_hz: f32) -> f32 {
    let pitch = 12.0 * (frequency / reference_hz).log2();
    pitch - pitch.round()
}

/// Wrap a semitone offset into [-0.5, 0.5)
fn wrap_semitone(value: f32) -> f32 {
    let wrapped = value - value.round();
    if wrapped >= 0.5 {
        wrapped - 1.0
    } else {
        wrapped
    }
}
