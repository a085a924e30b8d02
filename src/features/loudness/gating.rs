//! Gated loudness integration (ITU-R BS.1770-4 / EBU R 128)
//!
//! Algorithm:
//! 1. K-weight the signal
//! 2. Mean square over 400 ms blocks stepped by 100 ms (75 % overlap)
//! 3. Absolute gate: drop blocks below -70 LUFS
//! 4. Relative gate: drop blocks more than 10 LU below the mean of the
//!    absolute-gated blocks
//! 5. `LUFS = -0.691 + 10·log10(mean square of the remaining blocks)`
//!
//! # Reference
//!
//! ITU-R BS.1770-4 (2015). Algorithms to measure audio programme loudness and true-peak audio level.
//! EBU R 128 (2020). Loudness normalisation and permitted maximum level of audio signals.

use super::k_weighting::KWeightingFilter;
use crate::error::AnalysisError;

/// Loudness reported when no block passes the absolute gate
pub const SILENCE_LUFS: f32 = f32::NEG_INFINITY;

/// Absolute gate threshold (LUFS)
const ABSOLUTE_GATE_LUFS: f64 = -70.0;

/// Relative gate offset below the absolute-gated loudness (LU)
const RELATIVE_GATE_LU: f64 = -10.0;

/// Offset in the BS.1770 loudness formula
const LOUDNESS_OFFSET: f64 = -0.691;

/// Gating block length in tenths of a second (400 ms)
const BLOCK_TENTHS: usize = 4;

/// Integrated loudness of a mono buffer in LUFS
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// Integrated loudness, or `SILENCE_LUFS` (-∞) if every block is below the
/// absolute gate. A buffer shorter than one 400 ms block is measured as a
/// single block.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero sample rate and
/// `AnalysisError::EmptyInput` for an empty buffer.
///
/// # Example
///
/// ```
/// use sonority_dsp::features::loudness::{integrated_loudness, SILENCE_LUFS};
///
/// let silence = vec![0.0f32; 48000];
/// assert_eq!(integrated_loudness(&silence, 48000)?, SILENCE_LUFS);
/// # Ok::<(), sonority_dsp::AnalysisError>(())
/// ```
pub fn integrated_loudness(samples: &[f32], sample_rate: u32) -> Result<f32, AnalysisError> {
    let energies = block_energies(samples, sample_rate)?;

    let absolute_threshold = energy_of(ABSOLUTE_GATE_LUFS);
    let Some(absolute_mean) = gated_mean(&energies, absolute_threshold) else {
        log::warn!("All loudness blocks below the absolute gate (-70 LUFS)");
        return Ok(SILENCE_LUFS);
    };

    let relative_threshold = energy_of(loudness_of(absolute_mean) + RELATIVE_GATE_LU);
    let threshold = relative_threshold.max(absolute_threshold);
    let mean = gated_mean(&energies, threshold).unwrap_or(absolute_mean);

    let lufs = loudness_of(mean) as f32;
    log::debug!(
        "Integrated loudness: {:.2} LUFS from {} blocks ({} above relative gate)",
        lufs,
        energies.len(),
        energies.iter().filter(|&&e| e > threshold).count()
    );

    Ok(lufs)
}

/// Loudness of every gating block in LUFS (momentary loudness)
///
/// Blocks start every 100 ms; silent blocks read `SILENCE_LUFS`.
///
/// # Errors
///
/// Same as [`integrated_loudness`].
pub fn block_loudness(samples: &[f32], sample_rate: u32) -> Result<Vec<f32>, AnalysisError> {
    Ok(block_energies(samples, sample_rate)?
        .into_iter()
        .map(|e| {
            if e > 0.0 {
                loudness_of(e) as f32
            } else {
                SILENCE_LUFS
            }
        })
        .collect())
}

/// Mean square of each K-weighted gating block
fn block_energies(samples: &[f32], sample_rate: u32) -> Result<Vec<f64>, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid sample rate: 0".to_string(),
        ));
    }

    if samples.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let step = (sample_rate as usize / 10).max(1);
    let block = (sample_rate as usize * BLOCK_TENTHS / 10).max(1);

    let mut filter = KWeightingFilter::new(sample_rate);
    let squared: Vec<f64> = filter
        .process_buffer(samples)
        .into_iter()
        .map(|y| y * y)
        .collect();

    if squared.len() < block {
        log::debug!(
            "Buffer of {} samples shorter than one gating block ({}), measuring as one block",
            squared.len(),
            block
        );
        return Ok(vec![squared.iter().sum::<f64>() / squared.len() as f64]);
    }

    let n_blocks = 1 + (squared.len() - block) / step;
    log::debug!(
        "Loudness gating: {} blocks of {} samples, step {}",
        n_blocks,
        block,
        step
    );

    Ok((0..n_blocks)
        .map(|i| {
            let start = i * step;
            squared[start..start + block].iter().sum::<f64>() / block as f64
        })
        .collect())
}

/// Mean of the energies strictly above `threshold`, if any
fn gated_mean(energies: &[f64], threshold: f64) -> Option<f64> {
    let (sum, count) = energies
        .iter()
        .filter(|&&e| e > threshold)
        .fold((0.0f64, 0usize), |(s, c), &e| (s + e, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn loudness_of(mean_square: f64) -> f64 {
    LOUDNESS_OFFSET + 10.0 * mean_square.log10()
}

fn energy_of(lufs: f64) -> f64 {
    10.0f64.powf((lufs - LOUDNESS_OFFSET) / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_test_signal(freq: f32, amplitude: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let len = (sample_rate as f32 * seconds) as usize;
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                amplitude * (2.0 * std::f64::consts::PI * freq as f64 * t).sin() as f32
            })
            .collect()
    }

    #[test]
    fn test_full_scale_997hz_reads_minus_3() {
        let samples = generate_test_signal(997.0, 1.0, 48000, 5.0);
        let lufs = integrated_loudness(&samples, 48000).unwrap();
        assert!((lufs + 3.01).abs() < 0.1, "got {:.3} LUFS", lufs);
    }

    #[test]
    fn test_level_scales_with_amplitude() {
        let loud = integrated_loudness(&generate_test_signal(997.0, 0.5, 44100, 3.0), 44100).unwrap();
        let quiet = integrated_loudness(&generate_test_signal(997.0, 0.05, 44100, 3.0), 44100).unwrap();
        assert!(((loud - quiet) - 20.0).abs() < 0.1, "difference {}", loud - quiet);
    }

    #[test]
    fn test_silence_returns_sentinel() {
        let lufs = integrated_loudness(&vec![0.0f32; 48000], 48000).unwrap();
        assert_eq!(lufs, SILENCE_LUFS);
        assert!(!lufs.is_nan());

        // Below the absolute gate
        let whisper = generate_test_signal(997.0, 1e-5, 48000, 1.0);
        assert_eq!(integrated_loudness(&whisper, 48000).unwrap(), SILENCE_LUFS);
    }

    #[test]
    fn test_relative_gate_ignores_quiet_section() {
        let mut samples = generate_test_signal(997.0, 0.1, 48000, 5.0);
        samples.extend(generate_test_signal(997.0, 0.001, 48000, 5.0));

        let lufs = integrated_loudness(&samples, 48000).unwrap();
        // Quiet half is at -63 LUFS: above the absolute gate, below the relative one
        assert!((lufs + 23.0).abs() < 0.5, "got {:.3} LUFS", lufs);
    }

    #[test]
    fn test_short_buffer_single_block() {
        let samples = generate_test_signal(997.0, 0.1, 48000, 0.1);
        let blocks = block_loudness(&samples, 48000).unwrap();
        assert_eq!(blocks.len(), 1);

        let lufs = integrated_loudness(&samples, 48000).unwrap();
        assert!((lufs + 23.0).abs() < 0.5, "got {:.3} LUFS", lufs);
    }

    #[test]
    fn test_block_count() {
        // 1 s at 48 kHz: blocks at 0, 100, ..., 600 ms
        let blocks = block_loudness(&vec![0.0f32; 48000], 48000).unwrap();
        assert_eq!(blocks.len(), 7);
        assert!(blocks.iter().all(|&b| b == SILENCE_LUFS));
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(
            integrated_loudness(&[], 48000).unwrap_err(),
            AnalysisError::EmptyInput
        );
        assert!(integrated_loudness(&[0.1; 100], 0).is_err());
    }
}
