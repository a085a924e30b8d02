//! Autocorrelation-based tempo estimation
//!
//! Finds the dominant periodicity of the onset strength curve.
//!
//! # Algorithm
//!
//! 1. Remove the mean of the onset curve
//! 2. Compute autocorrelation using FFT acceleration: `ACF = IFFT(|FFT(signal)|²)`,
//!    zero padded to at least twice the signal length so lags do not wrap
//! 3. Search lags `[ceil(60·fr / max_bpm), floor(60·fr / min_bpm)]` for the
//!    maximum normalized ACF (optionally weighted by a log-normal tempo prior);
//!    ties go to the lower lag
//! 4. Reject the lag when its normalized ACF is below `MIN_PERIODICITY_STRENGTH`
//! 5. Refine the lag by parabolic interpolation, clamped to the search range,
//!    and convert: `BPM = 60 · frame_rate / lag`
//!
//! # Reference
//!
//! Ellis, D. P. W., & Pikrakis, A. (2006). Real-time Beat Induction.
//! *Proceedings of the International Conference on Music Information Retrieval*.
//!
//! # Example
//!
//! ```
//! use sonority_dsp::features::period::estimate_tempo;
//!
//! // One onset every 43 frames at 44100 / 512 frames per second (~120 BPM)
//! let mut onset = vec![0.0f32; 1000];
//! for i in (0..1000).step_by(43) {
//!     onset[i] = 1.0;
//! }
//! let tempo = estimate_tempo(&onset, 44100.0 / 512.0, 30.0, 300.0, None)?;
//! assert!((tempo.bpm - 120.0).abs() < 1.0);
//! # Ok::<(), sonority_dsp::AnalysisError>(())
//! ```

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::TempoEstimate;
use crate::error::AnalysisError;

const EPSILON: f32 = 1e-10;

/// Tempo reported when no periodicity is found
pub const NO_TEMPO_BPM: f32 = 0.0;

/// Normalized autocorrelation below which the onset curve counts as aperiodic
///
/// Sustained tones and noise stay under 0.01; a steady pulse scores above 0.5.
pub const MIN_PERIODICITY_STRENGTH: f32 = 0.1;

/// Standard deviation of the tempo prior, in octaves
const PRIOR_STD_OCTAVES: f32 = 1.0;

/// Estimate tempo from an onset strength curve
///
/// # Arguments
///
/// * `onset` - Onset strength, one value per frame
/// * `frame_rate` - Frames per second (`sample_rate / hop_size`)
/// * `min_bpm` - Minimum tempo to consider (default: 30.0)
/// * `max_bpm` - Maximum tempo to consider (default: 300.0)
/// * `prior_bpm` - Center of an optional log-normal tempo prior
///
/// # Returns
///
/// `TempoEstimate` with `bpm = NO_TEMPO_BPM` when the curve has no energy, is
/// too short for the lag range, or its best lag correlates less than
/// `MIN_PERIODICITY_STRENGTH`. A found tempo always lies in `[min_bpm, max_bpm]`.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a non-positive frame rate or an
/// invalid BPM range.
pub fn estimate_tempo(
    onset: &[f32],
    frame_rate: f32,
    min_bpm: f32,
    max_bpm: f32,
    prior_bpm: Option<f32>,
) -> Result<TempoEstimate, AnalysisError> {
    if !(frame_rate > 0.0) || !frame_rate.is_finite() {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid frame rate: {}",
            frame_rate
        )));
    }

    if !(min_bpm > 0.0) || !(max_bpm > min_bpm) {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid BPM range: [{:.1}, {:.1}]",
            min_bpm, max_bpm
        )));
    }

    if let Some(prior) = prior_bpm {
        if !(prior > 0.0) || !prior.is_finite() {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid tempo prior: {}",
                prior
            )));
        }
    }

    log::debug!(
        "Estimating tempo: {} onset frames, {:.2} frames/s, range=[{:.1}, {:.1}] BPM",
        onset.len(),
        frame_rate,
        min_bpm,
        max_bpm
    );

    if onset.len() < 2 {
        log::warn!("Onset curve too short for autocorrelation: {}", onset.len());
        return Ok(TempoEstimate::none());
    }

    let mean = onset.iter().sum::<f32>() / onset.len() as f32;
    let centered: Vec<f32> = onset.iter().map(|&x| x - mean).collect();

    let acf = compute_autocorrelation_fft(&centered);
    let energy = acf[0];
    if energy <= EPSILON {
        log::warn!("Onset curve has no energy, no tempo");
        return Ok(TempoEstimate::none());
    }

    let lag_min = ((60.0 * frame_rate / max_bpm).ceil() as usize).max(1);
    let lag_max = ((60.0 * frame_rate / min_bpm).floor() as usize).min(acf.len() - 1);

    if lag_min > lag_max {
        log::warn!(
            "Lag range starts at {} but onset curve has only {} frames",
            lag_min,
            acf.len()
        );
        return Ok(TempoEstimate::none());
    }

    let strengths: Vec<f32> = (lag_min..=lag_max)
        .map(|lag| {
            let normalized = acf[lag] / energy;
            match prior_bpm {
                Some(prior) => {
                    normalized * tempo_prior_weight(60.0 * frame_rate / lag as f32, prior)
                }
                None => normalized,
            }
        })
        .collect();

    let (best_lag, best_strength) = select_lag(&strengths, lag_min);

    let periodicity = acf[best_lag] / energy;
    if periodicity < MIN_PERIODICITY_STRENGTH {
        log::debug!(
            "Best lag {} correlates only {:.3} (< {}), no tempo",
            best_lag,
            periodicity,
            MIN_PERIODICITY_STRENGTH
        );
        return Ok(TempoEstimate::none());
    }

    let refined_lag = refine_lag(&acf, best_lag).clamp(lag_min as f32, lag_max as f32);
    let bpm = 60.0 * frame_rate / refined_lag;

    log::debug!(
        "Tempo: lag {} (refined {:.3}) -> {:.2} BPM, strength {:.3}",
        best_lag,
        refined_lag,
        bpm,
        best_strength
    );

    Ok(TempoEstimate {
        bpm,
        strength: best_strength,
    })
}

/// Log-normal tempo prior weight
///
/// `exp(-0.5 · (log2(bpm) - log2(center))² / σ²)` with σ = one octave.
/// Equals 1.0 at `center_bpm` and 0.607 one octave away.
pub fn tempo_prior_weight(bpm: f32, center_bpm: f32) -> f32 {
    if !(bpm > 0.0) || !(center_bpm > 0.0) {
        return 0.0;
    }
    let octaves = (bpm / center_bpm).log2() / PRIOR_STD_OCTAVES;
    (-0.5 * octaves * octaves).exp()
}

/// Lag with the highest strength; `strengths[i]` belongs to lag `lag_min + i`
///
/// The scan is ascending with a strict comparison, so ties keep the lower lag
/// (the higher BPM). `strengths` must not be empty.
fn select_lag(strengths: &[f32], lag_min: usize) -> (usize, f32) {
    let mut best = 0;
    for (i, &strength) in strengths.iter().enumerate().skip(1) {
        if strength > strengths[best] {
            best = i;
        }
    }
    (lag_min + best, strengths[best])
}

/// Parabolic interpolation of the ACF peak at `lag`
///
/// Returns the integer lag when a neighbour is missing or the three points do
/// not form a maximum.
fn refine_lag(acf: &[f32], lag: usize) -> f32 {
    if lag == 0 || lag + 1 >= acf.len() {
        return lag as f32;
    }

    let left = acf[lag - 1];
    let center = acf[lag];
    let right = acf[lag + 1];
    let denom = left - 2.0 * center + right;

    if denom >= 0.0 {
        return lag as f32;
    }

    let offset = (0.5 * (left - right) / denom).clamp(-0.5, 0.5);
    lag as f32 + offset
}

/// Compute autocorrelation using FFT acceleration
///
/// Uses the identity: ACF = IFFT(|FFT(signal)|²). The signal is zero padded to
/// the next power of two ≥ 2n, so the result is the linear (not circular)
/// autocorrelation for lags `0..n`.
fn compute_autocorrelation_fft(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    let fft_size = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    for x in &mut buffer {
        *x = Complex::new(x.norm_sqr(), 0.0);
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut buffer);

    let scale = 1.0 / fft_size as f32;
    buffer[..n].iter().map(|x| x.re * scale).collect()
}
