//! # Sonority DSP
//!
//! Feature-extraction core for an audio analysis service: tempo, musical key,
//! integrated loudness, tuning offset and duration of a decoded recording.
//!
//! ## Features
//!
//! - **BPM Detection**: Spectral-flux onset strength with FFT-accelerated autocorrelation
//! - **Key Detection**: Dominant pitch class from linear and constant-Q chroma profiles
//! - **Loudness**: Integrated LUFS following ITU-R BS.1770-4 (K-weighting + gating)
//! - **Tuning**: Deviation of spectral peaks from equal temperament
//!
//! ## Quick Start
//!
//! ```no_run
//! use sonority_dsp::{analyze_audio, AnalysisConfig};
//!
//! // Load audio samples (mono, f32, normalized)
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let sample_rate = 44100;
//!
//! // Analyze
//! let result = analyze_audio(&samples, sample_rate, AnalysisConfig::default())?;
//!
//! println!("BPM: {:.2}", result.bpm);
//! println!("Key: {} (confidence: {:.2})", result.key, result.key_confidence);
//! println!("Loudness: {:.1} LUFS", result.lufs);
//! # Ok::<(), sonority_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! PCM ─┬─→ STFT ─┬─→ onset strength → autocorrelation → BPM
//!      │         ├─→ linear chroma ─┐
//!      │         └─→ tuning         ├─→ key reconciliation
//!      ├─→ constant-Q → CQT chroma ─┘
//!      └─→ K-weighting → gated integration → LUFS
//! ```
//!
//! Loudness runs concurrently with the spectral pipeline; the STFT is computed
//! once and shared by tempo, linear chroma and tuning. Chroma and tuning read
//! the reassigned frequency of each bin rather than its center.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;

// Re-export main types
pub use analysis::result::{AnalysisFlag, AnalysisResult};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use features::key::PitchClass;
pub use features::loudness::SILENCE_LUFS;
pub use features::period::NO_TEMPO_BPM;

use features::chroma::{cqt_chroma, linear_chroma, ChromaPair};
use features::key::{dominant_pitch_class, reconcile};
use features::loudness::integrated_loudness;
use features::onset::onset_strength;
use features::period::{estimate_tempo, TempoEstimate};
use features::spectral::{compute_cqt, compute_reassigned_stft, ConstantQKernel};
use features::tuning::estimate_tuning;

/// Standard concert pitch the default constant-Q grid is laid out for
const STANDARD_A4_HZ: f32 = 440.0;

/// Spectral-side features computed from one shared STFT plus the constant-Q transform
struct SpectralFeatures {
    tempo: TempoEstimate,
    chroma: ChromaPair,
    tuning: f32,
}

/// Main analysis function
///
/// Analyzes a mono buffer and returns tempo, key, loudness, tuning and
/// duration. Silent or aperiodic input is not an error: it yields sentinel
/// values (`bpm == 0`, `lufs == -inf`) and [`AnalysisFlag`]s.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (typically 44100 or 48000)
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// `AnalysisResult` with BPM, key, key confidence, LUFS, duration, tuning and flags.
/// Identical input yields bit-identical results.
///
/// # Errors
///
/// - `AnalysisError::InvalidInput` for an invalid configuration, a zero sample
///   rate or non-finite samples
/// - `AnalysisError::EmptyInput` for an empty buffer
/// - `AnalysisError::NumericFailure` if a computation produced NaN
///
/// # Example
///
/// ```
/// use sonority_dsp::{analyze_audio, AnalysisConfig, PitchClass};
///
/// let sample_rate = 22050;
/// let samples: Vec<f32> = (0..sample_rate)
///     .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin())
///     .collect();
///
/// let result = analyze_audio(&samples, sample_rate as u32, AnalysisConfig::default())?;
/// assert_eq!(result.key, PitchClass::A);
/// assert!((result.duration - 1.0).abs() < 1e-6);
/// # Ok::<(), sonority_dsp::AnalysisError>(())
/// ```
pub fn analyze_audio(
    samples: &[f32],
    sample_rate: u32,
    config: AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    log::debug!(
        "Starting audio analysis: {} samples at {} Hz",
        samples.len(),
        sample_rate
    );

    config.validate()?;

    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid sample rate: 0".to_string(),
        ));
    }

    let duration = (samples.len() as f64 / sample_rate as f64) as f32;
    if samples.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
        return Err(AnalysisError::InvalidInput(format!(
            "Non-finite sample at index {}",
            index
        )));
    }

    let (lufs, spectral) = rayon::join(
        || integrated_loudness(samples, sample_rate),
        || extract_spectral_features(samples, sample_rate, &config),
    );
    let lufs = lufs?;
    let spectral = spectral?;

    let key = reconcile(&spectral.chroma);

    let mut flags = Vec::new();
    if lufs == f32::NEG_INFINITY {
        log::warn!("Audio is silent (all blocks below the absolute gate)");
        flags.push(AnalysisFlag::Silent);
    }
    if !spectral.tempo.is_found() {
        flags.push(AnalysisFlag::NoPeriodicity);
    }
    if key.confidence < config.weak_tonality_threshold {
        flags.push(AnalysisFlag::WeakTonality);
    }
    if dominant_pitch_class(&spectral.chroma.linear).pitch_class
        != dominant_pitch_class(&spectral.chroma.constant_q).pitch_class
    {
        flags.push(AnalysisFlag::ChromaDisagreement);
    }

    let result = AnalysisResult {
        bpm: spectral.tempo.bpm,
        key: key.pitch_class,
        key_confidence: key.confidence,
        lufs,
        duration,
        tuning: spectral.tuning,
        flags,
    };

    check_numeric(&result)?;

    log::debug!(
        "Analysis complete: {:.2} BPM, key {} ({:.3}), {:.2} LUFS, tuning {:+.3}, {:.2} s, flags {:?}",
        result.bpm,
        result.key,
        result.key_confidence,
        result.lufs,
        result.tuning,
        result.duration,
        result.flags
    );

    Ok(result)
}

/// STFT-based features and constant-Q chroma, run side by side
fn extract_spectral_features(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<SpectralFeatures, AnalysisError> {
    let (stft_side, constant_q) = rayon::join(
        || -> Result<_, AnalysisError> {
            let stft =
                compute_reassigned_stft(samples, sample_rate, config.frame_size, config.hop_size)?;

            let onset = onset_strength(&stft.spectrogram, config.onset_smoothing_frames)?;
            let tempo = estimate_tempo(
                &onset,
                stft.spectrogram.frame_rate(),
                config.min_bpm,
                config.max_bpm,
                config.tempo_prior_bpm,
            )?;

            let linear = linear_chroma(
                &stft,
                config.reference_frequency,
                config.chroma_min_frequency,
                config.chroma_max_frequency,
            )?;

            let tuning = estimate_tuning(
                &stft,
                config.reference_frequency,
                config.tuning_min_frequency,
                config.tuning_max_frequency,
                config.tuning_peak_threshold,
            )?;

            Ok((tempo, linear, tuning))
        },
        || -> Result<_, AnalysisError> {
            // Keep the semitone grid on the configured reference pitch
            let min_frequency =
                config.cqt_min_frequency * config.reference_frequency / STANDARD_A4_HZ;
            let kernel = ConstantQKernel::new(
                sample_rate,
                min_frequency,
                config.cqt_octaves * 12,
                12,
                config.cqt_filter_scale,
            )?;
            let cqt = compute_cqt(
                samples,
                sample_rate,
                config.hop_size,
                &kernel,
                config.cqt_frame_stride,
            )?;
            cqt_chroma(&cqt, config.reference_frequency)
        },
    );

    let (tempo, linear, tuning) = stft_side?;
    let constant_q = constant_q?;

    Ok(SpectralFeatures {
        tempo,
        chroma: ChromaPair { linear, constant_q },
        tuning,
    })
}

/// Reject NaN anywhere and infinities other than the silent-loudness sentinel
fn check_numeric(result: &AnalysisResult) -> Result<(), AnalysisError> {
    let finite_fields = [
        ("bpm", result.bpm),
        ("key_confidence", result.key_confidence),
        ("duration", result.duration),
        ("tuning", result.tuning),
    ];
    for (name, value) in finite_fields {
        if !value.is_finite() {
            return Err(AnalysisError::NumericFailure(format!(
                "{} is {}",
                name, value
            )));
        }
    }

    if result.lufs.is_nan() || result.lufs == f32::INFINITY {
        return Err(AnalysisError::NumericFailure(format!(
            "lufs is {}",
            result.lufs
        )));
    }

    Ok(())
}
