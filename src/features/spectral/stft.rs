//! Short-time Fourier transform (magnitude)
//!
//! Frames are centered: frame `t` covers samples
//! `[t * hop - frame_size / 2, t * hop + frame_size / 2)` and reads zeros outside
//! the buffer. A buffer of `len` samples yields `1 + len / hop` frames, so input
//! shorter than one window still produces a (zero-padded) frame.
//!
//! # Example
//!
//! ```
//! use sonority_dsp::features::spectral::compute_stft;
//!
//! let samples = vec![0.0f32; 4410];
//! let spec = compute_stft(&samples, 44100, 2048, 512)?;
//! assert_eq!(spec.n_frames(), 1 + 4410 / 512);
//! assert_eq!(spec.n_bins(), 1025);
//! # Ok::<(), sonority_dsp::AnalysisError>(())
//! ```

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::window::{hann_derivative_window, hann_window};
use super::{FrequencyScale, Spectrogram};
use crate::error::AnalysisError;

/// Bins with less power than this keep their center frequency when reassigned
const MIN_REASSIGN_POWER: f32 = 1e-20;

/// Magnitude STFT plus the reassigned frequency of every bin
///
/// The reassigned frequency is the instantaneous frequency of the component
/// dominating a bin. For a stationary sinusoid every bin of its main lobe
/// reports the sinusoid's frequency, not the bin center, so pitch can be read
/// to a fraction of a cent even where bins are wider than a semitone.
#[derive(Debug, Clone, PartialEq)]
pub struct ReassignedSpectrogram {
    /// Magnitudes, identical to [`compute_stft`] with the same parameters
    pub spectrogram: Spectrogram,

    /// Reassigned frequency in Hz, same shape as `spectrogram.frames`
    pub frequencies: Vec<Vec<f32>>,
}

/// Compute the magnitude STFT of a mono buffer
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `frame_size` - FFT size (even, default 2048)
/// * `hop_size` - Samples between frame centers (default 512)
///
/// # Returns
///
/// Spectrogram with `frame_size / 2 + 1` bins per frame. An empty buffer yields
/// an empty spectrogram.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `sample_rate`, `frame_size` or
/// `hop_size` is zero, or `frame_size` is odd.
pub fn compute_stft(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> Result<Spectrogram, AnalysisError> {
    validate_params(sample_rate, frame_size, hop_size)?;

    let mut spectrogram = Spectrogram {
        frames: Vec::new(),
        sample_rate,
        hop_size,
        scale: FrequencyScale::Linear { frame_size },
    };

    if samples.is_empty() {
        return Ok(spectrogram);
    }

    let n_frames = 1 + samples.len() / hop_size;
    let n_bins = frame_size / 2 + 1;

    log::debug!(
        "Computing STFT: {} samples, {} frames, frame_size={}, hop={}",
        samples.len(),
        n_frames,
        frame_size,
        hop_size
    );

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);
    let window = hann_window(frame_size);

    let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];
    spectrogram.frames.reserve(n_frames);

    for t in 0..n_frames {
        load_frame(&mut buffer, samples, &window, t * hop_size);
        fft.process(&mut buffer);
        spectrogram
            .frames
            .push(buffer[..n_bins].iter().map(|c| c.norm()).collect());
    }

    Ok(spectrogram)
}

/// Compute the magnitude STFT together with reassigned bin frequencies
///
/// Each frame is transformed twice, once with the Hann window `h` and once
/// with its derivative `h'`. The reassigned frequency of bin `k` is
/// `(k - Im(X_h'[k] / X_h[k]) · N / 2π) · sample_rate / N`.
///
/// # Errors
///
/// Same conditions as [`compute_stft`].
///
/// # Reference
///
/// Auger, F., & Flandrin, P. (1995). Improving the readability of
/// time-frequency and time-scale representations by the reassignment method.
/// *IEEE Transactions on Signal Processing*, 43(5), 1068-1089.
pub fn compute_reassigned_stft(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> Result<ReassignedSpectrogram, AnalysisError> {
    validate_params(sample_rate, frame_size, hop_size)?;

    let mut spectrogram = Spectrogram {
        frames: Vec::new(),
        sample_rate,
        hop_size,
        scale: FrequencyScale::Linear { frame_size },
    };

    if samples.is_empty() {
        return Ok(ReassignedSpectrogram {
            spectrogram,
            frequencies: Vec::new(),
        });
    }

    let n_frames = 1 + samples.len() / hop_size;
    let n_bins = frame_size / 2 + 1;
    let bin_hz = sample_rate as f32 / frame_size as f32;
    let bins_per_radian = frame_size as f32 / (2.0 * std::f32::consts::PI);

    log::debug!(
        "Computing reassigned STFT: {} samples, {} frames, frame_size={}, hop={}",
        samples.len(),
        n_frames,
        frame_size,
        hop_size
    );

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);
    let window = hann_window(frame_size);
    let derivative = hann_derivative_window(frame_size);

    let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];
    let mut derivative_buffer = vec![Complex::new(0.0f32, 0.0); frame_size];
    let mut frequencies = Vec::with_capacity(n_frames);
    spectrogram.frames.reserve(n_frames);

    for t in 0..n_frames {
        load_frame(&mut buffer, samples, &window, t * hop_size);
        load_frame(&mut derivative_buffer, samples, &derivative, t * hop_size);
        fft.process(&mut buffer);
        fft.process(&mut derivative_buffer);

        let mut magnitudes = Vec::with_capacity(n_bins);
        let mut bin_frequencies = Vec::with_capacity(n_bins);
        for (k, (x, dx)) in buffer[..n_bins].iter().zip(&derivative_buffer).enumerate() {
            let power = x.norm_sqr();
            let offset = if power > MIN_REASSIGN_POWER {
                -(dx * x.conj()).im / power * bins_per_radian
            } else {
                0.0
            };
            magnitudes.push(x.norm());
            bin_frequencies.push((k as f32 + offset) * bin_hz);
        }

        spectrogram.frames.push(magnitudes);
        frequencies.push(bin_frequencies);
    }

    Ok(ReassignedSpectrogram {
        spectrogram,
        frequencies,
    })
}

fn validate_params(
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> Result<(), AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid sample rate: 0".to_string(),
        ));
    }

    if frame_size == 0 || frame_size % 2 != 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Frame size must be even and > 0, got {}",
            frame_size
        )));
    }

    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Hop size must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Fill `buffer` with the windowed frame centered on sample `center`
fn load_frame(buffer: &mut [Complex<f32>], samples: &[f32], window: &[f32], center: usize) {
    let half = buffer.len() / 2;
    // Index of the first window sample that falls inside the buffer
    let skip = half.saturating_sub(center);
    let start = center.saturating_sub(half);

    buffer.fill(Complex::new(0.0, 0.0));
    for (i, slot) in buffer.iter_mut().enumerate().skip(skip) {
        let idx = start + (i - skip);
        if idx >= samples.len() {
            break;
        }
        *slot = Complex::new(samples[idx] * window[i], 0.0);
    }
}
