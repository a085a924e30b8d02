//! Constant-Q transform (magnitude)
//!
//! Direct time-domain constant-Q transform with precomputed kernels. Bin `k` is
//! centered on `f_k = fmin * 2^(k / B)` and uses a Hann-weighted complex
//! exponential of length `N_k = ceil(Q * sample_rate / f_k)` with
//! `Q = filter_scale / (2^(1/B) - 1)`, so every bin spans the same number of
//! cycles and the bins line up with equal-tempered semitones when `B = 12`.
//!
//! # Reference
//!
//! Brown, J. C. (1991). Calculation of a constant Q spectral transform.
//! *Journal of the Acoustical Society of America*, 89(1), 425-434.

use rayon::prelude::*;
use rustfft::num_complex::Complex;

use super::{FrequencyScale, Spectrogram};
use crate::error::AnalysisError;

/// Precomputed constant-Q kernels for one sample rate
#[derive(Debug, Clone)]
pub struct ConstantQKernel {
    sample_rate: u32,
    min_frequency: f32,
    bins_per_octave: usize,
    /// Windowed complex exponential per bin, lowest bin first
    kernels: Vec<Vec<Complex<f32>>>,
}

impl ConstantQKernel {
    /// Build kernels for `n_bins` bins starting at `min_frequency`
    ///
    /// Bins whose upper band edge (`f_k * (1 + 1/Q)`) reaches the Nyquist
    /// frequency are dropped, so low sample rates yield fewer bins instead of
    /// aliased ones.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a zero sample rate, zero bins
    /// per octave, or a non-positive minimum frequency or filter scale.
    pub fn new(
        sample_rate: u32,
        min_frequency: f32,
        n_bins: usize,
        bins_per_octave: usize,
        filter_scale: f32,
    ) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Invalid sample rate: 0".to_string(),
            ));
        }

        if bins_per_octave == 0 || !(min_frequency > 0.0) || !(filter_scale > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid constant-Q parameters: fmin={}, bins_per_octave={}, filter_scale={}",
                min_frequency, bins_per_octave, filter_scale
            )));
        }

        let quality = filter_scale / (2.0f32.powf(1.0 / bins_per_octave as f32) - 1.0);
        let nyquist = sample_rate as f32 / 2.0;

        let mut kernels = Vec::with_capacity(n_bins);
        for k in 0..n_bins {
            let frequency = min_frequency * 2.0f32.powf(k as f32 / bins_per_octave as f32);
            if frequency * (1.0 + 1.0 / quality) >= nyquist {
                log::debug!(
                    "Constant-Q: dropping bins from {:.1} Hz (Nyquist {:.1} Hz)",
                    frequency,
                    nyquist
                );
                break;
            }
            kernels.push(kernel_taps(frequency, quality, sample_rate));
        }

        log::debug!(
            "Constant-Q kernel: {} bins from {:.2} Hz, Q={:.2}, longest kernel {} samples",
            kernels.len(),
            min_frequency,
            quality,
            kernels.first().map_or(0, Vec::len)
        );

        Ok(Self {
            sample_rate,
            min_frequency,
            bins_per_octave,
            kernels,
        })
    }

    /// Number of usable bins
    pub fn n_bins(&self) -> usize {
        self.kernels.len()
    }

    #[cfg(test)]
    fn frequencies(&self) -> Vec<f32> {
        (0..self.n_bins())
            .map(|k| self.min_frequency * 2.0f32.powf(k as f32 / self.bins_per_octave as f32))
            .collect()
    }

    /// Magnitude of every bin for a frame centered on sample `center`
    fn frame_magnitudes(&self, samples: &[f32], center: usize) -> Vec<f32> {
        self.kernels
            .iter()
            .map(|taps| {
                let len = taps.len();
                let start = center as isize - (len / 2) as isize;
                let first = (-start).max(0) as usize;
                let last = (samples.len() as isize - start).clamp(0, len as isize) as usize;

                let mut acc = Complex::new(0.0f32, 0.0);
                if first < last {
                    let offset = (start + first as isize) as usize;
                    for (tap, &x) in taps[first..last]
                        .iter()
                        .zip(&samples[offset..offset + (last - first)])
                    {
                        acc += *tap * x;
                    }
                }
                acc.norm()
            })
            .collect()
    }
}

/// Hann-weighted complex exponential normalized by the window sum
fn kernel_taps(frequency: f32, quality: f32, sample_rate: u32) -> Vec<Complex<f32>> {
    let len = (quality as f64 * sample_rate as f64 / frequency as f64).ceil() as usize;
    let len = len.max(1);
    let center = (len / 2) as f64;

    let window: Vec<f64> = (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / len as f64).cos())
        .collect();
    let norm: f64 = window.iter().sum::<f64>().max(f64::EPSILON);

    window
        .iter()
        .enumerate()
        .map(|(n, &w)| {
            let phase = -2.0 * std::f64::consts::PI * frequency as f64 * (n as f64 - center)
                / sample_rate as f64;
            let scale = w / norm;
            Complex::new((scale * phase.cos()) as f32, (scale * phase.sin()) as f32)
        })
        .collect()
}

/// Compute constant-Q magnitudes on the STFT frame grid
///
/// Frames are centered on `j * hop_size * frame_stride` for every STFT frame
/// index that is a multiple of `frame_stride`, so the constant-Q timeline is a
/// subset of the STFT timeline. Frames are evaluated in parallel; each frame's
/// accumulation order is fixed, so the output is deterministic.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `hop_size` or `frame_stride` is
/// zero, or the kernel was built for a different sample rate.
pub fn compute_cqt(
    samples: &[f32],
    sample_rate: u32,
    hop_size: usize,
    kernel: &ConstantQKernel,
    frame_stride: usize,
) -> Result<Spectrogram, AnalysisError> {
    if hop_size == 0 || frame_stride == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "hop_size and frame_stride must be > 0, got {} and {}",
            hop_size, frame_stride
        )));
    }

    if kernel.sample_rate != sample_rate {
        return Err(AnalysisError::InvalidInput(format!(
            "Constant-Q kernel built for {} Hz, buffer is {} Hz",
            kernel.sample_rate, sample_rate
        )));
    }

    let scale = FrequencyScale::ConstantQ {
        min_frequency: kernel.min_frequency,
        bins_per_octave: kernel.bins_per_octave,
    };
    let cqt_hop = hop_size * frame_stride;

    if samples.is_empty() {
        return Ok(Spectrogram {
            frames: Vec::new(),
            sample_rate,
            hop_size: cqt_hop,
            scale,
        });
    }

    let n_stft_frames = 1 + samples.len() / hop_size;
    let n_frames = n_stft_frames.div_ceil(frame_stride);

    log::debug!(
        "Computing constant-Q transform: {} frames, {} bins, hop={}",
        n_frames,
        kernel.n_bins(),
        cqt_hop
    );

    let frames: Vec<Vec<f32>> = (0..n_frames)
        .into_par_iter()
        .map(|j| kernel.frame_magnitudes(samples, j * cqt_hop))
        .collect();

    Ok(Spectrogram {
        frames,
        sample_rate,
        hop_size: cqt_hop,
        scale,
    })
}
