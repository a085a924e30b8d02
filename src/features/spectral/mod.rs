//! Frame/spectral engine
//!
//! Turns a mono PCM buffer into time-ordered magnitude spectra shared by every
//! downstream analyzer:
//! - Linear-frequency STFT magnitudes (tempo), with the reassigned frequency of
//!   every bin (linear chroma, tuning)
//! - Constant-Q magnitudes with semitone-aligned bins (constant-Q chroma)
//!
//! Both representations use centered frames on the same hop grid, so frame `t`
//! of the STFT and the constant-Q frame covering the same center describe the
//! same instant.

pub mod cqt;
pub mod stft;
pub mod window;

pub use cqt::{compute_cqt, ConstantQKernel};
pub use stft::{compute_reassigned_stft, compute_stft, ReassignedSpectrogram};
pub use window::{hann_derivative_window, hann_window};

/// Frequency axis of a [`Spectrogram`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrequencyScale {
    /// FFT bins spaced `sample_rate / frame_size` apart, bin 0 = DC
    Linear {
        /// FFT size used to produce the frames
        frame_size: usize,
    },
    /// Log-spaced bins, bin `k` centered on `min_frequency * 2^(k / bins_per_octave)`
    ConstantQ {
        /// Center frequency of bin 0 in Hz
        min_frequency: f32,
        /// Number of bins per octave
        bins_per_octave: usize,
    },
}

/// Magnitude spectrogram (n_frames × n_bins)
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    /// Magnitude frames, one inner `Vec` per frame
    pub frames: Vec<Vec<f32>>,

    /// Sample rate of the analyzed buffer in Hz
    pub sample_rate: u32,

    /// Samples between consecutive frame centers
    pub hop_size: usize,

    /// Frequency axis
    pub scale: FrequencyScale,
}

impl Spectrogram {
    /// Number of frames
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Number of bins per frame (0 for an empty spectrogram)
    pub fn n_bins(&self) -> usize {
        self.frames.first().map_or(0, Vec::len)
    }

    /// Frames per second
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.hop_size as f32
    }

    /// Center frequency of `bin` in Hz
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        match self.scale {
            FrequencyScale::Linear { frame_size } => {
                bin as f32 * self.sample_rate as f32 / frame_size as f32
            }
            FrequencyScale::ConstantQ {
                min_frequency,
                bins_per_octave,
            } => min_frequency * 2.0f32.powf(bin as f32 / bins_per_octave as f32),
        }
    }
}
