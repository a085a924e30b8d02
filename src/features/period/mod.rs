//! Period estimation
//!
//! Converts the onset strength curve into a single tempo estimate using
//! FFT-accelerated autocorrelation.

pub mod autocorrelation;

pub use autocorrelation::{
    estimate_tempo, tempo_prior_weight, MIN_PERIODICITY_STRENGTH, NO_TEMPO_BPM,
};

/// Tempo estimate from the onset autocorrelation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEstimate {
    /// Tempo in beats per minute (`NO_TEMPO_BPM` when no periodicity was found)
    pub bpm: f32,

    /// Normalized autocorrelation at the chosen lag, after prior weighting (≤ 1.0)
    pub strength: f32,
}

impl TempoEstimate {
    /// Estimate used when the onset signal carries no periodicity
    pub fn none() -> Self {
        Self {
            bpm: NO_TEMPO_BPM,
            strength: 0.0,
        }
    }

    /// Whether a tempo was found
    pub fn is_found(&self) -> bool {
        self.bpm > 0.0
    }
}
