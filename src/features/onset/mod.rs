//! Onset strength
//!
//! Per-frame scalar estimating how much new energy appears in each STFT frame:
//! - Spectral flux on log-compressed magnitudes
//! - Moving-average smoothing

pub mod spectral_flux;

pub use spectral_flux::{onset_strength, smooth_moving_average};
