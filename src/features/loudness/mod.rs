//! Loudness measurement
//!
//! Integrated loudness in LUFS following ITU-R BS.1770-4:
//! - K-weighting pre-filter
//! - Block gating and integration

pub mod gating;
pub mod k_weighting;

pub use gating::{block_loudness, integrated_loudness, SILENCE_LUFS};
pub use k_weighting::{Biquad, KWeightingFilter};
