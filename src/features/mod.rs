//! Feature extraction modules
//!
//! This module contains all feature extraction algorithms:
//! - Spectral engine (STFT and constant-Q transform)
//! - Onset strength and period estimation (BPM detection)
//! - Chroma extraction
//! - Key detection
//! - Tuning estimation
//! - Loudness measurement

pub mod chroma;
pub mod key;
pub mod loudness;
pub mod onset;
pub mod period;
pub mod spectral;
pub mod tuning;
