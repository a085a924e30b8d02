//! Key detection
//!
//! Detect the dominant pitch class of a recording from its chroma profiles:
//! - Pitch-class naming
//! - Dominant class selection and confidence
//! - Reconciliation of the linear and constant-Q estimates

pub mod detector;
pub mod pitch_class;

pub use detector::{dominant_pitch_class, reconcile, KeyEstimate};
pub use pitch_class::{PitchClass, PITCH_CLASS_NAMES};
