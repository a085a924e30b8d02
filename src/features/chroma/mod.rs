//! Chroma extraction
//!
//! Extract the pitch-class distribution (12 semitones) of a recording:
//! - Linear-frequency and constant-Q front ends
//! - Per-frame normalization and time averaging

pub mod extractor;
pub mod normalization;

pub use extractor::{cqt_chroma, linear_chroma, pitch_class_index, ChromaPair, ChromaProfile};
