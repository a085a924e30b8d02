//! Result aggregation
//!
//! Types returned by [`analyze_audio`](crate::analyze_audio).

pub mod result;

pub use result::{AnalysisFlag, AnalysisResult};
