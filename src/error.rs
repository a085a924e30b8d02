//! Error types for the feature-extraction core

use thiserror::Error;

/// Errors that can occur during audio analysis
///
/// Silent or near-silent input is not an error: it produces sentinel values
/// (`bpm == 0`, `lufs == -inf`) and [`AnalysisFlag`](crate::AnalysisFlag)s.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Zero-length buffer (zero duration); rejected before feature extraction
    #[error("Empty or corrupted audio: buffer contains no samples")]
    EmptyInput,

    /// Invalid input parameters (sample rate, configuration, non-finite samples)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A computation produced NaN or an undocumented infinity
    #[error("Numeric failure: {0}")]
    NumericFailure(String),
}

impl AnalysisError {
    /// Whether the failure is caused by the caller's input rather than by the core.
    ///
    /// Hosts map client errors to a 4xx-class rejection and everything else to a
    /// generic 5xx-class failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AnalysisError::EmptyInput | AnalysisError::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(AnalysisError::EmptyInput.is_client_error());
        assert!(AnalysisError::InvalidInput("bad".to_string()).is_client_error());
        assert!(!AnalysisError::NumericFailure("nan".to_string()).is_client_error());
    }

    #[test]
    fn test_display_messages() {
        assert!(AnalysisError::EmptyInput.to_string().contains("Empty"));
        assert_eq!(
            AnalysisError::InvalidInput("sample rate is 0".to_string()).to_string(),
            "Invalid input: sample rate is 0"
        );
    }
}
