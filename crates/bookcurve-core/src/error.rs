//! Error types for the booking analytics pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Error kinds produced by selection, decomposition and smoothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid cutoff {cutoff}: must be between 1 and {max}")]
    InvalidCutoff { cutoff: usize, max: usize },

    #[error("Invalid range for '{param}': {reason}")]
    InvalidRange { param: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AnalyticsError {
    /// Convert to an error code for FFI.
    pub fn to_code(&self) -> i32 {
        match self {
            AnalyticsError::InsufficientData { .. } => 1,
            AnalyticsError::InvalidCutoff { .. } => 2,
            AnalyticsError::InvalidRange { .. } => 3,
            AnalyticsError::InvalidInput(_) => 4,
        }
    }

    pub(crate) fn invalid_range(param: &str, reason: impl Into<String>) -> Self {
        AnalyticsError::InvalidRange {
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}
