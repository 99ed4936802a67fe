//! Error types for the plotting pipeline

use std::fmt;

/// Errors surfaced to the caller of a plot request
#[derive(Debug, Clone, PartialEq)]
pub enum PlotError {
    /// Malformed colormap anchor list
    InvalidColormap(String),

    /// Signal too short for the requested segmentation or window
    InsufficientSamples(String),

    /// Inconsistent or out-of-range configuration
    InvalidConfiguration(String),

    /// FFT planning or processing failure
    Transform(String),
}

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotError::InvalidColormap(msg) => write!(f, "Invalid colormap: {}", msg),
            PlotError::InsufficientSamples(msg) => write!(f, "Insufficient samples: {}", msg),
            PlotError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            PlotError::Transform(msg) => write!(f, "Transform error: {}", msg),
        }
    }
}

impl std::error::Error for PlotError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PlotError::InsufficientSamples("need 4096 samples, got 100".to_string());
        assert_eq!(
            err.to_string(),
            "Insufficient samples: need 4096 samples, got 100"
        );
    }
}
