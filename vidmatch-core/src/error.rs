//! Error types for the vidmatch library.
//!
//! Every call-fatal condition in the extraction pipeline maps to one of the
//! variants here. Leaf crates define their own error enums and convert into
//! this type at the crate boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the vidmatch library.
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced media file does not exist.
    #[error("Media file not found: {0}")]
    NotFound(PathBuf),

    /// Codec/demuxer could not open or decode the media.
    #[error("Decode error: {0}")]
    Decode(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrong input shape or type for an extractor.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two vectors of different dimension were compared or fused.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction produced no usable output.
    #[error("Extraction failed: {0}")]
    Extraction(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Error::DimensionMismatch { expected, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::dimension_mismatch(512, 2048);
        assert_eq!(err.to_string(), "Dimension mismatch: expected 512, got 2048");

        let err = Error::NotFound(PathBuf::from("missing.mp4"));
        assert!(err.to_string().contains("missing.mp4"));
    }
}
