//! Error types for extractor registry and fusion.

use thiserror::Error;

/// Errors produced when building or running a multi-modal bundle.
#[derive(Error, Debug)]
pub enum FusionError {
    /// Invalid bundle configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// No extractor produced output for the given input.
    #[error("extraction failed: {0}")]
    Extraction(String),
}

/// Result alias for fusion.
pub type Result<T> = std::result::Result<T, FusionError>;

impl From<FusionError> for vidmatch_core::Error {
    fn from(err: FusionError) -> Self {
        match err {
            FusionError::Config(msg) => vidmatch_core::Error::Config(msg),
            FusionError::Extraction(msg) => vidmatch_core::Error::Extraction(msg),
        }
    }
}
