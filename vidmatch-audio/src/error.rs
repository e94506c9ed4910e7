//! Error types for audio feature extraction.

use thiserror::Error;

/// Errors produced by audio extractors.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The input cannot be processed by this extractor.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Feature computation failed.
    #[error("extraction failed: {0}")]
    Extraction(String),
}

/// Result alias for audio extraction.
pub type Result<T> = std::result::Result<T, AudioError>;

impl From<AudioError> for vidmatch_core::Error {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::InvalidInput(msg) => vidmatch_core::Error::InvalidInput(msg),
            AudioError::Extraction(msg) => vidmatch_core::Error::Extraction(msg),
        }
    }
}
