//! Video processing error types.

use std::path::PathBuf;
use thiserror::Error;

/// Video processing errors.
#[derive(Debug, Error)]
pub enum VideoError {
    /// Media file does not exist.
    #[error("Media file not found: {0}")]
    NotFound(PathBuf),

    /// The decoder could not open or demux the file.
    #[error("Decoder failed: {0}")]
    DecoderFailed(String),

    /// Requested stream is absent (e.g. no audio track).
    #[error("Missing stream: {0}")]
    MissingStream(String),

    /// Invalid parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<VideoError> for vidmatch_core::Error {
    fn from(e: VideoError) -> Self {
        match e {
            VideoError::NotFound(path) => vidmatch_core::Error::NotFound(path),
            VideoError::DecoderFailed(msg) => vidmatch_core::Error::Decode(msg),
            VideoError::MissingStream(msg) => vidmatch_core::Error::Decode(msg),
            VideoError::InvalidParameter(msg) => vidmatch_core::Error::InvalidInput(msg),
            VideoError::Io(e) => vidmatch_core::Error::Io(e),
        }
    }
}

/// Result type for video processing.
pub type Result<T> = std::result::Result<T, VideoError>;
