//! Error types for visual feature extraction.

use thiserror::Error;

/// Errors produced by visual extractors.
#[derive(Error, Debug)]
pub enum VisualError {
    /// The input cannot be processed by this extractor.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A model could not be loaded or initialized.
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// Feature computation failed.
    #[error("extraction failed: {0}")]
    Extraction(String),
}

/// Result alias for visual extraction.
pub type Result<T> = std::result::Result<T, VisualError>;

impl From<VisualError> for vidmatch_core::Error {
    fn from(err: VisualError) -> Self {
        match err {
            VisualError::InvalidInput(msg) => vidmatch_core::Error::InvalidInput(msg),
            VisualError::ModelLoad(msg) | VisualError::Extraction(msg) => {
                vidmatch_core::Error::Extraction(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_core() {
        let err: vidmatch_core::Error = VisualError::ModelLoad("missing weights".into()).into();
        assert!(matches!(err, vidmatch_core::Error::Extraction(_)));
    }
}
