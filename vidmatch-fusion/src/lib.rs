//! Extractor registry and multi-modal fusion.
//!
//! [`ExtractorKind`] is the closed set of extractors the system can build;
//! [`MultiModalExtractor`] runs a configured subset over whatever media is
//! available and fuses their outputs into one weighted-mean vector.

pub mod error;
pub mod fusion;
pub mod kind;

pub use error::{FusionError, Result};
pub use fusion::{fuse, MediaInput, MultiModalExtractor, MultiModalOutput};
pub use kind::{AnyExtractor, ExtractorKind, Modality};
