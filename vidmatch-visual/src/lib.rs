//! Visual feature extraction for content identification.
//!
//! Three extractors share the [`VisualExtractor`] trait:
//!
//! - [`EmbeddingExtractor`]: CNN backbone embeddings with lazy model
//!   loading and a deterministic projection fallback
//! - [`DhashExtractor`]: binary difference hashes, scale and compression
//!   tolerant
//! - [`MotionExtractor`]: block-grid motion statistics over frame pairs
//!
//! All extractors emit fixed-dimension [`FeatureVector`]s with provenance
//! metadata, so downstream fusion can treat them uniformly.
//!
//! [`FeatureVector`]: vidmatch_core::FeatureVector

pub mod dhash;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod motion;

pub use dhash::{DhashConfig, DhashExtractor};
pub use embedding::{Architecture, EmbeddingBackend, EmbeddingConfig, EmbeddingExtractor};
pub use error::{Result, VisualError};
pub use extractor::{VisualExtractor, VisualInput};
pub use motion::{MotionConfig, MotionExtractor};
