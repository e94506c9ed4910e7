//! # vidmatch
//!
//! Multi-modal media fingerprinting and similarity matching.
//!
//! The library identifies video and audio content by extracting complementary
//! feature vectors:
//! - Visual: CNN embeddings, difference hashes, motion statistics
//! - Audio: MFCC timbre profiles, constellation fingerprints, waveform
//!   statistics
//!
//! and comparing them with cosine similarity, individually or fused into
//! weighted multi-modal vectors.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use vidmatch::{FeaturePipeline, compare_features};
//! use std::path::Path;
//!
//! fn main() -> vidmatch::Result<()> {
//!     let pipeline = FeaturePipeline::default();
//!     let a = pipeline.extract_features_from_video(Path::new("a.mp4"), Some("a"))?;
//!     let b = pipeline.extract_features_from_video(Path::new("b.mp4"), Some("b"))?;
//!
//!     let score = compare_features(&a["combined"], &b["combined"])?;
//!     println!("similarity: {score:.3}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several crates:
//! - `vidmatch-core`: feature vectors, frames, audio buffers, errors
//! - `vidmatch-video`: decoding, frame sampling, scene detection, keyframes
//! - `vidmatch-visual` / `vidmatch-audio`: the extractors
//! - `vidmatch-fusion`: extractor registry and weighted fusion
//! - `vidmatch-search`: similarity scoring and ranked search
//!
//! This crate re-exports the most commonly used types and provides the
//! high-level [`FeaturePipeline`].

mod pipeline;

// Re-export core types
pub use vidmatch_core::{
    fit_dimension, AudioBuffer, Error, FeatureRecord, FeatureVector, Frame, MetaValue, Metadata,
    Result,
};

// Re-export video processing types
pub use vidmatch_video::{
    create_summary_sheet, BoundaryMethod, FfmpegDecoder, MediaDecoder, MediaInfo, SceneConfig,
    SceneInterval, Size, Thumbnail, ThumbnailConfig, ThumbnailFormat, VideoProcessor,
    VideoProcessorConfig,
};

// Re-export extractor types
pub use vidmatch_audio::{
    AudioExtractor, FingerprintConfig, FingerprintExtractor, MfccConfig, MfccExtractor,
    WaveformStatsConfig, WaveformStatsExtractor,
};
pub use vidmatch_visual::{
    Architecture, DhashConfig, DhashExtractor, EmbeddingBackend, EmbeddingConfig,
    EmbeddingExtractor, MotionConfig, MotionExtractor, VisualExtractor, VisualInput,
};

// Re-export fusion and search types
pub use vidmatch_fusion::{
    fuse, ExtractorKind, MediaInput, Modality, MultiModalExtractor, MultiModalOutput,
};
pub use vidmatch_search::{cosine, SearchHit, SimilarityIndex};

// High-level API
pub use pipeline::{compare_features, FeatureMap, FeaturePipeline, PipelineConfig};
