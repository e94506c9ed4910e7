//! Video ingestion for content identification.
//!
//! This crate turns media files into the raw signals the feature extractors
//! consume:
//!
//! - **Frame extraction**: uniform or sequential sampling of RGB frames,
//!   scaled to an analysis width
//! - **Scene detection**: histogram, content, edge and blended boundary
//!   scoring with an optional adaptive threshold
//! - **Keyframes**: one representative frame per detected scene
//! - **Audio demux**: the audio track as mono PCM at a fixed sample rate
//! - **Thumbnails**: rendering frames and summary sheets to image files
//!
//! Decoding goes through the [`MediaDecoder`] trait; the default
//! [`FfmpegDecoder`] shells out to the ffmpeg CLI so no native codec
//! bindings are required.

pub mod decode;
pub mod error;
pub mod processor;
pub mod scene;
pub mod thumbnail;

pub use decode::{FfmpegDecoder, MediaDecoder, MediaInfo};
pub use error::{Result, VideoError};
pub use processor::{SceneInterval, VideoProcessor, VideoProcessorConfig};
pub use scene::{segment_scenes, BoundaryMethod, SceneConfig, SceneDetector, SceneSpan};
pub use thumbnail::{create_summary_sheet, Thumbnail, ThumbnailConfig, ThumbnailFormat, Size};
