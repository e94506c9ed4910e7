//! The end-to-end feature pipeline.
//!
//! Ties the video processor, the extractor bundle and the fusion step into
//! one call per media file: decode, extract every configured feature, fuse
//! per modality and overall, and return a named feature map ready for
//! storage or search.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vidmatch_core::{Error, FeatureVector, Frame, Result};
use vidmatch_fusion::{fuse, ExtractorKind, MediaInput, Modality, MultiModalExtractor};
use vidmatch_video::{FfmpegDecoder, MediaDecoder, VideoProcessor, VideoProcessorConfig};

/// Map of feature name to extracted vector.
pub type FeatureMap = BTreeMap<String, FeatureVector>;

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Video processing settings.
    pub processor: VideoProcessorConfig,
    /// Extractors to run.
    pub extractors: Vec<ExtractorKind>,
    /// Frames sampled per video.
    pub max_frames: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            processor: VideoProcessorConfig::default(),
            extractors: ExtractorKind::all().to_vec(),
            max_frames: 30,
        }
    }
}

/// Extracts named feature maps from video and image files.
pub struct FeaturePipeline<D: MediaDecoder = FfmpegDecoder> {
    processor: VideoProcessor<D>,
    bundle: MultiModalExtractor,
    max_frames: usize,
}

impl FeaturePipeline<FfmpegDecoder> {
    /// Create a pipeline backed by the ffmpeg CLI decoder.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let processor = VideoProcessor::new(config.processor.clone());
        Self::with_processor(config, processor)
    }
}

impl Default for FeaturePipeline<FfmpegDecoder> {
    fn default() -> Self {
        // The default configuration always names at least one extractor.
        match Self::new(PipelineConfig::default()) {
            Ok(pipeline) => pipeline,
            Err(_) => unreachable!("default pipeline configuration is valid"),
        }
    }
}

impl<D: MediaDecoder> FeaturePipeline<D> {
    /// Create a pipeline with a custom-decoder processor.
    pub fn with_processor(config: PipelineConfig, processor: VideoProcessor<D>) -> Result<Self> {
        let bundle = MultiModalExtractor::new(&config.extractors).map_err(Error::from)?;
        Ok(Self {
            processor,
            bundle,
            max_frames: config.max_frames,
        })
    }

    /// Adjust one extractor's fusion weight.
    pub fn set_weight(&mut self, kind: ExtractorKind, weight: f32) -> Result<()> {
        self.bundle.set_weight(kind, weight).map_err(Error::from)
    }

    /// Extract all configured features from a video file.
    ///
    /// The returned map holds one `visual_*` / `audio_*` entry per
    /// successful extractor, `combined_visual` / `combined_audio` fusion
    /// entries per modality, and an overall `combined` entry when both
    /// modalities produced output. A missing or silent audio track degrades
    /// to visual-only extraction.
    pub fn extract_features_from_video(
        &self,
        path: &Path,
        content_id: Option<&str>,
    ) -> Result<FeatureMap> {
        let frames = self
            .processor
            .extract_frames(path, self.max_frames, true)
            .map_err(Error::from)?;

        let audio = match self.processor.extract_audio(path) {
            Ok(audio) => Some(audio),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "audio unavailable, visual only");
                None
            }
        };

        let input = MediaInput {
            frames: Some(&frames),
            audio: audio.as_ref(),
        };
        let output = self.bundle.extract(input).map_err(Error::from)?;

        info!(
            path = %path.display(),
            extractors = output.features.len(),
            "video features extracted"
        );
        Ok(self.assemble(output.features, output.combined, content_id))
    }

    /// Extract visual features from a still image file.
    pub fn extract_features_from_image(
        &self,
        path: &Path,
        content_id: Option<&str>,
    ) -> Result<FeatureMap> {
        let frame = load_image_frame(path)?;
        let output = self.bundle.extract_image(&frame).map_err(Error::from)?;
        Ok(self.assemble(output.features, output.combined, content_id))
    }

    /// Build the final feature map: prefixed per-extractor entries plus
    /// per-modality and overall fusion entries.
    fn assemble(
        &self,
        features: BTreeMap<String, FeatureVector>,
        combined: Option<FeatureVector>,
        content_id: Option<&str>,
    ) -> FeatureMap {
        let weights = self.bundle.weights();

        let mut visual = BTreeMap::new();
        let mut audio = BTreeMap::new();
        let mut map = FeatureMap::new();

        for (name, vector) in features {
            let kind = ExtractorKind::all()
                .into_iter()
                .find(|k| k.name() == name);
            let Some(kind) = kind else { continue };
            match kind.modality() {
                Modality::Visual => {
                    map.insert(format!("visual_{name}"), vector.clone());
                    visual.insert(name, vector);
                }
                Modality::Audio => {
                    let key = feature_key(kind);
                    map.insert(key.to_string(), vector.clone());
                    audio.insert(name, vector);
                }
            }
        }

        if !visual.is_empty() {
            if let Some(fused) = fuse(&visual, &weights) {
                map.insert("combined_visual".to_string(), fused);
            }
        }
        if !audio.is_empty() {
            if let Some(fused) = fuse(&audio, &weights) {
                map.insert("combined_audio".to_string(), fused);
            }
        }
        // The overall entry only makes sense when both modalities contributed.
        if !visual.is_empty() && !audio.is_empty() {
            if let Some(fused) = combined {
                map.insert("combined".to_string(), fused);
            }
        }

        if let Some(id) = content_id {
            map = map
                .into_iter()
                .map(|(key, vector)| (key, vector.with_meta("content_id", id)))
                .collect();
        }
        map
    }
}

/// Facade feature-map key for an audio extractor.
fn feature_key(kind: ExtractorKind) -> &'static str {
    match kind {
        ExtractorKind::Mfcc => "audio_mfcc",
        ExtractorKind::Fingerprint => "audio_fingerprint",
        ExtractorKind::WaveformStats => "audio_stats",
        _ => unreachable!("visual kinds are keyed by prefixing"),
    }
}

/// Compare two feature vectors, returning a similarity score in [0, 1].
pub fn compare_features(a: &FeatureVector, b: &FeatureVector) -> Result<f32> {
    vidmatch_search::compare(a, b)
}

/// Decode an image file into an RGB frame.
fn load_image_frame(path: &Path) -> Result<Frame> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let image = image::open(path)
        .map_err(|e| Error::decode(format!("cannot decode image {}: {e}", path.display())))?
        .to_rgb8();
    let (width, height) = image.dimensions();
    Frame::new(image.into_raw(), width, height, 3)
}
