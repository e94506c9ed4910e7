//! Motion descriptors from frame-to-frame luminance flow.
//!
//! For each consecutive frame pair the absolute grayscale difference is
//! summarized over a block grid as per-block mean and standard deviation.
//! Flow vectors from all pairs are concatenated into the final descriptor,
//! so both spatial layout and temporal evolution of motion survive.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use vidmatch_core::{fit_dimension, Frame};

use crate::error::{Result, VisualError};
use crate::extractor::VisualExtractor;

/// Motion extractor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Output dimensionality.
    pub dim: usize,
    /// Block edge is `min(width, height) / block_divisor`, floor 1.
    pub block_divisor: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            dim: 128,
            block_divisor: 16,
        }
    }
}

/// Extracts motion statistics from frame sequences.
///
/// Unlike the other visual extractors this one has no meaningful
/// single-frame form; still input is rejected.
#[derive(Debug, Clone)]
pub struct MotionExtractor {
    config: MotionConfig,
}

impl MotionExtractor {
    /// Create an extractor; fails on zero dim or divisor.
    pub fn new(config: MotionConfig) -> Result<Self> {
        if config.dim == 0 {
            return Err(VisualError::InvalidInput("dim must be > 0".into()));
        }
        if config.block_divisor == 0 {
            return Err(VisualError::InvalidInput("block_divisor must be > 0".into()));
        }
        Ok(Self { config })
    }

    /// Per-block [means.., stds..] of the absolute difference between two
    /// grayscale planes.
    fn flow_stats(&self, prev: &[u8], curr: &[u8], width: usize, height: usize) -> Vec<f32> {
        let block = (width.min(height) / self.config.block_divisor as usize).max(1);
        let cols = width.div_ceil(block);
        let rows = height.div_ceil(block);

        let mut means = Vec::with_capacity(rows * cols);
        let mut stds = Vec::with_capacity(rows * cols);

        for by in 0..rows {
            for bx in 0..cols {
                let x0 = bx * block;
                let x1 = ((bx + 1) * block).min(width);
                let y0 = by * block;
                let y1 = ((by + 1) * block).min(height);

                let mut sum = 0.0f64;
                let mut sum_sq = 0.0f64;
                let count = ((x1 - x0) * (y1 - y0)) as f64;
                for y in y0..y1 {
                    for x in x0..x1 {
                        let idx = y * width + x;
                        let diff = (prev[idx] as f64 - curr[idx] as f64).abs() / 255.0;
                        sum += diff;
                        sum_sq += diff * diff;
                    }
                }
                let mean = sum / count;
                let var = (sum_sq / count - mean * mean).max(0.0);
                means.push(mean as f32);
                stds.push(var.sqrt() as f32);
            }
        }

        means.extend_from_slice(&stds);
        means
    }
}

impl Default for MotionExtractor {
    fn default() -> Self {
        Self {
            config: MotionConfig::default(),
        }
    }
}

impl VisualExtractor for MotionExtractor {
    fn name(&self) -> &'static str {
        "motion"
    }

    fn dim(&self) -> usize {
        self.config.dim
    }

    fn extract_frame(&self, _frame: &Frame) -> Result<Vec<f32>> {
        Err(VisualError::InvalidInput(
            "motion features require a frame sequence".into(),
        ))
    }

    fn extract_sequence(&self, frames: &[Frame]) -> Result<Vec<f32>> {
        if frames.len() < 2 {
            return Err(VisualError::InvalidInput(format!(
                "motion features need at least 2 frames, got {}",
                frames.len()
            )));
        }
        for pair in frames.windows(2) {
            if pair[0].width != pair[1].width || pair[0].height != pair[1].height {
                return Err(VisualError::InvalidInput(
                    "frames in a sequence must share dimensions".into(),
                ));
            }
        }

        let width = frames[0].width as usize;
        let height = frames[0].height as usize;
        let planes: Vec<Vec<u8>> = frames.par_iter().map(|f| f.to_grayscale()).collect();

        let flows: Vec<Vec<f32>> = planes
            .par_windows(2)
            .map(|pair| self.flow_stats(&pair[0], &pair[1], width, height))
            .collect();

        // Flows are concatenated raw and fitted once at the end. Fitting
        // each flow to `dim` first would zero-pad small grids to the full
        // dimension, and the final truncation would then discard every flow
        // after the first.
        let mut concatenated = Vec::new();
        for flow in flows {
            concatenated.extend(flow);
        }
        Ok(fit_dimension(concatenated, self.config.dim))
    }
}
