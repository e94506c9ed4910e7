//! Content-based scene boundary detection.
//!
//! Consecutive frames are reduced to cheap signatures (luma histogram, mean
//! luminance, edge strength, 64-bit content hash) and a change score is
//! computed between neighbors. A score above the threshold — fixed or
//! adaptive — starts a new scene.

use serde::{Deserialize, Serialize};
use tracing::debug;

use vidmatch_core::Frame;

use crate::error::{Result, VideoError};

/// Scene change scoring method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundaryMethod {
    /// Histogram intersection difference (fast).
    Histogram,
    /// Mean-luminance plus content-hash difference.
    #[default]
    Content,
    /// Sobel edge-strength difference.
    Edge,
    /// Weighted blend of all three.
    Blended,
}

/// Scene detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Scoring method.
    pub method: BoundaryMethod,
    /// Sensitivity threshold in [0, 1]; higher means fewer cuts.
    pub threshold: f64,
    /// Minimum frames between detected cuts.
    pub min_scene_frames: usize,
    /// Adapt the threshold to the running score statistics.
    pub adaptive: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            method: BoundaryMethod::default(),
            threshold: 0.3,
            min_scene_frames: 8,
            adaptive: false,
        }
    }
}

impl SceneConfig {
    /// Set the scoring method.
    pub fn with_method(mut self, method: BoundaryMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the sensitivity threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Enable adaptive thresholding.
    pub fn adaptive(mut self, enabled: bool) -> Self {
        self.adaptive = enabled;
        self
    }
}

/// A detected scene as a half-open frame-index span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSpan {
    /// First frame of the scene.
    pub start_frame: usize,
    /// Last frame of the scene (inclusive).
    pub end_frame: usize,
    /// Cut confidence in [0, 1] at the scene start (1.0 for the first scene).
    pub confidence: f64,
}

impl SceneSpan {
    /// Frame count of the scene.
    pub fn frame_count(&self) -> usize {
        self.end_frame - self.start_frame + 1
    }

    /// Index of the temporal midpoint frame.
    pub fn midpoint_frame(&self) -> usize {
        self.start_frame + (self.end_frame - self.start_frame) / 2
    }
}

/// Per-frame signature used for change scoring.
#[derive(Debug, Clone)]
struct FrameSignature {
    histogram: [u32; 256],
    mean_luma: f64,
    edge_strength: f64,
    content_hash: u64,
}

fn signature(frame: &Frame) -> FrameSignature {
    let w = frame.width as usize;
    let h = frame.height as usize;

    let mut histogram = [0u32; 256];
    let mut sum = 0u64;
    for y in 0..h {
        for x in 0..w {
            let luma = frame.luma_at(x, y);
            histogram[luma as usize] += 1;
            sum += luma as u64;
        }
    }
    let mean_luma = sum as f64 / (w * h) as f64;

    FrameSignature {
        histogram,
        mean_luma,
        edge_strength: edge_strength(frame),
        content_hash: content_hash(frame),
    }
}

/// Mean Sobel gradient magnitude, sampled every 4th pixel, normalized to
/// roughly [0, 1].
fn edge_strength(frame: &Frame) -> f64 {
    let w = frame.width as usize;
    let h = frame.height as usize;
    if w < 3 || h < 3 {
        return 0.0;
    }

    let step = 4;
    let mut total = 0.0;
    let mut samples = 0usize;
    for y in (1..h - 1).step_by(step) {
        for x in (1..w - 1).step_by(step) {
            let l = |dx: i32, dy: i32| -> f64 {
                frame.luma_at((x as i32 + dx) as usize, (y as i32 + dy) as usize) as f64
            };
            let gx = -l(-1, -1) - 2.0 * l(-1, 0) - l(-1, 1) + l(1, -1) + 2.0 * l(1, 0) + l(1, 1);
            let gy = -l(-1, -1) - 2.0 * l(0, -1) - l(1, -1) + l(-1, 1) + 2.0 * l(0, 1) + l(1, 1);
            total += (gx * gx + gy * gy).sqrt();
            samples += 1;
        }
    }
    if samples == 0 {
        0.0
    } else {
        total / (samples as f64 * 255.0)
    }
}

/// 64-bit average hash of the 8x8 downsampled luma plane.
fn content_hash(frame: &Frame) -> u64 {
    let grid = frame.grayscale_resized(8, 8);
    let mean: u32 = grid.iter().map(|&v| v as u32).sum::<u32>() / 64;
    let mut hash = 0u64;
    for (i, &value) in grid.iter().enumerate() {
        if value as u32 > mean {
            hash |= 1 << i;
        }
    }
    hash
}

/// Streaming scene-boundary detector.
#[derive(Debug)]
pub struct SceneDetector {
    config: SceneConfig,
    prev: Option<FrameSignature>,
    frame_index: usize,
    last_cut: usize,
    // Welford running statistics for the adaptive threshold.
    score_mean: f64,
    score_m2: f64,
    score_count: usize,
}

impl Default for SceneDetector {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl SceneDetector {
    /// Create a detector.
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            prev: None,
            frame_index: 0,
            last_cut: 0,
            score_mean: 0.0,
            score_m2: 0.0,
            score_count: 0,
        }
    }

    /// Reset detector state.
    pub fn reset(&mut self) {
        self.prev = None;
        self.frame_index = 0;
        self.last_cut = 0;
        self.score_mean = 0.0;
        self.score_m2 = 0.0;
        self.score_count = 0;
    }

    /// Feed the next frame; returns the cut score when this frame starts a
    /// new scene.
    pub fn push(&mut self, frame: &Frame) -> Result<Option<f64>> {
        if frame.pixel_count() == 0 {
            return Err(VideoError::InvalidParameter("empty frame".into()));
        }
        let current = signature(frame);
        self.frame_index += 1;

        let cut = if let Some(prev) = &self.prev {
            let score = self.score(prev, &current);
            self.observe(score);

            let threshold = if self.config.adaptive {
                self.adaptive_threshold()
            } else {
                self.config.threshold
            };

            let long_enough = self.frame_index - self.last_cut >= self.config.min_scene_frames;
            if score > threshold && long_enough {
                self.last_cut = self.frame_index;
                Some(score)
            } else {
                None
            }
        } else {
            None
        };

        self.prev = Some(current);
        Ok(cut)
    }

    fn score(&self, prev: &FrameSignature, current: &FrameSignature) -> f64 {
        match self.config.method {
            BoundaryMethod::Histogram => histogram_diff(prev, current),
            BoundaryMethod::Content => content_diff(prev, current),
            BoundaryMethod::Edge => edge_diff(prev, current),
            BoundaryMethod::Blended => {
                0.4 * histogram_diff(prev, current)
                    + 0.4 * content_diff(prev, current)
                    + 0.2 * edge_diff(prev, current)
            }
        }
    }

    fn observe(&mut self, score: f64) {
        self.score_count += 1;
        let delta = score - self.score_mean;
        self.score_mean += delta / self.score_count as f64;
        self.score_m2 += delta * (score - self.score_mean);
    }

    fn adaptive_threshold(&self) -> f64 {
        if self.score_count < 10 {
            return self.config.threshold;
        }
        let variance = self.score_m2 / self.score_count as f64;
        (self.score_mean + 2.0 * variance.sqrt()).clamp(0.1, 0.8)
    }
}

fn histogram_diff(prev: &FrameSignature, current: &FrameSignature) -> f64 {
    let mut diff = 0.0;
    let mut total = 0.0;
    for i in 0..256 {
        let p = prev.histogram[i] as f64;
        let c = current.histogram[i] as f64;
        diff += (p - c).abs();
        total += p + c;
    }
    if total > 0.0 {
        diff / total
    } else {
        0.0
    }
}

fn content_diff(prev: &FrameSignature, current: &FrameSignature) -> f64 {
    let luma = (prev.mean_luma - current.mean_luma).abs() / 255.0;
    let hash = (prev.content_hash ^ current.content_hash).count_ones() as f64 / 64.0;
    (luma + hash) / 2.0
}

fn edge_diff(prev: &FrameSignature, current: &FrameSignature) -> f64 {
    let max = prev.edge_strength.max(current.edge_strength);
    if max > 0.0 {
        (prev.edge_strength - current.edge_strength).abs() / max
    } else {
        0.0
    }
}

/// Segment a frame sequence into ordered, non-overlapping scenes covering
/// the whole sequence.
pub fn segment_scenes(frames: &[Frame], config: SceneConfig) -> Result<Vec<SceneSpan>> {
    if frames.is_empty() {
        return Ok(Vec::new());
    }

    let mut detector = SceneDetector::new(config);
    let mut scenes = Vec::new();
    let mut scene_start = 0usize;

    for (i, frame) in frames.iter().enumerate() {
        if let Some(score) = detector.push(frame)? {
            if i > 0 {
                scenes.push(SceneSpan {
                    start_frame: scene_start,
                    end_frame: i - 1,
                    confidence: score.min(1.0),
                });
            }
            scene_start = i;
        }
    }

    scenes.push(SceneSpan {
        start_frame: scene_start,
        end_frame: frames.len() - 1,
        confidence: 1.0,
    });

    debug!(scenes = scenes.len(), frames = frames.len(), "segmented scenes");
    Ok(scenes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(value: u8) -> Frame {
        Frame::new(vec![value; 64 * 64 * 3], 64, 64, 3).unwrap()
    }

    #[test]
    fn test_identical_frames_no_cut() {
        let mut detector = SceneDetector::default();
        let frame = solid(128);
        assert!(detector.push(&frame).unwrap().is_none());
        assert!(detector.push(&frame).unwrap().is_none());
        assert!(detector.push(&frame).unwrap().is_none());
    }

    #[test]
    fn test_hard_cut_detected() {
        let mut detector = SceneDetector::new(SceneConfig {
            threshold: 0.1,
            min_scene_frames: 1,
            adaptive: false,
            ..Default::default()
        });
        detector.push(&solid(10)).unwrap();
        let cut = detector.push(&solid(240)).unwrap();
        assert!(cut.is_some());
        assert!(cut.unwrap() > 0.1);
    }

    #[test]
    fn test_segment_covers_sequence() {
        let frames: Vec<Frame> = (0..12)
            .map(|i| solid(if i < 6 { 30 } else { 220 }))
            .collect();
        let config = SceneConfig {
            threshold: 0.1,
            min_scene_frames: 1,
            adaptive: false,
            ..Default::default()
        };

        let scenes = segment_scenes(&frames, config).unwrap();
        assert!(scenes.len() >= 2);

        // Spans are ordered, non-overlapping and cover the sequence.
        assert_eq!(scenes[0].start_frame, 0);
        assert_eq!(scenes.last().unwrap().end_frame, 11);
        for pair in scenes.windows(2) {
            assert_eq!(pair[0].end_frame + 1, pair[1].start_frame);
        }
    }

    #[test]
    fn test_midpoint_frame() {
        let span = SceneSpan {
            start_frame: 10,
            end_frame: 20,
            confidence: 1.0,
        };
        assert_eq!(span.midpoint_frame(), 15);
        assert_eq!(span.frame_count(), 11);
    }
}
