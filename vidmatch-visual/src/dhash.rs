//! Difference-hash extraction.
//!
//! The classic perceptual dHash: downsample to a `(n+1) x n` grayscale
//! grid and emit one bit per horizontally adjacent pixel pair. The result
//! is robust to rescaling and recompression while staying cheap enough to
//! run on every sampled frame.

use serde::{Deserialize, Serialize};

use vidmatch_core::Frame;

use crate::error::{Result, VisualError};
use crate::extractor::VisualExtractor;

/// Difference-hash configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DhashConfig {
    /// Hash grid edge length; the output has `hash_size * hash_size` bits.
    pub hash_size: usize,
}

impl Default for DhashConfig {
    fn default() -> Self {
        Self { hash_size: 8 }
    }
}

/// Extracts binary difference hashes from frames.
#[derive(Debug, Clone)]
pub struct DhashExtractor {
    config: DhashConfig,
}

impl DhashExtractor {
    /// Create an extractor; fails on a zero hash size.
    pub fn new(config: DhashConfig) -> Result<Self> {
        if config.hash_size == 0 {
            return Err(VisualError::InvalidInput("hash_size must be > 0".into()));
        }
        Ok(Self { config })
    }

    /// Hamming distance between two binary hash vectors.
    pub fn hamming_distance(a: &[f32], b: &[f32]) -> usize {
        a.iter()
            .zip(b)
            .filter(|&(&x, &y)| (x > 0.5) != (y > 0.5))
            .count()
    }
}

impl Default for DhashExtractor {
    fn default() -> Self {
        Self {
            config: DhashConfig::default(),
        }
    }
}

impl VisualExtractor for DhashExtractor {
    fn name(&self) -> &'static str {
        "dhash"
    }

    fn dim(&self) -> usize {
        self.config.hash_size * self.config.hash_size
    }

    fn extract_frame(&self, frame: &Frame) -> Result<Vec<f32>> {
        let n = self.config.hash_size;
        let gray = frame.grayscale_resized(n + 1, n);

        let mut bits = Vec::with_capacity(n * n);
        for y in 0..n {
            for x in 0..n {
                let left = gray[y * (n + 1) + x];
                let right = gray[y * (n + 1) + x + 1];
                bits.push(if right > left { 1.0 } else { 0.0 });
            }
        }
        Ok(bits)
    }

    /// Majority vote per bit position, so the sequence hash stays binary.
    fn aggregate(&self, per_frame: &[Vec<f32>]) -> Result<Vec<f32>> {
        if per_frame.is_empty() {
            return Err(VisualError::InvalidInput("no frames to aggregate".into()));
        }
        let dim = per_frame[0].len();
        let n = per_frame.len() as f32;
        let mut voted = vec![0.0f32; dim];
        for bits in per_frame {
            for (acc, bit) in voted.iter_mut().zip(bits) {
                *acc += bit;
            }
        }
        for v in &mut voted {
            *v = if *v / n > 0.5 { 1.0 } else { 0.0 };
        }
        Ok(voted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::VisualInput;

    /// Left half dark, right half bright.
    fn split_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _y in 0..height {
            for x in 0..width {
                let v = if x < width / 2 { 30 } else { 220 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::new(data, width, height, 3).unwrap()
    }

    #[test]
    fn test_hash_is_binary() {
        let extractor = DhashExtractor::default();
        let bits = extractor.extract_frame(&split_frame(64, 64)).unwrap();
        assert_eq!(bits.len(), 64);
        assert!(bits.iter().all(|&b| b == 0.0 || b == 1.0));
    }

    #[test]
    fn test_repeated_frame_aggregates_to_single_hash() {
        let extractor = DhashExtractor::default();
        let frame = split_frame(64, 64);
        let single = extractor.extract_frame(&frame).unwrap();
        let frames = vec![frame.clone(), frame.clone(), frame];
        let voted = extractor.extract_sequence(&frames).unwrap();
        assert_eq!(single, voted);
    }

    #[test]
    fn test_hash_invariant_to_scale() {
        let extractor = DhashExtractor::default();
        let small = extractor.extract_frame(&split_frame(64, 64)).unwrap();
        let large = extractor.extract_frame(&split_frame(256, 256)).unwrap();
        assert_eq!(small, large);
    }

    #[test]
    fn test_uniform_frame_hashes_to_zero() {
        let extractor = DhashExtractor::default();
        let flat = Frame::new(vec![128u8; 64 * 64 * 3], 64, 64, 3).unwrap();
        let bits = extractor.extract_frame(&flat).unwrap();
        assert!(bits.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_majority_vote_stays_binary() {
        let extractor = DhashExtractor::default();
        let frames = vec![split_frame(64, 64), split_frame(64, 64), split_frame(32, 32)];
        let vector = extractor.extract(VisualInput::Frames(&frames)).unwrap();
        assert!(vector.values().iter().all(|&b| b == 0.0 || b == 1.0));
    }

    #[test]
    fn test_hamming_distance() {
        let a = vec![1.0, 0.0, 1.0, 0.0];
        let b = vec![1.0, 1.0, 0.0, 0.0];
        assert_eq!(DhashExtractor::hamming_distance(&a, &b), 2);
        assert_eq!(DhashExtractor::hamming_distance(&a, &a), 0);
    }

    #[test]
    fn test_zero_hash_size_rejected() {
        assert!(DhashExtractor::new(DhashConfig { hash_size: 0 }).is_err());
    }
}
