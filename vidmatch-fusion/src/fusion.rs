//! Weighted multi-modal fusion.

use std::collections::BTreeMap;

use vidmatch_core::{AudioBuffer, FeatureVector, Frame};

use tracing::{debug, warn};

use crate::error::{FusionError, Result};
use crate::kind::{AnyExtractor, ExtractorKind};

/// Media handed to a multi-modal bundle. Either side may be absent;
/// extractors whose modality is missing are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaInput<'a> {
    /// Sampled video frames.
    pub frames: Option<&'a [Frame]>,
    /// Demuxed mono audio.
    pub audio: Option<&'a AudioBuffer>,
}

impl<'a> MediaInput<'a> {
    /// Input with frames only.
    pub fn from_frames(frames: &'a [Frame]) -> Self {
        Self {
            frames: Some(frames),
            audio: None,
        }
    }

    /// Input with audio only.
    pub fn from_audio(audio: &'a AudioBuffer) -> Self {
        Self {
            frames: None,
            audio: Some(audio),
        }
    }
}

/// Result of one multi-modal extraction run.
#[derive(Debug, Clone)]
pub struct MultiModalOutput {
    /// Per-extractor feature vectors, keyed by extractor name.
    pub features: BTreeMap<String, FeatureVector>,
    /// Weighted fusion of the per-extractor vectors, when any could be
    /// combined. `None` is distinct from a zero vector: nothing was fused.
    pub combined: Option<FeatureVector>,
}

/// A configured set of extractors with fusion weights.
pub struct MultiModalExtractor {
    extractors: BTreeMap<&'static str, AnyExtractor>,
    weights: BTreeMap<&'static str, f32>,
}

impl MultiModalExtractor {
    /// Build a bundle from extractor kinds, all weighted 1.0.
    pub fn new(kinds: &[ExtractorKind]) -> Result<Self> {
        if kinds.is_empty() {
            return Err(FusionError::Config("no extractors configured".into()));
        }

        let mut extractors = BTreeMap::new();
        let mut weights = BTreeMap::new();
        for kind in kinds {
            let extractor = kind.build()?;
            weights.insert(kind.name(), 1.0);
            extractors.insert(kind.name(), extractor);
        }
        Ok(Self {
            extractors,
            weights,
        })
    }

    /// Bundle with every known extractor.
    pub fn with_all() -> Result<Self> {
        Self::new(&ExtractorKind::all())
    }

    /// Set the fusion weight of one extractor. Fails on unknown names and
    /// negative weights.
    pub fn set_weight(&mut self, kind: ExtractorKind, weight: f32) -> Result<()> {
        if weight < 0.0 || !weight.is_finite() {
            return Err(FusionError::Config(format!(
                "weight for {} must be finite and non-negative, got {weight}",
                kind.name()
            )));
        }
        if !self.weights.contains_key(kind.name()) {
            return Err(FusionError::Config(format!(
                "extractor {} is not part of this bundle",
                kind.name()
            )));
        }
        self.weights.insert(kind.name(), weight);
        Ok(())
    }

    /// Names of the configured extractors.
    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.keys().copied().collect()
    }

    /// Run every applicable extractor and fuse the results.
    ///
    /// Individual extractor failures are logged and their entries omitted;
    /// the run fails only when nothing produced output.
    pub fn extract(&self, input: MediaInput<'_>) -> Result<MultiModalOutput> {
        let mut features = BTreeMap::new();

        for (name, extractor) in &self.extractors {
            let result = match (extractor, input.frames, input.audio) {
                (AnyExtractor::Visual(e), Some(frames), _) => {
                    e.extract(vidmatch_visual::VisualInput::Frames(frames))
                        .map_err(vidmatch_core::Error::from)
                }
                (AnyExtractor::Audio(e), _, Some(audio)) => {
                    e.extract(audio).map_err(vidmatch_core::Error::from)
                }
                _ => {
                    debug!(extractor = name, "input modality absent, skipping");
                    continue;
                }
            };

            match result {
                Ok(vector) => {
                    features.insert(name.to_string(), vector);
                }
                Err(err) => {
                    warn!(extractor = name, error = %err, "extractor failed, omitting");
                }
            }
        }

        if features.is_empty() {
            return Err(FusionError::Extraction(
                "no extractor produced output for the given input".into(),
            ));
        }

        let combined = fuse(&features, &self.weight_map());
        Ok(MultiModalOutput { features, combined })
    }

    /// Run the visual extractors over a still image and fuse the results.
    ///
    /// Audio extractors are skipped, as are visual extractors that reject
    /// still input (motion needs a sequence).
    pub fn extract_image(&self, frame: &Frame) -> Result<MultiModalOutput> {
        let mut features = BTreeMap::new();

        for (name, extractor) in &self.extractors {
            let AnyExtractor::Visual(e) = extractor else {
                continue;
            };
            match e.extract(vidmatch_visual::VisualInput::Image(frame)) {
                Ok(vector) => {
                    features.insert(name.to_string(), vector);
                }
                Err(err) => {
                    debug!(extractor = name, error = %err, "not applicable to still input");
                }
            }
        }

        if features.is_empty() {
            return Err(FusionError::Extraction(
                "no extractor produced output for the image".into(),
            ));
        }

        let combined = fuse(&features, &self.weight_map());
        Ok(MultiModalOutput { features, combined })
    }

    /// Current fusion weights keyed by extractor name.
    pub fn weights(&self) -> BTreeMap<String, f32> {
        self.weight_map()
    }

    /// Weights keyed by owned extractor name.
    fn weight_map(&self) -> BTreeMap<String, f32> {
        self.weights
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }
}

/// Weighted mean of same-dimension feature vectors.
///
/// The first vector (in key order) with a positive weight seeds the
/// accumulator and fixes the fused dimension; later vectors whose dimension
/// disagrees are logged and skipped. The accumulator is divided by the sum
/// of weights actually used, so weighting `{a: 0.6, b: 0.4}` with only `a`
/// present returns exactly `a`'s values. Returns `None` when no vector
/// could be used.
pub fn fuse(
    features: &BTreeMap<String, FeatureVector>,
    weights: &BTreeMap<String, f32>,
) -> Option<FeatureVector> {
    let mut accumulator: Option<Vec<f32>> = None;
    let mut used_weight = 0.0f32;
    let mut used_names: Vec<&str> = Vec::new();

    for (name, vector) in features {
        let weight = weights.get(name).copied().unwrap_or(1.0);
        if weight == 0.0 {
            continue;
        }

        match &mut accumulator {
            None => {
                accumulator = Some(vector.values().iter().map(|v| v * weight).collect());
                used_weight = weight;
                used_names.push(name);
            }
            Some(acc) => {
                if vector.dim() != acc.len() {
                    warn!(
                        extractor = name.as_str(),
                        dim = vector.dim(),
                        fused_dim = acc.len(),
                        "dimension mismatch, excluding from fusion"
                    );
                    continue;
                }
                for (a, v) in acc.iter_mut().zip(vector.values()) {
                    *a += v * weight;
                }
                used_weight += weight;
                used_names.push(name);
            }
        }
    }

    let mut values = accumulator?;
    for v in &mut values {
        *v /= used_weight;
    }

    Some(
        FeatureVector::new(values)
            .with_meta("fused_from", used_names.join(","))
            .with_meta("fused_count", used_names.len()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_map(entries: &[(&str, Vec<f32>)]) -> BTreeMap<String, FeatureVector> {
        entries
            .iter()
            .map(|(name, values)| (name.to_string(), FeatureVector::new(values.clone())))
            .collect()
    }

    #[test]
    fn test_fuse_weighted_mean() {
        let features = vec_map(&[("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])]);
        let weights = BTreeMap::from([("a".to_string(), 3.0), ("b".to_string(), 1.0)]);
        let fused = fuse(&features, &weights).unwrap();
        assert_eq!(fused.values(), &[0.75, 0.25]);
    }

    #[test]
    fn test_fuse_renormalizes_by_used_weights() {
        // Only "a" present: its vector comes back exactly despite w = 0.6.
        let features = vec_map(&[("a", vec![0.2, 0.4])]);
        let weights = BTreeMap::from([("a".to_string(), 0.6), ("b".to_string(), 0.4)]);
        let fused = fuse(&features, &weights).unwrap();
        assert_eq!(fused.values(), &[0.2, 0.4]);
    }

    #[test]
    fn test_fuse_skips_mismatched_dimension() {
        let features = vec_map(&[("a", vec![1.0, 1.0]), ("b", vec![1.0, 1.0, 1.0])]);
        let weights = BTreeMap::new();
        let fused = fuse(&features, &weights).unwrap();
        assert_eq!(fused.dim(), 2);
        assert_eq!(
            fused.metadata().get("fused_count"),
            Some(&vidmatch_core::MetaValue::Int(1))
        );
    }

    #[test]
    fn test_fuse_empty_is_none() {
        assert!(fuse(&BTreeMap::new(), &BTreeMap::new()).is_none());
        // All weights zero also yields None.
        let features = vec_map(&[("a", vec![1.0])]);
        let weights = BTreeMap::from([("a".to_string(), 0.0)]);
        assert!(fuse(&features, &weights).is_none());
    }

    #[test]
    fn test_extract_audio_only() {
        let bundle = MultiModalExtractor::new(&[
            ExtractorKind::Fingerprint,
            ExtractorKind::WaveformStats,
            ExtractorKind::Dhash,
        ])
        .unwrap();

        let samples: Vec<f32> = (0..22050)
            .map(|i| (i as f32 * 0.3).sin() * 0.4)
            .collect();
        let audio = AudioBuffer::from_samples(samples, 1, 22050);
        let output = bundle.extract(MediaInput::from_audio(&audio)).unwrap();

        // dhash skipped without frames
        assert!(output.features.contains_key("fingerprint"));
        assert!(output.features.contains_key("waveform_stats"));
        assert!(!output.features.contains_key("dhash"));
        assert!(output.combined.is_some());
    }

    #[test]
    fn test_extract_image_skips_motion_and_audio() {
        let bundle = MultiModalExtractor::new(&[
            ExtractorKind::Dhash,
            ExtractorKind::Motion,
            ExtractorKind::WaveformStats,
        ])
        .unwrap();

        let frame = Frame::new(vec![100u8; 16 * 16 * 3], 16, 16, 3).unwrap();
        let output = bundle.extract_image(&frame).unwrap();

        assert_eq!(output.features.len(), 1);
        assert!(output.features.contains_key("dhash"));
        assert_eq!(
            output.features["dhash"].metadata().get("source"),
            Some(&vidmatch_core::MetaValue::from("image"))
        );
    }

    #[test]
    fn test_extract_no_usable_input_fails() {
        let bundle = MultiModalExtractor::new(&[ExtractorKind::Dhash]).unwrap();
        let audio = AudioBuffer::from_samples(vec![0.1; 100], 1, 22050);
        assert!(bundle.extract(MediaInput::from_audio(&audio)).is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut bundle = MultiModalExtractor::new(&[ExtractorKind::Dhash]).unwrap();
        assert!(bundle.set_weight(ExtractorKind::Dhash, -1.0).is_err());
        assert!(bundle.set_weight(ExtractorKind::Mfcc, 1.0).is_err());
        assert!(bundle.set_weight(ExtractorKind::Dhash, 0.5).is_ok());
    }

    #[test]
    fn test_empty_bundle_rejected() {
        assert!(MultiModalExtractor::new(&[]).is_err());
    }
}
