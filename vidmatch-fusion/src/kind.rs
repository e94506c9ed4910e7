//! The closed extractor registry.
//!
//! Extractors are named by a fixed enum and built through one constructor,
//! so an unknown name is a configuration-time error rather than a runtime
//! dispatch failure.

use serde::{Deserialize, Serialize};

use vidmatch_audio::{
    AudioExtractor, FingerprintConfig, FingerprintExtractor, MfccConfig, MfccExtractor,
    WaveformStatsConfig, WaveformStatsExtractor,
};
use vidmatch_visual::{
    DhashConfig, DhashExtractor, EmbeddingConfig, EmbeddingExtractor, MotionConfig,
    MotionExtractor, VisualExtractor,
};

use crate::error::{FusionError, Result};

/// Input modality an extractor consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Frames or still images.
    Visual,
    /// PCM audio.
    Audio,
}

/// Every extractor the system knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// CNN embedding.
    Embedding,
    /// Difference hash.
    Dhash,
    /// Motion statistics.
    Motion,
    /// MFCC timbre profile.
    Mfcc,
    /// Constellation fingerprint.
    Fingerprint,
    /// Waveform statistics.
    WaveformStats,
}

impl ExtractorKind {
    /// All known kinds.
    pub fn all() -> [ExtractorKind; 6] {
        [
            ExtractorKind::Embedding,
            ExtractorKind::Dhash,
            ExtractorKind::Motion,
            ExtractorKind::Mfcc,
            ExtractorKind::Fingerprint,
            ExtractorKind::WaveformStats,
        ]
    }

    /// Stable name, matching the underlying extractor's name.
    pub fn name(&self) -> &'static str {
        match self {
            ExtractorKind::Embedding => "embedding",
            ExtractorKind::Dhash => "dhash",
            ExtractorKind::Motion => "motion",
            ExtractorKind::Mfcc => "mfcc",
            ExtractorKind::Fingerprint => "fingerprint",
            ExtractorKind::WaveformStats => "waveform_stats",
        }
    }

    /// Modality this kind consumes.
    pub fn modality(&self) -> Modality {
        match self {
            ExtractorKind::Embedding | ExtractorKind::Dhash | ExtractorKind::Motion => {
                Modality::Visual
            }
            ExtractorKind::Mfcc | ExtractorKind::Fingerprint | ExtractorKind::WaveformStats => {
                Modality::Audio
            }
        }
    }

    /// Build this extractor with its default configuration.
    pub fn build(&self) -> Result<AnyExtractor> {
        let map_err = |e: String| FusionError::Config(e);
        Ok(match self {
            ExtractorKind::Embedding => {
                AnyExtractor::Visual(Box::new(EmbeddingExtractor::new(EmbeddingConfig::default())))
            }
            ExtractorKind::Dhash => AnyExtractor::Visual(Box::new(
                DhashExtractor::new(DhashConfig::default()).map_err(|e| map_err(e.to_string()))?,
            )),
            ExtractorKind::Motion => AnyExtractor::Visual(Box::new(
                MotionExtractor::new(MotionConfig::default()).map_err(|e| map_err(e.to_string()))?,
            )),
            ExtractorKind::Mfcc => AnyExtractor::Audio(Box::new(
                MfccExtractor::new(MfccConfig::default()).map_err(|e| map_err(e.to_string()))?,
            )),
            ExtractorKind::Fingerprint => AnyExtractor::Audio(Box::new(
                FingerprintExtractor::new(FingerprintConfig::default())
                    .map_err(|e| map_err(e.to_string()))?,
            )),
            ExtractorKind::WaveformStats => AnyExtractor::Audio(Box::new(
                WaveformStatsExtractor::new(WaveformStatsConfig::default())
                    .map_err(|e| map_err(e.to_string()))?,
            )),
        })
    }
}

/// A built extractor of either modality.
pub enum AnyExtractor {
    /// Operates on frames or images.
    Visual(Box<dyn VisualExtractor>),
    /// Operates on PCM audio.
    Audio(Box<dyn AudioExtractor>),
}

impl AnyExtractor {
    /// Stable extractor name.
    pub fn name(&self) -> &'static str {
        match self {
            AnyExtractor::Visual(e) => e.name(),
            AnyExtractor::Audio(e) => e.name(),
        }
    }

    /// Output dimensionality.
    pub fn dim(&self) -> usize {
        match self {
            AnyExtractor::Visual(e) => e.dim(),
            AnyExtractor::Audio(e) => e.dim(),
        }
    }

    /// Modality this extractor consumes.
    pub fn modality(&self) -> Modality {
        match self {
            AnyExtractor::Visual(_) => Modality::Visual,
            AnyExtractor::Audio(_) => Modality::Audio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_kinds_build() {
        for kind in ExtractorKind::all() {
            let extractor = kind.build().unwrap();
            assert_eq!(extractor.name(), kind.name());
            assert_eq!(extractor.modality(), kind.modality());
            assert!(extractor.dim() > 0);
        }
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ExtractorKind::WaveformStats).unwrap();
        assert_eq!(json, "\"waveform_stats\"");
        let kind: ExtractorKind = serde_json::from_str("\"dhash\"").unwrap();
        assert_eq!(kind, ExtractorKind::Dhash);
    }
}
