//! Audio feature extraction for content identification.
//!
//! Three extractors share the [`AudioExtractor`] trait:
//!
//! - [`MfccExtractor`]: mel-frequency cepstral summaries of timbre
//! - [`FingerprintExtractor`]: constellation fingerprints from spectral
//!   peak histograms
//! - [`WaveformStatsExtractor`]: time-domain and spectral shape statistics
//!
//! All extractors operate on mono PCM; multi-channel buffers are downmixed
//! automatically, and every output is a fixed-dimension
//! [`FeatureVector`](vidmatch_core::FeatureVector).

pub mod dft;
pub mod error;
pub mod extractor;
pub mod fingerprint;
pub mod mfcc;
pub mod stats;

pub use dft::SimpleDft;
pub use error::{AudioError, Result};
pub use extractor::AudioExtractor;
pub use fingerprint::{FingerprintConfig, FingerprintExtractor, Peak};
pub use mfcc::{MfccConfig, MfccExtractor};
pub use stats::{WaveformStatsConfig, WaveformStatsExtractor};
