//! Constellation-style spectral fingerprints.
//!
//! Local maxima of the log spectrogram form a sparse peak constellation.
//! The constellation is summarized as a pair of normalized histograms (peak
//! frequency distribution and peak time distribution), which survives
//! re-encoding and moderate level changes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use vidmatch_core::AudioBuffer;

use crate::dft::SimpleDft;
use crate::error::{AudioError, Result};
use crate::extractor::AudioExtractor;

/// A spectral peak: time frame, frequency bin, log amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Spectrogram frame index.
    pub frame: usize,
    /// Frequency bin index.
    pub bin: usize,
    /// Log-scaled amplitude in dB.
    pub amplitude: f32,
}

/// Fingerprint extractor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Output dimensionality. Half the dimensions hold the frequency
    /// histogram, half the time histogram.
    pub dim: usize,
    /// Analysis transform size.
    pub fft_size: usize,
    /// Hop between analysis frames, in samples.
    pub hop_size: usize,
    /// Required dB margin of a peak over its local neighborhood mean.
    pub peak_margin: f32,
    /// Peaks kept per track, strongest first.
    pub max_peaks: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            dim: 256,
            fft_size: 1024,
            hop_size: 512,
            peak_margin: 3.0,
            max_peaks: 200,
        }
    }
}

/// Extracts constellation fingerprints from audio.
pub struct FingerprintExtractor {
    config: FingerprintConfig,
    dft: SimpleDft,
}

impl FingerprintExtractor {
    /// Create an extractor; fails on degenerate parameters.
    pub fn new(config: FingerprintConfig) -> Result<Self> {
        if config.dim < 2 {
            return Err(AudioError::InvalidInput("dim must be >= 2".into()));
        }
        if config.hop_size == 0 {
            return Err(AudioError::InvalidInput("hop_size must be > 0".into()));
        }
        if config.max_peaks == 0 {
            return Err(AudioError::InvalidInput("max_peaks must be > 0".into()));
        }
        let dft = SimpleDft::new(config.fft_size);
        Ok(Self { config, dft })
    }

    /// Log-scale spectrogram in dB.
    fn log_spectrogram(&self, audio: &AudioBuffer) -> Vec<Vec<f32>> {
        self.dft
            .spectrogram(&audio.samples, self.config.hop_size)
            .into_iter()
            .map(|frame| {
                frame
                    .into_iter()
                    .map(|m| 20.0 * (m + 1e-10).log10())
                    .collect()
            })
            .collect()
    }

    /// Find constellation peaks: strictly greater than all 8 neighbors and
    /// above the 3x3 neighborhood mean by the configured margin.
    pub fn find_peaks(&self, spectrogram: &[Vec<f32>]) -> Vec<Peak> {
        let frames = spectrogram.len();
        if frames < 3 {
            return Vec::new();
        }
        let bins = spectrogram[0].len();

        let mut peaks = Vec::new();
        for t in 1..frames - 1 {
            for f in 1..bins - 1 {
                let value = spectrogram[t][f];

                let mut is_max = true;
                let mut neighborhood = 0.0f32;
                for dt in -1i32..=1 {
                    for df in -1i32..=1 {
                        let v = spectrogram[(t as i32 + dt) as usize][(f as i32 + df) as usize];
                        neighborhood += v;
                        if (dt, df) != (0, 0) && v >= value {
                            is_max = false;
                        }
                    }
                }
                let mean = neighborhood / 9.0;

                if is_max && value > mean + self.config.peak_margin {
                    peaks.push(Peak {
                        frame: t,
                        bin: f,
                        amplitude: value,
                    });
                }
            }
        }

        peaks.sort_by(|a, b| b.amplitude.partial_cmp(&a.amplitude).unwrap_or(std::cmp::Ordering::Equal));
        peaks.truncate(self.config.max_peaks);
        peaks
    }

    /// Histogram the constellation into the output vector.
    fn summarize(&self, peaks: &[Peak], num_frames: usize) -> Vec<f32> {
        let half = self.config.dim / 2;
        let mut values = vec![0.0f32; half * 2];

        let num_bins = self.dft.num_bins();
        for peak in peaks {
            let freq_slot = peak.bin * half / num_bins;
            let time_slot = peak.frame * half / num_frames.max(1);
            values[freq_slot.min(half - 1)] += 1.0;
            values[half + time_slot.min(half - 1)] += 1.0;
        }

        // L1 normalization keeps the fingerprint length-independent.
        let sum: f32 = values.iter().sum();
        if sum > 0.0 {
            for v in &mut values {
                *v /= sum;
            }
        }
        values
    }
}

impl AudioExtractor for FingerprintExtractor {
    fn name(&self) -> &'static str {
        "fingerprint"
    }

    fn dim(&self) -> usize {
        self.config.dim
    }

    fn extract_raw(&self, audio: &AudioBuffer) -> Result<Vec<f32>> {
        if audio.samples.len() < self.dft.size() {
            return Err(AudioError::InvalidInput(format!(
                "audio too short: {} samples, analysis needs {}",
                audio.samples.len(),
                self.dft.size()
            )));
        }

        let spectrogram = self.log_spectrogram(audio);
        let peaks = self.find_peaks(&spectrogram);
        debug!(peaks = peaks.len(), frames = spectrogram.len(), "built constellation");

        Ok(self.summarize(&peaks, spectrogram.len()))
    }
}
