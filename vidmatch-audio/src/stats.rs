//! Waveform statistics.
//!
//! A lightweight descriptor built from time-domain statistics, a handful of
//! spectral shape measures and percentiles of short-frame statistics. Much
//! coarser than MFCC or fingerprints but nearly free to compute, which
//! makes it a useful always-on signal for fusion.

use serde::{Deserialize, Serialize};

use vidmatch_core::AudioBuffer;

use crate::dft::SimpleDft;
use crate::error::{AudioError, Result};
use crate::extractor::AudioExtractor;

/// Analysis frame length in seconds.
const FRAME_SECS: f32 = 0.025;
/// Hop between analysis frames in seconds.
const HOP_SECS: f32 = 0.010;
/// Spectral rolloff energy fraction.
const ROLLOFF_FRACTION: f32 = 0.85;

/// Waveform statistics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformStatsConfig {
    /// Output dimensionality.
    pub dim: usize,
    /// Transform size for the spectral shape measures.
    pub fft_size: usize,
}

impl Default for WaveformStatsConfig {
    fn default() -> Self {
        Self {
            dim: 17,
            fft_size: 1024,
        }
    }
}

/// Extracts global and framed waveform statistics.
pub struct WaveformStatsExtractor {
    config: WaveformStatsConfig,
    dft: SimpleDft,
}

impl WaveformStatsExtractor {
    /// Create an extractor.
    pub fn new(config: WaveformStatsConfig) -> Result<Self> {
        if config.dim == 0 {
            return Err(AudioError::InvalidInput("dim must be > 0".into()));
        }
        let dft = SimpleDft::new(config.fft_size);
        Ok(Self { config, dft })
    }

    /// Centroid, bandwidth and rolloff of the average magnitude spectrum,
    /// all expressed as bin fractions in [0, 1].
    fn spectral_shape(&self, samples: &[f32]) -> (f32, f32, f32) {
        let spectrogram = self.dft.spectrogram(samples, self.dft.size() / 2);
        if spectrogram.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let num_bins = self.dft.num_bins();
        let mut mean_spectrum = vec![0.0f32; num_bins];
        for frame in &spectrogram {
            for (acc, m) in mean_spectrum.iter_mut().zip(frame) {
                *acc += m;
            }
        }

        let total: f32 = mean_spectrum.iter().sum();
        if total <= 0.0 {
            return (0.0, 0.0, 0.0);
        }

        let centroid: f32 = mean_spectrum
            .iter()
            .enumerate()
            .map(|(k, m)| k as f32 * m)
            .sum::<f32>()
            / total;

        let bandwidth = (mean_spectrum
            .iter()
            .enumerate()
            .map(|(k, m)| (k as f32 - centroid).powi(2) * m)
            .sum::<f32>()
            / total)
            .sqrt();

        let mut cumulative = 0.0f32;
        let mut rolloff_bin = num_bins - 1;
        for (k, m) in mean_spectrum.iter().enumerate() {
            cumulative += m;
            if cumulative >= ROLLOFF_FRACTION * total {
                rolloff_bin = k;
                break;
            }
        }

        let scale = (num_bins - 1) as f32;
        (centroid / scale, bandwidth / scale, rolloff_bin as f32 / scale)
    }

    /// Percentile of a sorted slice by nearest-rank interpolation.
    fn percentile(sorted: &[f32], p: f32) -> f32 {
        if sorted.is_empty() {
            return 0.0;
        }
        let pos = p * (sorted.len() - 1) as f32;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let frac = pos - lo as f32;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

impl AudioExtractor for WaveformStatsExtractor {
    fn name(&self) -> &'static str {
        "waveform_stats"
    }

    fn dim(&self) -> usize {
        self.config.dim
    }

    fn extract_raw(&self, audio: &AudioBuffer) -> Result<Vec<f32>> {
        let samples = &audio.samples;
        let n = samples.len() as f32;

        let mean = samples.iter().sum::<f32>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;
        let std = variance.sqrt();
        let energy = samples.iter().map(|s| s * s).sum::<f32>() / n;
        let rms = energy.sqrt();
        let zcr = samples
            .windows(2)
            .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
            .count() as f32
            / n;

        let (centroid, bandwidth, rolloff) = self.spectral_shape(samples);

        // Short-frame statistics mirror how the signal evolves over time.
        let frame_len = ((audio.sample_rate as f32 * FRAME_SECS) as usize).max(1);
        let hop = ((audio.sample_rate as f32 * HOP_SECS) as usize).max(1);

        let mut frame_means = Vec::new();
        let mut frame_stds = Vec::new();
        let mut frame_energies = Vec::new();
        let mut start = 0;
        while start + frame_len <= samples.len() {
            let frame = &samples[start..start + frame_len];
            let fm = frame.iter().sum::<f32>() / frame_len as f32;
            let fv = frame.iter().map(|s| (s - fm).powi(2)).sum::<f32>() / frame_len as f32;
            frame_means.push(fm);
            frame_stds.push(fv.sqrt());
            frame_energies.push(frame.iter().map(|s| s * s).sum::<f32>() / frame_len as f32);
            start += hop;
        }

        let mut values = vec![mean, std, rms, zcr, energy, centroid, bandwidth, rolloff];
        for series in [&mut frame_means, &mut frame_stds, &mut frame_energies] {
            series.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            for p in [0.25, 0.5, 0.75] {
                values.push(Self::percentile(series, p));
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> AudioBuffer {
        let len = (sample_rate as f32 * seconds) as usize;
        let samples = (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect();
        AudioBuffer::from_samples(samples, 1, sample_rate)
    }

    #[test]
    fn test_output_dimension() {
        let extractor = WaveformStatsExtractor::new(WaveformStatsConfig::default()).unwrap();
        let vector = extractor.extract(&sine(440.0, 22050, 1.0)).unwrap();
        assert_eq!(vector.dim(), 17);
    }

    #[test]
    fn test_silence_statistics() {
        let extractor = WaveformStatsExtractor::new(WaveformStatsConfig::default()).unwrap();
        let audio = AudioBuffer::from_samples(vec![0.0; 22050], 1, 22050);
        let values = extractor.extract_raw(&audio).unwrap();
        assert!(values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sine_descriptors() {
        let extractor = WaveformStatsExtractor::new(WaveformStatsConfig::default()).unwrap();
        let values = extractor.extract_raw(&sine(440.0, 22050, 1.0)).unwrap();

        // mean near zero, rms near amplitude / sqrt(2)
        assert!(values[0].abs() < 0.01);
        assert!((values[2] - 0.5 / 2.0f32.sqrt()).abs() < 0.01);
        // 440 Hz crosses zero 880 times per second
        assert!((values[3] - 880.0 / 22050.0).abs() < 0.005);
    }

    #[test]
    fn test_higher_tone_higher_centroid() {
        let extractor = WaveformStatsExtractor::new(WaveformStatsConfig::default()).unwrap();
        let low = extractor.extract_raw(&sine(220.0, 22050, 1.0)).unwrap();
        let high = extractor.extract_raw(&sine(4400.0, 22050, 1.0)).unwrap();
        assert!(high[5] > low[5]);
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = vec![0.0, 1.0, 2.0, 3.0];
        assert_eq!(WaveformStatsExtractor::percentile(&sorted, 0.5), 1.5);
        assert_eq!(WaveformStatsExtractor::percentile(&sorted, 0.0), 0.0);
        assert_eq!(WaveformStatsExtractor::percentile(&sorted, 1.0), 3.0);
    }
}
