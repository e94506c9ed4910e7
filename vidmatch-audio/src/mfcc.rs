//! MFCC timbre profiles.
//!
//! Mel-frequency cepstral coefficients summarize the spectral envelope of
//! the track. Per-frame coefficients are reduced to per-coefficient mean,
//! standard deviation and smoothed delta, giving a compact timbre
//! descriptor that tolerates re-encoding and small edits.

use std::sync::Arc;

use rustdct::{DctPlanner, TransformType2And3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use vidmatch_core::AudioBuffer;

use crate::dft::SimpleDft;
use crate::error::{AudioError, Result};
use crate::extractor::AudioExtractor;

/// MFCC extractor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfccConfig {
    /// Output dimensionality.
    pub dim: usize,
    /// Number of cepstral coefficients kept per frame.
    pub n_mfcc: usize,
    /// Number of mel filterbank bands.
    pub n_mels: usize,
    /// Analysis transform size.
    pub fft_size: usize,
    /// Hop between analysis frames, in samples.
    pub hop_size: usize,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            dim: 39,
            n_mfcc: 13,
            n_mels: 26,
            fft_size: 2048,
            hop_size: 512,
        }
    }
}

/// Extracts an MFCC summary vector from audio.
pub struct MfccExtractor {
    config: MfccConfig,
    dft: SimpleDft,
    dct: Arc<dyn TransformType2And3<f32>>,
}

impl MfccExtractor {
    /// Create an extractor; fails on inconsistent sizes.
    pub fn new(config: MfccConfig) -> Result<Self> {
        if config.n_mfcc == 0 || config.n_mfcc > config.n_mels {
            return Err(AudioError::InvalidInput(format!(
                "n_mfcc must be in 1..={}, got {}",
                config.n_mels, config.n_mfcc
            )));
        }
        if config.hop_size == 0 {
            return Err(AudioError::InvalidInput("hop_size must be > 0".into()));
        }
        let dft = SimpleDft::new(config.fft_size);
        let dct = DctPlanner::new().plan_dct2(config.n_mels);
        Ok(Self { config, dft, dct })
    }

    /// Hz to mel scale.
    fn hz_to_mel(hz: f32) -> f32 {
        2595.0 * (1.0 + hz / 700.0).log10()
    }

    /// Mel scale to Hz.
    fn mel_to_hz(mel: f32) -> f32 {
        700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
    }

    /// Triangular mel filterbank: `n_mels` rows over the magnitude bins.
    fn mel_filterbank(&self, sample_rate: u32) -> Vec<Vec<f32>> {
        let num_bins = self.dft.num_bins();
        let nyquist = sample_rate as f32 / 2.0;
        let mel_max = Self::hz_to_mel(nyquist);

        // n_mels + 2 evenly spaced mel points define the triangle edges.
        let points: Vec<f32> = (0..self.config.n_mels + 2)
            .map(|i| {
                let mel = mel_max * i as f32 / (self.config.n_mels + 1) as f32;
                Self::mel_to_hz(mel) / nyquist * (num_bins - 1) as f32
            })
            .collect();

        (0..self.config.n_mels)
            .map(|m| {
                let (left, center, right) = (points[m], points[m + 1], points[m + 2]);
                (0..num_bins)
                    .map(|bin| {
                        let b = bin as f32;
                        if b < left || b > right {
                            0.0
                        } else if b <= center {
                            (b - left) / (center - left).max(1e-6)
                        } else {
                            (right - b) / (right - center).max(1e-6)
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Per-frame cepstral coefficients for the whole signal.
    fn frame_coefficients(&self, audio: &AudioBuffer) -> Vec<Vec<f32>> {
        let spectrogram = self.dft.spectrogram(&audio.samples, self.config.hop_size);
        let filterbank = self.mel_filterbank(audio.sample_rate);

        spectrogram
            .iter()
            .map(|magnitudes| {
                let mut energies: Vec<f32> = filterbank
                    .iter()
                    .map(|filter| {
                        let e: f32 = filter
                            .iter()
                            .zip(magnitudes)
                            .map(|(w, m)| w * m * m)
                            .sum();
                        (e + 1e-10).ln()
                    })
                    .collect();
                self.dct.process_dct2(&mut energies);
                energies.truncate(self.config.n_mfcc);
                energies
            })
            .collect()
    }
}

impl AudioExtractor for MfccExtractor {
    fn name(&self) -> &'static str {
        "mfcc"
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

        let frames = self.frame_coefficients(audio);
        debug!(frames = frames.len(), n_mfcc = self.config.n_mfcc, "computed mfcc frames");

        let n = frames.len() as f32;
        let n_mfcc = self.config.n_mfcc;

        let mut means = vec![0.0f32; n_mfcc];
        for frame in &frames {
            for (acc, c) in means.iter_mut().zip(frame) {
                *acc += c;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut stds = vec![0.0f32; n_mfcc];
        for frame in &frames {
            for ((acc, c), mean) in stds.iter_mut().zip(frame).zip(&means) {
                let d = c - mean;
                *acc += d * d;
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
        }

        // Smoothed delta: central difference averaged over time.
        let mut deltas = vec![0.0f32; n_mfcc];
        if frames.len() > 2 {
            for t in 1..frames.len() - 1 {
                for (acc, (next, prev)) in
                    deltas.iter_mut().zip(frames[t + 1].iter().zip(&frames[t - 1]))
                {
                    *acc += (next - prev) / 2.0;
                }
            }
            let inner = (frames.len() - 2) as f32;
            for d in &mut deltas {
                *d /= inner;
            }
        }

        let mut values = means;
        values.extend(stds);
        values.extend(deltas);
        Ok(values)
    }
}
