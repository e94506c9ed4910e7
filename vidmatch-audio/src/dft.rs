//! Windowed DFT and spectrogram framing shared by the audio extractors.

use std::f32::consts::PI;

use rayon::prelude::*;

/// Smallest supported transform size.
pub const MIN_FFT_SIZE: usize = 256;
/// Largest supported transform size.
pub const MAX_FFT_SIZE: usize = 8192;

/// Simple DFT with a precomputed Hann window and twiddle table.
pub struct SimpleDft {
    size: usize,
    twiddles: Vec<(f32, f32)>,
    window: Vec<f32>,
}

impl SimpleDft {
    /// Create a new DFT processor. Sizes are clamped to the supported range.
    pub fn new(size: usize) -> Self {
        let size = size.clamp(MIN_FFT_SIZE, MAX_FFT_SIZE);

        let twiddles: Vec<(f32, f32)> = (0..size)
            .map(|k| {
                let angle = -2.0 * PI * k as f32 / size as f32;
                (angle.cos(), angle.sin())
            })
            .collect();

        let window: Vec<f32> = (0..size)
            .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f32 / (size - 1) as f32).cos()))
            .collect();

        Self {
            size,
            twiddles,
            window,
        }
    }

    /// Transform size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of magnitude bins produced per frame.
    pub fn num_bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// Magnitude spectrum of one windowed frame.
    pub fn magnitudes(&self, input: &[f32]) -> Vec<f32> {
        let n = self.size;
        let mut magnitudes = vec![0.0f32; self.num_bins()];

        for (k, magnitude) in magnitudes.iter_mut().enumerate() {
            let mut real = 0.0f32;
            let mut imag = 0.0f32;

            for (i, &sample) in input.iter().take(n).enumerate() {
                let windowed = sample * self.window[i];
                let idx = (k * i) % n;
                real += windowed * self.twiddles[idx].0;
                imag += windowed * self.twiddles[idx].1;
            }

            *magnitude = (real * real + imag * imag).sqrt();
        }

        magnitudes
    }

    /// Magnitude spectrogram: one frame every `hop_size` samples. Trailing
    /// samples that do not fill a whole frame are dropped.
    pub fn spectrogram(&self, samples: &[f32], hop_size: usize) -> Vec<Vec<f32>> {
        if samples.len() < self.size || hop_size == 0 {
            return Vec::new();
        }
        let num_frames = (samples.len() - self.size) / hop_size + 1;
        (0..num_frames)
            .into_par_iter()
            .map(|frame| {
                let start = frame * hop_size;
                self.magnitudes(&samples[start..start + self.size])
            })
            .collect()
    }
}
