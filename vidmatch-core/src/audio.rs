//! Audio buffer abstraction.

/// A decoded audio segment (interleaved samples).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data, interleaved across channels, in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Number of channels.
    pub channels: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create from samples.
    pub fn from_samples(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Get number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    /// Get duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.num_frames() as f64 / self.sample_rate as f64
        }
    }

    /// Extract one channel's samples.
    pub fn channel(&self, ch: usize) -> Vec<f32> {
        self.samples
            .iter()
            .skip(ch)
            .step_by(self.channels.max(1))
            .copied()
            .collect()
    }

    /// Downmix to mono by channel-averaging. A mono buffer is returned
    /// unchanged (cheap clone of the reference representation).
    pub fn to_mono(&self) -> AudioBuffer {
        if self.channels <= 1 {
            return self.clone();
        }
        let frames = self.num_frames();
        let mut mono = Vec::with_capacity(frames);
        for frame in 0..frames {
            let base = frame * self.channels;
            let sum: f32 = self.samples[base..base + self.channels].iter().sum();
            mono.push(sum / self.channels as f32);
        }
        AudioBuffer::from_samples(mono, 1, self.sample_rate)
    }
}
