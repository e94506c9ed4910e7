//! The audio extractor trait.

use vidmatch_core::{fit_dimension, AudioBuffer, FeatureVector};

use crate::error::{AudioError, Result};

/// A feature extractor operating on PCM audio.
///
/// Implementors compute over a mono signal; multi-channel input is downmixed
/// before extraction. Output vectors always have exactly
/// [`dim`](AudioExtractor::dim) values.
pub trait AudioExtractor: Send + Sync {
    /// Stable extractor name, used as a feature-map key.
    fn name(&self) -> &'static str;

    /// Output dimensionality.
    fn dim(&self) -> usize;

    /// Compute raw feature values from a mono buffer.
    fn extract_raw(&self, audio: &AudioBuffer) -> Result<Vec<f32>>;

    /// Extract a [`FeatureVector`] with provenance metadata.
    fn extract(&self, audio: &AudioBuffer) -> Result<FeatureVector> {
        if audio.samples.is_empty() {
            return Err(AudioError::InvalidInput("empty audio buffer".into()));
        }

        let mono;
        let input = if audio.channels > 1 {
            mono = audio.to_mono();
            &mono
        } else {
            audio
        };

        let values = self.extract_raw(input)?;
        Ok(FeatureVector::new(fit_dimension(values, self.dim()))
            .with_meta("extractor", self.name())
            .with_meta("sample_rate", input.sample_rate)
            .with_meta("duration", input.duration()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports the mean absolute amplitude.
    struct MeanAmp;

    impl AudioExtractor for MeanAmp {
        fn name(&self) -> &'static str {
            "mean_amp"
        }

        fn dim(&self) -> usize {
            3
        }

        fn extract_raw(&self, audio: &AudioBuffer) -> Result<Vec<f32>> {
            let mean =
                audio.samples.iter().map(|s| s.abs()).sum::<f32>() / audio.samples.len() as f32;
            Ok(vec![mean])
        }
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let audio = AudioBuffer::from_samples(vec![], 1, 22050);
        assert!(matches!(
            MeanAmp.extract(&audio),
            Err(AudioError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_output_padded_to_dim() {
        let audio = AudioBuffer::from_samples(vec![0.5; 100], 1, 22050);
        let vector = MeanAmp.extract(&audio).unwrap();
        assert_eq!(vector.dim(), 3);
        assert!((vector.values()[0] - 0.5).abs() < 1e-6);
        assert_eq!(vector.values()[1], 0.0);
    }

    #[test]
    fn test_stereo_downmixed() {
        // Opposite-phase stereo cancels to silence when downmixed.
        let audio = AudioBuffer::from_samples(vec![0.5, -0.5, 0.5, -0.5], 2, 22050);
        let vector = MeanAmp.extract(&audio).unwrap();
        assert!(vector.values()[0].abs() < 1e-6);
    }
}
