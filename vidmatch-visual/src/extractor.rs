//! The visual extractor trait and its input model.

use rayon::prelude::*;

use vidmatch_core::{fit_dimension, FeatureVector, Frame};

use crate::error::{Result, VisualError};

/// Input accepted by a visual extractor.
///
/// A still image and a single video frame carry the same pixel data; the
/// distinction is kept so output metadata records where the features came
/// from.
#[derive(Debug, Clone, Copy)]
pub enum VisualInput<'a> {
    /// A single video frame.
    Frame(&'a Frame),
    /// An ordered frame sequence from one video.
    Frames(&'a [Frame]),
    /// A decoded still image.
    Image(&'a Frame),
}

impl VisualInput<'_> {
    /// Provenance label recorded in output metadata.
    pub fn source(&self) -> &'static str {
        match self {
            VisualInput::Frame(_) => "frame",
            VisualInput::Frames(_) => "video",
            VisualInput::Image(_) => "image",
        }
    }
}

/// A feature extractor operating on visual input.
///
/// Implementors define per-frame extraction; sequence handling defaults to
/// extracting every frame in parallel and aggregating element-wise. Output
/// vectors always have exactly [`dim`](VisualExtractor::dim) values.
pub trait VisualExtractor: Send + Sync {
    /// Stable extractor name, used as a feature-map key.
    fn name(&self) -> &'static str;

    /// Output dimensionality.
    fn dim(&self) -> usize;

    /// Extract features from a single frame.
    fn extract_frame(&self, frame: &Frame) -> Result<Vec<f32>>;

    /// Combine per-frame vectors into one sequence-level vector.
    ///
    /// The default is the element-wise mean.
    fn aggregate(&self, per_frame: &[Vec<f32>]) -> Result<Vec<f32>> {
        if per_frame.is_empty() {
            return Err(VisualError::InvalidInput("no frames to aggregate".into()));
        }
        let dim = per_frame[0].len();
        let mut mean = vec![0.0f32; dim];
        for vec in per_frame {
            for (acc, v) in mean.iter_mut().zip(vec) {
                *acc += v;
            }
        }
        let n = per_frame.len() as f32;
        for v in &mut mean {
            *v /= n;
        }
        Ok(mean)
    }

    /// Extract one vector describing a whole frame sequence.
    fn extract_sequence(&self, frames: &[Frame]) -> Result<Vec<f32>> {
        if frames.is_empty() {
            return Err(VisualError::InvalidInput("empty frame sequence".into()));
        }
        let per_frame: Vec<Vec<f32>> = frames
            .par_iter()
            .map(|frame| self.extract_frame(frame))
            .collect::<Result<_>>()?;
        self.aggregate(&per_frame)
    }

    /// Extract a [`FeatureVector`] with provenance metadata.
    fn extract(&self, input: VisualInput<'_>) -> Result<FeatureVector> {
        let values = match input {
            VisualInput::Frame(frame) | VisualInput::Image(frame) => self.extract_frame(frame)?,
            VisualInput::Frames(frames) => self.extract_sequence(frames)?,
        };

        let mut vector = FeatureVector::new(fit_dimension(values, self.dim()))
            .with_meta("extractor", self.name())
            .with_meta("source", input.source());
        if let VisualInput::Frames(frames) = input {
            vector = vector.with_meta("frame_count", frames.len());
        }
        Ok(vector)
    }
}
