//! Cosine similarity scoring.

use vidmatch_core::{Error, FeatureVector, Result};

/// Cosine similarity between unit-normalized copies of the inputs, in
/// [-1, 1]. Zero-norm vectors are left unnormalized, so their dot product
/// (and thus the cosine) is 0.
pub fn cosine(a: &FeatureVector, b: &FeatureVector) -> f32 {
    let a = a.normalized();
    let b = b.normalized();
    a.values().iter().zip(b.values()).map(|(x, y)| x * y).sum()
}

/// Compare two feature vectors, returning a score in [0, 1].
///
/// The cosine is rescaled as `(cos + 1) / 2` so 1.0 means identical
/// direction, 0.5 means orthogonal (and is the score against a zero
/// vector), 0.0 means opposite. Dimensions must match.
pub fn compare(a: &FeatureVector, b: &FeatureVector) -> Result<f32> {
    if a.dim() == 0 {
        return Err(Error::invalid_input("cannot compare empty vectors"));
    }
    a.check_same_dim(b)?;
    Ok((cosine(a, b) + 1.0) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_score_one() {
        let v = FeatureVector::new(vec![0.3, -1.2, 4.0]);
        assert!((compare(&v, &v).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_scale_invariance() {
        let a = FeatureVector::new(vec![1.0, 2.0, 3.0]);
        let b = FeatureVector::new(vec![10.0, 20.0, 30.0]);
        assert!((compare(&a, &b).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_symmetry() {
        let a = FeatureVector::new(vec![0.5, -1.0, 2.5, 0.0]);
        let b = FeatureVector::new(vec![-0.3, 0.7, 1.1, 4.0]);
        assert_eq!(compare(&a, &b).unwrap(), compare(&b, &a).unwrap());
    }

    #[test]
    fn test_opposite_vectors_score_zero() {
        let a = FeatureVector::new(vec![1.0, 0.0]);
        let b = FeatureVector::new(vec![-1.0, 0.0]);
        assert!(compare(&a, &b).unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors_score_half() {
        let a = FeatureVector::new(vec![1.0, 0.0]);
        let b = FeatureVector::new(vec![0.0, 1.0]);
        assert!((compare(&a, &b).unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_half() {
        let a = FeatureVector::new(vec![0.0; 4]);
        let b = FeatureVector::new(vec![1.0, 2.0, 3.0, 4.0]);
        assert!((compare(&a, &b).unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch_fails() {
        let a = FeatureVector::new(vec![1.0; 4]);
        let b = FeatureVector::new(vec![1.0; 5]);
        assert!(matches!(
            compare(&a, &b),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_vectors_fail() {
        let a = FeatureVector::new(vec![]);
        assert!(compare(&a, &a).is_err());
    }
}
