//! Feature vectors and their serialization contract.
//!
//! A [`FeatureVector`] is one extractor's output for one input: a
//! fixed-dimension numeric vector plus a metadata map (type tag, source
//! sample rate, frame/peak counts). Vectors are immutable by convention,
//! created per extraction call and consumed immediately by fusion, comparison
//! or storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A scalar metadata value attached to a feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value (counts, sample rates).
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value (type tags, identifiers).
    Str(String),
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<usize> for MetaValue {
    fn from(v: usize) -> Self {
        MetaValue::Int(v as i64)
    }
}

impl From<u32> for MetaValue {
    fn from(v: u32) -> Self {
        MetaValue::Int(v as i64)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Str(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Str(v)
    }
}

/// Metadata map type used by feature vectors.
pub type Metadata = BTreeMap<String, MetaValue>;

/// A fixed-dimension feature vector with provenance metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f32>,
    metadata: Metadata,
}

/// Serializable record form of a feature vector.
///
/// This is the storage contract: `{vector: [...], metadata: {...}}`. It must
/// round-trip exactly (same dimension, same metadata keys and values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Vector values.
    pub vector: Vec<f32>,
    /// Metadata mapping.
    pub metadata: Metadata,
}

impl FeatureVector {
    /// Create a vector with empty metadata.
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            metadata: Metadata::new(),
        }
    }

    /// Create a vector with metadata.
    pub fn with_metadata(values: Vec<f32>, metadata: Metadata) -> Self {
        Self { values, metadata }
    }

    /// Vector dimension.
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Vector values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Consume into the raw values.
    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    /// Metadata mapping.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Insert a metadata entry, returning self for chaining at construction.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// L2 norm of the vector.
    pub fn l2_norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Rescale to unit L2 norm. The zero vector is returned unchanged.
    pub fn normalized(&self) -> FeatureVector {
        let norm = self.l2_norm();
        if norm == 0.0 {
            return self.clone();
        }
        FeatureVector {
            values: self.values.iter().map(|v| v / norm).collect(),
            metadata: self.metadata.clone(),
        }
    }

    /// Fail unless `other` has the same dimension.
    pub fn check_same_dim(&self, other: &FeatureVector) -> Result<()> {
        if self.dim() != other.dim() {
            return Err(Error::dimension_mismatch(self.dim(), other.dim()));
        }
        Ok(())
    }

    /// Convert to the serializable record form.
    pub fn to_record(&self) -> FeatureRecord {
        FeatureRecord {
            vector: self.values.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Rebuild from a record.
    pub fn from_record(record: FeatureRecord) -> Self {
        Self {
            values: record.vector,
            metadata: record.metadata,
        }
    }
}

/// Fit a raw feature vector to a fixed dimension: truncate when longer,
/// zero-pad at the end when shorter.
pub fn fit_dimension(mut values: Vec<f32>, dim: usize) -> Vec<f32> {
    if values.len() > dim {
        values.truncate(dim);
    } else if values.len() < dim {
        values.resize(dim, 0.0);
    }
    values
}
