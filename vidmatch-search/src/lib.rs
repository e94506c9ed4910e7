//! Similarity scoring and search for feature vectors.
//!
//! [`compare`] scores two vectors directly and fails loudly on dimension
//! mismatches; [`SimilarityIndex`] scans many stored candidates and degrades
//! mismatches to a 0.0 score instead, so one bad record cannot abort a bulk
//! search.

pub mod engine;
pub mod similarity;

pub use engine::{SearchHit, SimilarityIndex};
pub use similarity::{compare, cosine};
