//! In-memory similarity search over stored feature vectors.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use vidmatch_core::{Error, FeatureVector, Result};

use crate::similarity::cosine;

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Identifier of the stored candidate.
    pub id: String,
    /// Similarity score in [0, 1].
    pub score: f32,
}

/// A flat in-memory index of `(id, vector)` candidates.
///
/// Bulk search deliberately differs from [`compare`](crate::compare) on
/// dimension mismatches: a single bad candidate must not abort scanning a
/// large index, so it is logged and scored 0.0 instead.
#[derive(Default)]
pub struct SimilarityIndex {
    entries: Vec<(String, FeatureVector)>,
}

impl SimilarityIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored candidates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no candidates.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a candidate vector under an identifier.
    pub fn insert(&mut self, id: impl Into<String>, vector: FeatureVector) -> Result<()> {
        if vector.dim() == 0 {
            return Err(Error::invalid_input("cannot index an empty vector"));
        }
        self.entries.push((id.into(), vector));
        Ok(())
    }

    /// Rank all candidates against the query, filter by `min_score` and
    /// return at most `limit` hits, best first.
    pub fn search(&self, query: &FeatureVector, min_score: f32, limit: usize) -> Result<Vec<SearchHit>> {
        if query.dim() == 0 {
            return Err(Error::invalid_input("cannot search with an empty query"));
        }

        let query = query.normalized();
        let mut hits: Vec<SearchHit> = self
            .entries
            .par_iter()
            .map(|(id, candidate)| {
                let score = if candidate.dim() != query.dim() {
                    warn!(
                        id = id.as_str(),
                        candidate_dim = candidate.dim(),
                        query_dim = query.dim(),
                        "dimension mismatch, scoring 0.0"
                    );
                    0.0
                } else {
                    (cosine(&query, candidate) + 1.0) / 2.0
                };
                SearchHit {
                    id: id.clone(),
                    score,
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.retain(|hit| hit.score >= min_score);
        hits.truncate(limit);

        debug!(candidates = self.entries.len(), hits = hits.len(), "search complete");
        Ok(hits)
    }
}
