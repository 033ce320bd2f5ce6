//! Ranker for descriptor similarity
//!
//! Scores every candidate against a query descriptor with the configured
//! weight table and returns the best matches with per-feature explanations.

use crate::distance::{feature_similarity, vector_similarity};
use crate::explain::{FeatureComparison, SimilarityResult};
use crate::schema::{Feature, SchemaError, WeightTable};
use geosearch_core::{CancelToken, Descriptor, ModelId, Result};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const DEFAULT_THRESHOLD: f64 = 0.7;
pub const DEFAULT_LIMIT: usize = 10;

/// Per-query ranking options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankOptions {
    /// Results scoring below this are dropped
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Keep only the N candidates closest in comparison-vector space before
    /// full scoring
    #[serde(default)]
    pub prefilter: Option<usize>,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for RankOptions {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD, limit: DEFAULT_LIMIT, prefilter: None }
    }
}

/// Ranker that computes weighted descriptor similarity
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    weights: WeightTable,
}

impl Ranker {
    /// Create a ranker; the table is validated and normalized.
    pub fn new(mut weights: WeightTable) -> std::result::Result<Self, SchemaError> {
        weights.validate_and_normalize()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Rank `candidates` by similarity to `query`.
    ///
    /// Results are sorted by descending similarity, ties broken by ascending
    /// id. Candidates with a different descriptor schema version are skipped.
    pub fn rank<'a, I>(
        &self,
        query: &Descriptor,
        candidates: I,
        options: &RankOptions,
    ) -> Vec<SimilarityResult>
    where
        I: IntoIterator<Item = (&'a ModelId, &'a Descriptor)>,
    {
        // A fresh token is never cancelled.
        self.rank_with_cancel(query, candidates, options, &CancelToken::new())
            .unwrap_or_default()
    }

    /// Like [`rank`](Self::rank), checking `cancel` before every candidate.
    pub fn rank_with_cancel<'a, I>(
        &self,
        query: &Descriptor,
        candidates: I,
        options: &RankOptions,
        cancel: &CancelToken,
    ) -> Result<Vec<SimilarityResult>>
    where
        I: IntoIterator<Item = (&'a ModelId, &'a Descriptor)>,
    {
        if query.is_empty() || options.limit == 0 {
            return Ok(Vec::new());
        }

        let mut pool: Vec<(&ModelId, &Descriptor)> = candidates
            .into_iter()
            .filter(|(id, candidate)| {
                let compatible = candidate.schema_version == query.schema_version;
                if !compatible {
                    debug!(
                        model_id = %id,
                        version = candidate.schema_version,
                        expected = query.schema_version,
                        "skipping candidate with foreign schema version"
                    );
                }
                compatible
            })
            .collect();

        if let Some(keep) = options.prefilter {
            if keep < pool.len() {
                pool.sort_by_cached_key(|(id, candidate)| {
                    let score =
                        vector_similarity(&query.normalized_vector, &candidate.normalized_vector);
                    (Reverse(OrderedFloat(score)), (*id).clone())
                });
                pool.truncate(keep);
            }
        }

        let features = self.weights.reported_features();
        let mut results = Vec::new();
        for (id, candidate) in pool {
            cancel.check()?;
            let result = self.score(id, query, candidate, &features);
            if result.similarity >= options.threshold {
                results.push(result);
            }
        }

        results.sort_by(|a, b| {
            OrderedFloat(b.similarity)
                .cmp(&OrderedFloat(a.similarity))
                .then_with(|| a.model_id.cmp(&b.model_id))
        });
        results.truncate(options.limit);

        Ok(results)
    }

    /// Weighted similarity of one candidate with its breakdown
    pub fn compare(
        &self,
        id: &ModelId,
        query: &Descriptor,
        candidate: &Descriptor,
    ) -> SimilarityResult {
        self.score(id, query, candidate, &self.weights.reported_features())
    }

    fn score(
        &self,
        id: &ModelId,
        query: &Descriptor,
        candidate: &Descriptor,
        features: &[Feature],
    ) -> SimilarityResult {
        let mut feature_comparison = BTreeMap::new();
        let mut weighted = 0.0;
        let mut total = 0.0;

        for &feature in features {
            let similarity = feature_similarity(feature, query, candidate);
            let weight = self.weights.get(feature);
            weighted += weight * similarity;
            total += weight;
            feature_comparison.insert(
                feature,
                FeatureComparison {
                    query: feature.value(query),
                    matched: feature.value(candidate),
                    similarity,
                },
            );
        }

        let similarity = if total > 0.0 { (weighted / total).clamp(0.0, 1.0) } else { 0.0 };
        SimilarityResult { model_id: id.clone(), similarity, feature_comparison }
    }

    /// Create a new ranker with custom weight overrides
    ///
    /// Overrides replace table weights for the given features and add
    /// features the table did not weight. The result is re-normalized; if
    /// that fails the current weights are kept.
    pub fn with_weights(&self, overrides: &BTreeMap<Feature, f64>) -> Ranker {
        let mut weights = self.weights.clone();
        for (&feature, &weight) in overrides {
            weights.weights.insert(feature, weight.max(0.0));
        }

        match weights.validate_and_normalize() {
            Ok(()) => Ranker { weights },
            Err(e) => {
                warn!(error = %e, "ignoring weight overrides");
                self.clone()
            }
        }
    }
}
