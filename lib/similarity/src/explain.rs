//! Explainability for similarity results
//!
//! Output structures that show how each overall score was computed, one
//! entry per reported feature.

use crate::schema::{Feature, WeightTable};
use geosearch_core::ModelId;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One feature of one comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureComparison {
    /// Value in the query descriptor
    pub query: f64,
    /// Value in the candidate descriptor
    #[serde(rename = "match")]
    pub matched: f64,
    pub similarity: f64,
}

/// A ranked candidate with its per-feature breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResult {
    pub model_id: ModelId,
    /// Weighted overall similarity in `[0, 1]`
    pub similarity: f64,
    pub feature_comparison: BTreeMap<Feature, FeatureComparison>,
}

impl SimilarityResult {
    /// Feature with the largest weighted contribution to this result
    pub fn top_contributing_feature(&self, weights: &WeightTable) -> Option<Feature> {
        self.feature_comparison
            .iter()
            .filter(|(feature, _)| weights.get(**feature) > 0.0)
            .max_by_key(|(feature, c)| OrderedFloat(weights.get(**feature) * c.similarity))
            .map(|(feature, _)| *feature)
    }
}

/// Response structure for a similarity query
#[derive(Debug, Clone, Serialize)]
pub struct SimilarResponse {
    /// Ranked matches with explanations
    pub result: Vec<SimilarityResult>,
    pub stats: SimilarityStats,
}

impl SimilarResponse {
    pub fn new(
        result: Vec<SimilarityResult>,
        candidates_count: usize,
        weights: &WeightTable,
    ) -> Self {
        let stats = SimilarityStats::compute(&result, candidates_count, weights);
        Self { result, stats }
    }
}

/// Summary statistics for a similarity query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityStats {
    /// Number of candidates considered
    pub candidates_count: usize,
    /// Number of results returned
    pub results_count: usize,
    /// Average score of results
    pub avg_score: f64,
    /// Score of best result
    pub best_score: f64,
    /// Feature that contributed most to best result
    pub top_contributing_feature: Option<Feature>,
}

impl SimilarityStats {
    /// Compute stats from ranked results
    pub fn compute(
        results: &[SimilarityResult],
        candidates_count: usize,
        weights: &WeightTable,
    ) -> Self {
        let Some(best) = results.first() else {
            return Self {
                candidates_count,
                results_count: 0,
                avg_score: 0.0,
                best_score: 0.0,
                top_contributing_feature: None,
            };
        };

        let avg_score = results.iter().map(|r| r.similarity).sum::<f64>() / results.len() as f64;

        Self {
            candidates_count,
            results_count: results.len(),
            avg_score,
            best_score: best.similarity, // Results are sorted
            top_contributing_feature: best.top_contributing_feature(weights),
        }
    }
}
