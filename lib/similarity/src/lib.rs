//! # GeoSearch Similarity
//!
//! Weighted, explainable similarity between shape descriptors.
//!
//! ## Features
//!
//! - **Weight Table**: Declarative table defining which features matter and how much
//! - **Per-feature Similarity**: Relative distance for scalars, overlap for histograms
//! - **Ranking**: Threshold, limit and deterministic tie-breaking
//! - **Explainability**: Per-feature query/match/similarity breakdown
//!
//! ## Example
//!
//! ```rust
//! use geosearch_core::{build_descriptor, primitives, DescriptorOptions, ModelId};
//! use geosearch_similarity::{RankOptions, Ranker};
//!
//! let options = DescriptorOptions::default();
//! let cube = build_descriptor(&primitives::unit_cube(), &options).unwrap();
//! let sphere = build_descriptor(&primitives::icosphere(0.62, 2), &options).unwrap();
//!
//! let ids = [ModelId::from("cube"), ModelId::from("sphere")];
//! let ranker = Ranker::default();
//! let results = ranker.rank(
//!     &cube,
//!     [(&ids[0], &cube), (&ids[1], &sphere)],
//!     &RankOptions { threshold: 0.0, ..Default::default() },
//! );
//!
//! assert_eq!(results[0].model_id, ids[0]);
//! assert_eq!(results[0].similarity, 1.0);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ WeightTable │────>│   Ranker    │<────│ Descriptors │
//! │ (features)  │     │ (candidates)│     │  (library)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌─────────────┐
//!                     │  Explain    │
//!                     │  (results)  │
//!                     └─────────────┘
//! ```

pub mod distance;
pub mod explain;
pub mod rank;
pub mod schema;

pub use distance::{feature_similarity, histogram_similarity, scalar_similarity, vector_similarity};
pub use explain::{FeatureComparison, SimilarResponse, SimilarityResult, SimilarityStats};
pub use rank::{RankOptions, Ranker, DEFAULT_LIMIT, DEFAULT_THRESHOLD};
pub use schema::{Feature, SchemaError, WeightTable};
