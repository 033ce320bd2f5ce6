//! # GeoSearch
//!
//! Content-based 3D shape retrieval: fingerprint triangle meshes with
//! geometric descriptors and rank a model library by explainable,
//! weighted similarity.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! geosearch describe chair.json > chair.descriptor.json
//! geosearch index --out library.json models/*.json
//! geosearch search --library library.json --query chair.json --threshold 0.8
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use geosearch::prelude::*;
//! use geosearch::primitives;
//!
//! let index = DescriptorIndex::new();
//! let options = DescriptorOptions::default();
//! index.insert_mesh(ModelId::from("cube"), &primitives::unit_cube(), &options).unwrap();
//! index.insert_mesh(ModelId::from("ball"), &primitives::icosphere(0.62, 2), &options).unwrap();
//!
//! let query = build_descriptor(&primitives::cuboid(1.0, 1.0, 1.1), &options).unwrap();
//! let results = index.rank(&query, &Ranker::default(), &RankOptions::default());
//! assert_eq!(results[0].model_id, ModelId::from("cube"));
//! ```
//!
//! ## Crate Structure
//!
//! GeoSearch is composed of several crates:
//!
//! - [`geosearch-core`](https://docs.rs/geosearch-core) - Mesh metrics, D2 sampling, descriptors
//! - [`geosearch-similarity`](https://docs.rs/geosearch-similarity) - Weight tables, ranking,
//!   explanations
//! - [`geosearch-storage`](https://docs.rs/geosearch-storage) - Descriptor index and JSON snapshots

// Re-export core types
pub use geosearch_core::{
    build_descriptor, build_descriptor_with_cancel, build_descriptors, primitives, BoundingBox,
    CancelToken, Descriptor, DescriptorOptions, Error, Mesh, ModelId, Result, SamplerOptions,
    ShapeDistribution, SCHEMA_VERSION,
};

// Re-export similarity
pub use geosearch_similarity::{
    Feature, FeatureComparison, RankOptions, Ranker, SchemaError, SimilarResponse,
    SimilarityResult, SimilarityStats, WeightTable,
};

// Re-export storage
pub use geosearch_storage::{DescriptorIndex, IndexStats};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        build_descriptor, CancelToken, Descriptor, DescriptorIndex, DescriptorOptions, Error,
        Feature, Mesh, ModelId, RankOptions, Ranker, Result, SamplerOptions, SimilarityResult,
        WeightTable,
    };
}
