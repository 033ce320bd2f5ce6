//! # GeoSearch Core
//!
//! Core library for the GeoSearch shape similarity engine.
//!
//! This crate turns a triangle mesh into a [`Descriptor`], a fixed-shape
//! geometric fingerprint:
//!
//! - [`geometry`] - Bounding box, surface area, volume and PCA
//! - [`topology`] - Euler characteristic, genus and manifold check
//! - [`curvature`] - Discrete mean and Gaussian curvature
//! - [`sampler`] - D2 shape distribution histogram
//! - [`descriptor`] - Everything above assembled into one record
//!
//! ## Example
//!
//! ```rust
//! use geosearch_core::{build_descriptor, primitives, DescriptorOptions};
//!
//! let cube = primitives::unit_cube();
//! let descriptor = build_descriptor(&cube, &DescriptorOptions::default()).unwrap();
//!
//! assert_eq!(descriptor.face_count, 12);
//! assert!((descriptor.volume - 1.0).abs() < 1e-9);
//! assert!(descriptor.is_manifold);
//! ```

pub mod cancel;
pub mod curvature;
pub mod descriptor;
pub mod eigen;
pub mod error;
pub mod geometry;
pub mod id;
pub mod mesh;
pub mod primitives;
pub mod sampler;
pub mod topology;

pub use cancel::CancelToken;
pub use curvature::CurvatureStats;
pub use descriptor::{
    build_descriptor, build_descriptor_with_cancel, build_descriptors, Descriptor,
    DescriptorOptions, SCHEMA_VERSION,
};
pub use error::{Error, Result};
pub use geometry::{BoundingBox, Dimensions, Orientation, PrincipalAxes};
pub use id::ModelId;
pub use mesh::{Mesh, Triangle};
pub use sampler::{SamplerOptions, ShapeDistribution};
pub use topology::Adjacency;
