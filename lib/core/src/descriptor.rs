//! Shape descriptor
//!
//! A [`Descriptor`] is the fixed-shape fingerprint of one mesh. It is built
//! once, never mutated, and serialized as a plain camelCase JSON record.
//!
//! ## Comparison vector
//!
//! `normalizedVector` caches a dense encoding for vector-space prefiltering.
//! It is derived from the authoritative fields and then scaled to unit length:
//!
//! | slot | value |
//! |------|-------|
//! | 0 | `ln(1 + surfaceArea)` |
//! | 1 | `ln(1 + volume)` |
//! | 2 | `sphericity` |
//! | 3 | `1 / compactness` |
//! | 4 | `aspectRatio1` |
//! | 5 | `aspectRatio2` |
//! | 6 | `1 / elongation` |
//! | 7 | `tanh(meanCurvature * diagonal)` |
//! | 8 | `tanh(gaussianCurvature * diagonal^2)` |
//! | 9 | `isManifold` as 0 or 1 |
//! | 10 | `genus / (1 + genus)` |
//! | 11 | `shapeDistribution.mean / diagonal` |
//! | 12 | `shapeDistribution.stdDev / diagonal` |
//! | 13 | `convexity` |
//! | 14.. | `shapeDistribution.histogram` |

use crate::cancel::CancelToken;
use crate::curvature::curvature;
use crate::geometry::{self, BoundingBox, Orientation};
use crate::sampler::{sample_with_cancel, SamplerOptions, ShapeDistribution};
use crate::topology::{self, Adjacency};
use crate::{Mesh, ModelId, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Bumped whenever a field is added or its meaning changes.
pub const SCHEMA_VERSION: u32 = 2;

/// Stand-in compactness for shapes that enclose no volume.
pub const COMPACTNESS_SENTINEL: f64 = 1.0e6;

/// Volume below `VOLUME_EPSILON * diagonal^3` counts as zero.
const VOLUME_EPSILON: f64 = 1e-9;

/// Principal magnitudes are floored at this fraction of the largest one.
const PRINCIPAL_FLOOR: f64 = 1e-9;

/// Geometric fingerprint of a triangle mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Required; descriptors without it are of unknown vintage
    pub schema_version: u32,
    pub vertex_count: usize,
    pub face_count: usize,
    pub surface_area: f64,
    pub volume: f64,
    pub bounding_box: BoundingBox,
    pub sphericity: f64,
    pub compactness: f64,
    pub aspect_ratio1: f64,
    pub aspect_ratio2: f64,
    pub elongation: f64,
    /// Volume over convex hull volume; 0.5 when the surface is not closed
    pub convexity: f64,
    pub mean_curvature: f64,
    pub gaussian_curvature: f64,
    pub curvature_variance: f64,
    pub euler_characteristic: i64,
    /// Best-effort handle count; only reliable for one closed orientable shell
    pub genus: i64,
    pub is_manifold: bool,
    pub principal_components: [f64; 3],
    pub shape_distribution: ShapeDistribution,
    /// Cache for vector-space comparison, never authoritative
    pub normalized_vector: Vec<f32>,
}

impl Descriptor {
    /// A descriptor of nothing; queries with it match nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Bounding-box diagonal of the source mesh
    #[inline]
    pub fn diagonal(&self) -> f64 {
        self.bounding_box.diagonal
    }
}

/// Options controlling descriptor construction
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DescriptorOptions {
    pub sampler: SamplerOptions,
    /// Center the mesh and scale it into the unit sphere before measuring
    #[serde(default)]
    pub normalize: bool,
}

impl DescriptorOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sampler.seed = seed;
        self
    }
}

pub fn build_descriptor(mesh: &Mesh, options: &DescriptorOptions) -> Result<Descriptor> {
    build_descriptor_with_cancel(mesh, options, &CancelToken::new())
}

/// Build a descriptor; `cancel` is honoured while sampling.
pub fn build_descriptor_with_cancel(
    mesh: &Mesh,
    options: &DescriptorOptions,
    cancel: &CancelToken,
) -> Result<Descriptor> {
    mesh.validate()?;
    options.sampler.validate()?;

    let normalized;
    let mesh = if options.normalize {
        normalized = mesh.normalized();
        &normalized
    } else {
        mesh
    };

    let bounding_box = geometry::bounding_box(mesh)?;
    let surface_area = geometry::surface_area(mesh);
    let signed_volume = geometry::signed_volume(mesh);
    let volume = signed_volume.abs();
    let axes = geometry::pca(mesh);

    let adjacency = Adjacency::build(mesh);
    let curvature = curvature(mesh, &adjacency);
    let euler_characteristic = topology::euler_characteristic(mesh, &adjacency);
    let genus = topology::genus(euler_characteristic);
    let is_manifold = topology::is_manifold(mesh, &adjacency);

    let shape_distribution = sample_with_cancel(mesh, &options.sampler, cancel)?;

    if !is_manifold {
        warn!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "non-manifold mesh: genus and volume are unreliable"
        );
    }
    if is_manifold && Orientation::from_signed_volume(signed_volume) == Orientation::Inward {
        debug!(signed_volume, "faces wound inward; reporting absolute volume");
    }

    let diagonal = bounding_box.diagonal;
    let sphericity = sphericity(volume, surface_area);
    let compactness = compactness(volume, surface_area, diagonal);
    let (aspect_ratio1, aspect_ratio2, elongation) = proportions(axes.components);
    let convexity = geometry::convexity(mesh, volume, is_manifold);

    let mut descriptor = Descriptor {
        schema_version: SCHEMA_VERSION,
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        surface_area,
        volume,
        bounding_box,
        sphericity,
        compactness,
        aspect_ratio1,
        aspect_ratio2,
        elongation,
        convexity,
        mean_curvature: curvature.mean,
        gaussian_curvature: curvature.gaussian,
        curvature_variance: curvature.variance,
        euler_characteristic,
        genus,
        is_manifold,
        principal_components: axes.components,
        shape_distribution,
        normalized_vector: Vec::new(),
    };
    descriptor.normalized_vector = comparison_vector(&descriptor);

    debug!(
        vertices = descriptor.vertex_count,
        faces = descriptor.face_count,
        surface_area,
        volume,
        sphericity,
        "built shape descriptor"
    );
    Ok(descriptor)
}

/// Build descriptors for many models in parallel.
///
/// Results keep the input order; each entry fails or succeeds on its own.
pub fn build_descriptors(
    meshes: &[(ModelId, Mesh)],
    options: &DescriptorOptions,
) -> Vec<(ModelId, Result<Descriptor>)> {
    meshes
        .par_iter()
        .map(|(id, mesh)| (id.clone(), build_descriptor(mesh, options)))
        .collect()
}

/// `pi^(1/3) * (6V)^(2/3) / A`, clamped to `[0, 1]`; 1 for a sphere.
pub fn sphericity(volume: f64, surface_area: f64) -> f64 {
    if surface_area <= 0.0 {
        return 0.0;
    }
    let value = PI.cbrt() * (6.0 * volume).powf(2.0 / 3.0) / surface_area;
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// `A^3 / (36 pi V^2)`; 1 for a sphere, [`COMPACTNESS_SENTINEL`] for flat shapes.
pub fn compactness(volume: f64, surface_area: f64, diagonal: f64) -> f64 {
    if volume <= VOLUME_EPSILON * diagonal.powi(3) {
        return COMPACTNESS_SENTINEL;
    }
    let value = surface_area.powi(3) / (36.0 * PI * volume * volume);
    if value.is_finite() {
        value.min(COMPACTNESS_SENTINEL)
    } else {
        COMPACTNESS_SENTINEL
    }
}

/// `(pc1 / pc0, pc2 / pc0, pc0 / pc2)` with the minor axes floored so that
/// flat or linear shapes stay finite.
fn proportions(components: [f64; 3]) -> (f64, f64, f64) {
    let major = components[0];
    if major <= 0.0 {
        return (1.0, 1.0, 1.0);
    }
    let floor = major * PRINCIPAL_FLOOR;
    let middle = components[1].max(floor);
    let minor = components[2].max(floor);
    (
        (middle / major).min(1.0),
        (minor / major).min(1.0),
        (major / minor).max(1.0),
    )
}

fn comparison_vector(d: &Descriptor) -> Vec<f32> {
    let diagonal = d.diagonal();
    let per_length = |x: f64| if diagonal > 0.0 { x / diagonal } else { 0.0 };

    let mut values = vec![
        d.surface_area.ln_1p(),
        d.volume.ln_1p(),
        d.sphericity,
        1.0 / d.compactness,
        d.aspect_ratio1,
        d.aspect_ratio2,
        1.0 / d.elongation,
        (d.mean_curvature * diagonal).tanh(),
        (d.gaussian_curvature * diagonal * diagonal).tanh(),
        if d.is_manifold { 1.0 } else { 0.0 },
        d.genus as f64 / (1.0 + d.genus as f64),
        per_length(d.shape_distribution.mean),
        per_length(d.shape_distribution.std_dev),
        d.convexity,
    ];
    values.extend_from_slice(&d.shape_distribution.histogram);

    let norm = values.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in &mut values {
            *v /= norm;
        }
    }
    values.into_iter().map(|v| v as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;
    use crate::Error;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_cube_descriptor() {
        let d = build_descriptor(&primitives::unit_cube(), &DescriptorOptions::default()).unwrap();
        assert_eq!(d.vertex_count, 8);
        assert_eq!(d.face_count, 12);
        assert_relative_eq!(d.surface_area, 6.0, epsilon = 1e-12);
        assert_relative_eq!(d.volume, 1.0, epsilon = 1e-12);
        assert_eq!(d.euler_characteristic, 2);
        assert_eq!(d.genus, 0);
        assert!(d.is_manifold);
        assert_relative_eq!(d.aspect_ratio1, 1.0, epsilon = 1e-9);
        assert_relative_eq!(d.elongation, 1.0, epsilon = 1e-9);
        // pi^(1/3) * 6^(2/3) / 6
        assert_relative_eq!(d.sphericity, 0.805_996, epsilon = 1e-5);
        assert_relative_eq!(d.compactness, 6.0 / PI, epsilon = 1e-9);
        assert_relative_eq!(d.convexity, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sphere_is_nearly_spherical() {
        let sphere = primitives::icosphere(1.0, 3);
        let d = build_descriptor(&sphere, &DescriptorOptions::default()).unwrap();
        assert!(d.sphericity >= 0.98, "sphericity {}", d.sphericity);
        assert!(d.sphericity <= 1.0);
        assert!(d.compactness >= 1.0 && d.compactness < 1.01);
        assert_relative_eq!(d.convexity, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_torus_is_not_convex() {
        let ring = primitives::torus(2.0, 0.5, 24, 12);
        let d = build_descriptor(&ring, &DescriptorOptions::default()).unwrap();
        assert!(d.convexity > 0.0 && d.convexity < 1.0, "convexity {}", d.convexity);
    }

    #[test]
    fn test_open_shape_uses_sentinels() {
        let sheet = Mesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        let d = build_descriptor(&sheet, &DescriptorOptions::default()).unwrap();
        assert_eq!(d.volume, 0.0);
        assert_eq!(d.sphericity, 0.0);
        assert_eq!(d.compactness, COMPACTNESS_SENTINEL);
        assert!(d.aspect_ratio2 > 0.0 && d.aspect_ratio2 <= 1.0);
        assert!(d.elongation.is_finite() && d.elongation >= 1.0);
        assert!(!d.is_manifold);
        assert_eq!(d.convexity, geometry::OPEN_SURFACE_CONVEXITY);
        assert!(d.normalized_vector.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_single_point_mesh() {
        let point = Mesh::new(vec![[1.0, 2.0, 3.0]], vec![]);
        let d = build_descriptor(&point, &DescriptorOptions::default()).unwrap();
        assert_eq!(d.surface_area, 0.0);
        assert_eq!(d.diagonal(), 0.0);
        assert_eq!((d.aspect_ratio1, d.aspect_ratio2, d.elongation), (1.0, 1.0, 1.0));
        assert_eq!(d.shape_distribution.histogram[0], 1.0);
        assert!(d.normalized_vector.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_input_errors() {
        let empty = build_descriptor(&Mesh::default(), &DescriptorOptions::default());
        assert!(matches!(empty, Err(Error::EmptyMesh)));

        let bad = Mesh::new(vec![[0.0; 3]; 3], vec![[0, 1, 7]]);
        let result = build_descriptor(&bad, &DescriptorOptions::default());
        assert!(matches!(result, Err(Error::InvalidFaceIndex { index: 7, .. })));
    }

    #[test]
    fn test_build_is_deterministic() {
        let mesh = primitives::torus(2.0, 0.7, 20, 10);
        let options = DescriptorOptions::default().with_seed(42);
        let a = serde_json::to_vec(&build_descriptor(&mesh, &options).unwrap()).unwrap();
        let b = serde_json::to_vec(&build_descriptor(&mesh, &options).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_option_rescales() {
        let big =
            primitives::icosphere(50.0, 2).translated(nalgebra::Vector3::new(100.0, 0.0, 0.0));
        let options = DescriptorOptions { normalize: true, ..Default::default() };
        let d = build_descriptor(&big, &options).unwrap();
        assert!(d.bounding_box.dimensions.width <= 2.0 + 1e-9);
        assert_relative_eq!(d.bounding_box.center[0], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_comparison_vector_is_unit_length() {
        let d = build_descriptor(&primitives::unit_cube(), &DescriptorOptions::default()).unwrap();
        assert_eq!(d.normalized_vector.len(), 14 + d.shape_distribution.histogram.len());
        let norm: f32 = d.normalized_vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_json_field_names() {
        let d = build_descriptor(&primitives::unit_cube(), &DescriptorOptions::default()).unwrap();
        let json = serde_json::to_value(&d).unwrap();
        for key in [
            "schemaVersion", "vertexCount", "faceCount", "surfaceArea", "volume", "boundingBox",
            "sphericity", "compactness", "aspectRatio1", "aspectRatio2", "elongation", "convexity",
            "meanCurvature", "gaussianCurvature", "curvatureVariance", "eulerCharacteristic",
            "genus", "isManifold", "principalComponents", "shapeDistribution", "normalizedVector",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json["shapeDistribution"].get("stdDev").is_some());
        assert!(json["boundingBox"]["dimensions"].get("width").is_some());
    }

    #[test]
    fn test_schema_version_is_required() {
        let d = build_descriptor(&primitives::unit_cube(), &DescriptorOptions::default()).unwrap();
        let mut json = serde_json::to_value(&d).unwrap();
        assert_eq!(serde_json::from_value::<Descriptor>(json.clone()).unwrap(), d);

        json.as_object_mut().unwrap().remove("schemaVersion");
        assert!(serde_json::from_value::<Descriptor>(json).is_err());
    }

    #[test]
    fn test_batch_build_keeps_order_and_errors() {
        let meshes = vec![
            (ModelId::from("cube"), primitives::unit_cube()),
            (ModelId::from("empty"), Mesh::default()),
            (ModelId::from("sphere"), primitives::icosphere(1.0, 1)),
        ];
        let built = build_descriptors(&meshes, &DescriptorOptions::default());
        assert_eq!(built.len(), 3);
        assert_eq!(built[0].0, ModelId::from("cube"));
        assert!(built[0].1.is_ok());
        assert!(matches!(built[1].1, Err(Error::EmptyMesh)));
        assert!(built[2].1.is_ok());
    }
}
