//! Global geometric measures of a mesh
//!
//! Every function here is pure and O(V) or O(F). Degenerate triangles add
//! nothing to the sums; malformed input is rejected by [`Mesh::validate`]
//! before any of these run.

use crate::eigen::symmetric_eigenvalues;
use crate::{Error, Mesh, Result};
use chull::ConvexHullWrapper;
use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Multiplier applied to `sqrt(eigenvalue)` so that principal components
/// read as the +/- one sigma extent along each axis.
pub const PRINCIPAL_COMPONENT_SCALE: f64 = 2.0;

/// Convexity reported for surfaces that do not enclose a volume.
pub const OPEN_SURFACE_CONVEXITY: f64 = 0.5;

/// Extent of a box along x, y and z
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub center: [f64; 3],
    pub dimensions: Dimensions,
    pub diagonal: f64,
}

impl BoundingBox {
    fn from_corners(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        let extent = max - min;
        let center = (min + max) * 0.5;
        Self {
            min: [min.x, min.y, min.z],
            max: [max.x, max.y, max.z],
            center: [center.x, center.y, center.z],
            dimensions: Dimensions { width: extent.x, height: extent.y, depth: extent.z },
            diagonal: extent.norm(),
        }
    }
}

/// Which way the faces of a closed mesh point, read off the signed volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Outward,
    Inward,
    Flat,
}

impl Orientation {
    pub fn from_signed_volume(signed: f64) -> Self {
        if signed > 0.0 {
            Orientation::Outward
        } else if signed < 0.0 {
            Orientation::Inward
        } else {
            Orientation::Flat
        }
    }
}

/// Eigen-decomposition summary of the vertex covariance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalAxes {
    /// Covariance eigenvalues, descending, never negative
    pub eigenvalues: [f64; 3],
    /// `sqrt(eigenvalue) * PRINCIPAL_COMPONENT_SCALE`
    pub components: [f64; 3],
}

pub fn bounding_box(mesh: &Mesh) -> Result<BoundingBox> {
    let mut points = mesh.vertices.iter().map(|v| Vector3::new(v[0], v[1], v[2]));
    let first = points.next().ok_or(Error::EmptyMesh)?;
    let (min, max) = points.fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p)));
    Ok(BoundingBox::from_corners(min, max))
}

pub fn surface_area(mesh: &Mesh) -> f64 {
    mesh.triangles().map(|t| t.area()).sum()
}

/// Sum of signed tetrahedra spanned by each face and the origin.
///
/// Positive for a closed mesh with outward-facing (counter-clockwise) faces.
pub fn signed_volume(mesh: &Mesh) -> f64 {
    mesh.triangles()
        .map(|t| t.a.coords.dot(&t.b.coords.cross(&t.c.coords)))
        .sum::<f64>()
        / 6.0
}

/// Enclosed volume, independent of face orientation
pub fn volume(mesh: &Mesh) -> f64 {
    signed_volume(mesh).abs()
}

/// Twice the largest distance from the vertex centroid to a vertex.
///
/// Every surface point lies within this distance of the centroid, so no pair
/// of them is further apart. Unlike the bounding-box diagonal it does not
/// change when the mesh is rotated.
pub fn bounding_diameter(mesh: &Mesh) -> f64 {
    let centroid = mesh.centroid();
    let radius = mesh
        .vertices
        .iter()
        .map(|v| (Point3::new(v[0], v[1], v[2]) - centroid).norm())
        .fold(0.0, f64::max);
    2.0 * radius
}

/// Volume of the convex hull of the vertices.
///
/// `None` when no hull exists: fewer than four vertices, or all of them coplanar.
pub fn convex_hull_volume(mesh: &Mesh) -> Option<f64> {
    let points: Vec<Vec<f64>> = mesh.vertices.iter().map(|v| v.to_vec()).collect();
    let hull = ConvexHullWrapper::try_new(&points, None).ok()?;
    let (corners, indices) = hull.vertices_indices();
    let corner = |i: usize| Vector3::new(corners[i][0], corners[i][1], corners[i][2]);

    let apex = corner(*indices.first()?);
    let volume = indices
        .chunks_exact(3)
        .map(|f| {
            let (a, b, c) = (corner(f[0]) - apex, corner(f[1]) - apex, corner(f[2]) - apex);
            a.dot(&b.cross(&c))
        })
        .sum::<f64>()
        / 6.0;
    Some(volume.abs())
}

/// Enclosed volume over convex hull volume, in `[0, 1]`; 1 for convex shapes.
///
/// `closed` should be false for surfaces with holes, which get
/// [`OPEN_SURFACE_CONVEXITY`]. A closed surface without a hull is flat and
/// counts as convex.
pub fn convexity(mesh: &Mesh, volume: f64, closed: bool) -> f64 {
    if !closed {
        return OPEN_SURFACE_CONVEXITY;
    }
    match convex_hull_volume(mesh) {
        Some(hull) if hull > 0.0 => (volume / hull).clamp(0.0, 1.0),
        _ => 1.0,
    }
}

/// Principal component analysis of vertex positions about their centroid.
pub fn pca(mesh: &Mesh) -> PrincipalAxes {
    let centroid: Point3<f64> = mesh.centroid();
    let n = mesh.vertex_count().max(1) as f64;

    let covariance = mesh
        .vertices
        .iter()
        .map(|v| Vector3::new(v[0], v[1], v[2]) - centroid.coords)
        .fold(Matrix3::zeros(), |acc, d| acc + d * d.transpose())
        / n;

    let eigenvalues = symmetric_eigenvalues(&covariance).map(|l| l.max(0.0));
    let components = eigenvalues.map(|l| l.sqrt() * PRINCIPAL_COMPONENT_SCALE);
    PrincipalAxes { eigenvalues, components }
}
