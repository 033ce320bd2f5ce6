//! Discrete curvature estimation
//!
//! Mean curvature comes from the cotangent Laplacian, Gaussian curvature from
//! the angle deficit. Both are normalized by the mixed Voronoi area of each
//! vertex, here one third of the area of its non-degenerate incident faces.

use crate::topology::Adjacency;
use crate::Mesh;
use nalgebra::{Point3, Vector3};
use std::f64::consts::TAU;

/// Mesh-level curvature summary
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CurvatureStats {
    /// Area-weighted mean of per-vertex mean curvature
    pub mean: f64,
    /// Area-weighted mean of per-vertex Gaussian curvature
    pub gaussian: f64,
    /// Population variance of per-vertex mean curvature
    pub variance: f64,
}

/// Curvature at a single vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexCurvature {
    pub mean: f64,
    pub gaussian: f64,
    pub area: f64,
}

/// Per-vertex curvature; `None` for vertices without non-degenerate faces.
pub fn vertex_curvature(
    mesh: &Mesh,
    adjacency: &Adjacency,
    vertex: u32,
) -> Option<VertexCurvature> {
    let pv = mesh.point(vertex);
    let mut area = 0.0;
    let mut angle_sum = 0.0;
    let mut laplacian = Vector3::zeros();

    for &f in adjacency.faces_of(vertex) {
        let triangle = mesh.triangle(f as usize);
        if triangle.is_degenerate() {
            continue;
        }
        let face = mesh.faces[f as usize];
        let corner = match face.iter().position(|&i| i == vertex) {
            Some(c) => c,
            None => continue,
        };
        let pj = mesh.point(face[(corner + 1) % 3]);
        let pk = mesh.point(face[(corner + 2) % 3]);

        area += triangle.area() / 3.0;
        angle_sum += triangle.angles()[corner];

        // Edge (v, j) is opposite corner k and vice versa.
        laplacian += (pj - pv) * (0.5 * cotangent(pk, pv, pj));
        laplacian += (pk - pv) * (0.5 * cotangent(pj, pv, pk));
    }

    if area <= 0.0 {
        return None;
    }
    Some(VertexCurvature {
        mean: laplacian.norm() / (2.0 * area),
        gaussian: (TAU - angle_sum) / area,
        area,
    })
}

/// Aggregate curvature over every vertex that carries area.
pub fn curvature(mesh: &Mesh, adjacency: &Adjacency) -> CurvatureStats {
    let samples: Vec<VertexCurvature> = (0..mesh.vertex_count() as u32)
        .filter_map(|v| vertex_curvature(mesh, adjacency, v))
        .collect();

    if samples.is_empty() {
        return CurvatureStats::default();
    }

    let total_area: f64 = samples.iter().map(|s| s.area).sum();
    let mean = samples.iter().map(|s| s.mean * s.area).sum::<f64>() / total_area;
    let gaussian = samples.iter().map(|s| s.gaussian * s.area).sum::<f64>() / total_area;

    let n = samples.len() as f64;
    let unweighted = samples.iter().map(|s| s.mean).sum::<f64>() / n;
    let variance = samples.iter().map(|s| (s.mean - unweighted).powi(2)).sum::<f64>() / n;

    CurvatureStats { mean, gaussian, variance }
}

/// Cotangent of the angle at `apex` in the triangle `(apex, p, q)`.
#[inline]
fn cotangent(apex: Point3<f64>, p: Point3<f64>, q: Point3<f64>) -> f64 {
    let u = p - apex;
    let v = q - apex;
    let sin = u.cross(&v).norm();
    if sin == 0.0 {
        0.0
    } else {
        u.dot(&v) / sin
    }
}
