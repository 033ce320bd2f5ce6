//! Triangle mesh input
//!
//! Meshes arrive already parsed from an external loader. Nothing beyond the
//! 0-based indexing convention is guaranteed, so every computation starts
//! from [`Mesh::validate`].

use crate::{Error, Result};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Relative tolerance below which a triangle counts as degenerate.
///
/// Compared against `|e0 x e1|` scaled by the squared longest edge, which
/// keeps the test independent of model units.
const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Triangle mesh: vertex positions plus 0-based triangle indices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    #[inline]
    #[must_use]
    pub fn new(vertices: Vec<[f64; 3]>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Reject meshes no metric can be computed on.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.is_empty() {
            return Err(Error::EmptyMesh);
        }
        let vertex_count = self.vertices.len();
        for (face, indices) in self.faces.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(Error::InvalidFaceIndex { face, index, vertex_count });
            }
        }
        Ok(())
    }

    /// Position of a vertex. Callers must have validated the mesh.
    #[inline]
    pub fn point(&self, index: u32) -> Point3<f64> {
        let [x, y, z] = self.vertices[index as usize];
        Point3::new(x, y, z)
    }

    #[inline]
    pub fn triangle(&self, face: usize) -> Triangle {
        let [a, b, c] = self.faces[face];
        Triangle::new(self.point(a), self.point(b), self.point(c))
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.faces.len()).map(move |f| self.triangle(f))
    }

    /// Mean of all vertex positions
    pub fn centroid(&self) -> Point3<f64> {
        if self.vertices.is_empty() {
            return Point3::origin();
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + Vector3::new(v[0], v[1], v[2]));
        Point3::from(sum / self.vertices.len() as f64)
    }

    /// Copy with every vertex passed through `f`; faces are unchanged.
    #[must_use]
    pub fn map_vertices<F>(&self, f: F) -> Self
    where
        F: Fn(Point3<f64>) -> Point3<f64>,
    {
        let vertices = self
            .vertices
            .iter()
            .map(|&[x, y, z]| {
                let p = f(Point3::new(x, y, z));
                [p.x, p.y, p.z]
            })
            .collect();
        Self { vertices, faces: self.faces.clone() }
    }

    #[must_use]
    pub fn translated(&self, offset: Vector3<f64>) -> Self {
        self.map_vertices(|p| p + offset)
    }

    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        self.map_vertices(|p| Point3::from(p.coords * factor))
    }

    /// Center on the vertex centroid and scale into the unit sphere.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let center = self.centroid();
        let centered = self.map_vertices(|p| Point3::from(p - center));
        let max_distance = centered
            .vertices
            .iter()
            .map(|v| Vector3::new(v[0], v[1], v[2]).norm())
            .fold(0.0f64, f64::max);
        if max_distance > 0.0 {
            centered.scaled(1.0 / max_distance)
        } else {
            centered
        }
    }
}

/// A single triangle resolved to positions
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub a: Point3<f64>,
    pub b: Point3<f64>,
    pub c: Point3<f64>,
}

impl Triangle {
    #[inline]
    pub fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self { a, b, c }
    }

    /// Unnormalized normal `(b - a) x (c - a)`; its length is twice the area.
    #[inline]
    pub fn cross(&self) -> Vector3<f64> {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    #[inline]
    pub fn area(&self) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            0.5 * self.cross().norm()
        }
    }

    pub fn is_degenerate(&self) -> bool {
        let longest = (self.b - self.a)
            .norm_squared()
            .max((self.c - self.b).norm_squared())
            .max((self.a - self.c).norm_squared());
        if longest == 0.0 {
            return true;
        }
        self.cross().norm() <= DEGENERATE_TOLERANCE * longest
    }

    /// Interior angles at `a`, `b` and `c`.
    pub fn angles(&self) -> [f64; 3] {
        [
            corner_angle(self.a, self.b, self.c),
            corner_angle(self.b, self.c, self.a),
            corner_angle(self.c, self.a, self.b),
        ]
    }

    /// Point at barycentric weights `(1 - u - v, u, v)`.
    #[inline]
    pub fn point_at(&self, u: f64, v: f64) -> Point3<f64> {
        self.a + (self.b - self.a) * u + (self.c - self.a) * v
    }
}

/// Angle at `apex` between the edges to `p` and `q`.
#[inline]
fn corner_angle(apex: Point3<f64>, p: Point3<f64>, q: Point3<f64>) -> f64 {
    let u = p - apex;
    let v = q - apex;
    u.cross(&v).norm().atan2(u.dot(&v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_validate_empty() {
        assert!(matches!(Mesh::default().validate(), Err(Error::EmptyMesh)));
    }

    #[test]
    fn test_validate_bad_index() {
        let mesh = Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        match mesh.validate() {
            Err(Error::InvalidFaceIndex { face, index, vertex_count }) => {
                assert_eq!(face, 1);
                assert_eq!(index, 3);
                assert_eq!(vertex_count, 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_point_cloud_is_valid() {
        let mesh = Mesh::new(vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]], vec![]);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_triangle_area_and_angles() {
        let t = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(t.area(), 0.5, epsilon = 1e-12);
        let [a, b, c] = t.angles();
        assert_relative_eq!(a, std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(a + b + c, std::f64::consts::PI, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_triangle() {
        let collinear = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        assert!(collinear.is_degenerate());
        assert_eq!(collinear.area(), 0.0);

        let collapsed = Triangle::new(Point3::origin(), Point3::origin(), Point3::origin());
        assert!(collapsed.is_degenerate());
    }

    #[test]
    fn test_normalized_fits_unit_sphere() {
        let mesh = Mesh::new(
            vec![[10.0, 10.0, 10.0], [14.0, 10.0, 10.0], [10.0, 13.0, 10.0]],
            vec![[0, 1, 2]],
        );
        let normalized = mesh.normalized();
        assert_relative_eq!(normalized.centroid().coords.norm(), 0.0, epsilon = 1e-12);
        let max = normalized
            .vertices
            .iter()
            .map(|v| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt())
            .fold(0.0f64, f64::max);
        assert_relative_eq!(max, 1.0, epsilon = 1e-12);
    }
}
