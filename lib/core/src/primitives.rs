//! Reference meshes
//!
//! Closed, outward-wound shapes with known measures. Used by tests and
//! benchmarks, and handy for calibrating weight tables.

use crate::Mesh;
use ahash::AHashMap;
use nalgebra::Vector3;
use std::f64::consts::TAU;

#[rustfmt::skip]
const CUBE_FACES: [[u32; 3]; 12] = [
    [0, 2, 1], [0, 3, 2], // z = 0
    [4, 5, 6], [4, 6, 7], // z = 1
    [0, 1, 5], [0, 5, 4], // y = 0
    [3, 7, 6], [3, 6, 2], // y = 1
    [0, 4, 7], [0, 7, 3], // x = 0
    [1, 2, 6], [1, 6, 5], // x = 1
];

const CUBE_CORNERS: [[f64; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

/// Golden ratio
const PHI: f64 = 1.618_033_988_749_895;

#[rustfmt::skip]
const ICOSAHEDRON_CORNERS: [[f64; 3]; 12] = [
    [-1.0, PHI, 0.0], [1.0, PHI, 0.0], [-1.0, -PHI, 0.0], [1.0, -PHI, 0.0],
    [0.0, -1.0, PHI], [0.0, 1.0, PHI], [0.0, -1.0, -PHI], [0.0, 1.0, -PHI],
    [PHI, 0.0, -1.0], [PHI, 0.0, 1.0], [-PHI, 0.0, -1.0], [-PHI, 0.0, 1.0],
];

#[rustfmt::skip]
const ICOSAHEDRON_FACES: [[u32; 3]; 20] = [
    [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
    [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
    [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
    [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
];

/// Cube spanning `[0, 1]^3`: 8 vertices, 12 faces.
pub fn unit_cube() -> Mesh {
    Mesh::new(CUBE_CORNERS.to_vec(), CUBE_FACES.to_vec())
}

/// Box centered on the origin with the given extents.
pub fn cuboid(width: f64, height: f64, depth: f64) -> Mesh {
    let vertices = CUBE_CORNERS
        .iter()
        .map(|c| [(c[0] - 0.5) * width, (c[1] - 0.5) * height, (c[2] - 0.5) * depth])
        .collect();
    Mesh::new(vertices, CUBE_FACES.to_vec())
}

/// Unit cube without its top two triangles: a box with an open lid.
pub fn open_box() -> Mesh {
    let faces = CUBE_FACES
        .iter()
        .enumerate()
        .filter(|(i, _)| !matches!(i, 2 | 3))
        .map(|(_, f)| *f)
        .collect();
    Mesh::new(CUBE_CORNERS.to_vec(), faces)
}

/// Subdivided icosahedron projected onto a sphere.
///
/// Level `n` has `20 * 4^n` faces.
pub fn icosphere(radius: f64, subdivisions: u32) -> Mesh {
    let mut vertices: Vec<Vector3<f64>> = ICOSAHEDRON_CORNERS
        .iter()
        .map(|v| Vector3::new(v[0], v[1], v[2]).normalize())
        .collect();
    let mut faces = ICOSAHEDRON_FACES.to_vec();

    for _ in 0..subdivisions {
        let mut midpoints: AHashMap<(u32, u32), u32> = AHashMap::new();
        let mut midpoint = |a: u32, b: u32, vertices: &mut Vec<Vector3<f64>>| -> u32 {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let m = (vertices[a as usize] + vertices[b as usize]).normalize();
                vertices.push(m);
                (vertices.len() - 1) as u32
            })
        };

        let mut next = Vec::with_capacity(faces.len() * 4);
        for &[a, b, c] in &faces {
            let ab = midpoint(a, b, &mut vertices);
            let bc = midpoint(b, c, &mut vertices);
            let ca = midpoint(c, a, &mut vertices);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        faces = next;
    }

    let vertices = vertices
        .into_iter()
        .map(|v| [v.x * radius, v.y * radius, v.z * radius])
        .collect();
    Mesh::new(vertices, faces)
}

/// Ring torus around the z axis: genus 1.
pub fn torus(
    major_radius: f64,
    minor_radius: f64,
    major_segments: u32,
    minor_segments: u32,
) -> Mesh {
    let n = major_segments.max(3);
    let m = minor_segments.max(3);
    let mut vertices = Vec::with_capacity((n * m) as usize);
    for i in 0..n {
        let u = TAU * i as f64 / n as f64;
        for j in 0..m {
            let v = TAU * j as f64 / m as f64;
            let ring = major_radius + minor_radius * v.cos();
            vertices.push([ring * u.cos(), ring * u.sin(), minor_radius * v.sin()]);
        }
    }

    let index = |i: u32, j: u32| (i % n) * m + (j % m);
    let mut faces = Vec::with_capacity((2 * n * m) as usize);
    for i in 0..n {
        for j in 0..m {
            let a = index(i, j);
            let b = index(i + 1, j);
            let c = index(i + 1, j + 1);
            let d = index(i, j + 1);
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
    }
    Mesh::new(vertices, faces)
}
