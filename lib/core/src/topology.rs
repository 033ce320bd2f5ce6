//! Connectivity of a triangle mesh
//!
//! [`Adjacency`] is built once per mesh in a single O(V + F) pass and shared
//! by the curvature estimator, the Euler characteristic and the manifold
//! check.

use crate::Mesh;
use ahash::{AHashMap, AHashSet};
use smallvec::SmallVec;

/// Undirected edge key, smaller index first
pub type EdgeKey = (u32, u32);

#[inline]
pub fn edge_key(a: u32, b: u32) -> EdgeKey {
    if a < b { (a, b) } else { (b, a) }
}

/// Vertex to face incidence plus per-edge face counts
#[derive(Debug, Clone)]
pub struct Adjacency {
    /// Faces touching each vertex, indexed by vertex
    pub vertex_faces: Vec<SmallVec<[u32; 8]>>,
    /// Number of faces bordering each undirected edge
    pub edge_faces: AHashMap<EdgeKey, u32>,
    /// Faces that repeat a vertex index
    pub collapsed_faces: usize,
}

impl Adjacency {
    /// Build incidence tables. The mesh must already be validated.
    pub fn build(mesh: &Mesh) -> Self {
        let mut vertex_faces: Vec<SmallVec<[u32; 8]>> = vec![SmallVec::new(); mesh.vertex_count()];
        let mut edge_faces: AHashMap<EdgeKey, u32> =
            AHashMap::with_capacity(mesh.face_count() * 3 / 2);
        let mut collapsed_faces = 0;

        for (f, &[a, b, c]) in mesh.faces.iter().enumerate() {
            if a == b || b == c || c == a {
                collapsed_faces += 1;
            }
            for v in dedup([a, b, c]) {
                vertex_faces[v as usize].push(f as u32);
            }
            for (p, q) in [(a, b), (b, c), (c, a)] {
                if p != q {
                    *edge_faces.entry(edge_key(p, q)).or_insert(0) += 1;
                }
            }
        }

        Self { vertex_faces, edge_faces, collapsed_faces }
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_faces.len()
    }

    /// Faces incident to `vertex`
    #[inline]
    pub fn faces_of(&self, vertex: u32) -> &[u32] {
        &self.vertex_faces[vertex as usize]
    }
}

fn dedup(face: [u32; 3]) -> SmallVec<[u32; 3]> {
    let mut out: SmallVec<[u32; 3]> = SmallVec::new();
    for v in face {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// V - E + F with E counted as unique undirected edges.
pub fn euler_characteristic(mesh: &Mesh, adjacency: &Adjacency) -> i64 {
    mesh.vertex_count() as i64 - adjacency.edge_count() as i64 + mesh.face_count() as i64
}

/// Handle count implied by the Euler characteristic.
///
/// Only meaningful for a single closed orientable component; anything else
/// yields a best-effort diagnostic, floored at zero.
pub fn genus(euler_characteristic: i64) -> i64 {
    ((2 - euler_characteristic) as f64 / 2.0).round().max(0.0) as i64
}

/// True iff every edge borders exactly two faces and the faces around every
/// referenced vertex form one connected fan.
pub fn is_manifold(mesh: &Mesh, adjacency: &Adjacency) -> bool {
    if mesh.faces.is_empty() || adjacency.collapsed_faces > 0 {
        return false;
    }
    if adjacency.edge_faces.values().any(|&count| count != 2) {
        return false;
    }
    (0..mesh.vertex_count() as u32).all(|v| is_single_fan(mesh, adjacency, v))
}

/// Walk the faces around `vertex` across shared edges and check that the
/// walk reaches all of them.
fn is_single_fan(mesh: &Mesh, adjacency: &Adjacency, vertex: u32) -> bool {
    let faces = adjacency.faces_of(vertex);
    if faces.len() <= 1 {
        // Isolated vertices carry no surface; a lone face fails the edge test.
        return true;
    }

    // Each incident face contributes the two neighbours of `vertex` in it.
    let rim = |f: u32| -> [u32; 2] {
        let [a, b, c] = mesh.faces[f as usize];
        if a == vertex {
            [b, c]
        } else if b == vertex {
            [c, a]
        } else {
            [a, b]
        }
    };

    let mut visited: AHashSet<u32> = AHashSet::with_capacity(faces.len());
    let mut stack = vec![faces[0]];
    visited.insert(faces[0]);
    while let Some(f) = stack.pop() {
        let [p, q] = rim(f);
        for &g in faces {
            if visited.contains(&g) {
                continue;
            }
            let [r, s] = rim(g);
            if r == p || r == q || s == p || s == q {
                visited.insert(g);
                stack.push(g);
            }
        }
    }
    visited.len() == faces.len()
}
