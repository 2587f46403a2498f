//! Per-mesh triangle store: a contiguous triangle array and a parallel
//! attribute array indexed identically.
//!
//! The store is read-only to traversal. The BVH builder writes triangle
//! centroids; everything else belongs to whoever loaded the mesh.

use crate::triangle::{Triangle, TriangleAttributes};

#[derive(Clone, Default)]
pub struct Mesh {
    pub tri: Vec<Triangle>,
    pub attrs: Vec<TriangleAttributes>,
}

impl Mesh {
    pub fn new(tri: Vec<Triangle>, attrs: Vec<TriangleAttributes>) -> Self {
        debug_assert_eq!(tri.len(), attrs.len());
        Mesh { tri, attrs }
    }

    /// Builds a mesh from bare triangles, deriving flat-shaded attributes
    /// (the geometric normal at all three vertices, zero UVs).
    pub fn from_triangles(tri: Vec<Triangle>) -> Self {
        let attrs = tri
            .iter()
            .map(|t| {
                let n = t.compute_normal();
                TriangleAttributes {
                    n0: n,
                    n1: n,
                    n2: n,
                    ..Default::default()
                }
            })
            .collect();
        Mesh { tri, attrs }
    }

    #[inline(always)]
    pub fn tri_count(&self) -> usize {
        self.tri.len()
    }
}
