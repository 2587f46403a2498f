//! # Two-level BVH construction and traversal
//!
//! - Bottom-level acceleration structures ([`bvh::Bvh`]) built per triangle
//!   mesh with binned SAH partitioning, plus a bottom-up [`bvh::Bvh::refit`]
//!   for deforming meshes with fixed topology.
//! - [`instance::Instance`] places a BLAS into world space via an affine
//!   transform; rays are transformed into BLAS-local space during traversal.
//! - A top-level acceleration structure ([`tlas::Tlas`]) built over instances
//!   with agglomerative clustering. [`tlas::Tlas::build_quick`] pre-splits the
//!   instances into 8 chunks and clusters them in parallel, using one kD-tree
//!   per chunk for nearest-neighbor queries.
//!
//! ## Example
//!
//! ```
//! use glam::*;
//! use two_level_bvh::{bvh::Bvh, mesh::Mesh, ray::Ray, test_util::geometry::quad};
//!
//! let mesh = Mesh::from_triangles(quad(vec3a(0.0, 0.0, 0.0), 1.0));
//! let bvh = Bvh::build(mesh).unwrap();
//!
//! let mut ray = Ray::new(vec3a(0.25, 0.25, 4.0), vec3a(0.0, 0.0, -1.0));
//! bvh.intersect(&mut ray, 0);
//! if ray.hit.is_hit() {
//!     println!("hit triangle {} at t={}", ray.hit.prim(), ray.hit.t);
//! }
//! ```

use std::time::Instant;

use thiserror::Error;

pub mod aabb;
pub mod bvh;
pub mod instance;
pub mod kdtree;
pub mod mesh;
pub mod par;
pub mod ray;
pub mod test_util;
pub mod tlas;
pub mod triangle;

pub const INVALID: u32 = u32::MAX;

/// Largest triangle count a single mesh BVH can index: `prim` occupies the
/// low 20 bits of the packed hit id.
pub const MAX_TRIS_PER_MESH: usize = 1 << 20;

/// Largest instance count a TLAS can reference: `instance` occupies the high
/// 12 bits of the packed hit id.
pub const MAX_INSTANCES: usize = 1 << 12;

/// Build-entry validation errors. Queries never fail; a structure that failed
/// to build holds an empty node pool and misses everything.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    #[error("mesh has {0} triangles, the per-mesh limit is 2^20")]
    TooManyTriangles(usize),
    #[error("scene has {0} instances, the limit is 2^12")]
    TooManyInstances(usize),
}

pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    pub fn new(label: &str) -> Self {
        Self {
            start: Instant::now(),
            label: label.to_string(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        println!("{:>10.2?} {}", self.start.elapsed(), self.label)
    }
}

/// Add profile scope. Nesting the macro allows us to make the profiling crate optional.
/// Use profile feature to enable profiling.
#[doc(hidden)]
#[macro_export]
macro_rules! scope {
    [$label:expr] => {
        #[cfg(feature = "profile")]
        profiling::scope!($label);
    };
}

/// Add profile scope and timer.
/// Use scope_print feature to print times to console.
/// Use profile feature to enable profiling.
#[doc(hidden)]
#[macro_export]
macro_rules! scope_print {
    [$label:expr] => {
        #[cfg(feature = "profile")]
        profiling::scope!($label);
        #[cfg(feature = "scope_print")]
        let _t = $crate::Timer::new($label);
    };
}
