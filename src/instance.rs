//! A placement of a BLAS into world space via an affine transform.
//!
//! The BLAS stays static; moving an instance only means storing a new
//! transform pair and recomputing the world-space bounds. Rays are mapped
//! into BLAS-local space for traversal instead.

use std::sync::Arc;

use glam::{vec3a, Mat4};

use crate::aabb::Aabb;
use crate::bvh::Bvh;
use crate::ray::Ray;

#[derive(Clone)]
pub struct Instance {
    bvh: Arc<Bvh>,
    transform: Mat4,
    inv_transform: Mat4,
    /// World-space box of the eight transformed corners of the BLAS root box.
    pub bounds: Aabb,
    idx: u32,
}

impl Instance {
    pub fn new(bvh: Arc<Bvh>, idx: u32, transform: Mat4) -> Self {
        debug_assert!((idx as usize) < crate::MAX_INSTANCES);
        let mut instance = Instance {
            bvh,
            transform: Mat4::IDENTITY,
            inv_transform: Mat4::IDENTITY,
            bounds: Aabb::empty(),
            idx,
        };
        instance.set_transform(transform);
        instance
    }

    /// Stores the transform and its inverse, and recomputes the world-space
    /// bounds using the new matrix.
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.inv_transform = transform.inverse();
        let root = self.bvh.root_bounds();
        if self.bvh.nodes().is_empty() {
            self.bounds = Aabb::empty();
            return;
        }
        let mut bounds = Aabb::empty();
        for i in 0..8 {
            let corner = vec3a(
                if i & 1 != 0 { root.max.x } else { root.min.x },
                if i & 2 != 0 { root.max.y } else { root.min.y },
                if i & 4 != 0 { root.max.z } else { root.min.z },
            );
            bounds.extend(transform.transform_point3a(corner));
        }
        self.bounds = bounds;
    }

    /// Intersects the ray with the instanced BLAS. The ray is transformed
    /// into BLAS-local space for the traversal and restored afterwards; only
    /// the hit record carries over.
    pub fn intersect(&self, ray: &mut Ray) {
        let origin = ray.origin;
        let direction = ray.direction;
        let inv_direction = ray.inv_direction;

        ray.origin = self.inv_transform.transform_point3a(origin);
        ray.set_direction(self.inv_transform.transform_vector3a(direction));
        self.bvh.intersect(ray, self.idx);

        ray.origin = origin;
        ray.direction = direction;
        ray.inv_direction = inv_direction;
    }

    #[inline(always)]
    pub fn bvh(&self) -> &Arc<Bvh> {
        &self.bvh
    }

    #[inline(always)]
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    #[inline(always)]
    pub fn inv_transform(&self) -> &Mat4 {
        &self.inv_transform
    }

    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.idx
    }
}
