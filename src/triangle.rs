//! Triangle representation in 3D space, plus the per-vertex shading attributes
//! stored alongside each triangle.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3A};

use crate::aabb::Aabb;
use crate::ray::{Hit, Ray};

/// Rays closer to parallel with the triangle plane than this are rejected.
const PARALLEL_EPSILON: f32 = 1e-5;
/// Minimum accepted hit distance, avoids self-intersection at the ray origin.
const T_MIN: f32 = 1e-4;

#[derive(Clone, Copy, Default, Debug)]
pub struct Triangle {
    pub v0: Vec3A,
    pub v1: Vec3A,
    pub v2: Vec3A,
    /// Arithmetic mean of the vertices. Written by the BVH builder before
    /// subdivision; stale until then.
    pub centroid: Vec3A,
}

unsafe impl Pod for Triangle {}
unsafe impl Zeroable for Triangle {}

impl Triangle {
    #[inline(always)]
    pub fn new(v0: Vec3A, v1: Vec3A, v2: Vec3A) -> Self {
        Triangle {
            v0,
            v1,
            v2,
            centroid: (v0 + v1 + v2) * (1.0 / 3.0),
        }
    }

    /// Compute the geometric normal of the triangle.
    #[inline(always)]
    pub fn compute_normal(&self) -> Vec3A {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(e2).normalize_or_zero()
    }

    /// Compute the bounding box of the triangle.
    #[inline(always)]
    pub fn aabb(&self) -> Aabb {
        *Aabb::from_point(self.v0).extend(self.v1).extend(self.v2)
    }

    /// Möller–Trumbore ray/triangle intersection, see:
    /// en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm
    ///
    /// Updates `ray.hit` when the hit at `t` is closer than the current
    /// nearest and `t > 1e-4`.
    #[inline(always)]
    pub fn intersect(&self, ray: &mut Ray, inst_prim: u32) {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);
        if a.abs() < PARALLEL_EPSILON {
            return; // ray parallel to triangle
        }
        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return;
        }
        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return;
        }
        let t = f * edge2.dot(q);
        if t > T_MIN && t < ray.hit.t {
            ray.hit = Hit { t, u, v, inst_prim };
        }
    }
}

/// Per-vertex shading attributes, indexed identically to the triangle array.
#[derive(Clone, Copy, Default, Debug)]
pub struct TriangleAttributes {
    pub n0: Vec3A,
    pub n1: Vec3A,
    pub n2: Vec3A,
    pub uv0: Vec2,
    pub uv1: Vec2,
    pub uv2: Vec2,
}

impl TriangleAttributes {
    /// Interpolated shading normal at barycentric coordinates `(u, v)`.
    #[inline(always)]
    pub fn normal_at(&self, u: f32, v: f32) -> Vec3A {
        let w = 1.0 - u - v;
        (self.n0 * w + self.n1 * u + self.n2 * v).normalize_or_zero()
    }

    /// Interpolated texture coordinates at barycentric coordinates `(u, v)`.
    #[inline(always)]
    pub fn uv_at(&self, u: f32, v: f32) -> Vec2 {
        let w = 1.0 - u - v;
        self.uv0 * w + self.uv1 * u + self.uv2 * v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{vec2, vec3a};

    fn unit_triangle() -> Triangle {
        Triangle::new(
            vec3a(0.0, 0.0, 0.0),
            vec3a(1.0, 0.0, 0.0),
            vec3a(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn hit_with_barycentrics() {
        let tri = unit_triangle();
        let mut ray = Ray::new(vec3a(0.25, 0.25, 1.0), vec3a(0.0, 0.0, -1.0));
        tri.intersect(&mut ray, 0);
        assert!(ray.hit.is_hit());
        assert!((ray.hit.t - 1.0).abs() < 1e-6);
        assert!((ray.hit.u - 0.25).abs() < 1e-6);
        assert!((ray.hit.v - 0.25).abs() < 1e-6);
        assert_eq!(ray.hit.inst_prim, 0);
    }

    #[test]
    fn parallel_ray_misses() {
        let tri = unit_triangle();
        let mut ray = Ray::new(vec3a(0.25, 0.25, 0.0), vec3a(1.0, 0.0, 0.0));
        tri.intersect(&mut ray, 0);
        assert!(!ray.hit.is_hit());
    }

    #[test]
    fn outside_barycentric_range_misses() {
        let tri = unit_triangle();
        let mut ray = Ray::new(vec3a(0.75, 0.75, 1.0), vec3a(0.0, 0.0, -1.0));
        tri.intersect(&mut ray, 0);
        assert!(!ray.hit.is_hit());
    }

    #[test]
    fn near_origin_hit_rejected() {
        // The origin sits on the triangle; t below the epsilon must not count.
        let tri = unit_triangle();
        let mut ray = Ray::new(vec3a(0.25, 0.25, 0.0), vec3a(0.0, 0.0, -1.0));
        tri.intersect(&mut ray, 0);
        assert!(!ray.hit.is_hit());
    }

    #[test]
    fn attributes_interpolate_barycentrically() {
        let attrs = TriangleAttributes {
            n0: vec3a(1.0, 0.0, 0.0),
            n1: vec3a(0.0, 1.0, 0.0),
            n2: vec3a(0.0, 0.0, 1.0),
            uv0: vec2(0.0, 0.0),
            uv1: vec2(1.0, 0.0),
            uv2: vec2(0.0, 1.0),
        };

        // the corners return the vertex values untouched
        assert_eq!(attrs.uv_at(0.0, 0.0), vec2(0.0, 0.0));
        assert_eq!(attrs.uv_at(1.0, 0.0), vec2(1.0, 0.0));
        assert_eq!(attrs.uv_at(0.0, 1.0), vec2(0.0, 1.0));

        // the centroid blends all three equally
        let uv = attrs.uv_at(1.0 / 3.0, 1.0 / 3.0);
        assert!((uv.x - 1.0 / 3.0).abs() < 1e-6);
        assert!((uv.y - 1.0 / 3.0).abs() < 1e-6);
        let n = attrs.normal_at(1.0 / 3.0, 1.0 / 3.0);
        let e = 1.0 / 3.0f32.sqrt();
        assert!((n - vec3a(e, e, e)).length() < 1e-6);
    }

    #[test]
    fn farther_hit_does_not_replace_nearer() {
        let tri = unit_triangle();
        let mut ray = Ray::new(vec3a(0.25, 0.25, 1.0), vec3a(0.0, 0.0, -1.0));
        ray.hit.t = 0.5;
        tri.intersect(&mut ray, 7);
        assert_eq!(ray.hit.t, 0.5);
        assert_ne!(ray.hit.inst_prim, 7);
    }
}
