//! Deterministic geometry and random-number helpers shared by the tests and
//! the demos.

use std::sync::Arc;

use glam::{vec3, Mat4};

use crate::bvh::Bvh;
use crate::instance::Instance;

/// Small xorshift* generator; deterministic across platforms so tests can
/// pin their scenes with a seed.
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng(seed.max(1))
    }

    #[inline(always)]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Uniform in `[0, 1)`.
    #[inline(always)]
    pub fn f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    #[inline(always)]
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.f32()
    }
}

/// Instances of one BLAS scattered with random translations and rotations.
pub fn random_instances(bvh: Arc<Bvh>, count: usize, extent: f32, seed: u64) -> Vec<Instance> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|i| {
            let t = vec3(
                rng.range(-extent, extent),
                rng.range(-extent, extent),
                rng.range(-extent, extent),
            );
            let transform = Mat4::from_translation(t)
                * Mat4::from_rotation_y(rng.range(0.0, std::f32::consts::TAU))
                * Mat4::from_rotation_x(rng.range(0.0, std::f32::consts::TAU));
            Instance::new(bvh.clone(), i as u32, transform)
        })
        .collect()
}

pub mod geometry {
    use glam::{vec3a, Vec3A};

    use super::Rng;
    use crate::triangle::Triangle;

    /// Right triangle with unit legs in the xy plane, `offset` at the corner.
    pub fn unit_triangle_at(offset: Vec3A) -> Triangle {
        Triangle::new(
            offset,
            offset + vec3a(1.0, 0.0, 0.0),
            offset + vec3a(0.0, 1.0, 0.0),
        )
    }

    /// Two triangles spanning a `size` × `size` square in the xy plane
    /// around `center`.
    pub fn quad(center: Vec3A, size: f32) -> Vec<Triangle> {
        let h = size * 0.5;
        let a = center + vec3a(-h, -h, 0.0);
        let b = center + vec3a(h, -h, 0.0);
        let c = center + vec3a(h, h, 0.0);
        let d = center + vec3a(-h, h, 0.0);
        vec![Triangle::new(a, b, c), Triangle::new(a, c, d)]
    }

    /// 12 triangles forming an axis-aligned box around `center`.
    pub fn cube_tris(center: Vec3A, half: f32) -> Vec<Triangle> {
        let min = center - Vec3A::splat(half);
        let max = center + Vec3A::splat(half);
        let p = |i: u32| {
            vec3a(
                if i & 1 != 0 { max.x } else { min.x },
                if i & 2 != 0 { max.y } else { min.y },
                if i & 4 != 0 { max.z } else { min.z },
            )
        };
        const FACES: [[u32; 4]; 6] = [
            [0, 4, 6, 2], // -x
            [1, 3, 7, 5], // +x
            [0, 1, 5, 4], // -y
            [2, 6, 7, 3], // +y
            [0, 2, 3, 1], // -z
            [4, 5, 7, 6], // +z
        ];
        FACES
            .iter()
            .flat_map(|f| {
                [
                    Triangle::new(p(f[0]), p(f[1]), p(f[2])),
                    Triangle::new(p(f[0]), p(f[2]), p(f[3])),
                ]
            })
            .collect()
    }

    /// Random triangle soup: centers inside a cube of `±extent`, unit-scale
    /// edges.
    pub fn random_triangles(count: usize, extent: f32, seed: u64) -> Vec<Triangle> {
        let mut rng = Rng::new(seed);
        let edge = |rng: &mut Rng| {
            vec3a(
                rng.range(-1.0, 1.0),
                rng.range(-1.0, 1.0),
                rng.range(-1.0, 1.0),
            )
        };
        (0..count)
            .map(|_| {
                let c = vec3a(
                    rng.range(-extent, extent),
                    rng.range(-extent, extent),
                    rng.range(-extent, extent),
                );
                Triangle::new(c, c + edge(&mut rng), c + edge(&mut rng))
            })
            .collect()
    }
}
