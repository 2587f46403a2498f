//! An Axis-Aligned Bounding Box (AABB) represented by its minimum and maximum points.

use bytemuck::{Pod, Zeroable};
use glam::Vec3A;

/// An Axis-Aligned Bounding Box (AABB) represented by its minimum and maximum points.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Aabb {
    pub min: Vec3A,
    pub max: Vec3A,
}

unsafe impl Pod for Aabb {}
unsafe impl Zeroable for Aabb {}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// Returns an empty AABB. Extending it with any point yields that point.
    #[inline(always)]
    pub fn empty() -> Self {
        Self {
            min: Vec3A::splat(f32::MAX),
            max: Vec3A::splat(f32::MIN),
        }
    }

    /// Creates a new AABB with both min and max set to the given point.
    #[inline(always)]
    pub fn from_point(point: Vec3A) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Extends the AABB to include the given point.
    #[inline(always)]
    pub fn extend(&mut self, point: Vec3A) -> &mut Self {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
        self
    }

    /// Returns the union of this AABB and another AABB.
    #[inline(always)]
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the diagonal vector of the AABB.
    #[inline(always)]
    pub fn diagonal(&self) -> Vec3A {
        self.max - self.min
    }

    /// Returns the center point of the AABB.
    #[inline(always)]
    pub fn center(&self) -> Vec3A {
        (self.max + self.min) * 0.5
    }

    /// Returns the center coordinate of the AABB along a specific axis.
    #[inline(always)]
    pub fn center_axis(&self, axis: usize) -> f32 {
        (self.max[axis] + self.min[axis]) * 0.5
    }

    /// Returns half the surface area of the AABB. All SAH and merge-cost
    /// comparisons in this crate use this quantity; the factor of two cancels.
    #[inline(always)]
    pub fn half_area(&self) -> f32 {
        let d = self.diagonal();
        (d.x + d.y) * d.z + d.x * d.y
    }

    /// Checks if the given point lies inside the AABB (inclusive).
    #[inline(always)]
    pub fn contains_point(&self, point: Vec3A) -> bool {
        (point.cmpge(self.min) & point.cmple(self.max)).all()
    }

    /// Checks if `other` lies fully inside the AABB (inclusive).
    #[inline(always)]
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3a;

    #[test]
    fn extend_and_union() {
        let mut a = Aabb::empty();
        a.extend(vec3a(1.0, 2.0, 3.0)).extend(vec3a(-1.0, 0.0, 5.0));
        assert_eq!(a.min, vec3a(-1.0, 0.0, 3.0));
        assert_eq!(a.max, vec3a(1.0, 2.0, 5.0));

        let b = Aabb::from_point(vec3a(0.0, -4.0, 0.0));
        let u = a.union(&b);
        assert_eq!(u.min, vec3a(-1.0, -4.0, 0.0));
        assert_eq!(u.max, vec3a(1.0, 2.0, 5.0));
        assert!(u.contains_aabb(&a));
        assert!(u.contains_aabb(&b));
    }

    #[test]
    fn half_area_of_unit_cube() {
        let mut a = Aabb::from_point(Vec3A::ZERO);
        a.extend(Vec3A::ONE);
        assert_eq!(a.half_area(), 3.0);
    }
}
