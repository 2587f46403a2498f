//! Bottom-level acceleration structure: a binned-SAH BVH over the triangles
//! of one mesh.
//!
//! Nodes live in a flat pool addressed by `u32` indices. Child pairs are
//! contiguous (`left_first`, `left_first + 1`) and slot 1 is left unused so
//! pairs start at even indices. Leaves reference a contiguous range of the
//! `tri_idx` permutation.

use std::mem;

use bytemuck::{zeroed_vec, Pod, Zeroable};
use glam::{Vec3, Vec3A};

use crate::aabb::Aabb;
use crate::mesh::Mesh;
use crate::ray::{pack_inst_prim, Ray, MISS};
use crate::{scope_print, BuildError, MAX_TRIS_PER_MESH};

/// Number of SAH bins per axis; the 7 planes between them are the split
/// candidates.
pub const BINS: usize = 8;

/// Fixed traversal stack capacity. SAH-built trees stay well below this for
/// any mesh within the 2^20 triangle limit.
pub(crate) const STACK_DEPTH: usize = 64;

/// A 32-byte BVH node. `left_first` is the index of the first child for
/// interior nodes and the first slot of the leaf's `tri_idx` range for
/// leaves; `tri_count > 0` marks a leaf.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
#[repr(C, align(32))]
pub struct BvhNode {
    pub aabb_min: Vec3,
    pub left_first: u32,
    pub aabb_max: Vec3,
    pub tri_count: u32,
}

unsafe impl Pod for BvhNode {}
unsafe impl Zeroable for BvhNode {}

impl BvhNode {
    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.tri_count > 0
    }

    #[inline(always)]
    pub fn min(&self) -> Vec3A {
        self.aabb_min.into()
    }

    #[inline(always)]
    pub fn max(&self) -> Vec3A {
        self.aabb_max.into()
    }

    /// SAH cost of leaving this node unsplit.
    #[inline(always)]
    fn cost(&self) -> f32 {
        let d = self.max() - self.min();
        ((d.x + d.y) * d.z + d.x * d.y) * self.tri_count as f32
    }

    #[inline(always)]
    fn intersect(&self, ray: &Ray) -> f32 {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            unsafe { crate::ray::intersect_aabb_sse(ray, self as *const Self as *const f32) }
        }
        #[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
        {
            ray.intersect_aabb(self.min(), self.max())
        }
    }
}

#[derive(Clone, Copy)]
struct Bin {
    bounds: Aabb,
    count: u32,
}

impl Default for Bin {
    fn default() -> Self {
        Bin {
            bounds: Aabb::empty(),
            count: 0,
        }
    }
}

/// A binned-SAH BVH owning the mesh it indexes.
pub struct Bvh {
    mesh: Mesh,
    nodes: Vec<BvhNode>,
    tri_idx: Vec<u32>,
    nodes_used: u32,
}

impl Bvh {
    /// Builds the hierarchy over all triangles of `mesh`, taking ownership of
    /// the triangle store. Triangle centroids are (re)computed here.
    pub fn build(mesh: Mesh) -> Result<Self, BuildError> {
        let mut bvh = Bvh {
            mesh,
            nodes: Vec::new(),
            tri_idx: Vec::new(),
            nodes_used: 0,
        };
        bvh.rebuild()?;
        Ok(bvh)
    }

    /// Rebuilds from scratch, e.g. after editing triangles through
    /// [`Bvh::mesh_mut`]. For pure vertex deformation within unchanged
    /// topology prefer [`Bvh::refit`].
    pub fn rebuild(&mut self) -> Result<(), BuildError> {
        scope_print!("bvh build");
        let tri_count = self.mesh.tri.len();
        if tri_count > MAX_TRIS_PER_MESH {
            self.nodes.clear();
            self.nodes_used = 0;
            return Err(BuildError::TooManyTriangles(tri_count));
        }
        if tri_count == 0 {
            self.nodes.clear();
            self.nodes_used = 0;
            return Ok(());
        }

        // 2N nodes upper-bound a binary BVH over N triangles, slot 1 included.
        if self.nodes.len() != 2 * tri_count {
            self.nodes = zeroed_vec(2 * tri_count);
        }
        self.tri_idx.clear();
        self.tri_idx.extend(0..tri_count as u32);
        for tri in &mut self.mesh.tri {
            tri.centroid = (tri.v0 + tri.v1 + tri.v2) * (1.0 / 3.0);
        }

        // Slot 1 stays unused so child pairs land on even indices.
        self.nodes_used = 2;
        self.nodes[0] = BvhNode {
            left_first: 0,
            tri_count: tri_count as u32,
            ..Default::default()
        };
        self.update_node_bounds(0);
        self.subdivide(0);
        Ok(())
    }

    /// Updates node boxes bottom-up without changing topology. Children are
    /// always allocated after their parent, so a reverse sweep sees every
    /// child before its parent.
    pub fn refit(&mut self) {
        scope_print!("bvh refit");
        for i in (0..self.nodes_used as usize).rev() {
            if i == 1 {
                continue;
            }
            let node = self.nodes[i];
            if node.is_leaf() {
                self.update_node_bounds(i as u32);
                continue;
            }
            let left = self.nodes[node.left_first as usize];
            let right = self.nodes[node.left_first as usize + 1];
            let n = &mut self.nodes[i];
            n.aabb_min = left.min().min(right.min()).into();
            n.aabb_max = left.max().max(right.max()).into();
        }
    }

    /// Finds the nearest triangle hit, tagging hits with `instance_idx` in
    /// the packed hit identifier. Traversal descends the nearer child first
    /// and prunes children beyond the current nearest hit.
    pub fn intersect(&self, ray: &mut Ray, instance_idx: u32) {
        crate::scope!("bvh intersect");
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = [0u32; STACK_DEPTH];
        let mut stack_ptr = 0usize;
        let mut node = &self.nodes[0];
        loop {
            if node.is_leaf() {
                for i in 0..node.tri_count {
                    let prim = self.tri_idx[(node.left_first + i) as usize];
                    let inst_prim = pack_inst_prim(instance_idx, prim);
                    self.mesh.tri[prim as usize].intersect(ray, inst_prim);
                }
                if stack_ptr == 0 {
                    break;
                }
                stack_ptr -= 1;
                node = &self.nodes[stack[stack_ptr] as usize];
                continue;
            }
            let mut child1 = node.left_first;
            let mut child2 = node.left_first + 1;
            let mut dist1 = self.nodes[child1 as usize].intersect(ray);
            let mut dist2 = self.nodes[child2 as usize].intersect(ray);
            if dist1 > dist2 {
                mem::swap(&mut dist1, &mut dist2);
                mem::swap(&mut child1, &mut child2);
            }
            if dist1 == MISS {
                if stack_ptr == 0 {
                    break;
                }
                stack_ptr -= 1;
                node = &self.nodes[stack[stack_ptr] as usize];
            } else {
                node = &self.nodes[child1 as usize];
                if dist2 != MISS {
                    debug_assert!(stack_ptr < STACK_DEPTH);
                    stack[stack_ptr] = child2;
                    stack_ptr += 1;
                }
            }
        }
    }

    /// World-space box of the root node; empty for an empty mesh.
    pub fn root_bounds(&self) -> Aabb {
        if self.nodes.is_empty() {
            return Aabb::empty();
        }
        Aabb {
            min: self.nodes[0].min(),
            max: self.nodes[0].max(),
        }
    }

    #[inline(always)]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Mutable mesh access for deformation; follow up with [`Bvh::refit`]
    /// (same topology) or [`Bvh::rebuild`].
    #[inline(always)]
    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    #[inline(always)]
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    #[inline(always)]
    pub fn tri_idx(&self) -> &[u32] {
        &self.tri_idx
    }

    #[inline(always)]
    pub fn nodes_used(&self) -> u32 {
        self.nodes_used
    }

    fn update_node_bounds(&mut self, node_idx: u32) {
        let node = self.nodes[node_idx as usize];
        let mut aabb = Aabb::empty();
        for i in 0..node.tri_count {
            let tri = &self.mesh.tri[self.tri_idx[(node.left_first + i) as usize] as usize];
            aabb.extend(tri.v0).extend(tri.v1).extend(tri.v2);
        }
        let n = &mut self.nodes[node_idx as usize];
        n.aabb_min = aabb.min.into();
        n.aabb_max = aabb.max.into();
    }

    /// Evaluates the 7 candidate planes per axis over 8 centroid bins and
    /// returns `(cost, axis, position)` of the cheapest split. Axes with no
    /// centroid extent are skipped; ties keep the earliest candidate.
    fn find_best_split_plane(&self, node: &BvhNode) -> (f32, usize, f32) {
        let first = node.left_first as usize;
        let count = node.tri_count as usize;
        let mut best_cost = f32::MAX;
        let mut best_axis = 0;
        let mut best_pos = 0.0;
        for axis in 0..3 {
            let mut bounds_min = f32::MAX;
            let mut bounds_max = f32::MIN;
            for i in 0..count {
                let c = self.mesh.tri[self.tri_idx[first + i] as usize].centroid[axis];
                bounds_min = bounds_min.min(c);
                bounds_max = bounds_max.max(c);
            }
            if bounds_min == bounds_max {
                continue;
            }
            // populate the bins
            let mut bins = [Bin::default(); BINS];
            let scale = BINS as f32 / (bounds_max - bounds_min);
            for i in 0..count {
                let tri = &self.mesh.tri[self.tri_idx[first + i] as usize];
                let bin_idx =
                    (((tri.centroid[axis] - bounds_min) * scale) as usize).min(BINS - 1);
                bins[bin_idx].count += 1;
                bins[bin_idx]
                    .bounds
                    .extend(tri.v0)
                    .extend(tri.v1)
                    .extend(tri.v2);
            }
            // prefix/suffix counts and areas for the planes between the bins
            let mut left_area = [0.0f32; BINS - 1];
            let mut right_area = [0.0f32; BINS - 1];
            let mut left_count = [0u32; BINS - 1];
            let mut right_count = [0u32; BINS - 1];
            let mut left_box = Aabb::empty();
            let mut right_box = Aabb::empty();
            let mut left_sum = 0;
            let mut right_sum = 0;
            for i in 0..BINS - 1 {
                left_sum += bins[i].count;
                left_count[i] = left_sum;
                left_box = left_box.union(&bins[i].bounds);
                left_area[i] = left_box.half_area();
                right_sum += bins[BINS - 1 - i].count;
                right_count[BINS - 2 - i] = right_sum;
                right_box = right_box.union(&bins[BINS - 1 - i].bounds);
                right_area[BINS - 2 - i] = right_box.half_area();
            }
            let scale = (bounds_max - bounds_min) / BINS as f32;
            for i in 0..BINS - 1 {
                let plane_cost =
                    left_count[i] as f32 * left_area[i] + right_count[i] as f32 * right_area[i];
                if plane_cost < best_cost {
                    best_cost = plane_cost;
                    best_axis = axis;
                    best_pos = bounds_min + scale * (i + 1) as f32;
                }
            }
        }
        (best_cost, best_axis, best_pos)
    }

    fn subdivide(&mut self, node_idx: u32) {
        let node = self.nodes[node_idx as usize];
        let (split_cost, axis, split_pos) = self.find_best_split_plane(&node);
        if split_cost >= node.cost() {
            return;
        }
        // Hoare-style in-place partition of the node's tri_idx range
        let mut i = node.left_first as usize;
        let mut j = i + node.tri_count as usize - 1;
        while i <= j {
            if self.mesh.tri[self.tri_idx[i] as usize].centroid[axis] < split_pos {
                i += 1;
            } else {
                self.tri_idx.swap(i, j);
                if j == 0 {
                    break;
                }
                j -= 1;
            }
        }
        // abort split if one of the sides is empty
        let left_count = i as u32 - node.left_first;
        if left_count == 0 || left_count == node.tri_count {
            return;
        }
        // create child nodes as a contiguous pair
        let left_child = self.nodes_used;
        self.nodes_used += 2;
        self.nodes[left_child as usize].left_first = node.left_first;
        self.nodes[left_child as usize].tri_count = left_count;
        self.nodes[left_child as usize + 1].left_first = i as u32;
        self.nodes[left_child as usize + 1].tri_count = node.tri_count - left_count;
        let n = &mut self.nodes[node_idx as usize];
        n.left_first = left_child;
        n.tri_count = 0;
        self.update_node_bounds(left_child);
        self.update_node_bounds(left_child + 1);
        self.subdivide(left_child);
        self.subdivide(left_child + 1);
    }
}
