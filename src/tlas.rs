//! Top-level acceleration structure over BLAS instances.
//!
//! Two builders produce the same kind of tree:
//! - [`Tlas::build`] — reference agglomerative clustering; repeatedly merges
//!   mutual nearest neighbors found by scanning the active set.
//! - [`Tlas::build_quick`] — sorts the instances, bisects them into 8
//!   contiguous chunks, clusters the chunks in parallel (each with its own
//!   kD-tree and its own region of the node pool) and stitches the 8
//!   sub-roots under a fixed three-level top.
//!
//! Interior nodes pack their two children into one `u32` (16 bits each);
//! `left_right == 0` marks a leaf. Real leaves never live at slot 0, the
//! root.

use std::cmp::Ordering;
use std::mem;

use bytemuck::{zeroed_vec, Pod, Zeroable};
use glam::{Vec3, Vec3A};

use crate::aabb::Aabb;
use crate::instance::Instance;
use crate::kdtree::KdTree;
use crate::par::Scheduler;
use crate::ray::{Ray, MISS};
use crate::{scope_print, BuildError, MAX_INSTANCES};

use crate::bvh::STACK_DEPTH;

/// Number of chunks the parallel builder clusters independently. The stitch
/// topology in [`Tlas::build_quick`] is written for exactly this fan-out.
pub const QUICK_FAN_OUT: usize = 8;

/// First pool slot available to chunk regions; slots below hold the root and
/// the stitched top of the tree.
const QUICK_CHUNK_BASE: usize = 32;

/// A 32-byte TLAS node. Leaves reference an instance through `blas`;
/// interior nodes pack two 16-bit child indices into `left_right`.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
#[repr(C, align(32))]
pub struct TlasNode {
    pub aabb_min: Vec3,
    /// Packed child pair, see [`TlasNode::pack_children`]. 0 marks a leaf.
    pub left_right: u32,
    pub aabb_max: Vec3,
    /// Leaf payload: instance index.
    pub blas: u32,
}

unsafe impl Pod for TlasNode {}
unsafe impl Zeroable for TlasNode {}

impl TlasNode {
    #[inline(always)]
    pub fn leaf(bounds: Aabb, instance: u32) -> Self {
        TlasNode {
            aabb_min: bounds.min.into(),
            left_right: 0,
            aabb_max: bounds.max.into(),
            blas: instance,
        }
    }

    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.left_right == 0
    }

    #[inline(always)]
    pub fn left(&self) -> u32 {
        self.left_right & 0xffff
    }

    #[inline(always)]
    pub fn right(&self) -> u32 {
        self.left_right >> 16
    }

    /// Packs two child indices into the 16-bit halves of one `u32`. The left
    /// child can never be slot 0 (the root), which keeps 0 free as the leaf
    /// marker.
    #[inline(always)]
    pub fn pack_children(left: u32, right: u32) -> u32 {
        debug_assert!(left != 0 && left < 1 << 16);
        debug_assert!(right < 1 << 16);
        left | (right << 16)
    }

    #[inline(always)]
    pub fn min(&self) -> Vec3A {
        self.aabb_min.into()
    }

    #[inline(always)]
    pub fn max(&self) -> Vec3A {
        self.aabb_max.into()
    }

    #[inline(always)]
    pub fn bounds(&self) -> Aabb {
        Aabb {
            min: self.min(),
            max: self.max(),
        }
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

#[derive(Clone, Copy, Default)]
struct SortItem {
    pos: f32,
    inst: u32,
}

/// One chunk of the parallel build: a disjoint region of the node pool
/// (leaves first, then clustering scratch) plus the kD-tree covering it.
struct ChunkTask<'a> {
    nodes: &'a mut [TlasNode],
    tree: &'a mut KdTree,
    base: u32,
    leaf_count: usize,
    sub_root: TlasNode,
}

pub struct Tlas {
    instances: Vec<Instance>,
    nodes: Vec<TlasNode>,
    nodes_used: u32,
    /// Backend used by [`Tlas::build_quick`].
    pub scheduler: Scheduler,
    // Retained build_quick scratch, allocated on first use.
    sort_items: Vec<SortItem>,
    chunk_trees: Vec<KdTree>,
}

impl Tlas {
    pub fn new(instances: Vec<Instance>) -> Self {
        Tlas {
            instances,
            nodes: Vec::new(),
            nodes_used: 0,
            scheduler: Scheduler::default(),
            sort_items: Vec::new(),
            chunk_trees: Vec::new(),
        }
    }

    /// Reference builder: agglomerative clustering over the full active set.
    pub fn build(&mut self) -> Result<(), BuildError> {
        scope_print!("tlas build");
        let n = self.prepare_pool()?;
        if n == 0 {
            return Ok(());
        }

        // one leaf per instance, starting at slot 1
        let mut node_idx: Vec<u32> = Vec::with_capacity(n);
        let mut nodes_used = 1u32;
        for (i, inst) in self.instances.iter().enumerate() {
            node_idx.push(nodes_used);
            self.nodes[nodes_used as usize] = TlasNode::leaf(inst.bounds, i as u32);
            nodes_used += 1;
        }

        // repeatedly merge mutual nearest neighbors under the merge-area metric
        let mut active = n;
        let mut a = 0usize;
        let mut b = if active > 1 {
            self.find_best_match(&node_idx[..active], a)
        } else {
            0
        };
        while active > 1 {
            let c = self.find_best_match(&node_idx[..active], b);
            if a == c {
                let (ia, ib) = (node_idx[a], node_idx[b]);
                let bounds = self.nodes[ia as usize]
                    .bounds()
                    .union(&self.nodes[ib as usize].bounds());
                self.nodes[nodes_used as usize] = TlasNode {
                    aabb_min: bounds.min.into(),
                    left_right: TlasNode::pack_children(ia, ib),
                    aabb_max: bounds.max.into(),
                    blas: 0,
                };
                node_idx[a] = nodes_used;
                nodes_used += 1;
                node_idx[b] = node_idx[active - 1];
                active -= 1;
                if a == active {
                    a = b;
                }
                if active > 1 {
                    b = self.find_best_match(&node_idx[..active], a);
                }
            } else {
                a = b;
                b = c;
            }
        }
        self.nodes[0] = self.nodes[node_idx[a] as usize];
        self.nodes_used = nodes_used;
        Ok(())
    }

    /// Parallel builder: pre-splits the instances into [`QUICK_FAN_OUT`]
    /// sorted chunks, clusters each chunk independently and stitches the
    /// sub-roots. The pre-split bounds tree quality from above relative to
    /// [`Tlas::build`]; hit results are identical for both.
    pub fn build_quick(&mut self) -> Result<(), BuildError> {
        scope_print!("tlas build_quick");
        let n = self.instances.len();
        if n < QUICK_FAN_OUT {
            // the fixed stitch needs 8 non-empty chunks
            return self.build();
        }
        self.prepare_pool()?;

        // 1. sort by world-bounds midpoint, recursively bisected to depth 3
        self.sort_items.clear();
        self.sort_items
            .extend((0..n as u32).map(|inst| SortItem { pos: 0.0, inst }));
        let mut chunk_len = [0usize; QUICK_FAN_OUT];
        sort_and_split(&mut self.sort_items, &self.instances, 0, &mut chunk_len);

        // 2. write each chunk's leaves into its own region of the pool;
        //    regions are contiguous (leaves, then clustering scratch) so the
        //    workers can own disjoint slices
        if self.chunk_trees.len() != QUICK_FAN_OUT {
            self.chunk_trees = (0..QUICK_FAN_OUT).map(|_| KdTree::new()).collect();
        }
        let Tlas {
            instances,
            nodes,
            chunk_trees,
            sort_items,
            scheduler,
            ..
        } = self;
        let mut tasks: Vec<ChunkTask> = Vec::with_capacity(QUICK_FAN_OUT);
        let (top, mut rest) = nodes.split_at_mut(QUICK_CHUNK_BASE);
        let mut base = QUICK_CHUNK_BASE;
        let mut item = 0usize;
        for (tree, &k) in chunk_trees.iter_mut().zip(chunk_len.iter()) {
            let (region, tail) = rest.split_at_mut(2 * k - 1);
            rest = tail;
            for (slot, it) in region[..k].iter_mut().zip(&sort_items[item..item + k]) {
                let inst = &instances[it.inst as usize];
                *slot = TlasNode::leaf(inst.bounds, it.inst);
            }
            tasks.push(ChunkTask {
                nodes: region,
                tree,
                base: base as u32,
                leaf_count: k,
                sub_root: TlasNode::default(),
            });
            base += 2 * k - 1;
            item += k;
        }

        // 3. cluster the 8 chunks in parallel
        scheduler.par_map(&mut tasks, &|_, task: &mut ChunkTask<'_>| cluster_chunk(task));

        // 4. join the resulting trees; every stitch slot lives in the
        //    reserved top of the pool
        for (i, task) in tasks.iter().enumerate() {
            top[7 + i] = task.sub_root;
        }
        create_parent(top, 3, 7, 8);
        create_parent(top, 4, 9, 10);
        create_parent(top, 5, 11, 12);
        create_parent(top, 6, 13, 14);
        create_parent(top, 1, 3, 4);
        create_parent(top, 2, 5, 6);
        create_parent(top, 0, 1, 2);
        // watermark; only the subtree reachable from the root matters
        self.nodes_used = self.nodes.len() as u32;
        Ok(())
    }

    /// Finds the nearest instance hit. Shaped like the BLAS traversal, with
    /// children decoded from the packed pair and leaves delegating to
    /// [`Instance::intersect`].
    pub fn intersect(&self, ray: &mut Ray) {
        crate::scope!("tlas intersect");
        if self.nodes.is_empty() {
            return;
        }
        // keep the reciprocal directions consistent with however the ray was
        // put together
        let direction = ray.direction;
        ray.set_direction(direction);

        let mut stack = [0u32; STACK_DEPTH];
        let mut stack_ptr = 0usize;
        let mut node = &self.nodes[0];
        loop {
            if node.is_leaf() {
                self.instances[node.blas as usize].intersect(ray);
                if stack_ptr == 0 {
                    break;
                }
                stack_ptr -= 1;
                node = &self.nodes[stack[stack_ptr] as usize];
                continue;
            }
            let mut child1 = node.left();
            let mut child2 = node.right();
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

    #[inline(always)]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Mutable instance access, e.g. for [`Instance::set_transform`]; follow
    /// up with a rebuild.
    #[inline(always)]
    pub fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }

    #[inline(always)]
    pub fn nodes(&self) -> &[TlasNode] {
        &self.nodes
    }

    #[inline(always)]
    pub fn nodes_used(&self) -> u32 {
        self.nodes_used
    }

    /// Validates the instance count and sizes the pool: `2N` covers the
    /// binary tree, the slack covers the reserved stitch slots of the
    /// parallel builder.
    fn prepare_pool(&mut self) -> Result<usize, BuildError> {
        let n = self.instances.len();
        if n > MAX_INSTANCES {
            self.nodes.clear();
            self.nodes_used = 0;
            return Err(BuildError::TooManyInstances(n));
        }
        if n == 0 {
            self.nodes.clear();
            self.nodes_used = 0;
            return Ok(0);
        }
        let pool_size = 2 * n + 64;
        if self.nodes.len() != pool_size {
            self.nodes = zeroed_vec(pool_size);
        } else {
            self.nodes.fill(TlasNode::default());
        }
        Ok(n)
    }

    /// Index into `node_idx` of the active node that forms the smallest box
    /// when joined with `node_idx[a]`.
    fn find_best_match(&self, node_idx: &[u32], a: usize) -> usize {
        let abox = self.nodes[node_idx[a] as usize].bounds();
        let mut smallest = f32::MAX;
        let mut best = a;
        for (b, &ib) in node_idx.iter().enumerate() {
            if b == a {
                continue;
            }
            let sa = abox.union(&self.nodes[ib as usize].bounds()).half_area();
            if sa < smallest {
                smallest = sa;
                best = b;
            }
        }
        best
    }
}

/// Sorts `items` by instance-bounds midpoint along `level % 3`, then bisects
/// until depth 3 fills the 8 chunk lengths (chunks stay contiguous in the
/// sorted order).
fn sort_and_split(
    items: &mut [SortItem],
    instances: &[Instance],
    level: usize,
    chunk_len: &mut [usize],
) {
    let axis = level % 3;
    for item in items.iter_mut() {
        item.pos = instances[item.inst as usize].bounds.center_axis(axis);
    }
    items.sort_unstable_by(|x, y| x.pos.partial_cmp(&y.pos).unwrap_or(Ordering::Equal));
    let mid = items.len().div_ceil(2);
    let (left, right) = items.split_at_mut(mid);
    if level < 2 {
        let half = chunk_len.len() / 2;
        let (cl, cr) = chunk_len.split_at_mut(half);
        sort_and_split(left, instances, level + 1, cl);
        sort_and_split(right, instances, level + 1, cr);
    } else {
        chunk_len[0] = left.len();
        chunk_len[1] = right.len();
    }
}

/// The reference clustering loop restricted to one chunk's leaves, with the
/// kD-tree answering the nearest-neighbor queries. Scratch nodes go to the
/// upper half of the chunk's region; the final merge is the sub-root.
fn cluster_chunk(task: &mut ChunkTask) {
    crate::scope!("cluster chunk");
    let k = task.leaf_count;
    if k == 1 {
        task.sub_root = task.nodes[0];
        return;
    }
    task.tree.rebuild(task.nodes, task.base, k);
    let base = task.base;
    let mut node_ptr = k as u32;
    let mut work_left = k;
    let mut a = base;
    let (mut b, _) = task.tree.find_nearest(task.nodes, a);
    loop {
        let (c, _) = task.tree.find_nearest(task.nodes, b);
        if a == c {
            let (la, lb) = ((a - base) as usize, (b - base) as usize);
            let bounds = task.nodes[la].bounds().union(&task.nodes[lb].bounds());
            task.nodes[node_ptr as usize] = TlasNode {
                aabb_min: bounds.min.into(),
                left_right: TlasNode::pack_children(a, b),
                aabb_max: bounds.max.into(),
                blas: 0,
            };
            if work_left == 2 {
                break;
            }
            work_left -= 1;
            task.tree.remove_leaf(a);
            task.tree.remove_leaf(b);
            a = base + node_ptr;
            task.tree.add(task.nodes, a);
            node_ptr += 1;
            b = task.tree.find_nearest(task.nodes, a).0;
        } else {
            a = b;
            b = c;
        }
    }
    task.sub_root = task.nodes[node_ptr as usize];
}

fn create_parent(nodes: &mut [TlasNode], idx: usize, left: u32, right: u32) {
    let bounds = nodes[left as usize]
        .bounds()
        .union(&nodes[right as usize].bounds());
    nodes[idx] = TlasNode {
        aabb_min: bounds.min.into(),
        left_right: TlasNode::pack_children(left, right),
        aabb_max: bounds.max.into(),
        blas: 0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{geometry::unit_triangle_at, random_instances};
    use glam::{vec3a, Mat4, Vec3A};
    use std::sync::Arc;

    use crate::bvh::Bvh;
    use crate::mesh::Mesh;

    fn shared_bvh() -> Arc<Bvh> {
        Arc::new(Bvh::build(Mesh::from_triangles(vec![unit_triangle_at(Vec3A::ZERO)])).unwrap())
    }

    fn brute_force(instances: &[Instance], mut ray: Ray) -> crate::ray::Hit {
        for inst in instances {
            inst.intersect(&mut ray);
        }
        ray.hit
    }

    /// Collects the instance of every leaf reachable from the root and
    /// checks the boxes grow monotonically toward it.
    fn collect_leaves(tlas: &Tlas, idx: u32, leaves: &mut Vec<u32>) {
        let node = tlas.nodes()[idx as usize];
        if node.is_leaf() {
            leaves.push(node.blas);
            return;
        }
        for child in [node.left(), node.right()] {
            let c = tlas.nodes()[child as usize];
            assert!(node.bounds().contains_aabb(&c.bounds()));
            collect_leaves(tlas, child, leaves);
        }
    }

    #[test]
    fn left_right_packing_round_trip() {
        let node = TlasNode {
            left_right: TlasNode::pack_children(31, 65535),
            ..Default::default()
        };
        assert!(!node.is_leaf());
        assert_eq!(node.left(), 31);
        assert_eq!(node.right(), 65535);
    }

    #[test]
    fn two_instances_nearest_wins() {
        let bvh = shared_bvh();
        let instances = vec![
            Instance::new(bvh.clone(), 0, Mat4::from_translation(vec3a(0.0, 0.0, 5.0).into())),
            Instance::new(bvh, 1, Mat4::from_translation(vec3a(0.0, 0.0, -5.0).into())),
        ];
        let mut tlas = Tlas::new(instances);
        tlas.build().unwrap();

        let mut ray = Ray::new(vec3a(0.25, 0.25, 0.0), vec3a(0.0, 0.0, 1.0));
        tlas.intersect(&mut ray);
        assert!((ray.hit.t - 5.0).abs() < 1e-5);
        assert_eq!(ray.hit.instance(), 0);

        let mut ray = Ray::new(vec3a(0.25, 0.25, 0.0), vec3a(0.0, 0.0, -1.0));
        tlas.intersect(&mut ray);
        assert!((ray.hit.t - 5.0).abs() < 1e-5);
        assert_eq!(ray.hit.instance(), 1);
    }

    #[test]
    fn moved_instance_is_rehit_after_rebuild() {
        let bvh = shared_bvh();
        // a row of instances along x; the probe ray only ever sees the first
        let instances: Vec<Instance> = (0..16)
            .map(|i| {
                let t = Mat4::from_translation(vec3a(i as f32 * 3.0, 0.0, 5.0).into());
                Instance::new(bvh.clone(), i, t)
            })
            .collect();
        let mut tlas = Tlas::new(instances);
        tlas.build().unwrap();

        let probe = |tlas: &Tlas| {
            let mut ray = Ray::new(vec3a(0.25, 0.25, 0.0), vec3a(0.0, 0.0, 1.0));
            tlas.intersect(&mut ray);
            ray.hit
        };
        let hit = probe(&tlas);
        assert_eq!(hit.instance(), 0);
        assert!((hit.t - 5.0).abs() < 1e-5);

        // pull the first instance closer; the reference rebuild must see it
        tlas.instances_mut()[0]
            .set_transform(Mat4::from_translation(vec3a(0.0, 0.0, 2.0).into()));
        tlas.build().unwrap();
        let hit = probe(&tlas);
        assert_eq!(hit.instance(), 0);
        assert!((hit.t - 2.0).abs() < 1e-5);

        // push it away again; so must the parallel rebuild
        tlas.instances_mut()[0]
            .set_transform(Mat4::from_translation(vec3a(0.0, 0.0, 7.0).into()));
        tlas.build_quick().unwrap();
        let hit = probe(&tlas);
        assert_eq!(hit.instance(), 0);
        assert!((hit.t - 7.0).abs() < 1e-5);
    }

    #[test]
    fn empty_scene_misses() {
        let mut tlas = Tlas::new(Vec::new());
        tlas.build().unwrap();
        tlas.build_quick().unwrap();
        let mut ray = Ray::new(Vec3A::ZERO, vec3a(0.0, 0.0, 1.0));
        tlas.intersect(&mut ray);
        assert!(!ray.hit.is_hit());
    }

    #[test]
    fn reference_build_matches_brute_force() {
        let bvh = shared_bvh();
        let mut tlas = Tlas::new(random_instances(bvh, 100, 15.0, 40));
        tlas.build().unwrap();
        for k in 0..128 {
            let f = k as f32 / 128.0;
            let origin = vec3a(30.0 * f - 15.0, 20.0, 18.0);
            let dir = (vec3a(0.0, 0.0, 30.0 * f - 15.0) - origin).normalize();
            let mut ray = Ray::new(origin, dir);
            tlas.intersect(&mut ray);
            let expected = brute_force(tlas.instances(), Ray::new(origin, dir));
            assert_eq!(ray.hit.is_hit(), expected.is_hit());
            if expected.is_hit() {
                assert_eq!(ray.hit.inst_prim, expected.inst_prim);
                assert!((ray.hit.t - expected.t).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn quick_build_structure_is_valid() {
        let bvh = shared_bvh();
        let n = 257; // odd count; chunks end up uneven
        let mut tlas = Tlas::new(random_instances(bvh, n, 25.0, 41));
        tlas.build_quick().unwrap();

        let mut leaves = Vec::new();
        collect_leaves(&tlas, 0, &mut leaves);
        leaves.sort_unstable();
        let expected: Vec<u32> = (0..n as u32).collect();
        assert_eq!(leaves, expected);
    }

    #[test]
    fn quick_and_reference_builds_agree_on_hits() {
        let bvh = shared_bvh();
        let instances = random_instances(bvh, 1024, 40.0, 42);

        let mut reference = Tlas::new(instances.clone());
        reference.build().unwrap();
        let mut quick = Tlas::new(instances);
        quick.build_quick().unwrap();

        // same leaf set
        let mut leaves = Vec::new();
        collect_leaves(&quick, 0, &mut leaves);
        leaves.sort_unstable();
        assert_eq!(leaves, (0..1024).collect::<Vec<u32>>());

        // same hit decisions
        for k in 0..256 {
            let f = k as f32 / 256.0;
            let origin = vec3a(80.0 * f - 40.0, 55.0, 50.0);
            let dir = (vec3a(40.0 - 80.0 * f, 0.0, 0.0) - origin).normalize();
            let mut r1 = Ray::new(origin, dir);
            reference.intersect(&mut r1);
            let mut r2 = Ray::new(origin, dir);
            quick.intersect(&mut r2);
            assert_eq!(r1.hit.is_hit(), r2.hit.is_hit());
            if r1.hit.is_hit() {
                assert_eq!(r1.hit.inst_prim, r2.hit.inst_prim);
                assert!((r1.hit.t - r2.hit.t).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn quick_build_small_scene_falls_back() {
        let bvh = shared_bvh();
        let mut tlas = Tlas::new(random_instances(bvh, 5, 10.0, 43));
        tlas.scheduler = Scheduler::Sequential;
        tlas.build_quick().unwrap();
        let mut leaves = Vec::new();
        collect_leaves(&tlas, 0, &mut leaves);
        leaves.sort_unstable();
        assert_eq!(leaves, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn sequential_and_rayon_backends_agree() {
        let bvh = shared_bvh();
        let instances = random_instances(bvh, 200, 20.0, 44);
        let mut seq = Tlas::new(instances.clone());
        seq.scheduler = Scheduler::Sequential;
        seq.build_quick().unwrap();
        let mut par = Tlas::new(instances);
        par.scheduler = Scheduler::Rayon;
        par.build_quick().unwrap();
        assert_eq!(seq.nodes(), par.nodes());
    }

    #[test]
    fn too_many_instances_rejected() {
        let bvh = shared_bvh();
        let inst = Instance::new(bvh, 0, Mat4::IDENTITY);
        let instances = vec![inst; MAX_INSTANCES + 1];
        let mut tlas = Tlas::new(instances);
        assert_eq!(
            tlas.build().err(),
            Some(BuildError::TooManyInstances(MAX_INSTANCES + 1))
        );
        let mut ray = Ray::new(Vec3A::ZERO, vec3a(0.0, 0.0, 1.0));
        tlas.intersect(&mut ray);
        assert!(!ray.hit.is_hit());
    }
}
