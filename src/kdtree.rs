//! A kD-tree over TLAS leaf boxes, used to answer "which other leaf is the
//! cheapest to merge with this one" during agglomerative clustering without
//! scanning every active leaf.
//!
//! The tree covers one contiguous region of the TLAS node pool. Leaves store
//! pool indices; interior nodes carry a conservative box over every active
//! leaf box below them, which gives the branch-and-bound search a lower bound
//! on the achievable merge cost. The split axis/position recorded at
//! construction only steers which child is visited first; correctness comes
//! from the bound alone, so [`KdTree::find_nearest`] always returns the same
//! argmin an exhaustive scan under [`Aabb::half_area`] would.

use glam::Vec3A;

use crate::aabb::Aabb;
use crate::tlas::TlasNode;
use crate::INVALID;

#[derive(Clone, Copy, Debug)]
struct KdNode {
    /// Conservative box over every active leaf box in the subtree.
    bounds: Aabb,
    /// First child; the sibling sits at `left + 1`. [`INVALID`] marks a leaf.
    left: u32,
    parent: u32,
    /// Leaf payload: TLAS pool slot relative to the region base.
    item: u32,
    /// Near-child ordering hints from the last split of this slot.
    axis: usize,
    split: f32,
}

impl KdNode {
    fn blank(parent: u32) -> Self {
        KdNode {
            bounds: Aabb::empty(),
            left: INVALID,
            parent,
            item: INVALID,
            axis: 0,
            split: 0.0,
        }
    }

    #[inline(always)]
    fn is_leaf(&self) -> bool {
        self.left == INVALID
    }
}

/// Smallest half-area any box inside `b` can reach when unioned with `q`:
/// extend `q` by the per-axis gaps separating it from `b`.
#[inline(always)]
fn merge_lower_bound(q: &Aabb, b: &Aabb) -> f32 {
    let gap = (b.min - q.max).max(q.min - b.max).max(Vec3A::ZERO);
    let d = (q.max - q.min) + gap;
    (d.x + d.y) * d.z + d.x * d.y
}

#[inline(always)]
fn dominant_axis(d: Vec3A) -> usize {
    if d.y > d.x {
        if d.z > d.y {
            2
        } else {
            1
        }
    } else if d.z > d.x {
        2
    } else {
        0
    }
}

#[derive(Default)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    /// kd leaf holding each pool slot of the region, [`INVALID`] when absent.
    leaf_of: Vec<u32>,
    /// Pool index of the first slot of the covered region.
    base: u32,
}

impl KdTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Static median-split rebuild over `pool[0..leaf_count]`. `pool` is the
    /// region of the TLAS node pool this tree covers and `base` the pool
    /// index of its first slot; nodes added later may use any slot of the
    /// region. Allocations are retained across rebuilds.
    pub fn rebuild(&mut self, pool: &[TlasNode], base: u32, leaf_count: usize) {
        self.base = base;
        self.nodes.clear();
        self.leaf_of.clear();
        self.leaf_of.resize(pool.len(), INVALID);
        if leaf_count == 0 {
            return;
        }
        let mut items: Vec<u32> = (0..leaf_count as u32).collect();
        self.nodes.push(KdNode::blank(INVALID));
        self.build_into(0, pool, &mut items);
    }

    fn build_into(&mut self, idx: u32, pool: &[TlasNode], items: &mut [u32]) {
        let mut bounds = Aabb::empty();
        let mut centroids = Aabb::empty();
        for &slot in items.iter() {
            let b = pool[slot as usize].bounds();
            bounds = bounds.union(&b);
            centroids.extend(b.center());
        }
        self.nodes[idx as usize].bounds = bounds;
        if let [slot] = *items {
            self.nodes[idx as usize].item = slot;
            self.leaf_of[slot as usize] = idx;
            return;
        }
        let axis = dominant_axis(centroids.diagonal());
        let mid = items.len() / 2;
        items.select_nth_unstable_by(mid, |&a, &b| {
            let ca = pool[a as usize].bounds().center_axis(axis);
            let cb = pool[b as usize].bounds().center_axis(axis);
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });
        let split = pool[items[mid] as usize].bounds().center_axis(axis);

        let left = self.nodes.len() as u32;
        self.nodes.push(KdNode::blank(idx));
        self.nodes.push(KdNode::blank(idx));
        let node = &mut self.nodes[idx as usize];
        node.left = left;
        node.axis = axis;
        node.split = split;

        let (left_items, right_items) = items.split_at_mut(mid);
        self.build_into(left, pool, left_items);
        self.build_into(left + 1, pool, right_items);
    }

    /// Returns the active leaf (as a pool index) whose box is cheapest to
    /// merge with `query`'s box, together with that half-area cost. The query
    /// leaf itself never matches. At least one other leaf must be active.
    pub fn find_nearest(&self, pool: &[TlasNode], query: u32) -> (u32, f32) {
        debug_assert!(!self.nodes.is_empty());
        let slot = query - self.base;
        let q = pool[slot as usize].bounds();
        let mut best = (INVALID, f32::MAX);
        self.search(0, pool, &q, slot, &mut best);
        debug_assert_ne!(best.0, INVALID);
        (self.base + best.0, best.1)
    }

    fn search(&self, idx: u32, pool: &[TlasNode], q: &Aabb, exclude: u32, best: &mut (u32, f32)) {
        let node = &self.nodes[idx as usize];
        if merge_lower_bound(q, &node.bounds) >= best.1 {
            return;
        }
        if node.is_leaf() {
            if node.item != exclude {
                let sa = q.union(&pool[node.item as usize].bounds()).half_area();
                if sa < best.1 {
                    *best = (node.item, sa);
                }
            }
            return;
        }
        let (near, far) = if q.center_axis(node.axis) < node.split {
            (node.left, node.left + 1)
        } else {
            (node.left + 1, node.left)
        };
        self.search(near, pool, q, exclude, best);
        self.search(far, pool, q, exclude, best);
    }

    /// Deactivates the leaf holding pool index `node`. Its sibling subtree is
    /// folded into the parent slot and every ancestor box is contracted.
    pub fn remove_leaf(&mut self, node: u32) {
        let slot = (node - self.base) as usize;
        let kd = self.leaf_of[slot];
        debug_assert_ne!(kd, INVALID);
        self.leaf_of[slot] = INVALID;
        if kd == 0 {
            // last leaf; the tree is empty now
            self.nodes.clear();
            return;
        }

        let parent = self.nodes[kd as usize].parent;
        let first = self.nodes[parent as usize].left;
        let sibling = if kd == first { first + 1 } else { first };

        let grandparent = self.nodes[parent as usize].parent;
        let mut moved = self.nodes[sibling as usize];
        moved.parent = grandparent;
        self.nodes[parent as usize] = moved;
        if moved.is_leaf() {
            self.leaf_of[moved.item as usize] = parent;
        } else {
            self.nodes[moved.left as usize].parent = parent;
            self.nodes[moved.left as usize + 1].parent = parent;
        }

        // The folded subtree's box is already tight; contract the ancestors.
        let mut idx = grandparent;
        while idx != INVALID {
            let n = self.nodes[idx as usize];
            let bounds = self.nodes[n.left as usize]
                .bounds
                .union(&self.nodes[n.left as usize + 1].bounds);
            self.nodes[idx as usize].bounds = bounds;
            idx = n.parent;
        }
    }

    /// Activates pool index `node` by descending to the leaf whose box grows
    /// least and splitting it into a two-child interior node.
    pub fn add(&mut self, pool: &[TlasNode], node: u32) {
        if self.leaf_of.len() < pool.len() {
            self.leaf_of.resize(pool.len(), INVALID);
        }
        let slot = node - self.base;
        let b = pool[slot as usize].bounds();
        if self.nodes.is_empty() {
            self.nodes.push(KdNode::blank(INVALID));
            self.nodes[0].bounds = b;
            self.nodes[0].item = slot;
            self.leaf_of[slot as usize] = 0;
            return;
        }

        let mut idx = 0u32;
        loop {
            let n = self.nodes[idx as usize];
            self.nodes[idx as usize].bounds = n.bounds.union(&b);
            if n.is_leaf() {
                break;
            }
            let l = &self.nodes[n.left as usize];
            let r = &self.nodes[n.left as usize + 1];
            let grow_l = l.bounds.union(&b).half_area() - l.bounds.half_area();
            let grow_r = r.bounds.union(&b).half_area() - r.bounds.half_area();
            idx = if grow_l <= grow_r { n.left } else { n.left + 1 };
        }

        // split the leaf: the old payload and the new one become a child pair
        let old_item = self.nodes[idx as usize].item;
        let old_bounds = pool[old_item as usize].bounds();
        let co = old_bounds.center();
        let cn = b.center();
        let axis = dominant_axis((co - cn).abs());
        let (first, second) = if cn[axis] < co[axis] {
            (slot, old_item)
        } else {
            (old_item, slot)
        };

        let left = self.nodes.len() as u32;
        let mut l = KdNode::blank(idx);
        l.bounds = pool[first as usize].bounds();
        l.item = first;
        let mut r = KdNode::blank(idx);
        r.bounds = pool[second as usize].bounds();
        r.item = second;
        self.nodes.push(l);
        self.nodes.push(r);

        let node = &mut self.nodes[idx as usize];
        node.left = left;
        node.item = INVALID;
        node.axis = axis;
        node.split = (co[axis] + cn[axis]) * 0.5;
        self.leaf_of[first as usize] = left;
        self.leaf_of[second as usize] = left + 1;
    }
}
