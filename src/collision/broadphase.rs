use std::collections::HashMap;
use std::hash::Hash;

use crate::{
    collision::queries::RaycastHit,
    config::DEFAULT_BOUNDS_MARGIN,
    core::{aabb::Aabb, types::Ray2D},
    utils::allocator::{Arena, Handle},
};

/// Stand-in length for rays cast without a finite limit.
const UNBOUNDED_RAY: f32 = 1.0e9;

#[derive(Debug, Clone)]
struct TreeNode<K> {
    bounds: Aabb,
    parent: Option<Handle>,
    children: Option<[Handle; 2]>,
    key: Option<K>,
}

impl<K> TreeNode<K> {
    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Incremental bounding-volume tree used by the broad phase.
///
/// Leaves store bounds grown by a fixed margin, so small motions never touch
/// the tree structure. Internal nodes always bound exactly the union of their
/// two children.
pub struct AabbTree<K> {
    nodes: Arena<TreeNode<K>>,
    root: Option<Handle>,
    leaves: HashMap<K, Handle>,
    margin: f32,
}

impl<K: Copy + Eq + Hash> Default for AabbTree<K> {
    fn default() -> Self {
        Self::new(DEFAULT_BOUNDS_MARGIN)
    }
}

impl<K: Copy + Eq + Hash> AabbTree<K> {
    pub fn new(margin: f32) -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            leaves: HashMap::new(),
            margin,
        }
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn set_margin(&mut self, margin: f32) {
        self.margin = margin;
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.leaves.contains_key(&key)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.leaves.clear();
        self.root = None;
    }

    /// Loose bounds stored for `key`.
    pub fn leaf_bounds(&self, key: K) -> Option<Aabb> {
        let leaf = self.leaves.get(&key)?;
        self.nodes.get(*leaf).map(|node| node.bounds)
    }

    /// Adds a leaf for `key` with the given tight bounds. A key that is already
    /// present is updated instead.
    pub fn insert(&mut self, key: K, tight: Aabb) {
        if self.leaves.contains_key(&key) {
            log::warn!("AABB tree: key inserted twice, updating instead");
            self.update(key, tight);
            return;
        }

        let leaf = self.nodes.insert(TreeNode {
            bounds: tight.expanded(self.margin),
            parent: None,
            children: None,
            key: Some(key),
        });
        self.leaves.insert(key, leaf);
        self.insert_leaf(leaf);
    }

    /// Removes the leaf for `key`. Unknown keys are ignored.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(leaf) = self.leaves.remove(&key) else {
            return false;
        };
        self.detach_leaf(leaf);
        self.nodes.remove(leaf);
        true
    }

    /// Re-inserts `key` only if `tight` escaped its loose bounds.
    ///
    /// Returns whether the tree changed.
    pub fn update(&mut self, key: K, tight: Aabb) -> bool {
        let Some(&leaf) = self.leaves.get(&key) else {
            return false;
        };
        match self.nodes.get_mut(leaf) {
            Some(node) if node.bounds.contains(&tight) => return false,
            Some(node) => node.bounds = tight.expanded(self.margin),
            None => return false,
        }

        self.detach_leaf(leaf);
        self.insert_leaf(leaf);
        true
    }

    /// Visits every leaf whose loose bounds overlap `bounds`, left before right.
    /// The visitor returns `true` to stop the walk.
    pub fn query<F>(&self, bounds: &Aabb, mut visitor: F)
    where
        F: FnMut(K) -> bool,
    {
        let mut stack: Vec<Handle> = self.root.into_iter().collect();
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if !node.bounds.overlaps(bounds) {
                continue;
            }

            if node.is_leaf() {
                if let Some(key) = node.key {
                    if visitor(key) {
                        return;
                    }
                }
            } else if let Some([left, right]) = node.children {
                stack.push(right);
                stack.push(left);
            }
        }
    }

    /// Nearest hit along `ray` within `max_distance`.
    ///
    /// `hit_test` casts against the leaf's shape. Children are visited nearest
    /// first and skipped once they cannot beat the best hit.
    pub fn raycast<F>(&self, ray: &Ray2D, max_distance: f32, mut hit_test: F) -> Option<RaycastHit>
    where
        F: FnMut(K) -> Option<RaycastHit>,
    {
        let root = self.root?;
        let mut best_distance = if max_distance.is_finite() {
            max_distance
        } else {
            UNBOUNDED_RAY
        };
        let mut best = None;
        self.raycast_node(root, ray, &mut best_distance, &mut best, &mut hit_test);
        best
    }

    fn raycast_node<F>(
        &self,
        handle: Handle,
        ray: &Ray2D,
        best_distance: &mut f32,
        best: &mut Option<RaycastHit>,
        hit_test: &mut F,
    ) where
        F: FnMut(K) -> Option<RaycastHit>,
    {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };

        if node.is_leaf() {
            if let Some(hit) = node.key.and_then(|key| hit_test(key)) {
                if hit.distance < *best_distance {
                    *best_distance = hit.distance;
                    *best = Some(hit);
                }
            }
            return;
        }
        let Some([left, right]) = node.children else {
            return;
        };

        let end = ray.point_at(*best_distance);
        let distance_to = |child: Handle| {
            self.nodes
                .get(child)
                .map_or(f32::MAX, |n| n.bounds.segment_distance(ray.origin(), end))
        };
        let (d_left, d_right) = (distance_to(left), distance_to(right));
        let order = if d_left < d_right {
            [(left, d_left), (right, d_right)]
        } else {
            [(right, d_right), (left, d_left)]
        };

        for (child, distance) in order {
            if distance < *best_distance {
                self.raycast_node(child, ray, best_distance, best, hit_test);
            }
        }
    }

    /// Number of levels below the root, zero for a single leaf.
    pub fn height(&self) -> usize {
        fn depth<K>(nodes: &Arena<TreeNode<K>>, handle: Handle) -> usize {
            match nodes.get(handle).and_then(|n| n.children) {
                Some([l, r]) => 1 + depth(nodes, l).max(depth(nodes, r)),
                None => 0,
            }
        }
        self.root.map_or(0, |root| depth(&self.nodes, root))
    }

    /// Checks parent links, the leaf map, and that every internal node bounds
    /// exactly the union of its children.
    pub fn validate(&self) -> bool {
        let Some(root) = self.root else {
            return self.leaves.is_empty() && self.nodes.is_empty();
        };
        if self.nodes.get(root).map_or(true, |n| n.parent.is_some()) {
            return false;
        }

        let mut leaf_count = 0;
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                return false;
            };
            match (node.children, node.key) {
                (Some([l, r]), None) => {
                    let (Some(left), Some(right)) = (self.nodes.get(l), self.nodes.get(r)) else {
                        return false;
                    };
                    if left.parent != Some(handle) || right.parent != Some(handle) {
                        return false;
                    }
                    if node.bounds != left.bounds.merged(&right.bounds) {
                        return false;
                    }
                    stack.push(l);
                    stack.push(r);
                }
                (None, Some(key)) => {
                    if self.leaves.get(&key) != Some(&handle) {
                        return false;
                    }
                    leaf_count += 1;
                }
                _ => return false,
            }
        }
        leaf_count > 0
            && leaf_count == self.leaves.len()
            && self.nodes.len() == 2 * leaf_count - 1
    }

    fn insert_leaf(&mut self, leaf: Handle) {
        let Some(bounds) = self.nodes.get(leaf).map(|n| n.bounds) else {
            return;
        };
        let Some(root) = self.root else {
            if let Some(node) = self.nodes.get_mut(leaf) {
                node.parent = None;
            }
            self.root = Some(leaf);
            return;
        };

        // Descend to the cheapest sibling.
        let mut sibling = root;
        while let Some([left, right]) = self.nodes.get(sibling).and_then(|n| n.children) {
            sibling = if self.prefers_left(left, right, &bounds) {
                left
            } else {
                right
            };
        }

        let Some((sibling_bounds, old_parent)) =
            self.nodes.get(sibling).map(|n| (n.bounds, n.parent))
        else {
            return;
        };
        let branch = self.nodes.insert(TreeNode {
            bounds: sibling_bounds.merged(&bounds),
            parent: old_parent,
            children: Some([sibling, leaf]),
            key: None,
        });

        match old_parent {
            Some(parent) => self.replace_child(parent, sibling, branch),
            None => self.root = Some(branch),
        }
        for child in [sibling, leaf] {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = Some(branch);
            }
        }
        self.refit_from(old_parent);
    }

    /// Unlinks `leaf`, splicing its sibling into the grandparent. The leaf node
    /// itself stays allocated.
    fn detach_leaf(&mut self, leaf: Handle) {
        let parent = self.nodes.get(leaf).and_then(|n| n.parent);
        let Some(parent) = parent else {
            if self.root == Some(leaf) {
                self.root = None;
            }
            return;
        };

        let Some(parent_node) = self.nodes.remove(parent) else {
            return;
        };
        let sibling = match parent_node.children {
            Some([l, r]) if l == leaf => r,
            Some([l, _]) => l,
            None => return,
        };
        let grandparent = parent_node.parent;

        if let Some(node) = self.nodes.get_mut(sibling) {
            node.parent = grandparent;
        }
        if let Some(node) = self.nodes.get_mut(leaf) {
            node.parent = None;
        }

        match grandparent {
            Some(g) => {
                self.replace_child(g, parent, sibling);
                self.refit_from(Some(g));
            }
            None => self.root = Some(sibling),
        }
    }

    fn prefers_left(&self, left: Handle, right: Handle, bounds: &Aabb) -> bool {
        let (Some(a), Some(b)) = (self.nodes.get(left), self.nodes.get(right)) else {
            return true;
        };
        let (a, b) = (a.bounds, b.bounds);

        let cost_left = a.merged(bounds).area() + b.area();
        let cost_right = b.merged(bounds).area() + a.area();
        if cost_left != cost_right {
            return cost_left < cost_right;
        }

        let offset = |other: Aabb| {
            let d = bounds.center() - other.center();
            d.x.abs() + d.y.abs()
        };
        offset(a) < offset(b)
    }

    fn replace_child(&mut self, parent: Handle, old: Handle, new: Handle) {
        if let Some(children) = self.nodes.get_mut(parent).and_then(|n| n.children.as_mut()) {
            for child in children.iter_mut() {
                if *child == old {
                    *child = new;
                }
            }
        }
    }

    fn refit_from(&mut self, mut current: Option<Handle>) {
        while let Some(handle) = current {
            let Some([l, r]) = self.nodes.get(handle).and_then(|n| n.children) else {
                return;
            };
            let merged = match (self.nodes.get(l), self.nodes.get(r)) {
                (Some(a), Some(b)) => a.bounds.merged(&b.bounds),
                _ => return,
            };
            let Some(node) = self.nodes.get_mut(handle) else {
                return;
            };
            node.bounds = merged;
            current = node.parent;
        }
    }
}
