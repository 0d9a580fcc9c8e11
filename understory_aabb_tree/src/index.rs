// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `AabbTree`: node arena, SAH insertion, leaf splitting, and removal with collapse.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::{SmallVec, smallvec};

use crate::boundable::Boundable;
use crate::config::TreeConfig;
use crate::node::{LeafContents, Node, NodeId, NodeKind};
use crate::types::{Aabb3, split_order};

/// A dynamic bounding volume hierarchy over [`Boundable`] objects.
///
/// Objects are their own keys: `T` must be cheap to clone and its `Eq`/`Hash`
/// must express identity (handles, ids, `Rc` pointers with identity semantics,
/// and so on). Each object is stored once in a leaf and once as a key of the
/// leaf map, which makes [`remove`][Self::remove] O(1) to locate plus a walk up
/// the tree.
///
/// Mutation takes `&mut self` and queries take `&self`, so queries may run in
/// parallel with each other but never with an insert or remove.
///
/// ## Example
///
/// ```rust
/// use glam::Vec3;
/// use understory_aabb_tree::{Aabb3, AabbTree, Boundable};
///
/// #[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// struct Crate(u32);
///
/// impl Boundable for Crate {
///     fn bounds(&self) -> Aabb3 {
///         let x = self.0 as f32 * 2.0;
///         Aabb3::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0))
///     }
/// }
///
/// let mut tree = AabbTree::new();
/// for i in 0..20 {
///     tree.insert(Crate(i));
/// }
/// assert_eq!(tree.len(), 20);
/// assert!(tree.remove(&Crate(3)));
/// assert!(!tree.remove(&Crate(3)));
/// assert!(tree.validate().is_ok());
/// ```
pub struct AabbTree<T> {
    /// slots
    nodes: Vec<Option<Node<T>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    pub(crate) root: NodeId,
    pub(crate) leaf_map: HashMap<T, NodeId>,
    next_serial: u64,
    /// live leaves
    leaves: usize,
    /// live nodes per depth, without trailing zeros
    depth_counts: Vec<usize>,
    config: TreeConfig,
}

impl<T> Debug for AabbTree<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = total - self.free_list.len();
        f.debug_struct("AabbTree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("objects", &self.leaf_map.len())
            .field("root", &self.root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T> Default for AabbTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Where an object goes when it reaches an internal node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    Left,
    Right,
    /// Wrap both children in a new node and give the object its own leaf.
    PushDown,
}

/// Pick the placement with the smallest total sibling surface area.
///
/// Pushing down has to be strictly cheaper than both descents; between the two
/// descents, ties go left.
pub(crate) fn choose_placement(left: &Aabb3, right: &Aabb3, object: &Aabb3) -> Placement {
    let send_left = right.surface_area() + left.union(object).surface_area();
    let send_right = left.surface_area() + right.union(object).surface_area();
    let push_down = object.surface_area() + left.union(right).surface_area();
    if push_down < send_left.min(send_right) {
        Placement::PushDown
    } else if send_left <= send_right {
        Placement::Left
    } else {
        Placement::Right
    }
}

/// Result of partitioning an oversized leaf.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct SplitPlan {
    /// Items before this index go to the first leaf.
    pub(crate) mid: usize,
    pub(crate) first: Aabb3,
    pub(crate) second: Aabb3,
}

/// Sort `items` for a split of a leaf with `leaf_bounds` and find the halves.
///
/// Returns `None` when both halves would have identical bounds, in which case
/// splitting cannot shrink anything (for example, duplicated geometry).
fn plan_split<I>(leaf_bounds: &Aabb3, items: &mut [(Aabb3, I)]) -> Option<SplitPlan> {
    let axis = leaf_bounds.largest_axis();
    items.sort_by(|a, b| split_order(axis, &a.0, &b.0));
    let mid = items.len() / 2;
    let fold = |acc: Aabb3, (b, _): &(Aabb3, I)| acc.union(b);
    let first = items[..mid].iter().fold(Aabb3::EMPTY, fold);
    let second = items[mid..].iter().fold(Aabb3::EMPTY, fold);
    if first == second {
        return None;
    }
    Some(SplitPlan { mid, first, second })
}

impl<T> AabbTree<T> {
    /// Create an empty tree with the default [`TreeConfig`].
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty tree with an explicit configuration.
    pub fn with_config(config: TreeConfig) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::new(0, 0),
            leaf_map: HashMap::new(),
            next_serial: 0,
            leaves: 0,
            depth_counts: Vec::new(),
            config,
        };
        tree.root = tree.alloc(None, 0, Aabb3::EMPTY, NodeKind::Leaf(SmallVec::new()));
        tree
    }

    /// The configuration this tree was created with.
    pub fn config(&self) -> TreeConfig {
        self.config
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.leaf_map.len()
    }

    /// Returns true if no objects are indexed.
    pub fn is_empty(&self) -> bool {
        self.leaf_map.is_empty()
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Bounds of everything in the tree, or `None` when it is empty.
    pub fn bounds(&self) -> Option<Aabb3> {
        let b = self.node(self.root).bounds;
        (!b.is_empty()).then_some(b)
    }

    /// Iterate every indexed object, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.leaf_map.keys()
    }

    /// Number of live nodes (leaves and internal nodes).
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Number of live leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    /// Depth of the deepest node (0 for a tree that is a single leaf).
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Depths are stored as u32 on every node."
    )]
    pub fn max_depth(&self) -> u32 {
        self.depth_counts.len().saturating_sub(1) as u32
    }

    /// Remove every object and reset to a single empty leaf.
    ///
    /// Generations are kept, so handles from before the clear stay stale.
    pub fn clear(&mut self) {
        for slot in &mut self.nodes {
            *slot = None;
        }
        self.free_list.clear();
        self.free_list.extend((0..self.nodes.len()).rev());
        self.leaf_map.clear();
        self.leaves = 0;
        self.depth_counts.clear();
        self.root = self.alloc(None, 0, Aabb3::EMPTY, NodeKind::Leaf(SmallVec::new()));
    }

    /// Access a live node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node<T> {
        match self.nodes.get(id.idx()) {
            Some(Some(node)) if node.generation == id.1 => node,
            _ => panic!("tree invariant violated: dangling {id:?}"),
        }
    }

    /// Access a live node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match self.nodes.get_mut(id.idx()) {
            Some(Some(node)) if node.generation == id.1 => node,
            _ => panic!("tree invariant violated: dangling {id:?}"),
        }
    }

    fn alloc(
        &mut self,
        parent: Option<NodeId>,
        depth: u32,
        bounds: Aabb3,
        kind: NodeKind<T>,
    ) -> NodeId {
        let serial = self.next_serial;
        self.next_serial += 1;
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.nodes.push(None);
            self.generations.push(1);
            (self.nodes.len() - 1, 1)
        };
        if matches!(kind, NodeKind::Leaf(_)) {
            self.leaves += 1;
        }
        self.count_depth(depth);
        self.nodes[idx] = Some(Node {
            generation,
            serial,
            depth,
            parent,
            bounds,
            kind,
            split_abandoned: false,
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        NodeId::new(idx as u32, generation)
    }

    fn free(&mut self, id: NodeId) {
        let Some(node) = self.nodes[id.idx()].take() else {
            panic!("tree invariant violated: double free of {id:?}");
        };
        if node.is_leaf() {
            self.leaves -= 1;
        }
        self.uncount_depth(node.depth);
        self.free_list.push(id.idx());
    }

    fn count_depth(&mut self, depth: u32) {
        let d = depth as usize;
        if self.depth_counts.len() <= d {
            self.depth_counts.resize(d + 1, 0);
        }
        self.depth_counts[d] += 1;
    }

    fn uncount_depth(&mut self, depth: u32) {
        self.depth_counts[depth as usize] -= 1;
        while self.depth_counts.last() == Some(&0) {
            self.depth_counts.pop();
        }
    }

    /// Set the depth of `id` to `depth` and of every descendant accordingly.
    fn restamp_depth(&mut self, id: NodeId, depth: u32) {
        let mut stack: SmallVec<[(NodeId, u32); 32]> = smallvec![(id, depth)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node_mut(id);
            let old = core::mem::replace(&mut node.depth, depth);
            if let NodeKind::Internal { left, right } = node.kind {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
            if old != depth {
                self.uncount_depth(old);
                self.count_depth(depth);
            }
        }
    }

    /// Recompute bounds from children, walking up from `start` until nothing changes.
    fn propagate_bounds(&mut self, start: Option<NodeId>) {
        let mut current = start;
        while let Some(id) = current {
            let (left, right) = self.node(id).children();
            let bounds = self.node(left).bounds.union(&self.node(right).bounds);
            let node = self.node_mut(id);
            if node.bounds == bounds {
                break;
            }
            node.bounds = bounds;
            current = node.parent;
        }
    }
}

impl<T> AabbTree<T>
where
    T: Boundable + Clone + Eq + Hash,
{
    /// Returns true if `object` is indexed.
    pub fn contains(&self, object: &T) -> bool {
        self.leaf_map.contains_key(object)
    }

    /// The leaf currently holding `object`.
    pub fn leaf_of(&self, object: &T) -> Option<NodeId> {
        self.leaf_map.get(object).copied()
    }

    /// Depth of the leaf currently holding `object`.
    pub fn depth_of(&self, object: &T) -> Option<u32> {
        self.leaf_of(object).map(|leaf| self.node(leaf).depth)
    }

    /// Insert an object.
    ///
    /// The object's bounds are read once. Inserting an object that is already
    /// present is a caller error; debug builds assert.
    pub fn insert(&mut self, object: T) {
        debug_assert!(
            !self.leaf_map.contains_key(&object),
            "object inserted twice"
        );
        let bounds = object.bounds();
        let mut current = self.root;
        loop {
            let node = self.node_mut(current);
            let NodeKind::Internal { left, right } = node.kind else {
                break;
            };
            node.bounds = node.bounds.union(&bounds);
            let left_bounds = self.node(left).bounds;
            let right_bounds = self.node(right).bounds;
            let placement = choose_placement(&left_bounds, &right_bounds, &bounds);
            log::trace!("insert at {current:?}: {placement:?}");
            match placement {
                Placement::Left => current = left,
                Placement::Right => current = right,
                Placement::PushDown => {
                    self.push_down(current, object, bounds);
                    return;
                }
            }
        }
        self.insert_into_leaf(current, object, bounds);
    }

    /// Move the children of `id` under a new internal node and put `object` in
    /// a new leaf next to it.
    fn push_down(&mut self, id: NodeId, object: T, bounds: Aabb3) {
        let (left, right) = self.node(id).children();
        let depth = self.node(id).depth;
        let merged_bounds = self.node(left).bounds.union(&self.node(right).bounds);
        let merged = self.alloc(
            Some(id),
            depth + 1,
            merged_bounds,
            NodeKind::Internal { left, right },
        );
        for child in [left, right] {
            self.node_mut(child).parent = Some(merged);
            self.restamp_depth(child, depth + 2);
        }
        let leaf = self.alloc(
            Some(id),
            depth + 1,
            bounds,
            NodeKind::Leaf(smallvec![object.clone()]),
        );
        self.leaf_map.insert(object, leaf);
        self.node_mut(id).kind = NodeKind::Internal {
            left: merged,
            right: leaf,
        };
    }

    fn insert_into_leaf(&mut self, id: NodeId, object: T, bounds: Aabb3) {
        let node = self.node_mut(id);
        let NodeKind::Leaf(contents) = &mut node.kind else {
            panic!("tree invariant violated: inserting into internal node {id:?}");
        };
        node.bounds = if contents.is_empty() {
            bounds
        } else {
            node.bounds.union(&bounds)
        };
        contents.push(object.clone());
        let len = contents.len();
        self.leaf_map.insert(object, id);
        if len > self.config.max_leaf_size() {
            self.split(id);
        }
    }

    /// Split an oversized leaf in place; `id` becomes an internal node.
    fn split(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        let leaf_bounds = node.bounds;
        let depth = node.depth;
        let NodeKind::Leaf(contents) = &mut node.kind else {
            panic!("tree invariant violated: split of internal node {id:?}");
        };
        let mut items: Vec<(Aabb3, T)> = contents.drain(..).map(|o| (o.bounds(), o)).collect();
        let Some(plan) = plan_split(&leaf_bounds, &mut items) else {
            log::debug!(
                "split of {id:?} skipped: {} objects with indistinguishable halves",
                items.len()
            );
            contents.extend(items.into_iter().map(|(_, o)| o));
            node.split_abandoned = true;
            return;
        };

        let second_items = items.split_off(plan.mid);
        let first = self.new_leaf(id, depth + 1, items, plan.first);
        let second = self.new_leaf(id, depth + 1, second_items, plan.second);
        let node = self.node_mut(id);
        node.kind = NodeKind::Internal {
            left: first,
            right: second,
        };
        node.split_abandoned = false;
        self.leaves -= 1;
        log::debug!("split {id:?} into {first:?} and {second:?}");

        let max = self.config.max_leaf_size();
        for child in [first, second] {
            if self.node(child).contents().len() > max {
                self.split(child);
            }
        }
    }

    /// Allocate a leaf under `parent` and point the leaf map at it.
    fn new_leaf(
        &mut self,
        parent: NodeId,
        depth: u32,
        items: Vec<(Aabb3, T)>,
        bounds: Aabb3,
    ) -> NodeId {
        let contents: LeafContents<T> = items.into_iter().map(|(_, o)| o).collect();
        let members = contents.clone();
        let leaf = self.alloc(Some(parent), depth, bounds, NodeKind::Leaf(contents));
        for o in members {
            self.leaf_map.insert(o, leaf);
        }
        leaf
    }

    /// Remove an object. Returns false if it was not indexed.
    pub fn remove(&mut self, object: &T) -> bool {
        let Some(leaf) = self.leaf_map.remove(object) else {
            return false;
        };
        let is_root = leaf == self.root;
        let max = self.config.max_leaf_size();
        let node = self.node_mut(leaf);
        let NodeKind::Leaf(contents) = &mut node.kind else {
            panic!("tree invariant violated: leaf map points at internal node {leaf:?}");
        };
        let pos = contents
            .iter()
            .position(|o| o == object)
            .expect("tree invariant violated: object missing from its leaf");
        contents.swap_remove(pos);
        if contents.len() <= max {
            node.split_abandoned = false;
        }

        if contents.is_empty() {
            if is_root {
                node.bounds = Aabb3::EMPTY;
            } else {
                self.collapse(leaf);
            }
            return true;
        }

        let bounds = contents
            .iter()
            .fold(Aabb3::EMPTY, |acc, o| acc.union(&o.bounds()));
        if node.bounds != bounds {
            node.bounds = bounds;
            let parent = node.parent;
            self.propagate_bounds(parent);
        }
        true
    }

    /// Remove the empty leaf `leaf` and its parent, splicing the sibling into
    /// the parent's place.
    fn collapse(&mut self, leaf: NodeId) {
        let parent = self
            .node(leaf)
            .parent
            .expect("tree invariant violated: non-root leaf without parent");
        let (left, right) = self.node(parent).children();
        let sibling = if left == leaf {
            right
        } else if right == leaf {
            left
        } else {
            panic!("tree invariant violated: {leaf:?} is not a child of {parent:?}");
        };
        let grandparent = self.node(parent).parent;
        let depth = self.node(parent).depth;

        self.free(leaf);
        self.free(parent);
        self.node_mut(sibling).parent = grandparent;
        match grandparent {
            Some(g) => {
                let NodeKind::Internal { left, right } = &mut self.node_mut(g).kind else {
                    panic!("tree invariant violated: parent {g:?} is a leaf");
                };
                if *left == parent {
                    *left = sibling;
                } else if *right == parent {
                    *right = sibling;
                } else {
                    panic!("tree invariant violated: {parent:?} is not a child of {g:?}");
                }
            }
            None => self.root = sibling,
        }
        self.restamp_depth(sibling, depth);
        log::debug!("collapsed {parent:?}; {sibling:?} moved up to depth {depth}");
        self.propagate_bounds(grandparent);
    }

    /// Re-read the bounds of `object` after its geometry changed.
    ///
    /// Equivalent to a remove followed by an insert. Returns false (and does
    /// nothing) if the object is not indexed.
    pub fn update(&mut self, object: &T) -> bool {
        if !self.remove(object) {
            return false;
        }
        self.insert(object.clone());
        true
    }

    /// Rebuild the tree from scratch, re-reading every object's bounds.
    pub fn rebuild(&mut self) {
        let mut objects = Vec::with_capacity(self.len());
        let mut stack: SmallVec<[NodeId; 32]> = smallvec![self.root];
        while let Some(id) = stack.pop() {
            match &self.node(id).kind {
                NodeKind::Leaf(contents) => objects.extend(contents.iter().cloned()),
                NodeKind::Internal { left, right } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
        log::debug!("rebuilding tree with {} objects", objects.len());
        self.clear();
        self.extend(objects);
    }
}

impl<T> Extend<T> for AabbTree<T>
where
    T: Boundable + Clone + Eq + Hash,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for object in iter {
            self.insert(object);
        }
    }
}

impl<T> FromIterator<T> for AabbTree<T>
where
    T: Boundable + Clone + Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{Item, grid_items};
    use alloc::vec;
    use glam::Vec3;

    fn unit_at(x: f32, y: f32, z: f32) -> Aabb3 {
        let min = Vec3::new(x, y, z);
        Aabb3::new(min, min + Vec3::ONE)
    }

    #[test]
    fn placement_prefers_cheaper_side() {
        let left = unit_at(0.0, 0.0, 0.0);
        let right = unit_at(10.0, 0.0, 0.0);
        assert_eq!(
            choose_placement(&left, &right, &unit_at(0.5, 0.0, 0.0)),
            Placement::Left
        );
        assert_eq!(
            choose_placement(&left, &right, &unit_at(9.5, 0.0, 0.0)),
            Placement::Right
        );
    }

    #[test]
    fn placement_ties_go_left() {
        let left = unit_at(0.0, 0.0, 0.0);
        let right = unit_at(4.0, 0.0, 0.0);
        // Exactly halfway; both descents cost the same.
        assert_eq!(
            choose_placement(&left, &right, &unit_at(2.0, 0.0, 0.0)),
            Placement::Left
        );
    }

    #[test]
    fn placement_pushes_down_far_objects() {
        let left = unit_at(0.0, 0.0, 0.0);
        let right = unit_at(1.0, 0.0, 0.0);
        // A point far away: joining either child would balloon it, while the
        // pair of children stays compact.
        let far = Aabb3::from_point(Vec3::splat(100.0));
        assert_eq!(choose_placement(&left, &right, &far), Placement::PushDown);
    }

    #[test]
    fn empty_tree_is_a_single_leaf() {
        let tree: AabbTree<Item> = AabbTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.bounds(), None);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.max_depth(), 0);
        tree.validate().unwrap();
    }

    #[test]
    fn first_insert_sets_root_bounds() {
        let mut tree = AabbTree::new();
        let a = Item::new(1, unit_at(2.0, 3.0, 4.0));
        tree.insert(a.clone());
        assert_eq!(tree.bounds(), Some(a.bounds));
        assert_eq!(tree.leaf_of(&a), Some(tree.root()));
        assert_eq!(tree.depth_of(&a), Some(0));
        tree.validate().unwrap();
    }

    #[test]
    fn ninth_object_splits_root_leaf() {
        let mut tree = AabbTree::new();
        for item in grid_items(9) {
            tree.insert(item);
        }
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.max_depth(), 1);
        let report = tree.validate().unwrap();
        assert_eq!(report.objects, 9);
        assert_eq!(report.oversized_leaves, 0);
    }

    #[test]
    fn split_keeps_root_id_and_bounds() {
        let mut tree = AabbTree::new();
        let root = tree.root();
        let items = grid_items(9);
        for item in &items[..8] {
            tree.insert(item.clone());
        }
        tree.insert(items[8].clone());
        assert_eq!(tree.root(), root);
        let expected = Aabb3::union_all(items.iter().map(|i| i.bounds)).unwrap();
        assert_eq!(tree.bounds(), Some(expected));
    }

    #[test]
    fn split_puts_larger_centers_first() {
        let mut tree = AabbTree::new();
        for i in 0..9 {
            tree.insert(Item::new(i, unit_at(i as f32 * 2.0, 0.0, 0.0)));
        }
        let (left, right) = tree.node(tree.root()).children();
        // Sorted descending along x, first half has the four largest centers.
        let mut first: Vec<u32> = tree.node(left).contents().iter().map(|i| i.id).collect();
        first.sort_unstable();
        assert_eq!(first, vec![5, 6, 7, 8]);
        assert_eq!(tree.node(right).contents().len(), 5);
    }

    #[test]
    fn degenerate_split_is_abandoned() {
        let mut tree = AabbTree::new();
        let b = unit_at(0.0, 0.0, 0.0);
        for i in 0..9 {
            tree.insert(Item::new(i, b));
        }
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.node(tree.root()).contents().len(), 9);
        let report = tree.validate().unwrap();
        assert_eq!(report.oversized_leaves, 1);

        // Still fully usable.
        assert!(tree.remove(&Item::new(4, b)));
        assert_eq!(tree.len(), 8);
        tree.validate().unwrap();
    }

    #[test]
    fn abandoned_split_stays_tolerated_after_removal() {
        let long = Aabb3::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
        let short = Aabb3::new(Vec3::new(0.5, 0.0, 0.0), Vec3::new(1.5, 1.0, 1.0));
        let mut tree = AabbTree::new();
        for i in 0..6 {
            tree.insert(Item::new(i, long));
        }
        // Longer boxes sort first, so every half keeps a long box.
        for i in 6..11 {
            tree.insert(Item::new(i, short));
        }
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.validate().unwrap().oversized_leaves, 1);

        // Five long and five short boxes could now be separated.
        assert!(tree.remove(&Item::new(0, long)));
        assert_eq!(tree.node(tree.root()).contents().len(), 10);
        assert_eq!(tree.validate().unwrap().oversized_leaves, 1);

        // The next insert retries the split and succeeds.
        tree.insert(Item::new(11, short));
        let report = tree.validate().unwrap();
        assert_eq!(report.oversized_leaves, 0);
        assert_eq!(report.leaves, 2);
    }

    #[test]
    fn removal_back_to_capacity_clears_tolerance() {
        let b = unit_at(0.0, 0.0, 0.0);
        let mut tree = AabbTree::new();
        for i in 0..9 {
            tree.insert(Item::new(i, b));
        }
        assert!(tree.node(tree.root()).split_abandoned);
        assert!(tree.remove(&Item::new(0, b)));
        assert!(!tree.node(tree.root()).split_abandoned);
        assert_eq!(tree.validate().unwrap().oversized_leaves, 0);
    }

    #[test]
    fn removing_last_object_empties_root() {
        let mut tree = AabbTree::new();
        let a = Item::new(1, unit_at(0.0, 0.0, 0.0));
        tree.insert(a.clone());
        assert!(tree.remove(&a));
        assert!(tree.is_empty());
        assert_eq!(tree.bounds(), None);
        assert_eq!(tree.leaf_of(&a), None);
        tree.validate().unwrap();
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut tree = AabbTree::new();
        tree.insert(Item::new(1, unit_at(0.0, 0.0, 0.0)));
        assert!(!tree.remove(&Item::new(2, unit_at(0.0, 0.0, 0.0))));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn remove_shrinks_bounds_upward() {
        let mut tree = AabbTree::new();
        let items: Vec<Item> = (0..12)
            .map(|i| Item::new(i, unit_at(i as f32 * 2.0, 0.0, 0.0)))
            .collect();
        for item in &items {
            tree.insert(item.clone());
        }
        let before = tree.bounds().unwrap();
        // The last item is the only one reaching the maximum x.
        let far = items.last().unwrap();
        assert!(tree.remove(far));
        let after = tree.bounds().unwrap();
        assert!(before.contains(&after));
        assert_ne!(before, after);
        tree.validate().unwrap();
    }

    #[test]
    fn collapse_splices_sibling_and_fixes_depths() {
        let mut tree = AabbTree::new();
        let near: Vec<Item> = (0..9).map(|i| Item::new(i, unit_at(i as f32, 0.0, 0.0))).collect();
        for item in &near {
            tree.insert(item.clone());
        }
        // Far enough away to be pushed down into its own leaf.
        let far = Item::new(100, Aabb3::from_point(Vec3::splat(1000.0)));
        tree.insert(far.clone());
        let far_leaf = tree.leaf_of(&far).unwrap();
        assert_eq!(tree.node(far_leaf).contents().len(), 1);
        assert_eq!(tree.max_depth(), 2);

        let nodes_before = tree.node_count();
        assert!(tree.remove(&far));
        assert_eq!(tree.node_count(), nodes_before - 2);
        assert_eq!(tree.max_depth(), 1);
        assert_eq!(tree.node(tree.root()).depth, 0);
        tree.validate().unwrap();
    }

    #[test]
    fn stale_ids_are_not_reused() {
        let mut tree = AabbTree::new();
        for item in grid_items(9) {
            tree.insert(item);
        }
        let far = Item::new(100, Aabb3::from_point(Vec3::splat(1000.0)));
        tree.insert(far.clone());
        let old_leaf = tree.leaf_of(&far).unwrap();
        tree.remove(&far);
        tree.insert(far.clone());
        let new_leaf = tree.leaf_of(&far).unwrap();
        assert_ne!(old_leaf, new_leaf);
    }

    #[test]
    fn update_moves_object() {
        use alloc::rc::Rc;
        use core::cell::Cell;

        #[derive(Clone, Debug)]
        struct Movable(u32, Rc<Cell<Vec3>>);
        impl PartialEq for Movable {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }
        impl Eq for Movable {}
        impl Hash for Movable {
            fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }
        impl Boundable for Movable {
            fn bounds(&self) -> Aabb3 {
                let min = self.1.get();
                Aabb3::new(min, min + Vec3::ONE)
            }
        }

        let mut tree = AabbTree::new();
        let pos = Rc::new(Cell::new(Vec3::ZERO));
        let m = Movable(1, pos.clone());
        tree.insert(m.clone());
        for i in 0..12 {
            let at = Vec3::splat((i + 1) as f32 * 3.0);
            tree.insert(Movable(10 + i, Rc::new(Cell::new(at))));
        }
        pos.set(Vec3::splat(500.0));
        assert!(tree.update(&m));
        assert!(tree.bounds().unwrap().contains_point(Vec3::splat(500.5)));
        assert_eq!(tree.query_point(Vec3::splat(500.5)).len(), 1);
        assert!(tree.query_point(Vec3::splat(0.5)).is_empty());
        assert!(!tree.update(&Movable(99, Rc::new(Cell::new(Vec3::ZERO)))));
        tree.validate().unwrap();
    }

    #[test]
    fn rebuild_keeps_members() {
        let mut tree: AabbTree<Item> = grid_items(40).into_iter().collect();
        let mut before: Vec<u32> = tree.iter().map(|i| i.id).collect();
        tree.rebuild();
        let mut after: Vec<u32> = tree.iter().map(|i| i.id).collect();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
        tree.validate().unwrap();
    }

    #[test]
    fn small_leaves_split_recursively() {
        let config = TreeConfig::default().with_max_leaf_size(1);
        let mut tree = AabbTree::with_config(config);
        for item in grid_items(16) {
            tree.insert(item);
            let report = tree.validate().unwrap();
            assert_eq!(report.oversized_leaves, 0);
        }
        assert_eq!(tree.leaf_count(), 16);
    }

    #[test]
    fn counters_follow_structure() {
        let config = TreeConfig::default().with_max_leaf_size(2);
        let mut tree = AabbTree::with_config(config);
        let items = grid_items(40);
        let scan = |tree: &AabbTree<Item>| {
            let mut leaves = 0;
            let mut depth = 0;
            tree.debug_dump(|info| {
                depth = depth.max(info.depth);
                if matches!(info.shape, crate::node::NodeShape::Leaf { .. }) {
                    leaves += 1;
                }
            });
            (leaves, depth)
        };
        for item in &items {
            tree.insert(item.clone());
            assert_eq!(scan(&tree), (tree.leaf_count(), tree.max_depth()));
        }
        let far = Item::new(100, Aabb3::from_point(Vec3::splat(1000.0)));
        tree.insert(far.clone());
        assert_eq!(scan(&tree), (tree.leaf_count(), tree.max_depth()));
        assert!(tree.remove(&far));
        for item in items.iter().rev() {
            assert!(tree.remove(item));
            assert_eq!(scan(&tree), (tree.leaf_count(), tree.max_depth()));
        }
        assert_eq!((tree.leaf_count(), tree.max_depth()), (1, 0));
    }

    #[test]
    fn clear_resets() {
        let mut tree: AabbTree<Item> = grid_items(20).into_iter().collect();
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert_eq!((tree.leaf_count(), tree.max_depth()), (1, 0));
        tree.validate().unwrap();
    }
}
