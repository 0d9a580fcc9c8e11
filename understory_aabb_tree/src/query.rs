// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds-guarded traversal: predicate queries, ray queries, and the debug dump.

use alloc::vec::Vec;

use glam::Vec3;
use smallvec::{SmallVec, smallvec};

use crate::boundable::Boundable;
use crate::index::AabbTree;
use crate::node::{NodeId, NodeInfo, NodeKind};
use crate::types::{Aabb3, Ray};

impl<T: Boundable> AabbTree<T> {
    /// Visit objects in subtrees whose bounds satisfy `bounds_query` and that
    /// themselves satisfy `item_query` (does not allocate result storage).
    ///
    /// `bounds_query` is evaluated on node bounds, starting at the root; a
    /// subtree is skipped as soon as it returns false. Each object reached is
    /// passed to `item_query` and, on success, to `f`. The order is unspecified.
    pub fn visit<'a, B, I, F>(&'a self, mut bounds_query: B, mut item_query: I, mut f: F)
    where
        B: FnMut(&Aabb3) -> bool,
        I: FnMut(&T) -> bool,
        F: FnMut(&'a T),
    {
        let mut stack: SmallVec<[NodeId; 32]> = smallvec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if !bounds_query(&node.bounds) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(contents) => {
                    for object in contents {
                        if item_query(object) {
                            f(object);
                        }
                    }
                }
                NodeKind::Internal { left, right } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
    }

    /// Collect objects matching both predicates. See [`visit`][Self::visit].
    pub fn query<B, I>(&self, bounds_query: B, item_query: I) -> Vec<&T>
    where
        B: FnMut(&Aabb3) -> bool,
        I: FnMut(&T) -> bool,
    {
        let mut out = Vec::new();
        self.visit(bounds_query, item_query, |o| out.push(o));
        out
    }

    /// Collect objects whose own bounds satisfy `bounds_query`.
    ///
    /// The same predicate guards the descent, so it must hold for a node
    /// whenever it holds for anything inside the node (for example "overlaps
    /// a region", but not "lies entirely inside a region").
    pub fn query_bounds<B>(&self, bounds_query: B) -> Vec<&T>
    where
        B: Fn(&Aabb3) -> bool,
    {
        self.query(&bounds_query, |o| bounds_query(&o.bounds()))
    }

    /// Collect objects whose bounds overlap `area` (touching faces count).
    pub fn query_aabb(&self, area: &Aabb3) -> Vec<&T> {
        self.query_bounds(|b| b.overlaps(area))
    }

    /// Collect objects whose bounds contain `point`.
    pub fn query_point(&self, point: Vec3) -> Vec<&T> {
        self.query_bounds(|b| b.contains_point(point))
    }

    /// Collect objects hit by `ray`, in no particular order.
    ///
    /// Node bounds prune the descent; each candidate then decides with
    /// [`Boundable::intersects_ray`].
    pub fn query_ray(&self, ray: &Ray) -> Vec<&T> {
        self.query(|b| b.intersects_ray(ray), |o| o.intersects_ray(ray))
    }

    /// Collect objects hit by `ray` with their [`Boundable::ray_distance`],
    /// nearest first.
    ///
    /// Reports the same objects as [`query_ray`][Self::query_ray]: an object
    /// is a hit when [`Boundable::intersects_ray`] accepts it and it reports
    /// a distance.
    ///
    /// ```
    /// use glam::Vec3;
    /// use understory_aabb_tree::{Aabb3, AabbTree, Boundable, Ray};
    ///
    /// #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    /// struct Wall(i32);
    ///
    /// impl Boundable for Wall {
    ///     fn bounds(&self) -> Aabb3 {
    ///         let z = self.0 as f32;
    ///         Aabb3::new(Vec3::new(-1.0, -1.0, z), Vec3::new(1.0, 1.0, z + 0.1))
    ///     }
    /// }
    ///
    /// let tree: AabbTree<Wall> = [Wall(7), Wall(3), Wall(5)].into_iter().collect();
    /// let hits = tree.query_ray_sorted(&Ray::new(Vec3::ZERO, Vec3::Z));
    /// let order: Vec<i32> = hits.iter().map(|(_, w)| w.0).collect();
    /// assert_eq!(order, [3, 5, 7]);
    /// ```
    pub fn query_ray_sorted(&self, ray: &Ray) -> Vec<(f32, &T)> {
        let mut out = Vec::new();
        self.visit(
            |b| b.intersects_ray(ray),
            |o| o.intersects_ray(ray),
            |o| {
                if let Some(t) = o.ray_distance(ray) {
                    out.push((t, o));
                }
            },
        );
        out.sort_by(|a, b| a.0.total_cmp(&b.0));
        out
    }
}

impl<T> AabbTree<T> {
    /// Emit a [`NodeInfo`] for every node, parents before children.
    ///
    /// Purely diagnostic; use it to draw node bounds or log the tree shape.
    pub fn debug_dump<F: FnMut(NodeInfo)>(&self, mut sink: F) {
        let mut stack: SmallVec<[NodeId; 32]> = smallvec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            sink(NodeInfo::of(id, node));
            if let NodeKind::Internal { left, right } = node.kind {
                stack.push(right);
                stack.push(left);
            }
        }
    }
}
