// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full structural check of an `AabbTree`.

use core::hash::Hash;

use smallvec::{SmallVec, smallvec};

use crate::boundable::Boundable;
use crate::error::InvariantError;
use crate::index::AabbTree;
use crate::node::{NodeId, NodeKind};
use crate::types::Aabb3;

/// Summary of a tree that passed [`AabbTree::validate`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeReport {
    /// Live nodes.
    pub nodes: usize,
    /// Live leaves.
    pub leaves: usize,
    /// Indexed objects.
    pub objects: usize,
    /// Deepest node.
    pub max_depth: u32,
    /// Leaves above the configured capacity whose last split was abandoned
    /// because their members could not be separated. This is tolerated, not
    /// an error.
    pub oversized_leaves: usize,
}

impl<T> AabbTree<T>
where
    T: Boundable + Clone + Eq + Hash,
{
    /// Walk the whole tree and check every structural invariant.
    ///
    /// This is O(n) in the number of nodes and objects and re-reads every
    /// object's bounds; it is meant for tests and debugging, not per-frame use.
    ///
    /// Checked:
    /// - every internal node's bounds equal the union of its children's;
    /// - every leaf's bounds equal the union of its members' (the empty root
    ///   stores [`Aabb3::EMPTY`]);
    /// - parent links and depths agree with the child links;
    /// - only the root may be an empty leaf;
    /// - each object sits in exactly one leaf and the leaf map points there;
    /// - every live node is reachable from the root;
    /// - oversized leaves exist only where a split was abandoned;
    /// - the tracked leaf count and maximum depth match the tree.
    pub fn validate(&self) -> Result<TreeReport, InvariantError> {
        let mut report = TreeReport::default();
        let root = self.node(self.root);
        if root.parent.is_some() || root.depth != 0 {
            return Err(InvariantError::ParentMismatch {
                node: self.root,
                recorded: root.parent,
                actual: None,
            });
        }

        let max = self.config().max_leaf_size();
        let mut stack: SmallVec<[NodeId; 32]> = smallvec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            report.nodes += 1;
            report.max_depth = report.max_depth.max(node.depth);
            match &node.kind {
                NodeKind::Internal { left, right } => {
                    for child in [*left, *right] {
                        let c = self.node(child);
                        if c.parent != Some(id) {
                            return Err(InvariantError::ParentMismatch {
                                node: child,
                                recorded: c.parent,
                                actual: Some(id),
                            });
                        }
                        if c.depth != node.depth + 1 {
                            return Err(InvariantError::DepthMismatch {
                                node: child,
                                recorded: c.depth,
                                expected: node.depth + 1,
                            });
                        }
                        stack.push(child);
                    }
                    let expected = self.node(*left).bounds.union(&self.node(*right).bounds);
                    check_bounds(id, node.bounds, expected)?;
                }
                NodeKind::Leaf(contents) => {
                    report.leaves += 1;
                    report.objects += contents.len();
                    if contents.is_empty() && id != self.root {
                        return Err(InvariantError::EmptyLeaf { node: id });
                    }
                    let expected = contents
                        .iter()
                        .fold(Aabb3::EMPTY, |acc, o| acc.union(&o.bounds()));
                    check_bounds(id, node.bounds, expected)?;
                    for (i, o) in contents.iter().enumerate() {
                        if contents[i + 1..].contains(o) {
                            return Err(InvariantError::DuplicateObject { node: id });
                        }
                        let mapped = self.leaf_map.get(o).copied();
                        if mapped != Some(id) {
                            return Err(InvariantError::LeafMapMismatch { node: id, mapped });
                        }
                    }
                    if contents.len() > max {
                        // Removals may make the members separable again; the
                        // leaf stays tolerated until its next insert.
                        if !node.split_abandoned {
                            return Err(InvariantError::OversizedLeaf {
                                node: id,
                                len: contents.len(),
                            });
                        }
                        report.oversized_leaves += 1;
                    }
                }
            }
        }

        if report.objects != self.leaf_map.len() {
            return Err(InvariantError::CountMismatch {
                map: self.leaf_map.len(),
                stored: report.objects,
            });
        }
        let live = self.node_count();
        if report.nodes != live {
            return Err(InvariantError::UnreachableNodes {
                count: live - report.nodes,
            });
        }
        if report.leaves != self.leaf_count() || report.max_depth != self.max_depth() {
            return Err(InvariantError::StaleCounters {
                tracked_leaves: self.leaf_count(),
                tracked_depth: self.max_depth(),
                leaves: report.leaves,
                depth: report.max_depth,
            });
        }
        Ok(report)
    }
}

fn check_bounds(node: NodeId, stored: Aabb3, expected: Aabb3) -> Result<(), InvariantError> {
    if stored == expected {
        Ok(())
    } else {
        Err(InvariantError::StaleBounds {
            node,
            stored,
            expected,
        })
    }
}
