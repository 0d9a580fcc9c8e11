// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural invariant violations reported by [`AabbTree::validate`][crate::AabbTree::validate].

use crate::node::NodeId;
use crate::types::Aabb3;

/// A broken structural invariant.
///
/// The tree maintains all of these itself; seeing one means a bug in the tree
/// or an object whose bounds changed without [`AabbTree::update`][crate::AabbTree::update].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum InvariantError {
    /// Stored bounds differ from the union of the node's children or members.
    #[error("node {node:?} stores bounds {stored:?}, expected {expected:?}")]
    StaleBounds {
        /// Offending node.
        node: NodeId,
        /// Bounds stored on the node.
        stored: Aabb3,
        /// Bounds recomputed from its children or members.
        expected: Aabb3,
    },
    /// A node's parent link does not match the node that references it.
    #[error("node {node:?} records parent {recorded:?} but is referenced by {actual:?}")]
    ParentMismatch {
        /// Offending node.
        node: NodeId,
        /// Parent stored on the node.
        recorded: Option<NodeId>,
        /// Node that actually holds it as a child.
        actual: Option<NodeId>,
    },
    /// A node's depth is not its parent's depth plus one.
    #[error("node {node:?} records depth {recorded}, expected {expected}")]
    DepthMismatch {
        /// Offending node.
        node: NodeId,
        /// Depth stored on the node.
        recorded: u32,
        /// Depth implied by its position.
        expected: u32,
    },
    /// A leaf other than the root has no members.
    #[error("non-root leaf {node:?} is empty")]
    EmptyLeaf {
        /// Offending leaf.
        node: NodeId,
    },
    /// A leaf is over capacity without an abandoned split to account for it.
    #[error("leaf {node:?} holds {len} objects but was never refused a split")]
    OversizedLeaf {
        /// Offending leaf.
        node: NodeId,
        /// Number of members.
        len: usize,
    },
    /// The leaf map disagrees with the leaf that stores an object.
    #[error("leaf {node:?} stores an object the leaf map assigns to {mapped:?}")]
    LeafMapMismatch {
        /// Leaf holding the object.
        node: NodeId,
        /// Leaf recorded in the map, if any.
        mapped: Option<NodeId>,
    },
    /// The same object appears more than once in a leaf.
    #[error("leaf {node:?} holds an object more than once")]
    DuplicateObject {
        /// Offending leaf.
        node: NodeId,
    },
    /// The leaf map and the leaves disagree on how many objects are indexed.
    #[error("leaf map has {map} entries but leaves hold {stored} objects")]
    CountMismatch {
        /// Entries in the leaf map.
        map: usize,
        /// Objects found in leaves.
        stored: usize,
    },
    /// The tracked leaf count or maximum depth disagrees with the tree.
    #[error(
        "tracked {tracked_leaves} leaves at max depth {tracked_depth}, found {leaves} at {depth}"
    )]
    StaleCounters {
        /// Leaf count kept by the tree.
        tracked_leaves: usize,
        /// Maximum depth kept by the tree.
        tracked_depth: u32,
        /// Leaves found by walking the tree.
        leaves: usize,
        /// Deepest node found by walking the tree.
        depth: u32,
    },
    /// Live nodes exist that cannot be reached from the root.
    #[error("{count} live nodes are unreachable from the root")]
    UnreachableNodes {
        /// Number of unreachable live nodes.
        count: usize,
    },
}
