// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree nodes: identifiers, the leaf/internal sum type, and the public debug view.

use smallvec::SmallVec;

use crate::types::Aabb3;

/// Inline capacity of a leaf; matches the default leaf size.
pub(crate) const LEAF_INLINE: usize = 8;

/// Leaf contents. One extra slot spills while a split is pending.
pub(crate) type LeafContents<T> = SmallVec<[T; LEAF_INLINE]>;

/// Identifier for a node in the tree (generational).
///
/// Identifiers are handed out by [`AabbTree::debug_dump`][crate::AabbTree::debug_dump]
/// and [`AabbTree::leaf_of`][crate::AabbTree::leaf_of]. A node that is
/// collapsed away frees its slot; the slot is reused with a bumped generation,
/// so an old identifier never aliases a new node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub(crate) enum NodeKind<T> {
    Leaf(LeafContents<T>),
    Internal { left: NodeId, right: NodeId },
}

#[derive(Clone, Debug)]
pub(crate) struct Node<T> {
    pub(crate) generation: u32,
    /// Creation order, for diagnostics only.
    pub(crate) serial: u64,
    pub(crate) depth: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) bounds: Aabb3,
    pub(crate) kind: NodeKind<T>,
    /// Set when the last split of this leaf was abandoned; cleared once the
    /// leaf is back within capacity or splits.
    pub(crate) split_abandoned: bool,
}

impl<T> Node<T> {
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Children of an internal node.
    ///
    /// Panics on a leaf.
    pub(crate) fn children(&self) -> (NodeId, NodeId) {
        match self.kind {
            NodeKind::Internal { left, right } => (left, right),
            NodeKind::Leaf(_) => panic!("tree invariant violated: leaf has no children"),
        }
    }

    pub(crate) fn contents(&self) -> &[T] {
        match &self.kind {
            NodeKind::Leaf(contents) => contents.as_slice(),
            NodeKind::Internal { .. } => &[],
        }
    }
}

/// Shape of a node as reported by [`NodeInfo`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeShape {
    /// A leaf holding `len` objects.
    Leaf {
        /// Number of objects in the leaf.
        len: usize,
    },
    /// An internal node with two children.
    Internal {
        /// Left child.
        left: NodeId,
        /// Right child.
        right: NodeId,
    },
}

/// Snapshot of one node, emitted by [`AabbTree::debug_dump`][crate::AabbTree::debug_dump].
///
/// Intended for drawing the hierarchy or logging it; it carries no references
/// into the tree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeInfo {
    /// Handle of the node.
    pub id: NodeId,
    /// Monotonic creation counter of the owning tree.
    pub serial: u64,
    /// Distance from the root (root = 0).
    pub depth: u32,
    /// Parent node, `None` for the root.
    pub parent: Option<NodeId>,
    /// Bounds stored on the node.
    pub bounds: Aabb3,
    /// Leaf or internal.
    pub shape: NodeShape,
}

impl NodeInfo {
    pub(crate) fn of<T>(id: NodeId, node: &Node<T>) -> Self {
        let shape = match &node.kind {
            NodeKind::Leaf(contents) => NodeShape::Leaf {
                len: contents.len(),
            },
            NodeKind::Internal { left, right } => NodeShape::Internal {
                left: *left,
                right: *right,
            },
        };
        Self {
            id,
            serial: node.serial,
            depth: node.depth,
            parent: node.parent,
            bounds: node.bounds,
            shape,
        }
    }
}
