// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction-time tree parameters.

/// Default maximum number of objects held by one leaf before it is split.
pub const DEFAULT_MAX_LEAF_SIZE: usize = 8;

/// Parameters for an [`AabbTree`][crate::AabbTree].
///
/// ```
/// use understory_aabb_tree::TreeConfig;
///
/// let config = TreeConfig::default().with_max_leaf_size(4);
/// assert_eq!(config.max_leaf_size(), 4);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    max_leaf_size: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_leaf_size: DEFAULT_MAX_LEAF_SIZE,
        }
    }
}

impl TreeConfig {
    /// Set the leaf capacity. A leaf holding more than this many objects is
    /// split on the insertion that overflows it.
    ///
    /// # Panics
    ///
    /// Panics if `max_leaf_size` is zero.
    pub fn with_max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        assert!(max_leaf_size > 0, "max_leaf_size must be at least 1");
        self.max_leaf_size = max_leaf_size;
        self
    }

    /// Maximum number of objects in a leaf after a successful split.
    pub const fn max_leaf_size(&self) -> usize {
        self.max_leaf_size
    }
}
