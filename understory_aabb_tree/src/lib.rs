// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory AABB Tree: a dynamic 3D bounding volume hierarchy.
//!
//! Understory AABB Tree indexes a changing set of bounded objects and answers
//! spatial queries without ever rebuilding from scratch.
//!
//! - Insert and remove objects one at a time; removal is O(1) to locate thanks
//!   to a leaf map from each object to the leaf that holds it.
//! - Query with a pair of predicates (one for node bounds, one for objects), by
//!   overlapping box, by point, or by ray.
//! - Inspect the hierarchy with [`AabbTree::debug_dump`] and check it with
//!   [`AabbTree::validate`].
//!
//! Objects implement [`Boundable`]: they report an [`Aabb3`] and may refine ray
//! hits beyond their box. The object itself is the key, so it should be a cheap,
//! hashable identity (an id, a handle, a shared pointer).
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use understory_aabb_tree::{Aabb3, AabbTree, Boundable, Ray};
//!
//! #[derive(Clone, Debug, PartialEq, Eq, Hash)]
//! struct Part(u32);
//!
//! impl Boundable for Part {
//!     fn bounds(&self) -> Aabb3 {
//!         let x = self.0 as f32 * 3.0;
//!         Aabb3::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0))
//!     }
//! }
//!
//! let mut tree = AabbTree::new();
//! for i in 0..32 {
//!     tree.insert(Part(i));
//! }
//!
//! // Everything overlapping a region.
//! let area = Aabb3::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(7.0, 1.0, 1.0));
//! assert_eq!(tree.query_aabb(&area).len(), 3);
//!
//! // A ray along the row of parts hits all of them; nearest first on request.
//! let ray = Ray::new(Vec3::new(-1.0, 0.5, 0.5), Vec3::X);
//! assert_eq!(tree.query_ray(&ray).len(), 32);
//! let nearest = tree.query_ray_sorted(&ray)[0].1;
//! assert_eq!(nearest, &Part(0));
//!
//! assert!(tree.remove(&Part(0)));
//! assert_eq!(tree.query_ray_sorted(&ray)[0].1, &Part(1));
//! ```
//!
//! ## How insertion decides
//!
//! At each internal node the new object's box is scored three ways by the total
//! surface area of the two resulting siblings (the surface area heuristic, SAH):
//! grow the left child, grow the right child, or push both children down under
//! a new node and give the object a leaf of its own. Pushing down wins only when
//! strictly cheaper; otherwise the cheaper child is entered, ties going left.
//! Leaves hold up to [`TreeConfig::max_leaf_size`] objects (8 by default). An
//! overflowing leaf is split at the median along its widest axis, unless both
//! halves would have the same bounds (duplicated geometry), in which case the
//! leaf is left oversized.
//!
//! ## Removal
//!
//! Removing the last object of a leaf splices the leaf's sibling into the place
//! of their parent, so no internal node ever has fewer than two children. Bounds
//! shrink upward only until an ancestor's bounds come out unchanged.
//!
//! ## Features
//!
//! - `std` *(default)*: use `std` math for `glam`.
//! - `libm`: use `libm` math for `glam` in `no_std` builds.
//!
//! This crate is `no_std` and uses `alloc`. It logs structural events (splits,
//! collapses, rebuilds) at `debug` level and per-insert decisions at `trace`
//! level through the [`log`] facade.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs in bounds. Bounds comparisons are exact.

#![no_std]

extern crate alloc;

mod boundable;
mod config;
mod error;
mod index;
mod node;
mod query;
mod types;
mod validate;

#[cfg(test)]
mod test_util;

pub use boundable::Boundable;
pub use config::{DEFAULT_MAX_LEAF_SIZE, TreeConfig};
pub use error::InvariantError;
pub use index::AabbTree;
pub use node::{NodeId, NodeInfo, NodeShape};
pub use types::{Aabb3, Axis, Ray};
pub use validate::TreeReport;
