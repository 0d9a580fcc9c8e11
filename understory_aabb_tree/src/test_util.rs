// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for unit tests.

use alloc::vec::Vec;
use core::hash::{Hash, Hasher};

use glam::Vec3;

use crate::boundable::Boundable;
use crate::types::Aabb3;

/// A box with an identity; equality and hashing use only `id`.
#[derive(Clone, Debug)]
pub(crate) struct Item {
    pub(crate) id: u32,
    pub(crate) bounds: Aabb3,
}

impl Item {
    pub(crate) fn new(id: u32, bounds: Aabb3) -> Self {
        Self { id, bounds }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Boundable for Item {
    fn bounds(&self) -> Aabb3 {
        self.bounds
    }
}

/// `n` unit boxes on a 5x5xN grid with a spacing of 2, filled x first.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Test grids are far smaller than u32::MAX."
)]
pub(crate) fn grid_items(n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| {
            let cell = Vec3::new((i % 5) as f32, ((i / 5) % 5) as f32, (i / 25) as f32);
            let min = cell * 2.0;
            Item::new(i as u32, Aabb3::new(min, min + Vec3::ONE))
        })
        .collect()
}
