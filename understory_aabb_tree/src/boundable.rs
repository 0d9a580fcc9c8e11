// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability every indexed object provides.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::sync::Arc;

use crate::types::{Aabb3, Ray};

/// An object with axis-aligned bounds that can be stored in an [`AabbTree`][crate::AabbTree].
///
/// The tree reads [`bounds`][Boundable::bounds] when an object is inserted,
/// removed, updated, or the tree is rebuilt. It never caches geometry beyond
/// the node bounds, so an object whose geometry changes must be passed to
/// [`AabbTree::update`][crate::AabbTree::update] before the next query.
///
/// The ray methods default to the bounding box. Shapes that are not boxes
/// should override [`ray_distance`][Boundable::ray_distance] with an exact
/// test, so ray queries report only real hits. Every ray query asks
/// [`intersects_ray`][Boundable::intersects_ray] first, so overriding it alone
/// is enough to reject hits; the distance is only used to order them.
pub trait Boundable {
    /// Current world-space bounds of the object.
    fn bounds(&self) -> Aabb3;

    /// Parametric distance along `ray` to the first point of the object, if hit.
    fn ray_distance(&self, ray: &Ray) -> Option<f32> {
        self.bounds().ray_interval(ray).map(|(t_enter, _)| t_enter)
    }

    /// Whether `ray` hits the object itself.
    fn intersects_ray(&self, ray: &Ray) -> bool {
        self.ray_distance(ray).is_some()
    }
}

impl<T: Boundable + ?Sized> Boundable for &T {
    fn bounds(&self) -> Aabb3 {
        (**self).bounds()
    }

    fn ray_distance(&self, ray: &Ray) -> Option<f32> {
        (**self).ray_distance(ray)
    }

    fn intersects_ray(&self, ray: &Ray) -> bool {
        (**self).intersects_ray(ray)
    }
}

macro_rules! forward_boundable {
    ($($ptr:ident),*) => {
        $(
            impl<T: Boundable + ?Sized> Boundable for $ptr<T> {
                fn bounds(&self) -> Aabb3 {
                    (**self).bounds()
                }

                fn ray_distance(&self, ray: &Ray) -> Option<f32> {
                    (**self).ray_distance(ray)
                }

                fn intersects_ray(&self, ray: &Ray) -> bool {
                    (**self).intersects_ray(ray)
                }
            }
        )*
    };
}

forward_boundable!(Box, Rc, Arc);
