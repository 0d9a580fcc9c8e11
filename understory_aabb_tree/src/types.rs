// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and the surface-area cost math.

use core::cmp::Ordering;

use glam::Vec3;

/// Coordinate axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// All three axes in index order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Component index of this axis in a [`Vec3`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Axis-aligned bounding box in 3D.
///
/// Boxes are closed: points on a face are inside. A box whose `min` equals its
/// `max` (a single point) is valid and non-empty. [`Aabb3::EMPTY`] is the
/// identity for [`union`][Self::union] and contains nothing.
///
/// Equality is exact float equality. The tree relies on that to detect when
/// recomputed bounds did not change.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb3 {
    /// The empty box (`min = +inf`, `max = -inf`).
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create a new AABB from min/max corners.
    #[inline(always)]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// A degenerate box containing exactly one point.
    #[inline]
    pub const fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Create an AABB from its center and (non-negative) half extents.
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        debug_assert!(
            half_extents.cmpge(Vec3::ZERO).all(),
            "half extents must be non-negative"
        );
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// The smallest AABB enclosing both boxes.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Union of every box yielded by `boxes`, or `None` if there are none.
    ///
    /// ```
    /// use glam::Vec3;
    /// use understory_aabb_tree::Aabb3;
    ///
    /// assert_eq!(Aabb3::union_all([]), None);
    /// let u = Aabb3::union_all([
    ///     Aabb3::new(Vec3::ZERO, Vec3::ONE),
    ///     Aabb3::new(Vec3::splat(2.0), Vec3::splat(3.0)),
    /// ]);
    /// assert_eq!(u, Some(Aabb3::new(Vec3::ZERO, Vec3::splat(3.0))));
    /// ```
    pub fn union_all<I: IntoIterator<Item = Self>>(boxes: I) -> Option<Self> {
        let mut it = boxes.into_iter();
        let first = it.next()?;
        Some(it.fold(first, |acc, b| acc.union(&b)))
    }

    /// Return true if the box is inverted on any axis (contains no point).
    ///
    /// Zero-extent boxes are not empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max.cmplt(self.min).any()
    }

    /// Size along each axis, clamped to zero for empty boxes.
    #[inline]
    pub fn extent(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Sum of the areas of the six faces, accumulated in `f64`.
    ///
    /// This is the cost proxy used when choosing insertion points.
    #[inline]
    pub fn surface_area(&self) -> f64 {
        let e = self.extent().as_dvec3();
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }

    /// Enclosed volume, accumulated in `f64`.
    #[inline]
    pub fn volume(&self) -> f64 {
        let e = self.extent().as_dvec3();
        e.x * e.y * e.z
    }

    /// Axis along which the box is widest. Ties prefer x, then y.
    pub fn largest_axis(&self) -> Axis {
        let e = self.extent();
        if e.x >= e.y && e.x >= e.z {
            Axis::X
        } else if e.y >= e.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Whether this box contains the point (faces included).
    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }

    /// Whether `other` lies entirely inside this box.
    #[inline]
    pub fn contains(&self, other: &Self) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    /// Whether the two boxes share at least one point.
    ///
    /// Boxes touching along a face overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Parametric interval `(t_enter, t_exit)` along `ray` inside this box.
    ///
    /// `t_enter` is clamped to zero when the origin is inside. Returns `None`
    /// if the ray misses or the box lies entirely behind the origin. Hits
    /// that only graze a face or an edge are reported.
    pub fn ray_interval(&self, ray: &Ray) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }
        let mut t_enter = 0.0_f32;
        let mut t_exit = f32::INFINITY;
        for axis in Axis::ALL {
            let i = axis.index();
            let origin = ray.origin[i];
            let lo = self.min[i];
            let hi = self.max[i];
            if ray.direction[i] == 0.0 {
                // Parallel to this slab: the origin has to be inside it.
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = ray.inv_direction[i];
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                core::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }
        Some((t_enter, t_exit))
    }

    /// Whether `ray` passes through this box.
    #[inline]
    pub fn intersects_ray(&self, ray: &Ray) -> bool {
        self.ray_interval(ray).is_some()
    }
}

/// A half-line `origin + t * direction` for `t >= 0`.
///
/// The direction does not need to be normalized; parametric distances are in
/// units of its length.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    /// Create a ray. `direction` must not be zero.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        debug_assert!(direction != Vec3::ZERO, "ray direction must be non-zero");
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
        }
    }

    /// Start point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Direction of the ray, as given to [`Ray::new`].
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Point at parameter `t`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Descending by center along `axis`, then descending by volume.
pub(crate) fn split_order(axis: Axis, a: &Aabb3, b: &Aabb3) -> Ordering {
    let i = axis.index();
    b.center()[i]
        .total_cmp(&a.center()[i])
        .then_with(|| b.volume().total_cmp(&a.volume()))
}
