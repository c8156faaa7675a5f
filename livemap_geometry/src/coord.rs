// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate-space tags and the tagged point and rectangle types.

use core::fmt::Debug;
use core::marker::PhantomData;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect, Vec2};

/// Marker trait for coordinate spaces.
///
/// Spaces are zero-sized tags. A [`Coord<World>`] and a [`Coord<Client>`]
/// have the same layout but are different types, so geometry from one space
/// cannot be handed to code expecting the other without an explicit
/// transform.
pub trait Space: Copy + Debug + Default + PartialEq + Eq + Send + Sync + 'static {}

/// Longitude/latitude degrees.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LonLat;

/// Map world units, the space the quadtree cells live in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct World;

/// Client (screen) pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Client;

/// Coordinates with no particular meaning, for tests and scratch math.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Untyped;

impl Space for LonLat {}

impl Space for World {}

impl Space for Client {}

impl Space for Untyped {}

/// A point tagged with its coordinate space.
///
/// `Copy`, `Default` and `PartialEq` hold for every space, so generic code
/// needs no bounds on the tag.
pub struct Coord<S> {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
    space: PhantomData<S>,
}

impl<S> Clone for Coord<S> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Coord<S> {}

impl<S> Default for Coord<S> {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl<S> PartialEq for Coord<S> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

fn space_name<S>() -> &'static str {
    let full = core::any::type_name::<S>();
    full.rsplit("::").next().unwrap_or(full)
}

impl<S> Debug for Coord<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Coord<{}>({}, {})", space_name::<S>(), self.x, self.y)
    }
}

impl<S> Coord<S> {
    /// Create a point.
    #[inline(always)]
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }

    /// Wrap an untagged kurbo point.
    #[inline]
    pub const fn from_point(p: Point) -> Self {
        Self::new(p.x, p.y)
    }

    /// The untagged kurbo point.
    #[inline]
    pub const fn to_point(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Linear interpolation between `self` (`t = 0`) and `other` (`t = 1`).
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Squared euclidean distance.
    #[inline]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Offset by a vector in the same space.
    #[inline]
    pub fn translate(self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y)
    }

    /// The vector from `origin` to `self`.
    #[inline]
    pub fn offset_from(self, origin: Self) -> Vec2 {
        Vec2::new(self.x - origin.x, self.y - origin.y)
    }

    /// Re-tag the same numbers as another space.
    ///
    /// This is the escape hatch for transforms that are defined numerically
    /// (for example a scale that maps world units onto pixels).
    #[inline]
    pub const fn retag<T>(self) -> Coord<T> {
        Coord::new(self.x, self.y)
    }
}

/// An axis-aligned rectangle tagged with its coordinate space.
pub struct Bounds<S> {
    rect: Rect,
    space: PhantomData<S>,
}

impl<S> Clone for Bounds<S> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Bounds<S> {}

impl<S> Default for Bounds<S> {
    fn default() -> Self {
        Self::from_rect(Rect::ZERO)
    }
}

impl<S> PartialEq for Bounds<S> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.rect == other.rect
    }
}

impl<S> Debug for Bounds<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Bounds<{}>({}, {}, {}, {})",
            space_name::<S>(),
            self.rect.x0,
            self.rect.y0,
            self.rect.x1,
            self.rect.y1
        )
    }
}

impl<S> Bounds<S> {
    /// Create a rectangle from min/max corners.
    #[inline]
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::from_rect(Rect::new(x0, y0, x1, y1))
    }

    /// Wrap an untagged kurbo rectangle.
    #[inline]
    pub const fn from_rect(rect: Rect) -> Self {
        Self {
            rect,
            space: PhantomData,
        }
    }

    /// A rectangle from its origin and size.
    #[inline]
    pub fn from_origin_size(origin: Coord<S>, width: f64, height: f64) -> Self {
        Self::new(origin.x, origin.y, origin.x + width, origin.y + height)
    }

    /// The smallest rectangle containing both points.
    #[inline]
    pub fn from_corners(a: Coord<S>, b: Coord<S>) -> Self {
        Self::from_rect(Rect::from_points(a.to_point(), b.to_point()))
    }

    /// The untagged kurbo rectangle.
    #[inline]
    pub const fn rect(&self) -> Rect {
        self.rect
    }

    /// Top-left corner.
    #[inline]
    pub const fn origin(&self) -> Coord<S> {
        Coord::new(self.rect.x0, self.rect.y0)
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Coord<S> {
        Coord::from_point(self.rect.center())
    }

    /// Left edge.
    #[inline]
    pub const fn x0(&self) -> f64 {
        self.rect.x0
    }

    /// Top edge.
    #[inline]
    pub const fn y0(&self) -> f64 {
        self.rect.y0
    }

    /// Right edge.
    #[inline]
    pub const fn x1(&self) -> f64 {
        self.rect.x1
    }

    /// Bottom edge.
    #[inline]
    pub const fn y1(&self) -> f64 {
        self.rect.y1
    }

    /// Width.
    #[inline]
    pub fn width(&self) -> f64 {
        self.rect.width()
    }

    /// Height.
    #[inline]
    pub fn height(&self) -> f64 {
        self.rect.height()
    }

    /// Whether the point is inside or on the boundary.
    #[inline]
    pub fn contains(&self, p: Coord<S>) -> bool {
        self.rect.x0 <= p.x && p.x <= self.rect.x1 && self.rect.y0 <= p.y && p.y <= self.rect.y1
    }

    /// Whether the rectangles share area or a boundary.
    #[inline]
    pub fn touches(&self, other: &Self) -> bool {
        self.rect.x0 <= other.rect.x1
            && other.rect.x0 <= self.rect.x1
            && self.rect.y0 <= other.rect.y1
            && other.rect.y0 <= self.rect.y1
    }

    /// The smallest rectangle containing both.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self::from_rect(self.rect.union(other.rect))
    }

    /// Grow to include a point.
    #[inline]
    pub fn union_point(&self, p: Coord<S>) -> Self {
        Self::from_rect(self.rect.union_pt(p.to_point()))
    }

    /// Translate by a vector in the same space.
    #[inline]
    pub fn translate(&self, delta: Vec2) -> Self {
        Self::from_rect(self.rect + delta)
    }

    /// Re-tag the same numbers as another space.
    #[inline]
    pub const fn retag<T>(self) -> Bounds<T> {
        Bounds::from_rect(self.rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_and_distance() {
        let a = Coord::<World>::new(0.0, 0.0);
        let b = Coord::<World>::new(3.0, 4.0);
        assert_eq!(a.lerp(b, 0.5), Coord::new(1.5, 2.0));
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.offset_from(a), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn bounds_touch_and_union() {
        let a = Bounds::<Client>::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::<Client>::new(10.0, 0.0, 20.0, 5.0);
        let c = Bounds::<Client>::new(11.0, 0.0, 20.0, 5.0);
        assert!(a.touches(&b));
        assert!(!a.touches(&c));
        assert_eq!(a.union(&c), Bounds::new(0.0, 0.0, 20.0, 10.0));
        assert!(a.contains(Coord::new(10.0, 10.0)));
        assert_eq!(
            Bounds::from_corners(Coord::<Client>::new(5.0, 1.0), Coord::new(2.0, 3.0)),
            Bounds::new(2.0, 1.0, 5.0, 3.0)
        );
    }

    /// A tag with no trait impls at all.
    struct Bare;

    #[test]
    fn value_traits_do_not_depend_on_the_tag() {
        let p = Coord::<Bare>::new(1.0, 2.0);
        let q = p;
        assert!(p == q);
        assert!(Coord::<Bare>::default() == Coord::new(0.0, 0.0));
        let b = Bounds::<Bare>::from_corners(p, Coord::new(3.0, 0.0));
        let c = b;
        assert!(b == c);
        assert!(Bounds::<Bare>::default() == Bounds::new(0.0, 0.0, 0.0, 0.0));
    }
}
