// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable geometry trees.
//!
//! Trees are built once and never mutated. Every transform produces a new
//! tree in (possibly) another space.

use alloc::vec::Vec;
use core::fmt;

use crate::coord::{Bounds, Coord};

// The space tag is a marker; these impls must not require anything of it.
macro_rules! impl_value_traits {
    ($($ty:ident { $field:ident }),* $(,)?) => {$(
        impl<S> Clone for $ty<S> {
            fn clone(&self) -> Self {
                Self {
                    $field: self.$field.clone(),
                }
            }
        }

        impl<S> Default for $ty<S> {
            fn default() -> Self {
                Self { $field: Vec::new() }
            }
        }

        impl<S> PartialEq for $ty<S> {
            fn eq(&self, other: &Self) -> bool {
                self.$field == other.$field
            }
        }

        impl<S> fmt::Debug for $ty<S> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field(stringify!($field), &self.$field)
                    .finish()
            }
        }
    )*};
}

impl_value_traits!(
    LineString { points },
    Ring { points },
    Polygon { rings },
    MultiPoint { points },
    MultiLineString { lines },
    MultiPolygon { polygons },
);

fn bbox_of<'a, S: 'a>(points: impl IntoIterator<Item = &'a Coord<S>>) -> Option<Bounds<S>> {
    let mut it = points.into_iter();
    let first = *it.next()?;
    Some(it.fold(Bounds::from_corners(first, first), |acc, p| {
        acc.union_point(*p)
    }))
}

fn union_all<S>(boxes: impl Iterator<Item = Option<Bounds<S>>>) -> Option<Bounds<S>> {
    boxes.flatten().reduce(|a, b| a.union(&b))
}

/// An open sequence of points.
pub struct LineString<S> {
    points: Vec<Coord<S>>,
}

impl<S> LineString<S> {
    /// Create a line string.
    pub fn new(points: Vec<Coord<S>>) -> Self {
        Self { points }
    }

    /// The points in order.
    pub fn points(&self) -> &[Coord<S>] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box, `None` when empty.
    pub fn bbox(&self) -> Option<Bounds<S>> {
        bbox_of(&self.points)
    }

    /// Take the points out.
    pub fn into_points(self) -> Vec<Coord<S>> {
        self.points
    }
}

/// A closed ring; the closing edge from the last point back to the first is implied.
pub struct Ring<S> {
    points: Vec<Coord<S>>,
}

impl<S> Ring<S> {
    /// Create a ring.
    pub fn new(points: Vec<Coord<S>>) -> Self {
        Self { points }
    }

    /// The points in order.
    pub fn points(&self) -> &[Coord<S>] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box, `None` when empty.
    pub fn bbox(&self) -> Option<Bounds<S>> {
        bbox_of(&self.points)
    }
}

/// A polygon: an outer ring followed by zero or more holes.
pub struct Polygon<S> {
    rings: Vec<Ring<S>>,
}

impl<S> Polygon<S> {
    /// Create a polygon from its rings, outer ring first.
    pub fn new(rings: Vec<Ring<S>>) -> Self {
        Self { rings }
    }

    /// The rings, outer ring first.
    pub fn rings(&self) -> &[Ring<S>] {
        &self.rings
    }

    /// Whether there are no rings.
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Bounding box of the outer ring.
    pub fn bbox(&self) -> Option<Bounds<S>> {
        self.rings.first().and_then(Ring::bbox)
    }
}

/// A set of points.
pub struct MultiPoint<S> {
    points: Vec<Coord<S>>,
}

impl<S> MultiPoint<S> {
    /// Create a multi-point.
    pub fn new(points: Vec<Coord<S>>) -> Self {
        Self { points }
    }

    /// The points.
    pub fn points(&self) -> &[Coord<S>] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box, `None` when empty.
    pub fn bbox(&self) -> Option<Bounds<S>> {
        bbox_of(&self.points)
    }
}

/// A set of line strings.
pub struct MultiLineString<S> {
    lines: Vec<LineString<S>>,
}

impl<S> MultiLineString<S> {
    /// Create a multi-line-string.
    pub fn new(lines: Vec<LineString<S>>) -> Self {
        Self { lines }
    }

    /// The line strings.
    pub fn lines(&self) -> &[LineString<S>] {
        &self.lines
    }

    /// Number of line strings.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether there are no line strings.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Bounding box, `None` when there are no points.
    pub fn bbox(&self) -> Option<Bounds<S>> {
        union_all(self.lines.iter().map(LineString::bbox))
    }
}

/// A set of polygons.
pub struct MultiPolygon<S> {
    polygons: Vec<Polygon<S>>,
}

impl<S> MultiPolygon<S> {
    /// Create a multi-polygon.
    pub fn new(polygons: Vec<Polygon<S>>) -> Self {
        Self { polygons }
    }

    /// The polygons.
    pub fn polygons(&self) -> &[Polygon<S>] {
        &self.polygons
    }

    /// Number of polygons.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Whether there are no polygons.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Bounding box over all outer rings.
    pub fn bbox(&self) -> Option<Bounds<S>> {
        union_all(self.polygons.iter().map(Polygon::bbox))
    }
}

/// Any of the multi-geometries.
pub enum Geometry<S> {
    /// Points.
    Points(MultiPoint<S>),
    /// Paths.
    Lines(MultiLineString<S>),
    /// Areas.
    Polygons(MultiPolygon<S>),
}

impl<S> Clone for Geometry<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Points(g) => Self::Points(g.clone()),
            Self::Lines(g) => Self::Lines(g.clone()),
            Self::Polygons(g) => Self::Polygons(g.clone()),
        }
    }
}

impl<S> PartialEq for Geometry<S> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Points(a), Self::Points(b)) => a == b,
            (Self::Lines(a), Self::Lines(b)) => a == b,
            (Self::Polygons(a), Self::Polygons(b)) => a == b,
            _ => false,
        }
    }
}

impl<S> fmt::Debug for Geometry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Points(g) => f.debug_tuple("Points").field(g).finish(),
            Self::Lines(g) => f.debug_tuple("Lines").field(g).finish(),
            Self::Polygons(g) => f.debug_tuple("Polygons").field(g).finish(),
        }
    }
}

impl<S> Geometry<S> {
    /// Bounding box, `None` when there are no points.
    pub fn bbox(&self) -> Option<Bounds<S>> {
        match self {
            Self::Points(g) => g.bbox(),
            Self::Lines(g) => g.bbox(),
            Self::Polygons(g) => g.bbox(),
        }
    }

    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Points(g) => g.is_empty(),
            Self::Lines(g) => g.is_empty(),
            Self::Polygons(g) => g.is_empty(),
        }
    }
}
