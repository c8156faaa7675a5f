// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wrap-around policy and seam-aware rectangle math over the map plane.

use alloc::vec::Vec;

use hashbrown::HashSet;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use livemap_geometry::{Bounds, Coord, World};
use livemap_index::{CellKey, visit_quad_keys};
use smallvec::{SmallVec, smallvec};

bitflags::bitflags! {
    /// Axes with toroidal (wrap-around) semantics.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LoopAxes: u8 {
        /// Horizontal axis loops (longitude).
        const X = 0b0000_0001;
        /// Vertical axis loops.
        const Y = 0b0000_0010;
    }
}

impl Default for LoopAxes {
    fn default() -> Self {
        Self::X
    }
}

/// Fold `v` into `[min, max)`.
///
/// Works for inputs any number of spans away on either side. A degenerate
/// range folds everything onto `min`.
///
/// ```rust
/// assert_eq!(livemap_view::wrap(-1.0, 0.0, 10.0), 9.0);
/// assert_eq!(livemap_view::wrap(25.0, 0.0, 10.0), 5.0);
/// ```
pub fn wrap(v: f64, min: f64, max: f64) -> f64 {
    let len = max - min;
    if len <= 0.0 || len.is_nan() {
        return min;
    }
    let s = v - min;
    let r = min + (s - (s / len).floor() * len);
    // Rounding can land exactly on `max` for tiny negative inputs.
    if r >= max { min } else { r }
}

type Ranges = SmallVec<[(f64, f64); 2]>;

/// Pieces of `[lo, hi]` inside `[min, max]`, split at the seam on a looping axis.
fn split_axis(lo: f64, hi: f64, min: f64, max: f64, loops: bool) -> Ranges {
    if hi < lo {
        return Ranges::new();
    }
    if !loops {
        let a = lo.max(min);
        let b = hi.min(max);
        return if a < b { smallvec![(a, b)] } else { Ranges::new() };
    }
    let span = max - min;
    if hi - lo >= span {
        return smallvec![(min, max)];
    }
    let a = wrap(lo, min, max);
    let b = a + (hi - lo);
    if b <= max {
        smallvec![(a, b)]
    } else {
        smallvec![(a, max), (min, min + (b - max))]
    }
}

/// Offsets `k * span` that bring `[obj_lo, obj_hi]` into contact with `[view_lo, view_hi]`.
///
/// Without looping, touching ranges are in contact. With looping, a copy
/// only counts when it overlaps the view, so a copy that merely abuts the
/// view edge is skipped. A zero-width object belongs to `[view_lo, view_hi)`.
fn axis_offsets(
    (obj_lo, obj_hi): (f64, f64),
    (view_lo, view_hi): (f64, f64),
    span: f64,
    loops: bool,
) -> SmallVec<[f64; 2]> {
    if !loops || span <= 0.0 {
        return if obj_lo <= view_hi && view_lo <= obj_hi {
            smallvec![0.0]
        } else {
            SmallVec::new()
        };
    }
    let overlaps = |offset: f64| {
        let (lo, hi) = (obj_lo + offset, obj_hi + offset);
        if hi > lo {
            lo < view_hi && view_lo < hi
        } else {
            view_lo <= lo && lo < view_hi
        }
    };
    // Candidates are widened by one step on each side and then filtered exactly.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "copy indices are bounded by the view width over the map span; casts saturate."
    )]
    let (first, last) = (
        ((view_lo - obj_hi) / span).floor() as i64,
        ((view_hi - obj_lo) / span).ceil() as i64,
    );
    (first..=last)
        .map(|k| k as f64 * span)
        .filter(|&offset| overlaps(offset))
        .collect()
}

/// One axis of a bounding box under wrap-around: the shortest arc covering
/// every interval, found by dropping the largest uncovered gap.
fn circular_cover(intervals: &[(f64, f64)], min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    let mut arcs: Vec<(f64, f64)> = Vec::with_capacity(intervals.len());
    for &(lo, hi) in intervals {
        if hi - lo >= span {
            return (min, max);
        }
        let start = wrap(lo, min, max);
        arcs.push((start, start + (hi - lo)));
    }
    arcs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(arcs.len());
    for (start, end) in arcs {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    let Some(&(first_start, _)) = merged.first() else {
        return (min, min);
    };

    // The gap after arc `i` runs to the start of arc `i + 1`, or around the seam.
    let mut best_gap = f64::NEG_INFINITY;
    let mut best_start = first_start;
    for (i, &(_, end)) in merged.iter().enumerate() {
        let next_start = match merged.get(i + 1) {
            Some(&(s, _)) => s,
            None => first_start + span,
        };
        let gap = next_start - end;
        if gap > best_gap {
            best_gap = gap;
            best_start = next_start;
        }
    }
    if best_gap <= 0.0 {
        return (min, max);
    }
    let start = wrap(best_start, min, max);
    (start, start + (span - best_gap))
}

/// Coordinate policy of one map: its world rectangle and which axes wrap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportHelper {
    map_rect: Bounds<World>,
    loop_axes: LoopAxes,
}

impl ViewportHelper {
    /// Create a helper for `map_rect`.
    pub fn new(map_rect: Bounds<World>, loop_axes: LoopAxes) -> Self {
        Self {
            map_rect,
            loop_axes,
        }
    }

    /// The map's world rectangle.
    #[must_use]
    pub const fn map_rect(&self) -> Bounds<World> {
        self.map_rect
    }

    /// Which axes wrap.
    #[must_use]
    pub const fn loop_axes(&self) -> LoopAxes {
        self.loop_axes
    }

    /// Wrap or clamp a horizontal coordinate.
    pub fn normalize_x(&self, x: f64) -> f64 {
        let (min, max) = (self.map_rect.x0(), self.map_rect.x1());
        if self.loop_axes.contains(LoopAxes::X) {
            wrap(x, min, max)
        } else {
            x.clamp(min, max)
        }
    }

    /// Wrap or clamp a vertical coordinate.
    pub fn normalize_y(&self, y: f64) -> f64 {
        let (min, max) = (self.map_rect.y0(), self.map_rect.y1());
        if self.loop_axes.contains(LoopAxes::Y) {
            wrap(y, min, max)
        } else {
            y.clamp(min, max)
        }
    }

    /// Bring a point onto the map: looping axes wrap, the others clamp.
    pub fn normalize(&self, p: Coord<World>) -> Coord<World> {
        Coord::new(self.normalize_x(p.x), self.normalize_y(p.y))
    }

    /// Split `rect` into pieces that lie on the map without crossing a seam.
    ///
    /// Looping axes contribute up to two pieces each; non-looping axes are
    /// clipped to the map. A rectangle entirely off a non-looping axis yields
    /// nothing.
    pub fn split_rect(&self, rect: Bounds<World>) -> SmallVec<[Bounds<World>; 4]> {
        let map = self.map_rect;
        let xs = split_axis(
            rect.x0(),
            rect.x1(),
            map.x0(),
            map.x1(),
            self.loop_axes.contains(LoopAxes::X),
        );
        let ys = split_axis(
            rect.y0(),
            rect.y1(),
            map.y0(),
            map.y1(),
            self.loop_axes.contains(LoopAxes::Y),
        );
        let mut out = SmallVec::new();
        for &(x0, x1) in &xs {
            for &(y0, y1) in &ys {
                out.push(Bounds::new(x0, y0, x1, y1));
            }
        }
        out
    }

    /// Every cell at `zoom` overlapping `view_rect`, seams included.
    pub fn get_cells(&self, view_rect: Bounds<World>, zoom: u8) -> HashSet<CellKey> {
        let mut cells = HashSet::new();
        for piece in self.split_rect(view_rect) {
            visit_quad_keys(self.map_rect.rect(), piece.rect(), zoom, |key| {
                cells.insert(key);
            });
        }
        cells
    }

    /// Translations at which an object with bounds `obj_rect` must be drawn
    /// to show every copy of it that reaches `view_rect`.
    ///
    /// A looping axis yields every multiple of the map span that keeps part
    /// of the object in view; a copy that only touches the view edge is not
    /// drawn. A non-looping axis yields the identity only when the ranges
    /// overlap or touch.
    pub fn get_origins(
        &self,
        obj_rect: Bounds<World>,
        view_rect: Bounds<World>,
    ) -> SmallVec<[Coord<World>; 4]> {
        let xs = axis_offsets(
            (obj_rect.x0(), obj_rect.x1()),
            (view_rect.x0(), view_rect.x1()),
            self.map_rect.width(),
            self.loop_axes.contains(LoopAxes::X),
        );
        let ys = axis_offsets(
            (obj_rect.y0(), obj_rect.y1()),
            (view_rect.y0(), view_rect.y1()),
            self.map_rect.height(),
            self.loop_axes.contains(LoopAxes::Y),
        );
        let mut out = SmallVec::new();
        for &dx in &xs {
            for &dy in &ys {
                out.push(Coord::new(dx, dy));
            }
        }
        out
    }

    /// Smallest rectangle covering every input under the loop policy.
    ///
    /// On a looping axis the result may extend past the map's far edge: a
    /// set of rectangles clustered around the seam is covered by a narrow
    /// box straddling it rather than by the whole map.
    pub fn calculate_bounding_box(&self, rects: &[Bounds<World>]) -> Option<Bounds<World>> {
        let first = rects.first()?;
        let map = self.map_rect;
        let (x0, x1) = if self.loop_axes.contains(LoopAxes::X) {
            let xs: Vec<_> = rects.iter().map(|r| (r.x0(), r.x1())).collect();
            circular_cover(&xs, map.x0(), map.x1())
        } else {
            rects
                .iter()
                .fold((first.x0(), first.x1()), |(a, b), r| (a.min(r.x0()), b.max(r.x1())))
        };
        let (y0, y1) = if self.loop_axes.contains(LoopAxes::Y) {
            let ys: Vec<_> = rects.iter().map(|r| (r.y0(), r.y1())).collect();
            circular_cover(&ys, map.y0(), map.y1())
        } else {
            rects
                .iter()
                .fold((first.y0(), first.y1()), |(a, b), r| (a.min(r.y0()), b.max(r.y1())))
        };
        Some(Bounds::new(x0, y0, x1, y1))
    }
}
