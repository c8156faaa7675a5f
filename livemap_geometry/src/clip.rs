// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Border tracing of polygons against a clip rectangle.

use alloc::vec::Vec;
use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::coord::{Bounds, Coord};
use crate::resample::POINTS_PER_RESUME;
use crate::task::MicroTask;
use crate::tree::{LineString, MultiLineString, MultiPolygon};

const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const TOP: u8 = 4;
const BOTTOM: u8 = 8;

/// Clip a segment to `clip`, or `None` if nothing of it is inside.
///
/// Endpoints inside the rectangle are returned unchanged.
pub fn clip_segment<S>(
    a: Coord<S>,
    b: Coord<S>,
    clip: &Bounds<S>,
) -> Option<(Coord<S>, Coord<S>)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [
        (-dx, a.x - clip.x0()),
        (dx, clip.x1() - a.x),
        (-dy, a.y - clip.y0()),
        (dy, clip.y1() - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    let start = if t0 > 0.0 { a.lerp(b, t0) } else { a };
    let end = if t1 < 1.0 { a.lerp(b, t1) } else { b };
    Some((start, end))
}

fn border_mask<S>(p: Coord<S>, clip: &Bounds<S>, eps: f64) -> u8 {
    let mut mask = 0;
    if (p.x - clip.x0()).abs() <= eps {
        mask |= LEFT;
    }
    if (p.x - clip.x1()).abs() <= eps {
        mask |= RIGHT;
    }
    if (p.y - clip.y0()).abs() <= eps {
        mask |= TOP;
    }
    if (p.y - clip.y1()).abs() <= eps {
        mask |= BOTTOM;
    }
    mask
}

/// Traces the visible outline of a [`MultiPolygon`] inside a rectangle.
///
/// The result is a [`MultiLineString`]: closed rings degrade to open chords.
/// Parts of a ring running along the rectangle's border (the seam a tile or
/// viewport cut introduces) are hidden, so adjacent clipped pieces do not
/// draw a false outline where they meet.
pub struct ClipMultiPolygonBorder<S> {
    source: MultiPolygon<S>,
    clip: Bounds<S>,
    eps: f64,
    polygon: usize,
    ring: usize,
    edge: usize,
    ring_start: usize,
    current: Vec<Coord<S>>,
    lines: Vec<LineString<S>>,
    result: Option<MultiLineString<S>>,
    done: bool,
}

impl<S> fmt::Debug for ClipMultiPolygonBorder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipMultiPolygonBorder")
            .field("clip", &self.clip)
            .field("polygon", &self.polygon)
            .field("ring", &self.ring)
            .field("edge", &self.edge)
            .finish_non_exhaustive()
    }
}

impl<S> ClipMultiPolygonBorder<S> {
    /// Create the task.
    pub fn new(source: MultiPolygon<S>, clip: Bounds<S>) -> Self {
        let done = source.is_empty();
        let eps = 1e-9 * clip.width().max(clip.height());
        Self {
            source,
            clip,
            eps,
            polygon: 0,
            ring: 0,
            edge: 0,
            ring_start: 0,
            current: Vec::new(),
            lines: Vec::new(),
            result: done.then(MultiLineString::default),
            done,
        }
    }

    fn flush(&mut self) {
        if self.current.len() >= 2 {
            self.lines
                .push(LineString::new(core::mem::take(&mut self.current)));
        } else {
            self.current.clear();
        }
    }

    fn visit_edge(&mut self, a: Coord<S>, b: Coord<S>) {
        let Some((a, b)) = clip_segment(a, b, &self.clip) else {
            self.flush();
            return;
        };
        // Repeated vertices carry no direction and must not split the trace.
        if a == b {
            return;
        }
        let seam =
            border_mask(a, &self.clip, self.eps) & border_mask(b, &self.clip, self.eps) != 0;
        if seam {
            self.flush();
            return;
        }
        if self.current.last() == Some(&a) {
            self.current.push(b);
        } else {
            self.flush();
            self.current.push(a);
            self.current.push(b);
        }
    }

    /// Close the ring: join its last chord to its first one when they meet.
    fn finish_ring(&mut self) {
        self.flush();
        let count = self.lines.len() - self.ring_start;
        if count >= 2 {
            let first = &self.lines[self.ring_start];
            let last = &self.lines[self.lines.len() - 1];
            if last.points().last() == first.points().first()
                && let Some(last) = self.lines.pop()
            {
                let first = core::mem::take(&mut self.lines[self.ring_start]);
                let mut joined = last.into_points();
                joined.extend(first.into_points().into_iter().skip(1));
                self.lines[self.ring_start] = LineString::new(joined);
            }
        }
        self.ring_start = self.lines.len();
        self.edge = 0;
        self.ring += 1;
    }
}

impl<S> MicroTask for ClipMultiPolygonBorder<S> {
    type Output = MultiLineString<S>;

    fn resume(&mut self) {
        if self.done {
            return;
        }
        let mut budget = POINTS_PER_RESUME;
        while budget > 0 {
            let Some(polygon) = self.source.polygons().get(self.polygon) else {
                let lines = core::mem::take(&mut self.lines);
                self.result = Some(MultiLineString::new(lines));
                self.done = true;
                return;
            };
            // Every step costs one unit, ring and polygon boundaries included.
            budget -= 1;
            let Some(ring) = polygon.rings().get(self.ring) else {
                self.polygon += 1;
                self.ring = 0;
                continue;
            };
            let points = ring.points();
            if points.len() < 2 || self.edge >= points.len() {
                self.finish_ring();
                continue;
            }
            let a = points[self.edge];
            let b = points[(self.edge + 1) % points.len()];
            self.visit_edge(a, b);
            self.edge += 1;
        }
    }

    fn alive(&self) -> bool {
        !self.done
    }

    fn take_result(&mut self) -> Option<MultiLineString<S>> {
        if self.done { self.result.take() } else { None }
    }
}
