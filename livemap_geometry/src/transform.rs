// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resumable reprojection of multi-geometries.
//!
//! Each task keeps one cursor per nesting level and consumes at most
//! [`POINTS_PER_RESUME`] source points per step. Rings shorter than three
//! points and lines shorter than two after reprojection are dropped. A
//! polygon whose outer ring is dropped is dropped entirely.

use alloc::vec::Vec;
use core::fmt;

use crate::coord::Coord;
use crate::resample::{POINTS_PER_RESUME, PathCursor, Reprojector};
use crate::task::MicroTask;
use crate::tree::{LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon, Ring};

/// Reprojects a [`MultiPolygon`] ring by ring.
pub struct MultiPolygonTransform<S, T, F> {
    source: MultiPolygon<S>,
    reprojector: Reprojector<S, T, F>,
    polygon: usize,
    ring: usize,
    cursor: PathCursor<S, T>,
    rings: Vec<Ring<T>>,
    outer_dropped: bool,
    polygons: Vec<Polygon<T>>,
    result: Option<MultiPolygon<T>>,
    done: bool,
}

impl<S, T, F> fmt::Debug for MultiPolygonTransform<S, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiPolygonTransform")
            .field("polygon", &self.polygon)
            .field("ring", &self.ring)
            .finish_non_exhaustive()
    }
}

impl<S, T, F> MultiPolygonTransform<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    /// Create the task.
    pub fn new(source: MultiPolygon<S>, reprojector: Reprojector<S, T, F>) -> Self {
        let done = source.is_empty();
        Self {
            source,
            reprojector,
            polygon: 0,
            ring: 0,
            cursor: PathCursor::new(),
            rings: Vec::new(),
            outer_dropped: false,
            polygons: Vec::new(),
            result: done.then(MultiPolygon::default),
            done,
        }
    }

    fn finish_ring(&mut self) {
        self.cursor.close(&mut self.reprojector);
        let points = self.cursor.finish();
        if points.len() >= 3 {
            if !self.outer_dropped {
                self.rings.push(Ring::new(points));
            }
        } else if self.ring == 0 {
            self.outer_dropped = true;
        }
        self.ring += 1;
    }

    fn finish_polygon(&mut self) {
        let rings = core::mem::take(&mut self.rings);
        if !self.outer_dropped && !rings.is_empty() {
            self.polygons.push(Polygon::new(rings));
        }
        self.outer_dropped = false;
        self.ring = 0;
        self.polygon += 1;
    }
}

impl<S, T, F> MicroTask for MultiPolygonTransform<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    type Output = MultiPolygon<T>;

    fn resume(&mut self) {
        if self.done {
            return;
        }
        let mut budget = POINTS_PER_RESUME;
        while budget > 0 {
            let Some(polygon) = self.source.polygons().get(self.polygon) else {
                let polygons = core::mem::take(&mut self.polygons);
                self.result = Some(MultiPolygon::new(polygons));
                self.done = true;
                return;
            };
            // Closing a ring or polygon costs one unit, so empty ones still bound the step.
            budget -= 1;
            let Some(ring) = polygon.rings().get(self.ring) else {
                self.finish_polygon();
                continue;
            };
            if !self
                .cursor
                .advance(ring.points(), &mut self.reprojector, &mut budget)
            {
                return;
            }
            self.finish_ring();
        }
    }

    fn alive(&self) -> bool {
        !self.done
    }

    fn take_result(&mut self) -> Option<MultiPolygon<T>> {
        if self.done { self.result.take() } else { None }
    }
}

/// Reprojects a [`MultiLineString`] line by line.
pub struct MultiLineStringTransform<S, T, F> {
    source: MultiLineString<S>,
    reprojector: Reprojector<S, T, F>,
    line: usize,
    cursor: PathCursor<S, T>,
    lines: Vec<LineString<T>>,
    result: Option<MultiLineString<T>>,
    done: bool,
}

impl<S, T, F> fmt::Debug for MultiLineStringTransform<S, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiLineStringTransform")
            .field("line", &self.line)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<S, T, F> MultiLineStringTransform<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    /// Create the task.
    pub fn new(source: MultiLineString<S>, reprojector: Reprojector<S, T, F>) -> Self {
        let done = source.is_empty();
        Self {
            source,
            reprojector,
            line: 0,
            cursor: PathCursor::new(),
            lines: Vec::new(),
            result: done.then(MultiLineString::default),
            done,
        }
    }
}

impl<S, T, F> MicroTask for MultiLineStringTransform<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    type Output = MultiLineString<T>;

    fn resume(&mut self) {
        if self.done {
            return;
        }
        let mut budget = POINTS_PER_RESUME;
        while budget > 0 {
            let Some(line) = self.source.lines().get(self.line) else {
                let lines = core::mem::take(&mut self.lines);
                self.result = Some(MultiLineString::new(lines));
                self.done = true;
                return;
            };
            // Empty lines still cost one unit.
            budget -= 1;
            if !self
                .cursor
                .advance(line.points(), &mut self.reprojector, &mut budget)
            {
                return;
            }
            let points = self.cursor.finish();
            if points.len() >= 2 {
                self.lines.push(LineString::new(points));
            }
            self.line += 1;
        }
    }

    fn alive(&self) -> bool {
        !self.done
    }

    fn take_result(&mut self) -> Option<MultiLineString<T>> {
        if self.done { self.result.take() } else { None }
    }
}

/// Reprojects a [`MultiPoint`]. Points have no extent, so there is nothing to resample.
pub struct MultiPointTransform<S, T, F> {
    source: MultiPoint<S>,
    transform: F,
    index: usize,
    points: Vec<Coord<T>>,
    result: Option<MultiPoint<T>>,
    done: bool,
}

impl<S, T, F> fmt::Debug for MultiPointTransform<S, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiPointTransform")
            .field("index", &self.index)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<S, T, F> MultiPointTransform<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    /// Create the task.
    pub fn new(source: MultiPoint<S>, transform: F) -> Self {
        let done = source.is_empty();
        Self {
            source,
            transform,
            index: 0,
            points: Vec::new(),
            result: done.then(MultiPoint::default),
            done,
        }
    }
}

impl<S, T, F> MicroTask for MultiPointTransform<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    type Output = MultiPoint<T>;

    fn resume(&mut self) {
        if self.done {
            return;
        }
        let src = self.source.points();
        let end = (self.index + POINTS_PER_RESUME).min(src.len());
        self.points
            .extend(src[self.index..end].iter().filter_map(|p| (self.transform)(*p)));
        self.index = end;
        if self.index == src.len() {
            self.result = Some(MultiPoint::new(core::mem::take(&mut self.points)));
            self.done = true;
        }
    }

    fn alive(&self) -> bool {
        !self.done
    }

    fn take_result(&mut self) -> Option<MultiPoint<T>> {
        if self.done { self.result.take() } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{Client, World};
    use crate::task::run_to_completion;
    use alloc::vec;

    fn w(x: f64, y: f64) -> Coord<World> {
        Coord::new(x, y)
    }

    fn double(p: Coord<World>) -> Option<Coord<Client>> {
        Some(Coord::new(p.x * 2.0, p.y * 2.0))
    }

    fn square(x: f64, y: f64, side: f64) -> Ring<World> {
        Ring::new(vec![w(x, y), w(x + side, y), w(x + side, y + side), w(x, y + side)])
    }

    #[test]
    fn polygons_keep_structure() {
        let source = MultiPolygon::new(vec![
            Polygon::new(vec![square(0.0, 0.0, 10.0), square(2.0, 2.0, 1.0)]),
            Polygon::new(vec![square(20.0, 0.0, 1.0)]),
        ]);
        let task = MultiPolygonTransform::new(source, Reprojector::direct(double));
        let out = run_to_completion(task).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.polygons()[0].rings().len(), 2);
        assert_eq!(
            out.polygons()[1].rings()[0].points()[2],
            Coord::<Client>::new(42.0, 2.0)
        );
    }

    #[test]
    fn degenerate_rings_are_dropped() {
        let sliver = Ring::new(vec![w(0.0, 0.0), w(1.0, 0.0)]);
        let source = MultiPolygon::new(vec![
            // Degenerate outer ring drops the whole polygon, hole included.
            Polygon::new(vec![sliver.clone(), square(0.0, 0.0, 1.0)]),
            // A degenerate hole only drops the hole.
            Polygon::new(vec![square(0.0, 0.0, 4.0), sliver]),
        ]);
        let out =
            run_to_completion(MultiPolygonTransform::new(source, Reprojector::direct(double)))
                .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.polygons()[0].rings().len(), 1);
        assert_eq!(out.polygons()[0].rings()[0].len(), 4);
    }

    #[test]
    fn resampling_applies_to_ring_edges() {
        let source = MultiPolygon::new(vec![Polygon::new(vec![square(0.0, 0.0, 1.0)])]);
        let task = MultiPolygonTransform::new(source, Reprojector::resampling(1.5, double));
        let out = run_to_completion(task).unwrap();
        // Every doubled edge is 2.0 long and gains a midpoint, closing edge included.
        assert_eq!(out.polygons()[0].rings()[0].len(), 8);
    }

    #[test]
    fn lines_shorter_than_two_points_are_dropped() {
        let source = MultiLineString::new(vec![
            LineString::new(vec![w(0.0, 0.0)]),
            LineString::new(vec![w(0.0, 0.0), w(1.0, 1.0)]),
        ]);
        let out = run_to_completion(MultiLineStringTransform::new(
            source,
            Reprojector::direct(double),
        ))
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.lines()[0].points()[1], Coord::new(2.0, 2.0));
    }

    #[test]
    fn points_drop_unrepresentable_entries() {
        let source = MultiPoint::new(vec![w(1.0, 1.0), w(-1.0, 0.0), w(3.0, 0.0)]);
        let positive = |p: Coord<World>| (p.x > 0.0).then(|| p.retag::<Client>());
        let out = run_to_completion(MultiPointTransform::new(source, positive)).unwrap();
        assert_eq!(out.points(), [Coord::new(1.0, 1.0), Coord::new(3.0, 0.0)]);
    }

    #[test]
    fn empty_inputs_finish_immediately() {
        let mut polygons = MultiPolygonTransform::new(
            MultiPolygon::<World>::default(),
            Reprojector::direct(double),
        );
        assert!(!polygons.alive());
        assert_eq!(polygons.take_result(), Some(MultiPolygon::default()));
        let lines = MultiLineStringTransform::new(
            MultiLineString::<World>::default(),
            Reprojector::direct(double),
        );
        assert!(!lines.alive());
    }

    #[test]
    fn large_rings_take_several_resumes() {
        let n = POINTS_PER_RESUME * 3;
        let ring = Ring::new((0..n).map(|i| w(i as f64, (i % 2) as f64)).collect());
        let mut task = MultiPolygonTransform::new(
            MultiPolygon::new(vec![Polygon::new(vec![ring])]),
            Reprojector::direct(double),
        );
        let mut resumes = 0;
        while task.alive() {
            task.resume();
            resumes += 1;
        }
        assert!(resumes >= 3);
        assert_eq!(task.take_result().unwrap().polygons()[0].rings()[0].len(), n);
    }

    #[test]
    fn empty_rings_still_consume_the_step_budget() {
        let empty = Polygon::new(vec![Ring::new(vec![]); POINTS_PER_RESUME * 2]);
        let source = MultiPolygon::new(vec![empty; 2]);
        let mut task = MultiPolygonTransform::new(source, Reprojector::direct(double));
        task.resume();
        assert!(task.alive());
        assert_eq!(run_to_completion(task).unwrap().len(), 0);

        let lines = MultiLineString::new(vec![LineString::new(vec![]); POINTS_PER_RESUME * 2]);
        let mut task = MultiLineStringTransform::new(lines, Reprojector::direct(double));
        task.resume();
        assert!(task.alive());
    }

    /// A space tag with no traits at all.
    struct Bare;

    #[test]
    fn transforms_accept_any_space_tag() {
        let ring = Ring::<Bare>::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(1.0, 1.0),
        ]);
        let to_world = |p: Coord<Bare>| Some(p.retag::<World>());
        let polygons = MultiPolygonTransform::new(
            MultiPolygon::new(vec![Polygon::new(vec![ring.clone()])]),
            Reprojector::resampling(0.5, to_world),
        );
        let out = run_to_completion(polygons).unwrap();
        assert_eq!(out.polygons()[0].rings()[0].points()[1], w(0.5, 0.0));

        let lines = MultiLineStringTransform::new(
            MultiLineString::new(vec![LineString::new(ring.points().to_vec())]),
            Reprojector::direct(|p: Coord<Bare>| Some(p)),
        );
        let out = run_to_completion(lines).unwrap();
        assert_eq!(out.lines()[0].len(), 3);

        let empty = MultiPolygonTransform::new(
            MultiPolygon::<Bare>::default(),
            Reprojector::direct(|p: Coord<Bare>| Some(p)),
        );
        assert_eq!(run_to_completion(empty), Some(MultiPolygon::default()));
    }
}
