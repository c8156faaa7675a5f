// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adaptive resampling and point-by-point reprojection of paths.

use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::coord::Coord;
use crate::task::MicroTask;
use crate::tree::LineString;

/// Default resampling tolerance, in target-space units.
pub const DEFAULT_PRECISION: f64 = 0.004;

/// Default bisection depth limit. A single source segment never yields more
/// than `2^DEFAULT_MAX_DEPTH` output segments.
pub const DEFAULT_MAX_DEPTH: u32 = 9;

/// Source points consumed by one `resume()` of any pipeline task.
pub const POINTS_PER_RESUME: usize = 256;

/// Subdivides source segments until their image under a transform is
/// straight enough.
///
/// A segment `p1 -> p2` is accepted when the transformed chord `q1 -> q2` is
/// at most `precision` long and the transformed source midpoint lies within
/// `precision` of the chord midpoint. Otherwise it is bisected in source
/// space. Bisection stops at `max_depth` whether or not the tolerance is met,
/// which keeps singularities of the transform from recursing forever.
pub struct AdaptiveResampler<S, T, F> {
    precision: f64,
    max_depth: u32,
    transform: F,
    spaces: PhantomData<fn(Coord<S>) -> Coord<T>>,
}

impl<S, T, F> fmt::Debug for AdaptiveResampler<S, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveResampler")
            .field("precision", &self.precision)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl<S, T, F> AdaptiveResampler<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    /// Create a resampler with [`DEFAULT_MAX_DEPTH`].
    pub fn new(precision: f64, transform: F) -> Self {
        Self {
            precision,
            max_depth: DEFAULT_MAX_DEPTH,
            transform,
            spaces: PhantomData,
        }
    }

    /// Override the bisection depth limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The tolerance.
    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// Apply the transform to a single point.
    pub fn project(&mut self, p: Coord<S>) -> Option<Coord<T>> {
        (self.transform)(p)
    }

    /// Append the image of `p1 -> p2` to `out`, excluding `q1` and including `q2`.
    ///
    /// `q1` and `q2` must be the transformed endpoints.
    pub fn resample_segment(
        &mut self,
        (p1, q1): (Coord<S>, Coord<T>),
        (p2, q2): (Coord<S>, Coord<T>),
        out: &mut Vec<Coord<T>>,
    ) {
        self.bisect(p1, q1, p2, q2, 0, out);
    }

    fn bisect(
        &mut self,
        p1: Coord<S>,
        q1: Coord<T>,
        p2: Coord<S>,
        q2: Coord<T>,
        depth: u32,
        out: &mut Vec<Coord<T>>,
    ) {
        if depth >= self.max_depth {
            out.push(q2);
            return;
        }
        let pm = p1.lerp(p2, 0.5);
        let Some(qm) = (self.transform)(pm) else {
            // The midpoint has no image; keep the chord.
            out.push(q2);
            return;
        };
        let tolerance = self.precision * self.precision;
        let short = q1.distance_squared(q2) <= tolerance;
        let straight = qm.distance_squared(q1.lerp(q2, 0.5)) <= tolerance;
        if short && straight {
            out.push(q2);
            return;
        }
        self.bisect(p1, q1, pm, qm, depth + 1, out);
        self.bisect(pm, qm, p2, q2, depth + 1, out);
    }
}

/// How a pipeline task maps source points into the target space.
pub enum Reprojector<S, T, F> {
    /// Transform every point, nothing in between.
    Direct(F, PhantomData<fn(Coord<S>) -> Coord<T>>),
    /// Transform every point and insert extra points where the image bends.
    Resampling(AdaptiveResampler<S, T, F>),
}

impl<S, T, F> fmt::Debug for Reprojector<S, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(..) => f.write_str("Direct"),
            Self::Resampling(r) => f.debug_tuple("Resampling").field(r).finish(),
        }
    }
}

impl<S, T, F> Reprojector<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    /// Reproject without resampling.
    pub fn direct(transform: F) -> Self {
        Self::Direct(transform, PhantomData)
    }

    /// Reproject with adaptive resampling at `precision`.
    pub fn resampling(precision: f64, transform: F) -> Self {
        Self::Resampling(AdaptiveResampler::new(precision, transform))
    }

    fn project(&mut self, p: Coord<S>) -> Option<Coord<T>> {
        match self {
            Self::Direct(f, _) => f(p),
            Self::Resampling(r) => r.project(p),
        }
    }

    fn connect(
        &mut self,
        from: (Coord<S>, Coord<T>),
        to: (Coord<S>, Coord<T>),
        out: &mut Vec<Coord<T>>,
    ) {
        match self {
            Self::Direct(..) => out.push(to.1),
            Self::Resampling(r) => r.resample_segment(from, to, out),
        }
    }
}

/// Cursor over one point sequence, shared by every reprojection task.
pub(crate) struct PathCursor<S, T> {
    index: usize,
    first: Option<(Coord<S>, Coord<T>)>,
    last: Option<(Coord<S>, Coord<T>)>,
    out: Vec<Coord<T>>,
}

impl<S, T> PathCursor<S, T> {
    pub(crate) fn new() -> Self {
        Self {
            index: 0,
            first: None,
            last: None,
            out: Vec::new(),
        }
    }

    /// Consume up to `budget` source points. Returns `true` once `src` is exhausted.
    pub(crate) fn advance<F>(
        &mut self,
        src: &[Coord<S>],
        reprojector: &mut Reprojector<S, T, F>,
        budget: &mut usize,
    ) -> bool
    where
        F: FnMut(Coord<S>) -> Option<Coord<T>>,
    {
        while self.index < src.len() {
            if *budget == 0 {
                return false;
            }
            *budget -= 1;
            let p = src[self.index];
            self.index += 1;
            // Unrepresentable points are dropped; the next valid point bridges the gap.
            let Some(q) = reprojector.project(p) else {
                continue;
            };
            match self.last {
                Some(last) => reprojector.connect(last, (p, q), &mut self.out),
                None => {
                    self.first = Some((p, q));
                    self.out.push(q);
                }
            }
            self.last = Some((p, q));
        }
        true
    }

    /// Resample the implied closing edge of a ring, without repeating the first point.
    pub(crate) fn close<F>(&mut self, reprojector: &mut Reprojector<S, T, F>)
    where
        F: FnMut(Coord<S>) -> Option<Coord<T>>,
    {
        if self.out.len() < 2 {
            return;
        }
        if let (Some(first), Some(last)) = (self.first, self.last) {
            reprojector.connect(last, first, &mut self.out);
            self.out.pop();
        }
    }

    /// Take the output and reset for the next sequence.
    pub(crate) fn finish(&mut self) -> Vec<Coord<T>> {
        self.index = 0;
        self.first = None;
        self.last = None;
        core::mem::take(&mut self.out)
    }
}

/// Reprojects a single line string; see [`resample`] and [`transform`].
pub struct LineTask<S, T, F> {
    source: LineString<S>,
    reprojector: Reprojector<S, T, F>,
    cursor: PathCursor<S, T>,
    result: Option<LineString<T>>,
    done: bool,
}

impl<S, T, F> fmt::Debug for LineTask<S, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineTask")
            .field("reprojector", &self.reprojector)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<S, T, F> LineTask<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    /// Create a task reprojecting `source` with `reprojector`.
    pub fn new(source: LineString<S>, reprojector: Reprojector<S, T, F>) -> Self {
        let done = source.is_empty();
        Self {
            source,
            reprojector,
            cursor: PathCursor::new(),
            result: done.then(LineString::default),
            done,
        }
    }
}

impl<S, T, F> MicroTask for LineTask<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    type Output = LineString<T>;

    fn resume(&mut self) {
        if self.done {
            return;
        }
        let mut budget = POINTS_PER_RESUME;
        if self
            .cursor
            .advance(self.source.points(), &mut self.reprojector, &mut budget)
        {
            self.result = Some(LineString::new(self.cursor.finish()));
            self.done = true;
        }
    }

    fn alive(&self) -> bool {
        !self.done
    }

    fn take_result(&mut self) -> Option<LineString<T>> {
        if self.done { self.result.take() } else { None }
    }
}

/// Reproject a line string with adaptive resampling.
///
/// ```rust
/// use livemap_geometry::{Coord, LineString, Untyped, resample, run_to_completion};
///
/// let line = LineString::<Untyped>::new(vec![Coord::new(0.0, 0.0), Coord::new(2.0, 0.0)]);
/// let out = run_to_completion(resample(line, 1.0, |p: Coord<Untyped>| Some(p))).unwrap();
/// assert_eq!(out.len(), 3);
/// ```
pub fn resample<S, T, F>(
    line: LineString<S>,
    precision: f64,
    f: F,
) -> LineTask<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    LineTask::new(line, Reprojector::resampling(precision, f))
}

/// Reproject a line string point by point.
pub fn transform<S, T, F>(line: LineString<S>, f: F) -> LineTask<S, T, F>
where
    F: FnMut(Coord<S>) -> Option<Coord<T>>,
{
    LineTask::new(line, Reprojector::direct(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Untyped;
    use crate::task::run_to_completion;
    use alloc::vec;

    fn c(x: f64, y: f64) -> Coord<Untyped> {
        Coord::new(x, y)
    }

    fn identity(p: Coord<Untyped>) -> Option<Coord<Untyped>> {
        Some(p)
    }

    #[test]
    fn bisects_long_segments() {
        let line = LineString::new(vec![c(0.0, 0.0), c(1.0, 0.0), c(2.0, 0.0)]);
        let out = run_to_completion(resample(line, 0.999, identity)).unwrap();
        assert_eq!(
            out.points(),
            [c(0.0, 0.0), c(0.5, 0.0), c(1.0, 0.0), c(1.5, 0.0), c(2.0, 0.0)]
        );
    }

    #[test]
    fn fine_paths_are_unchanged() {
        let points = vec![c(0.0, 0.0), c(0.001, 0.002), c(0.003, 0.002), c(0.004, 0.0)];
        let line = LineString::new(points.clone());
        let out = run_to_completion(resample(line, DEFAULT_PRECISION, identity)).unwrap();
        assert_eq!(out.points(), points.as_slice());
    }

    #[test]
    fn depth_limit_bounds_output() {
        let line = LineString::new(vec![c(0.0, 0.0), c(1000.0, 0.0)]);
        let out = run_to_completion(resample(line, 1e-9, identity)).unwrap();
        assert_eq!(out.len(), (1 << DEFAULT_MAX_DEPTH) + 1);
    }

    #[test]
    fn curved_images_get_extra_points() {
        // A parabola: straight in source space, bent in target space.
        let bend = |p: Coord<Untyped>| Some(Coord::<Untyped>::new(p.x, p.x * p.x));
        let line = LineString::new(vec![c(-1.0, 0.0), c(1.0, 0.0)]);
        let out = run_to_completion(resample(line, 0.01, bend)).unwrap();
        assert!(out.len() > 2);
        for p in out.points() {
            assert!((p.y - p.x * p.x).abs() < 1e-12);
        }
    }

    #[test]
    fn unrepresentable_points_are_dropped() {
        let hole = |p: Coord<Untyped>| (p.x != 1.0).then_some(p);
        let line = LineString::new(vec![c(0.0, 0.0), c(1.0, 0.0), c(2.0, 0.0)]);
        let out = run_to_completion(transform(line, hole)).unwrap();
        assert_eq!(out.points(), [c(0.0, 0.0), c(2.0, 0.0)]);
    }

    #[test]
    fn empty_input_finishes_immediately() {
        let mut task = transform(LineString::<Untyped>::default(), identity);
        assert!(!task.alive());
        assert_eq!(task.take_result(), Some(LineString::default()));
    }

    #[test]
    fn work_is_spread_over_resumes() {
        let points: Vec<_> = (0..POINTS_PER_RESUME * 2 + 1)
            .map(|i| c(i as f64, 0.0))
            .collect();
        let mut task = transform(LineString::new(points), identity);
        let mut resumes = 0;
        while task.alive() {
            task.resume();
            resumes += 1;
        }
        assert_eq!(resumes, 3);
        assert_eq!(task.take_result().unwrap().len(), POINTS_PER_RESUME * 2 + 1);
    }

    #[test]
    fn ring_closing_edge_is_resampled() {
        let mut reprojector = Reprojector::resampling(0.6, identity);
        let mut cursor = PathCursor::new();
        let mut budget = usize::MAX;
        let ring = [c(0.0, 0.0), c(0.5, 0.0), c(0.5, 0.5)];
        assert!(cursor.advance(&ring, &mut reprojector, &mut budget));
        cursor.close(&mut reprojector);
        let out = cursor.finish();
        // The closing diagonal is longer than 0.6 and gains its midpoint.
        assert_eq!(out, vec![c(0.0, 0.0), c(0.5, 0.0), c(0.5, 0.5), c(0.25, 0.25)]);
    }
}
