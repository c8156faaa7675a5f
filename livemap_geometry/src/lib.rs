// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LiveMap Geometry: space-tagged geometry and a cooperative processing pipeline.
//!
//! Geometry trees ([`MultiPolygon`], [`MultiLineString`], [`MultiPoint`]) carry
//! their coordinate space as a type parameter ([`LonLat`], [`World`],
//! [`Client`]), so feeding lon/lat data to code that expects screen pixels is
//! a compile error rather than a rendering bug.
//!
//! Expensive work on unbounded input is expressed as a [`MicroTask`]: an
//! explicit state machine that does a bounded amount of work per
//! [`resume`](MicroTask::resume). The pipeline tasks are:
//!
//! - [`resample`] / [`transform`]: reproject a single line string, with or
//!   without [`AdaptiveResampler`] bisection.
//! - [`MultiPolygonTransform`], [`MultiLineStringTransform`],
//!   [`MultiPointTransform`]: reproject whole multi-geometries.
//! - [`ClipMultiPolygonBorder`]: trace the visible outline of polygons inside
//!   a rectangle.
//!
//! A transform returning `None` marks a point as unrepresentable in the
//! target space; such points are dropped rather than reported.
//!
//! # Example
//!
//! ```rust
//! use livemap_geometry::{
//!     Client, Coord, MicroTaskExt, MultiPolygon, MultiPolygonTransform, Polygon, Reprojector,
//!     Ring, World, run_to_completion,
//! };
//!
//! let square = Ring::new(vec![
//!     Coord::<World>::new(0.0, 0.0),
//!     Coord::new(1.0, 0.0),
//!     Coord::new(1.0, 1.0),
//!     Coord::new(0.0, 1.0),
//! ]);
//! let source = MultiPolygon::new(vec![Polygon::new(vec![square])]);
//! let to_screen = |p: Coord<World>| Some(Coord::<Client>::new(p.x * 100.0, p.y * 100.0));
//!
//! let task = MultiPolygonTransform::new(source, Reprojector::direct(to_screen))
//!     .map(|polygons| polygons.bbox());
//! let bbox = run_to_completion(task).flatten().unwrap();
//! assert_eq!(bbox.width(), 100.0);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod clip;
mod coord;
mod resample;
mod task;
mod transform;
mod tree;

pub use clip::{ClipMultiPolygonBorder, clip_segment};
pub use coord::{Bounds, Client, Coord, LonLat, Space, Untyped, World};
pub use resample::{
    AdaptiveResampler, DEFAULT_MAX_DEPTH, DEFAULT_PRECISION, LineTask, POINTS_PER_RESUME,
    Reprojector, resample, transform,
};
pub use task::{FlatMap, Join, Map, MicroTask, MicroTaskExt, Ready, join, ready, run_to_completion};
pub use transform::{MultiLineStringTransform, MultiPointTransform, MultiPolygonTransform};
pub use tree::{Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon, Ring};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn project_then_clip() {
        let ring = Ring::new(vec![
            Coord::<World>::new(0.0, 0.0),
            Coord::new(4.0, 0.0),
            Coord::new(4.0, 4.0),
            Coord::new(0.0, 4.0),
        ]);
        let source = MultiPolygon::new(vec![Polygon::new(vec![ring])]);
        let view = Bounds::<Client>::new(0.0, 0.0, 20.0, 20.0);
        let to_client = |p: Coord<World>| Some(Coord::<Client>::new(p.x * 10.0, p.y * 10.0));
        let task = MultiPolygonTransform::new(source, Reprojector::direct(to_client))
            .flat_map(move |polygons| ClipMultiPolygonBorder::new(polygons, view));
        let lines = run_to_completion(task).unwrap();
        // Left and top edges run along the view border, the rest is outside.
        assert!(lines.is_empty());
    }

    #[test]
    fn resampling_twice_is_stable() {
        let line = LineString::<Untyped>::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(3.0, 1.0),
            Coord::new(-2.0, 5.0),
        ]);
        let id = |p: Coord<Untyped>| Some(p);
        let once = run_to_completion(resample(line, 0.5, id)).unwrap();
        let twice = run_to_completion(resample(once.clone(), 0.5, id)).unwrap();
        assert_eq!(once, twice);
    }
}
