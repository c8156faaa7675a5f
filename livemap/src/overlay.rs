// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Components of vector overlay entities.
//!
//! An overlay moves through three stages: [`SourceGeometry`] in lon/lat is
//! projected once into [`WorldGeometry`], which is scaled per zoom level into
//! [`ScreenGeometry`]. Both steps run as micro-tasks.

use livemap_geometry::{Bounds, Client, Geometry, LonLat, World};

/// Geometry as supplied, in degrees.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceGeometry(pub Geometry<LonLat>);

/// Projected geometry and its bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldGeometry {
    /// The projected tree.
    pub geometry: Geometry<World>,
    /// Bounds of the tree; `None` when every point was dropped.
    pub bbox: Option<Bounds<World>>,
}

impl WorldGeometry {
    /// Wrap a projected tree, computing its bounds.
    pub fn new(geometry: Geometry<World>) -> Self {
        let bbox = geometry.bbox();
        Self { geometry, bbox }
    }
}

/// Geometry in client pixels for one zoom level.
///
/// Coordinates are world coordinates times `2^zoom`, not yet offset by the
/// view position, so panning does not invalidate them.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenGeometry {
    /// Zoom the geometry was scaled for.
    pub zoom: u8,
    /// Scaled tree.
    pub geometry: Geometry<Client>,
}

/// Draw only the outline of polygon areas, restricted to a world rectangle.
///
/// Edges lying on the rectangle's border are hidden.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BorderClip(pub Bounds<World>);

/// A screen geometry task for this zoom is in flight.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScreenPending(pub u8);

/// Projection into world space is in flight.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectionPending;
