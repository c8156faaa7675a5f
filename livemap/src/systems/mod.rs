// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-tick pipeline.
//!
//! [`LiveMap`](crate::LiveMap) runs these in order: viewport grid, tile
//! loading, cell removal, micro-tasks, overlay geometry, render.

mod geometry;
mod grid;
mod loading;
mod removing;
mod render;

pub use geometry::{GeometryProjectionSystem, ScreenGeometrySystem};
pub use grid::ViewportGridSystem;
pub use loading::TileLoadingSystem;
pub use removing::BasemapCellsRemovingSystem;
pub use render::RenderSystem;

use livemap_view::Viewport;

use crate::render::DisplayList;

/// State shared by all systems of a map's schedule.
#[derive(Clone, Debug)]
pub struct MapContext {
    /// The view being rendered.
    pub viewport: Viewport,
    /// Output of the render system, replayed onto the host surface.
    pub display: DisplayList,
}

impl MapContext {
    /// Create a context with an empty display list.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            display: DisplayList::new(),
        }
    }
}
