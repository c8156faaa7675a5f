// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use super::MapContext;
use crate::ecs::{System, World};
use crate::tiles::ViewportGridState;

/// Recomputes the visible cell set and its deltas from the viewport.
#[derive(Debug, Default)]
pub struct ViewportGridSystem;

impl System<MapContext> for ViewportGridSystem {
    fn name(&self) -> &'static str {
        "viewport_grid"
    }

    fn update(&mut self, world: &mut World, ctx: &mut MapContext, _dt: Duration) {
        let zoom = ctx.viewport.zoom();
        let visible = ctx.viewport.visible_cells();
        let Some(grid) = world.singleton_mut::<ViewportGridState>() else {
            return;
        };
        grid.update(zoom, visible);
        if !grid.to_load().is_empty() || !grid.to_remove().is_empty() {
            tracing::trace!(
                target: "livemap::tiles",
                zoom,
                visible = grid.visible().len(),
                to_load = grid.to_load().len(),
                to_remove = grid.to_remove().len(),
                "grid.changed"
            );
        }
    }
}
