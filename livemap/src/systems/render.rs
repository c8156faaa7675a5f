// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use livemap_index::CellKey;

use super::MapContext;
use crate::ecs::{EntityId, System, World};
use crate::tiles::{CellComponent, RendererComponent, TileLayer, ViewportGridState};

/// Records one frame into the context's display list.
///
/// Basemap layers are drawn first, in the order they were added, each
/// visible cell once. Overlays follow in creation order.
#[derive(Debug, Default)]
pub struct RenderSystem {
    cells: Vec<CellKey>,
}

impl System<MapContext> for RenderSystem {
    fn name(&self) -> &'static str {
        "render"
    }

    fn update(&mut self, world: &mut World, ctx: &mut MapContext, _dt: Duration) {
        let MapContext { viewport, display } = ctx;
        display.clear();

        self.cells.clear();
        if let Some(grid) = world.singleton::<ViewportGridState>() {
            self.cells.extend(grid.visible().iter().copied());
        }
        self.cells.sort_unstable();

        let mut layers = world.entities_with::<TileLayer>();
        layers.sort_unstable();
        for layer_entity in layers {
            let Some(layer) = world.get::<TileLayer>(layer_entity) else {
                continue;
            };
            for &cell in &self.cells {
                let Some(entity) = layer.entity(cell) else {
                    continue;
                };
                if let Some(RendererComponent(renderer)) = world.get::<RendererComponent>(entity) {
                    renderer.render(world, entity, viewport, display);
                }
            }
        }

        let mut overlays: Vec<EntityId> = world
            .iter::<RendererComponent>()
            .map(|(e, _)| e)
            .filter(|e| !world.contains::<CellComponent>(*e))
            .collect();
        overlays.sort_unstable();
        for entity in overlays {
            if let Some(RendererComponent(renderer)) = world.get::<RendererComponent>(entity) {
                renderer.render(world, entity, viewport, display);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{ScreenGeometry, WorldGeometry};
    use crate::render::{DrawCommand, PolygonRenderer, TileRenderer};
    use crate::tiles::{CellLayerKind, Snapshot, SolidTileBackend, Tile, TileComponent};
    use hashbrown::HashSet;
    use kurbo::Size;
    use livemap_geometry::{Bounds, Coord, Geometry, MultiPolygon, Polygon, Ring};
    use livemap_view::{LoopAxes, Viewport, ViewportHelper};
    use std::rc::Rc;

    #[test]
    fn basemap_then_overlays() {
        let helper = ViewportHelper::new(Bounds::new(0.0, 0.0, 256.0, 256.0), LoopAxes::X);
        let mut ctx = MapContext::new(Viewport::new(helper, Size::new(256.0, 256.0), 0, 4));
        let mut world = World::new();
        let map = world.spawn("map");
        world.insert(map, ViewportGridState::default());
        let layer = world.spawn("layer");
        world.insert(
            layer,
            TileLayer::new(
                CellLayerKind::Raster,
                Box::new(SolidTileBackend::new(Snapshot::new(0, 1, 1))),
                Rc::new(TileRenderer),
                None,
            ),
        );

        // The overlay is spawned before the cell; order still puts tiles first.
        let overlay = world.spawn("overlay");
        let ring = Ring::new(vec![
            Coord::new(10.0, 10.0),
            Coord::new(20.0, 10.0),
            Coord::new(20.0, 20.0),
        ]);
        let polygons = Geometry::Polygons(MultiPolygon::new(vec![Polygon::new(vec![ring])]));
        world.insert(overlay, WorldGeometry::new(polygons));
        let screen = match &world.get::<WorldGeometry>(overlay).unwrap().geometry {
            Geometry::Polygons(p) => Geometry::Polygons(MultiPolygon::new(
                p.polygons()
                    .iter()
                    .map(|poly| {
                        Polygon::new(
                            poly.rings()
                                .iter()
                                .map(|r| Ring::new(r.points().iter().map(|c| c.retag()).collect()))
                                .collect(),
                        )
                    })
                    .collect(),
            )),
            _ => unreachable!(),
        };
        world.insert(overlay, ScreenGeometry { zoom: 0, geometry: screen });
        world.insert(overlay, RendererComponent(Rc::new(PolygonRenderer)));

        let cell = world.spawn("cell");
        world.insert(cell, CellComponent(CellKey::ROOT));
        world.insert(cell, TileComponent(Tile::Snapshot(Snapshot::new(5, 256, 256))));
        world.insert(cell, RendererComponent(Rc::new(TileRenderer)));
        world.get_mut::<TileLayer>(layer).unwrap().attach(CellKey::ROOT, cell);
        world
            .singleton_mut::<ViewportGridState>()
            .unwrap()
            .update(0, HashSet::from_iter([CellKey::ROOT]));

        let mut system = RenderSystem::default();
        system.update(&mut world, &mut ctx, Duration::ZERO);
        let first = ctx.display.commands().to_vec();
        assert!(matches!(first[0], DrawCommand::Image { ref snapshot, .. } if snapshot.id() == 5));
        assert!(first.contains(&DrawCommand::Fill));

        // A second frame replaces the first rather than appending to it.
        system.update(&mut world, &mut ctx, Duration::ZERO);
        assert_eq!(ctx.display.commands(), first.as_slice());
    }
}
