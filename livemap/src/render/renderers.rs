// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Vec2;
use livemap_geometry::{Bounds, Client, Coord, Geometry, World};
use livemap_index::CellKey;
use livemap_view::Viewport;

use super::Context2d;
use crate::ecs::{EntityId, World as EcsWorld};
use crate::overlay::{ScreenGeometry, WorldGeometry};
use crate::tiles::{CellComponent, TileComponent};

/// Draws one entity.
///
/// Renderers are shared between entities and read everything they need from
/// the entity's components.
pub trait Renderer {
    /// Draw `entity` as seen through `viewport`.
    fn render(
        &self,
        world: &EcsWorld,
        entity: EntityId,
        viewport: &Viewport,
        ctx: &mut dyn Context2d,
    );
}

/// Draws nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&self, _: &EcsWorld, _: EntityId, _: &Viewport, _: &mut dyn Context2d) {}
}

/// Draws a cell's [`TileComponent`] over every visible copy of the cell.
#[derive(Copy, Clone, Debug, Default)]
pub struct TileRenderer;

impl Renderer for TileRenderer {
    fn render(
        &self,
        world: &EcsWorld,
        entity: EntityId,
        viewport: &Viewport,
        ctx: &mut dyn Context2d,
    ) {
        let (Some(CellComponent(cell)), Some(TileComponent(tile))) = (
            world.get::<CellComponent>(entity),
            world.get::<TileComponent>(entity),
        ) else {
            return;
        };
        if tile.is_empty() {
            return;
        }
        let rect = cell_bounds(*cell, viewport);
        for origin in viewport.helper().get_origins(rect, viewport.window()) {
            let dst = viewport.client_rect_of(rect.translate(origin.to_point().to_vec2()));
            tile.draw(ctx, dst.rect());
        }
    }
}

fn cell_bounds(cell: CellKey, viewport: &Viewport) -> Bounds<World> {
    Bounds::from_rect(cell.compute_rect(viewport.helper().map_rect().rect()))
}

/// Half the side of the square drawn for a point, in client pixels.
const POINT_RADIUS: f64 = 2.0;

/// Fills and strokes polygon areas; strokes lines (clipped borders).
#[derive(Copy, Clone, Debug, Default)]
pub struct PolygonRenderer;

impl Renderer for PolygonRenderer {
    fn render(
        &self,
        world: &EcsWorld,
        entity: EntityId,
        viewport: &Viewport,
        ctx: &mut dyn Context2d,
    ) {
        for_each_copy(world, entity, viewport, ctx, |geometry, ctx, _| match geometry {
            Geometry::Polygons(polygons) => {
                ctx.begin_path();
                for polygon in polygons.polygons() {
                    for ring in polygon.rings() {
                        trace(ctx, ring.points(), true);
                    }
                }
                ctx.fill();
                ctx.stroke();
            }
            Geometry::Lines(lines) => stroke_lines(ctx, lines.lines().iter().map(|l| l.points())),
            Geometry::Points(_) => {}
        });
    }
}

/// Strokes lines and marks points with small squares.
#[derive(Copy, Clone, Debug, Default)]
pub struct PathRenderer;

impl Renderer for PathRenderer {
    fn render(
        &self,
        world: &EcsWorld,
        entity: EntityId,
        viewport: &Viewport,
        ctx: &mut dyn Context2d,
    ) {
        for_each_copy(world, entity, viewport, ctx, |geometry, ctx, scale| match geometry {
            Geometry::Lines(lines) => stroke_lines(ctx, lines.lines().iter().map(|l| l.points())),
            Geometry::Points(points) => {
                // The path is drawn under `scale`, the marker size is in pixels.
                let r = POINT_RADIUS / scale;
                ctx.begin_path();
                for p in points.points() {
                    let square = [
                        Coord::<Client>::new(p.x - r, p.y - r),
                        Coord::new(p.x + r, p.y - r),
                        Coord::new(p.x + r, p.y + r),
                        Coord::new(p.x - r, p.y + r),
                    ];
                    trace(ctx, &square, true);
                }
                ctx.fill();
            }
            Geometry::Polygons(polygons) => stroke_lines(
                ctx,
                polygons
                    .polygons()
                    .iter()
                    .flat_map(|p| p.rings())
                    .map(|r| r.points()),
            ),
        });
    }
}

/// Run `draw` once per visible copy of the entity's screen geometry, with the
/// context transformed so geometry coordinates land on the right pixels.
///
/// `draw` also receives the scale applied to the geometry.
fn for_each_copy(
    world: &EcsWorld,
    entity: EntityId,
    viewport: &Viewport,
    ctx: &mut dyn Context2d,
    mut draw: impl FnMut(&Geometry<Client>, &mut dyn Context2d, f64),
) {
    let (Some(screen), Some(WorldGeometry { bbox: Some(bbox), .. })) = (
        world.get::<ScreenGeometry>(entity),
        world.get::<WorldGeometry>(entity),
    ) else {
        return;
    };
    let scale = viewport.zoom_scale();
    // Geometry built for another zoom is stretched until its replacement lands.
    let stretch = scale / (1_u64 << screen.zoom) as f64;
    let position = viewport.position();
    let half = Vec2::new(viewport.size().width, viewport.size().height) / 2.0;
    for origin in viewport.helper().get_origins(*bbox, viewport.window()) {
        let offset = (origin.offset_from(position)) * scale + half;
        ctx.save();
        ctx.translate(offset);
        ctx.scale(stretch);
        draw(&screen.geometry, ctx, stretch);
        ctx.restore();
    }
}

fn trace(ctx: &mut dyn Context2d, points: &[Coord<Client>], close: bool) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    ctx.move_to(first.to_point());
    for p in rest {
        ctx.line_to(p.to_point());
    }
    if close {
        ctx.close_path();
    }
}

fn stroke_lines<'a>(ctx: &mut dyn Context2d, lines: impl Iterator<Item = &'a [Coord<Client>]>) {
    ctx.begin_path();
    for line in lines {
        trace(ctx, line, false);
    }
    ctx.stroke();
}
