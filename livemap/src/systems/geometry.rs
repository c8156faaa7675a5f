// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use livemap_geometry::{
    ClipMultiPolygonBorder, Client, Coord, Geometry, LonLat, MicroTask, MicroTaskExt,
    MultiLineStringTransform, MultiPointTransform, MultiPolygonTransform, Reprojector, World,
};

use super::MapContext;
use crate::ecs::{EntityId, System, World as EcsWorld};
use crate::multitasking::MicroThreadComponent;
use crate::overlay::{
    BorderClip, ProjectionPending, ScreenGeometry, ScreenPending, SourceGeometry, WorldGeometry,
};
use crate::projection::Mercator;

type GeometryTask<S> = Box<dyn MicroTask<Output = Geometry<S>>>;

/// Starts the lon/lat to world projection of new overlays.
///
/// Polygons and lines are resampled so that long edges follow the curvature
/// of the projection to within `precision` world units.
#[derive(Debug)]
pub struct GeometryProjectionSystem {
    projection: Mercator,
    precision: f64,
}

impl GeometryProjectionSystem {
    /// Create the system.
    pub fn new(projection: Mercator, precision: f64) -> Self {
        Self {
            projection,
            precision,
        }
    }

    fn task(&self, source: Geometry<LonLat>) -> GeometryTask<World> {
        let mercator = self.projection;
        let project = move |p: Coord<LonLat>| mercator.project(p);
        match source {
            Geometry::Polygons(polygons) => MultiPolygonTransform::new(
                polygons,
                Reprojector::resampling(self.precision, project),
            )
            .map(Geometry::Polygons)
            .boxed(),
            Geometry::Lines(lines) => MultiLineStringTransform::new(
                lines,
                Reprojector::resampling(self.precision, project),
            )
            .map(Geometry::Lines)
            .boxed(),
            Geometry::Points(points) => MultiPointTransform::new(points, project)
                .map(Geometry::Points)
                .boxed(),
        }
    }
}

impl System<MapContext> for GeometryProjectionSystem {
    fn name(&self) -> &'static str {
        "geometry_projection"
    }

    fn update(&mut self, world: &mut EcsWorld, _ctx: &mut MapContext, _dt: Duration) {
        let pending: Vec<(EntityId, Geometry<LonLat>)> = world
            .iter::<SourceGeometry>()
            .filter(|(e, _)| {
                !world.contains::<WorldGeometry>(*e) && !world.contains::<ProjectionPending>(*e)
            })
            .map(|(e, source)| (e, source.0.clone()))
            .collect();
        for (entity, source) in pending {
            let thread = MicroThreadComponent::with_edit(
                self.task(source),
                |geometry, world: &mut EcsWorld, entity| {
                    world.remove::<ProjectionPending>(entity);
                    world.insert(entity, WorldGeometry::new(geometry));
                },
            );
            world.insert(entity, ProjectionPending);
            world.insert(entity, thread);
            tracing::trace!(target: "livemap::overlay", %entity, "projection.started");
        }
    }
}

/// Keeps each overlay's screen geometry in step with the view's zoom.
///
/// When the zoom changes, a new scaling task replaces any in-flight one
/// (dropping it cancels it). Until it finishes, the previous screen geometry
/// stays in place and is stretched by the renderer.
#[derive(Debug, Default)]
pub struct ScreenGeometrySystem;

impl ScreenGeometrySystem {
    fn task(source: &WorldGeometry, clip: Option<BorderClip>, zoom: u8) -> GeometryTask<Client> {
        let scale = (1_u64 << zoom) as f64;
        let to_screen = move |p: Coord<World>| Some(Coord::<Client>::new(p.x * scale, p.y * scale));
        match (&source.geometry, clip) {
            (Geometry::Polygons(polygons), Some(BorderClip(rect))) => {
                ClipMultiPolygonBorder::new(polygons.clone(), rect)
                    .flat_map(move |lines| {
                        MultiLineStringTransform::new(lines, Reprojector::direct(to_screen))
                    })
                    .map(Geometry::Lines)
                    .boxed()
            }
            (Geometry::Polygons(polygons), None) => {
                MultiPolygonTransform::new(polygons.clone(), Reprojector::direct(to_screen))
                    .map(Geometry::Polygons)
                    .boxed()
            }
            (Geometry::Lines(lines), _) => {
                MultiLineStringTransform::new(lines.clone(), Reprojector::direct(to_screen))
                    .map(Geometry::Lines)
                    .boxed()
            }
            (Geometry::Points(points), _) => MultiPointTransform::new(points.clone(), to_screen)
                .map(Geometry::Points)
                .boxed(),
        }
    }
}

impl System<MapContext> for ScreenGeometrySystem {
    fn name(&self) -> &'static str {
        "screen_geometry"
    }

    fn update(&mut self, world: &mut EcsWorld, ctx: &mut MapContext, _dt: Duration) {
        let zoom = ctx.viewport.zoom();
        let stale: Vec<EntityId> = world
            .iter::<WorldGeometry>()
            .map(|(e, _)| e)
            .filter(|e| {
                let current = world.get::<ScreenGeometry>(*e).is_some_and(|s| s.zoom == zoom);
                let pending = world.get::<ScreenPending>(*e) == Some(&ScreenPending(zoom));
                !current && !pending
            })
            .collect();
        for entity in stale {
            let Some(geometry) = world.get::<WorldGeometry>(entity) else {
                continue;
            };
            let clip = world.get::<BorderClip>(entity).copied();
            let task = Self::task(geometry, clip, zoom);
            let edit = move |geometry, world: &mut EcsWorld, entity| {
                if world.get::<ScreenPending>(entity) == Some(&ScreenPending(zoom)) {
                    world.remove::<ScreenPending>(entity);
                }
                world.insert(entity, ScreenGeometry { zoom, geometry });
            };
            let thread = MicroThreadComponent::with_edit(task, edit);
            if world.insert(entity, ScreenPending(zoom)).is_some() {
                tracing::trace!(target: "livemap::overlay", %entity, zoom, "screen.superseded");
            }
            world.insert(entity, thread);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multitasking::MicroTaskSystem;
    use kurbo::Size;
    use livemap_geometry::{Bounds, LineString, MultiLineString, MultiPolygon, Polygon, Ring};
    use livemap_view::{LoopAxes, Viewport, ViewportHelper};

    fn context() -> MapContext {
        let helper = ViewportHelper::new(Bounds::new(0.0, 0.0, 256.0, 256.0), LoopAxes::X);
        MapContext::new(Viewport::new(helper, Size::new(256.0, 256.0), 0, 6))
    }

    fn run(world: &mut EcsWorld, ctx: &mut MapContext, ticks: usize) {
        let mercator = Mercator::new(Bounds::new(0.0, 0.0, 256.0, 256.0));
        let mut projection = GeometryProjectionSystem::new(mercator, 0.004);
        let mut tasks = MicroTaskSystem::new(8);
        let mut screen = ScreenGeometrySystem;
        for _ in 0..ticks {
            projection.update(world, ctx, Duration::ZERO);
            System::<MapContext>::update(&mut tasks, world, ctx, Duration::ZERO);
            screen.update(world, ctx, Duration::ZERO);
        }
    }

    fn line(points: &[(f64, f64)]) -> Geometry<LonLat> {
        let points = points.iter().map(|&(x, y)| Coord::new(x, y)).collect();
        Geometry::Lines(MultiLineString::new(vec![LineString::new(points)]))
    }

    #[test]
    fn overlays_reach_screen_space() {
        let mut world = EcsWorld::new();
        let mut ctx = context();
        ctx.viewport.set_zoom(1);
        let id = world.spawn("route");
        world.insert(id, SourceGeometry(line(&[(-90.0, 0.0), (90.0, 0.0)])));
        run(&mut world, &mut ctx, 20);

        let world_geometry = world.get::<WorldGeometry>(id).unwrap();
        let bbox = world_geometry.bbox.unwrap();
        assert!((bbox.x0() - 64.0).abs() < 1e-9);
        assert!((bbox.x1() - 192.0).abs() < 1e-9);

        let screen = world.get::<ScreenGeometry>(id).unwrap();
        assert_eq!(screen.zoom, 1);
        let Geometry::Lines(lines) = &screen.geometry else {
            panic!("expected lines");
        };
        let first = lines.lines()[0].points()[0];
        assert!((first.x - 128.0).abs() < 1e-9);
        assert!((first.y - 256.0).abs() < 1e-9);
        assert!(!world.contains::<ScreenPending>(id));
        assert!(!world.contains::<ProjectionPending>(id));
    }

    #[test]
    fn zoom_change_rescales() {
        let mut world = EcsWorld::new();
        let mut ctx = context();
        let id = world.spawn("route");
        world.insert(id, SourceGeometry(line(&[(0.0, 0.0), (10.0, 0.0)])));
        run(&mut world, &mut ctx, 20);
        assert_eq!(world.get::<ScreenGeometry>(id).unwrap().zoom, 0);

        ctx.viewport.set_zoom(3);
        run(&mut world, &mut ctx, 20);
        assert_eq!(world.get::<ScreenGeometry>(id).unwrap().zoom, 3);
    }

    #[test]
    fn clipped_polygons_become_outlines() {
        let mut world = EcsWorld::new();
        let mut ctx = context();
        let id = world.spawn("area");
        let ring = Ring::new(vec![
            Coord::new(-10.0, 10.0),
            Coord::new(10.0, 10.0),
            Coord::new(10.0, -10.0),
            Coord::new(-10.0, -10.0),
        ]);
        world.insert(
            id,
            SourceGeometry(Geometry::Polygons(MultiPolygon::new(vec![Polygon::new(vec![ring])]))),
        );
        // Only the left half of the world: the polygon's right edge is cut away.
        world.insert(id, BorderClip(Bounds::new(0.0, 0.0, 128.0, 256.0)));
        run(&mut world, &mut ctx, 20);

        let screen = world.get::<ScreenGeometry>(id).unwrap();
        let Geometry::Lines(lines) = &screen.geometry else {
            panic!("expected outline");
        };
        assert!(!lines.is_empty());
        let max_x = lines
            .lines()
            .iter()
            .flat_map(|l| l.points())
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(max_x <= 128.0 + 1e-9);
    }
}
