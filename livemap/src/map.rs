// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The map facade: one world, one schedule, one view.

use std::rc::Rc;
use std::time::Duration;

use kurbo::Size;
use livemap_geometry::{
    Bounds, Coord, Geometry, LonLat, MultiLineString, MultiPoint, MultiPolygon, World,
};
use livemap_view::{Viewport, ViewportHelper};

use crate::config::LiveMapConfig;
use crate::ecs::{EntityId, SystemSchedule, SystemTimings, World as EcsWorld};
use crate::error::{ConfigError, MapError};
use crate::multitasking::MicroTaskSystem;
use crate::overlay::{BorderClip, SourceGeometry};
use crate::projection::Mercator;
use crate::render::{Context2d, PathRenderer, PolygonRenderer, Renderer, TileRenderer};
use crate::systems::{
    BasemapCellsRemovingSystem, GeometryProjectionSystem, MapContext, RenderSystem,
    ScreenGeometrySystem, TileLoadingSystem, ViewportGridSystem,
};
use crate::tiles::{
    CellLayerKind, RendererComponent, Snapshot, TileBackend, TileEvents, TileLayer,
    TileStatistics, ViewportGridState,
};

/// An interactive tile map with vector overlays.
///
/// Drive it by calling [`tick`](Self::tick) once per frame. Each tick runs,
/// in order: the viewport grid, tile loading, cell removal, micro-tasks,
/// overlay projection and scaling, and rendering, then replays the frame
/// onto the host's [`Context2d`].
pub struct LiveMap {
    world: EcsWorld,
    schedule: SystemSchedule<MapContext>,
    ctx: MapContext,
    map_entity: EntityId,
    projection: Mercator,
}

impl std::fmt::Debug for LiveMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveMap")
            .field("world", &self.world)
            .field("schedule", &self.schedule)
            .field("viewport", &self.ctx.viewport)
            .finish_non_exhaustive()
    }
}

impl LiveMap {
    /// Build a map from a configuration.
    pub fn new(config: LiveMapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let helper = ViewportHelper::new(config.map_rect(), config.loop_axes());
        let viewport = Viewport::new(
            helper,
            config.client_size(),
            config.min_zoom,
            config.max_zoom,
        );
        let projection = Mercator::new(config.map_rect());

        let mut world = EcsWorld::new();
        let map_entity = world.spawn("map");
        world.insert(map_entity, ViewportGridState::default());
        world.insert(map_entity, TileStatistics::default());
        world.insert(map_entity, TileEvents::default());

        let mut schedule = SystemSchedule::new();
        schedule
            .add(ViewportGridSystem)
            .add(TileLoadingSystem::new())
            .add(BasemapCellsRemovingSystem::new(config.tile_cache_limit))
            .add(MicroTaskSystem::new(config.micro_task_quantum))
            .add(GeometryProjectionSystem::new(
                projection,
                config.resampling_precision,
            ))
            .add(ScreenGeometrySystem)
            .add(RenderSystem::default());

        tracing::info!(
            target: "livemap",
            min_zoom = config.min_zoom,
            max_zoom = config.max_zoom,
            cache_limit = ?config.tile_cache_limit,
            "map.created"
        );
        Ok(Self {
            world,
            schedule,
            ctx: MapContext::new(viewport),
            map_entity,
            projection,
        })
    }

    /// Add a basemap layer. Layers draw in the order they were added.
    pub fn add_tile_layer(
        &mut self,
        kind: CellLayerKind,
        backend: impl TileBackend + 'static,
        placeholder: Option<Snapshot>,
    ) -> Result<EntityId, MapError> {
        if self.world.iter::<TileLayer>().any(|(_, l)| l.kind() == kind) {
            return Err(MapError::DuplicateLayer(kind));
        }
        let entity = self.world.spawn(format!("{kind:?} layer"));
        let renderer: Rc<dyn Renderer> = Rc::new(TileRenderer);
        self.world.insert(
            entity,
            TileLayer::new(kind, Box::new(backend), renderer, placeholder),
        );
        Ok(entity)
    }

    fn add_overlay(
        &mut self,
        name: &str,
        geometry: Geometry<LonLat>,
        renderer: Rc<dyn Renderer>,
    ) -> EntityId {
        let entity = self.world.spawn(name);
        self.world.insert(entity, SourceGeometry(geometry));
        self.world.insert(entity, RendererComponent(renderer));
        entity
    }

    /// Add filled polygons given in degrees.
    pub fn add_polygons(&mut self, polygons: MultiPolygon<LonLat>) -> EntityId {
        self.add_overlay("polygons", Geometry::Polygons(polygons), Rc::new(PolygonRenderer))
    }

    /// Add the outline of polygons given in degrees, hiding edges that lie on
    /// the border of `clip` (a world rectangle) and everything outside it.
    pub fn add_polygon_borders(
        &mut self,
        polygons: MultiPolygon<LonLat>,
        clip: Bounds<World>,
    ) -> EntityId {
        let entity = self.add_overlay(
            "polygon borders",
            Geometry::Polygons(polygons),
            Rc::new(PolygonRenderer),
        );
        self.world.insert(entity, BorderClip(clip));
        entity
    }

    /// Add paths given in degrees.
    pub fn add_paths(&mut self, lines: MultiLineString<LonLat>) -> EntityId {
        self.add_overlay("paths", Geometry::Lines(lines), Rc::new(PathRenderer))
    }

    /// Add point markers given in degrees.
    pub fn add_points(&mut self, points: MultiPoint<LonLat>) -> EntityId {
        self.add_overlay("points", Geometry::Points(points), Rc::new(PathRenderer))
    }

    /// Remove an overlay. Its in-flight tasks are cancelled.
    pub fn remove(&mut self, overlay: EntityId) -> bool {
        if !self.world.contains::<SourceGeometry>(overlay) {
            return false;
        }
        self.world.despawn(overlay)
    }

    /// Center the view on a world point.
    pub fn set_position(&mut self, position: Coord<World>) {
        self.ctx.viewport.set_position(position);
    }

    /// Center the view on a lon/lat point. Unrepresentable points are ignored.
    pub fn set_center(&mut self, center: Coord<LonLat>) {
        if let Some(position) = self.projection.project(center) {
            self.set_position(position);
        }
    }

    /// Change the zoom, clamped to the configured range.
    pub fn set_zoom(&mut self, zoom: u8) {
        self.ctx.viewport.set_zoom(zoom);
    }

    /// Resize the client area.
    pub fn set_client_size(&mut self, size: Size) {
        self.ctx.viewport.set_size(size);
    }

    /// The view.
    pub fn viewport(&self) -> &Viewport {
        &self.ctx.viewport
    }

    /// Entities and components, for inspection.
    pub fn world(&self) -> &EcsWorld {
        &self.world
    }

    /// The lon/lat projection overlays go through.
    pub fn projection(&self) -> &Mercator {
        &self.projection
    }

    /// Tile traffic so far.
    pub fn statistics(&self) -> TileStatistics {
        self.world
            .get::<TileStatistics>(self.map_entity)
            .copied()
            .unwrap_or_default()
    }

    /// Per-system time spent in the last tick.
    pub fn timings(&self) -> &SystemTimings {
        self.schedule.timings()
    }

    /// Run one frame and draw it onto `ctx`.
    pub fn tick(&mut self, dt: Duration, ctx: &mut dyn Context2d) {
        self.schedule.tick(&mut self.world, &mut self.ctx, dt);
        self.ctx.display.replay(ctx);
    }
}
