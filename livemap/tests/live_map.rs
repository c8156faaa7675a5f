// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior of the map facade, driven one tick at a time.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use livemap::render::{DisplayList, DrawCommand};
use livemap::tiles::{
    CellLayerKind, NonCacheable, Snapshot, SolidTileBackend, Tile, TileBackend, TileComponent,
    TileLayer, TileReply,
};
use livemap::{FetchError, LiveMap, LiveMapConfig};
use livemap_geometry::{Coord, MultiPolygon, Polygon, Ring};
use livemap_index::CellKey;

const FRAME: Duration = Duration::from_millis(16);

fn trace_init() {
    let collector = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .without_time()
        .finish();
    let _ = tracing::subscriber::set_global_default(collector);
}

fn key(s: &str) -> CellKey {
    s.parse().unwrap()
}

/// A 64 pixel client at zoom 2 sees a 16 unit window: exactly one cell when
/// centered on one.
fn config(limit: Option<usize>) -> LiveMapConfig {
    LiveMapConfig {
        tile_cache_limit: limit,
        min_zoom: 0,
        max_zoom: 4,
        client_size: (64.0, 64.0),
        ..LiveMapConfig::default()
    }
}

/// Center of the level 2 cell at column `x`, row `y`.
fn cell_center(x: u32, y: u32) -> Coord<livemap_geometry::World> {
    Coord::new(32.0 + 64.0 * f64::from(x), 32.0 + 64.0 * f64::from(y))
}

/// Holds replies until the test completes them.
#[derive(Clone, Default)]
struct Deferred(Rc<RefCell<Vec<TileReply>>>);

impl Deferred {
    /// The oldest pending reply for `cell`.
    fn take(&self, cell: CellKey) -> TileReply {
        let mut pending = self.0.borrow_mut();
        let at = pending.iter().position(|r| r.cell() == cell).unwrap();
        pending.remove(at)
    }
}

impl TileBackend for Deferred {
    fn request(&mut self, _cell: CellKey, reply: TileReply) {
        self.0.borrow_mut().push(reply);
    }
}

struct Harness {
    map: LiveMap,
    layer: livemap::ecs::EntityId,
    frame: DisplayList,
}

impl Harness {
    fn new(limit: Option<usize>, backend: impl TileBackend + 'static) -> Self {
        trace_init();
        let mut map = LiveMap::new(config(limit)).unwrap();
        map.set_zoom(2);
        let layer = map
            .add_tile_layer(CellLayerKind::Raster, backend, Some(Snapshot::new(99, 1, 1)))
            .unwrap();
        Self {
            map,
            layer,
            frame: DisplayList::new(),
        }
    }

    fn tick(&mut self) {
        self.frame.clear();
        self.map.tick(FRAME, &mut self.frame);
    }

    fn visit(&mut self, x: u32, y: u32) {
        self.map.set_position(cell_center(x, y));
        self.tick();
        self.tick();
    }

    fn layer(&self) -> &TileLayer {
        self.map.world().get::<TileLayer>(self.layer).unwrap()
    }

    fn tile(&self, cell: CellKey) -> Option<&Tile> {
        let entity = self.layer().entity(cell)?;
        self.map.world().get::<TileComponent>(entity).map(|t| &t.0)
    }
}

#[test]
fn least_recently_seen_cells_are_evicted_first() {
    let mut h = Harness::new(Some(1), SolidTileBackend::new(Snapshot::new(1, 256, 256)));
    h.visit(0, 0);
    h.visit(1, 0);
    assert!(h.layer().entity(key("00")).is_some());

    h.visit(2, 0);
    assert_eq!(h.layer().entity(key("00")), None);
    assert!(h.layer().entity(key("01")).is_some());
    assert!(h.layer().entity(key("10")).is_some());
    assert_eq!(h.map.statistics().evicted, 1);
}

#[test]
fn cache_stays_bounded_while_panning() {
    let limit = 3;
    let mut h = Harness::new(Some(limit), SolidTileBackend::new(Snapshot::new(1, 256, 256)));
    for y in 0..4 {
        for x in 0..4 {
            h.visit(x, y);
            let visible = h.map.viewport().visible_cells();
            assert!(h.layer().len() <= visible.len() + limit);
            for cell in &visible {
                assert!(h.layer().entity(*cell).is_some(), "visible cell {cell} was dropped");
            }
        }
    }
    let stats = h.map.statistics();
    assert_eq!(stats.requested, 16);
    assert_eq!(stats.loaded, 16);
    assert_eq!(stats.evicted, 16 - 1 - limit as u64);
}

#[test]
fn revisited_cells_are_not_requested_again() {
    let mut h = Harness::new(None, SolidTileBackend::new(Snapshot::new(1, 256, 256)));
    h.visit(0, 0);
    h.visit(1, 0);
    h.visit(0, 0);
    assert_eq!(h.map.statistics().requested, 2);
    assert_eq!(h.map.statistics().evicted, 0);
}

#[test]
fn failed_cells_show_the_placeholder_and_are_dropped_on_leave() {
    let backend = Deferred::default();
    let mut h = Harness::new(None, backend.clone());
    h.visit(0, 0);
    backend
        .take(key("00"))
        .fail(FetchError::Backend("offline".into()));
    h.tick();

    assert!(matches!(h.tile(key("00")), Some(Tile::Snapshot(s)) if s.id() == 99));
    assert_eq!(h.map.statistics().failed, 1);

    h.visit(1, 0);
    assert_eq!(h.layer().entity(key("00")), None);
}

#[test]
fn a_reply_to_an_evicted_request_does_not_touch_the_new_cell() {
    let backend = Deferred::default();
    let mut h = Harness::new(Some(0), backend.clone());
    h.visit(0, 0);
    let first = backend.take(key("00"));

    h.visit(1, 0);
    assert_eq!(h.layer().entity(key("00")), None);
    h.visit(0, 0);
    let second = backend.take(key("00"));

    second.succeed(Snapshot::new(7, 256, 256));
    h.tick();
    first.fail(FetchError::Backend("offline".into()));
    h.tick();

    assert!(matches!(h.tile(key("00")), Some(Tile::Snapshot(s)) if s.id() == 7));
    let stats = h.map.statistics();
    assert_eq!((stats.loaded, stats.failed, stats.stale), (1, 0, 1));
    let entity = h.layer().entity(key("00")).unwrap();
    assert!(!h.map.world().contains::<NonCacheable>(entity));
}

#[test]
fn zooming_in_borrows_from_the_loaded_parent() {
    let backend = Deferred::default();
    let mut h = Harness::new(None, backend.clone());
    h.map.set_zoom(1);
    h.map.set_position(Coord::new(64.0, 64.0));
    h.tick();
    backend.take(key("0")).succeed(Snapshot::new(7, 256, 256));
    h.tick();
    assert!(matches!(h.tile(key("0")), Some(Tile::Snapshot(s)) if s.id() == 7));

    h.map.set_zoom(2);
    h.tick();
    // The four children of "0" meet at the view center.
    for (cell, sub) in [("00", "0"), ("01", "1"), ("02", "2"), ("03", "3")] {
        match h.tile(key(cell)) {
            Some(Tile::Sub { tile, key: k }) => {
                assert_eq!(*k, key(sub));
                assert!(matches!(**tile, Tile::Snapshot(ref s) if s.id() == 7));
            }
            other => panic!("{cell}: expected a donor, got {other:?}"),
        }
    }

    // The frame draws the donor while the real tile is in flight.
    let images = h
        .frame
        .commands()
        .iter()
        .filter(|c| matches!(c, DrawCommand::Image { snapshot, .. } if snapshot.id() == 7))
        .count();
    assert_eq!(images, 4);
}

#[test]
fn overlays_render_and_can_be_removed() {
    trace_init();
    let mut map = LiveMap::new(config(None)).unwrap();
    map.set_zoom(2);
    map.set_center(Coord::new(0.0, 0.0));
    let ring = Ring::new(vec![
        Coord::new(-10.0, 10.0),
        Coord::new(10.0, 10.0),
        Coord::new(10.0, -10.0),
        Coord::new(-10.0, -10.0),
    ]);
    let area = map.add_polygons(MultiPolygon::new(vec![Polygon::new(vec![ring])]));

    let mut frame = DisplayList::new();
    for _ in 0..30 {
        map.tick(FRAME, &mut frame);
    }
    assert!(frame.commands().contains(&DrawCommand::Fill));
    assert!(frame.commands().contains(&DrawCommand::Stroke));

    assert!(map.remove(area));
    let mut frame = DisplayList::new();
    map.tick(FRAME, &mut frame);
    assert!(frame.is_empty());
}

#[test]
fn every_system_is_timed() {
    let mut h = Harness::new(None, SolidTileBackend::new(Snapshot::new(1, 256, 256)));
    h.tick();
    let timings = h.map.timings();
    for name in ["viewport_grid", "tile_loading", "render"] {
        assert!(timings.get(name).is_some(), "{name} was not timed");
    }
    assert_eq!(timings.iter().count(), 7);
}
