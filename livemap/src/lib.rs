// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LiveMap: a tile map engine driven by an entity/system scheduler.
//!
//! A [`LiveMap`] shows basemap tiles under continuous pan and zoom and draws
//! vector overlays (points, paths, polygons) on top, while keeping the cost
//! of every frame bounded.
//!
//! - Tiles are addressed by [`CellKey`](livemap_index::CellKey). Cells that
//!   enter the view are requested from a [`TileBackend`](tiles::TileBackend);
//!   until content arrives they show a donor tile assembled from loaded
//!   ancestors or descendants ([`DonorTileCalculator`](tiles::DonorTileCalculator)).
//! - Cells that leave the view are parked, then evicted oldest first once
//!   more than `tile_cache_limit` are held. Failed cells never linger.
//! - Overlay geometry is projected and scaled by micro-tasks that each do a
//!   bounded amount of work per frame.
//!
//! ## Frame pipeline
//!
//! [`LiveMap::tick`] runs these [`System`](ecs::System)s in order:
//!
//! 1. [`ViewportGridSystem`](systems::ViewportGridSystem): visible cells and their deltas.
//! 2. [`TileLoadingSystem`](systems::TileLoadingSystem): installs responses, spawns new cells.
//! 3. [`BasemapCellsRemovingSystem`](systems::BasemapCellsRemovingSystem): parking and eviction.
//! 4. [`MicroTaskSystem`]: resumes a quantum of micro-tasks.
//! 5. [`GeometryProjectionSystem`](systems::GeometryProjectionSystem) and
//!    [`ScreenGeometrySystem`](systems::ScreenGeometrySystem): start overlay work.
//! 6. [`RenderSystem`](systems::RenderSystem): records the frame.
//!
//! The recorded frame is then replayed onto the caller's [`Context2d`](render::Context2d).
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use livemap::render::DisplayList;
//! use livemap::tiles::{CellLayerKind, Snapshot, SolidTileBackend};
//! use livemap::{LiveMap, LiveMapConfig};
//!
//! let mut map = LiveMap::new(LiveMapConfig::default()).unwrap();
//! map.add_tile_layer(
//!     CellLayerKind::Solid,
//!     SolidTileBackend::new(Snapshot::new(1, 256, 256)),
//!     None,
//! )
//! .unwrap();
//!
//! let mut frame = DisplayList::new();
//! map.tick(Duration::from_millis(16), &mut frame);
//! map.tick(Duration::from_millis(16), &mut frame);
//! assert!(map.statistics().loaded > 0);
//! ```

pub mod ecs;
pub mod render;
pub mod systems;
pub mod tiles;

mod config;
mod error;
mod map;
mod multitasking;
mod overlay;
mod projection;

pub use config::LiveMapConfig;
pub use error::{ConfigError, FetchError, MapError};
pub use map::LiveMap;
pub use multitasking::{MicroTaskSystem, MicroThreadComponent, WorldEdit};
pub use overlay::{
    BorderClip, ProjectionPending, ScreenGeometry, ScreenPending, SourceGeometry, WorldGeometry,
};
pub use projection::{MAX_LATITUDE, Mercator};
