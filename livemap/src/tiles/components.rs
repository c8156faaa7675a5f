// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Components attached to cell entities and to the map entity.

use std::fmt;
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};
use livemap_index::CellKey;

use super::fetch::{RequestId, TileBackend};
use super::tile::{CellLayerKind, Snapshot, Tile};
use crate::ecs::EntityId;
use crate::render::Renderer;

/// The cell an entity displays.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellComponent(pub CellKey);

/// The layer a cell entity belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayerKindComponent(pub CellLayerKind);

/// What a cell entity currently draws.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileComponent(pub Tile);

/// Load progress of a cell entity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TileState {
    /// No request made.
    #[default]
    NotLoaded,
    /// Requested; the tile shows donor content. Only a reply to this request is accepted.
    Loading(RequestId),
    /// Real content installed.
    Loaded,
    /// The backend failed; the tile shows the placeholder.
    Failed,
}

/// Wrapper so [`TileState`] can be stored as a component.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TileStateComponent(pub TileState);

/// Marks a cell entity that must not survive leaving the view.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NonCacheable;

/// How an entity is drawn.
#[derive(Clone)]
pub struct RendererComponent(pub Rc<dyn Renderer>);

impl fmt::Debug for RendererComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RendererComponent(..)")
    }
}

/// The renderer an entity had before it was parked in the cache.
///
/// Cached entities draw nothing; the renderer moves back when the cell
/// becomes visible again.
#[derive(Clone)]
pub struct RendererCacheComponent(pub Rc<dyn Renderer>);

impl fmt::Debug for RendererCacheComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RendererCacheComponent(..)")
    }
}

/// Which cells the view covers, and how that changed on the last tick.
///
/// Lives on the map entity. The sets are replaced wholesale each tick.
#[derive(Clone, Debug, Default)]
pub struct ViewportGridState {
    zoom: Option<u8>,
    visible: HashSet<CellKey>,
    to_load: HashSet<CellKey>,
    to_remove: HashSet<CellKey>,
}

impl ViewportGridState {
    /// Replace the visible set and derive the load and remove deltas.
    pub fn update(&mut self, zoom: u8, visible: HashSet<CellKey>) {
        self.to_load = visible.difference(&self.visible).copied().collect();
        self.to_remove = self.visible.difference(&visible).copied().collect();
        self.visible = visible;
        self.zoom = Some(zoom);
    }

    /// Zoom of the last update, `None` before the first one.
    pub fn zoom(&self) -> Option<u8> {
        self.zoom
    }

    /// Cells in view.
    pub fn visible(&self) -> &HashSet<CellKey> {
        &self.visible
    }

    /// Cells that entered the view on the last update.
    pub fn to_load(&self) -> &HashSet<CellKey> {
        &self.to_load
    }

    /// Cells that left the view on the last update.
    pub fn to_remove(&self) -> &HashSet<CellKey> {
        &self.to_remove
    }
}

/// One basemap layer: its content source, and the entity of every cell it shows.
///
/// Lives on its own entity.
pub struct TileLayer {
    kind: CellLayerKind,
    backend: Box<dyn TileBackend>,
    renderer: Rc<dyn Renderer>,
    placeholder: Option<Snapshot>,
    cells: HashMap<CellKey, EntityId>,
}

impl fmt::Debug for TileLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileLayer")
            .field("kind", &self.kind)
            .field("placeholder", &self.placeholder)
            .field("cells", &self.cells.len())
            .finish_non_exhaustive()
    }
}

impl TileLayer {
    /// Create a layer.
    pub fn new(
        kind: CellLayerKind,
        backend: Box<dyn TileBackend>,
        renderer: Rc<dyn Renderer>,
        placeholder: Option<Snapshot>,
    ) -> Self {
        Self {
            kind,
            backend,
            renderer,
            placeholder,
            cells: HashMap::new(),
        }
    }

    /// Layer kind.
    pub fn kind(&self) -> CellLayerKind {
        self.kind
    }

    /// The content source.
    pub fn backend_mut(&mut self) -> &mut dyn TileBackend {
        self.backend.as_mut()
    }

    /// Renderer given to new cell entities.
    pub fn renderer(&self) -> &Rc<dyn Renderer> {
        &self.renderer
    }

    /// Content shown for cells whose fetch failed.
    pub fn placeholder(&self) -> Option<&Snapshot> {
        self.placeholder.as_ref()
    }

    /// Entity showing `cell`, visible or cached.
    pub fn entity(&self, cell: CellKey) -> Option<EntityId> {
        self.cells.get(&cell).copied()
    }

    /// Record the entity for `cell`.
    pub fn attach(&mut self, cell: CellKey, entity: EntityId) {
        self.cells.insert(cell, entity);
    }

    /// Forget `cell`, returning its entity.
    pub fn detach(&mut self, cell: CellKey) -> Option<EntityId> {
        self.cells.remove(&cell)
    }

    /// Number of cells with an entity.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell has an entity.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells with an entity.
    pub fn cells(&self) -> impl Iterator<Item = (CellKey, EntityId)> + '_ {
        self.cells.iter().map(|(k, e)| (*k, *e))
    }
}

/// Running totals of tile traffic, on the map entity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TileStatistics {
    /// Requests handed to backends.
    pub requested: u64,
    /// Successful responses installed.
    pub loaded: u64,
    /// Failed responses installed.
    pub failed: u64,
    /// Cells evicted from the cache.
    pub evicted: u64,
    /// Responses that arrived for cells no longer held.
    pub stale: u64,
}

/// Cells whose fetch failed since the removal pass last ran, on the map entity.
#[derive(Clone, Debug, Default)]
pub struct TileEvents {
    failed: Vec<CellKey>,
}

impl TileEvents {
    /// Record a failed cell.
    pub fn push_failed(&mut self, cell: CellKey) {
        self.failed.push(cell);
    }

    /// Take all recorded failures.
    pub fn drain_failed(&mut self) -> Vec<CellKey> {
        std::mem::take(&mut self.failed)
    }

    /// Recorded failures.
    pub fn failed(&self) -> &[CellKey] {
        &self.failed
    }
}
