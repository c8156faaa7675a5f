// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::rc::Rc;
use std::time::Duration;

use hashbrown::HashSet;
use livemap_index::CellKey;
use smallvec::SmallVec;

use super::MapContext;
use crate::ecs::{EntityId, System, World};
use crate::render::{NullRenderer, Renderer};
use crate::tiles::{
    NonCacheable, RecencyList, RendererCacheComponent, RendererComponent, TileEvents, TileLayer,
    TileStatistics, ViewportGridState,
};

/// Parks cells that leave the view and evicts them under a size cap.
///
/// Each tick:
///
/// 1. Cells entering the view get their renderer back; cells leaving it
///    draw nothing from now on but keep their entity.
/// 2. Visible cells are taken off the recency list, and cells that just
///    left the view are appended to it.
/// 3. Cells that left the view showing non-cacheable content are deleted
///    outright, whatever the cap.
/// 4. While the list is longer than the cap, its oldest cells are deleted.
/// 5. Deleted cells lose their entity in every layer.
///
/// A visible cell is never deleted.
pub struct BasemapCellsRemovingSystem {
    limit: Option<usize>,
    cache: RecencyList<CellKey>,
    parked: Rc<dyn Renderer>,
}

impl std::fmt::Debug for BasemapCellsRemovingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasemapCellsRemovingSystem")
            .field("limit", &self.limit)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl BasemapCellsRemovingSystem {
    /// Create the system. `None` never evicts by count.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            cache: RecencyList::new(),
            parked: Rc::new(NullRenderer),
        }
    }

    /// Cells out of view whose entities are kept, oldest first.
    pub fn cached(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.cache.iter()
    }

    fn cell_entities(
        world: &World,
        layers: &[EntityId],
        cell: CellKey,
    ) -> SmallVec<[EntityId; 4]> {
        layers
            .iter()
            .filter_map(|layer| world.get::<TileLayer>(*layer)?.entity(cell))
            .collect()
    }

    fn restore(world: &mut World, entity: EntityId) {
        if let Some(RendererCacheComponent(renderer)) =
            world.remove::<RendererCacheComponent>(entity)
        {
            world.insert(entity, RendererComponent(renderer));
        }
    }

    fn park(&self, world: &mut World, entity: EntityId) {
        if world.contains::<RendererCacheComponent>(entity) {
            return;
        }
        let parked = RendererComponent(self.parked.clone());
        if let Some(RendererComponent(renderer)) = world.insert(entity, parked) {
            world.insert(entity, RendererCacheComponent(renderer));
        }
    }
}

impl System<MapContext> for BasemapCellsRemovingSystem {
    fn name(&self) -> &'static str {
        "basemap_cells_removing"
    }

    fn update(&mut self, world: &mut World, _ctx: &mut MapContext, _dt: Duration) {
        let Some(grid) = world.singleton::<ViewportGridState>() else {
            return;
        };
        let visible = grid.visible().clone();
        let mut to_load: Vec<CellKey> = grid.to_load().iter().copied().collect();
        let mut to_remove: Vec<CellKey> = grid.to_remove().iter().copied().collect();
        to_load.sort_unstable();
        to_remove.sort_unstable();
        let failed = world
            .singleton_mut::<TileEvents>()
            .map(TileEvents::drain_failed)
            .unwrap_or_default();
        let mut layers = world.entities_with::<TileLayer>();
        layers.sort_unstable();

        for &cell in &to_load {
            for entity in Self::cell_entities(world, &layers, cell) {
                Self::restore(world, entity);
            }
        }
        for &cell in &to_remove {
            for entity in Self::cell_entities(world, &layers, cell) {
                self.park(world, entity);
            }
        }

        for cell in &visible {
            self.cache.remove(cell);
        }
        for &cell in &to_remove {
            self.cache.push_back(cell);
        }

        let mut doomed: Vec<CellKey> = Vec::new();
        let mut seen: HashSet<CellKey> = HashSet::new();
        // Failures reported after their cell already left the view count too.
        for cell in to_remove.iter().chain(failed.iter()) {
            if visible.contains(cell) || !seen.insert(*cell) {
                continue;
            }
            let non_cacheable = Self::cell_entities(world, &layers, *cell)
                .iter()
                .any(|e| world.contains::<NonCacheable>(*e));
            if non_cacheable {
                self.cache.remove(cell);
                doomed.push(*cell);
            }
        }

        if let Some(limit) = self.limit {
            while self.cache.len() > limit {
                let Some(cell) = self.cache.pop_front() else {
                    break;
                };
                doomed.push(cell);
            }
        }

        if doomed.is_empty() {
            return;
        }
        let mut despawned = 0_u64;
        for &cell in &doomed {
            debug_assert!(!visible.contains(&cell), "evicting visible cell {cell}");
            for &layer in &layers {
                let entity = world
                    .get_mut::<TileLayer>(layer)
                    .and_then(|layer| layer.detach(cell));
                if let Some(entity) = entity {
                    world.despawn(entity);
                    despawned += 1;
                }
            }
        }
        if let Some(stats) = world.singleton_mut::<TileStatistics>() {
            stats.evicted += doomed.len() as u64;
        }
        tracing::debug!(
            target: "livemap::tiles",
            cells = doomed.len(),
            entities = despawned,
            cached = self.cache.len(),
            "cells.evicted"
        );
    }
}
