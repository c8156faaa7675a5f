// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use livemap_index::CellKey;

use super::MapContext;
use crate::ecs::{EntityId, System, World};
use crate::tiles::{
    CellComponent, DonorTileCalculator, LayerKindComponent, NonCacheable, RendererComponent,
    RequestId, Tile, TileComponent, TileEvents, TileLayer, TileReply, TileResponse, TileState,
    TileStateComponent, TileStatistics, ViewportGridState,
};

/// Creates cell entities for cells entering the view and installs fetched content.
///
/// Responses that arrived since the last tick are applied first. Then every
/// layer gets an entity for each newly visible cell it does not already hold
/// (cached cells are reused as they are). A new entity shows a donor tile
/// built from the layer's loaded cells until its own content arrives.
///
/// A response is installed only while its cell entity is still waiting for
/// that exact request. Anything else (a reply for an evicted cell, or a late
/// reply to an earlier request for a cell that was since requested again) is
/// dropped and counted as stale.
#[derive(Debug)]
pub struct TileLoadingSystem {
    sender: Sender<TileResponse>,
    receiver: Receiver<TileResponse>,
    next_request: u64,
}

impl Default for TileLoadingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TileLoadingSystem {
    /// Create the system and its response channel.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            next_request: 0,
        }
    }

    fn apply(world: &mut World, response: TileResponse) {
        let TileResponse {
            layer: kind,
            cell,
            request,
            result,
        } = response;
        let target = world
            .iter::<TileLayer>()
            .find(|(_, layer)| layer.kind() == kind)
            .and_then(|(_, layer)| Some((layer.entity(cell)?, layer.placeholder().cloned())))
            .filter(|(entity, _)| {
                world.get::<TileStateComponent>(*entity)
                    == Some(&TileStateComponent(TileState::Loading(request)))
            });
        let Some((entity, placeholder)) = target else {
            tracing::debug!(
                target: "livemap::tiles",
                %cell, ?kind, ?request,
                "tile.stale_response"
            );
            if let Some(stats) = world.singleton_mut::<TileStatistics>() {
                stats.stale += 1;
            }
            return;
        };
        match result {
            Ok(snapshot) => {
                tracing::trace!(target: "livemap::tiles", %cell, ?kind, "tile.loaded");
                world.insert(entity, TileComponent(Tile::Snapshot(snapshot)));
                world.insert(entity, TileStateComponent(TileState::Loaded));
                world.remove::<NonCacheable>(entity);
                if let Some(stats) = world.singleton_mut::<TileStatistics>() {
                    stats.loaded += 1;
                }
            }
            Err(error) => {
                tracing::warn!(target: "livemap::tiles", %cell, ?kind, %error, "tile.failed");
                let tile = placeholder.map_or(Tile::Empty, Tile::Snapshot);
                world.insert(entity, TileComponent(tile));
                world.insert(entity, TileStateComponent(TileState::Failed));
                world.insert(entity, NonCacheable);
                if let Some(stats) = world.singleton_mut::<TileStatistics>() {
                    stats.failed += 1;
                }
                if let Some(events) = world.singleton_mut::<TileEvents>() {
                    events.push_failed(cell);
                }
            }
        }
    }

    /// Loaded, cacheable tiles of `layer`, the only ones fit to stand in for others.
    fn donors(world: &World, layer: &TileLayer) -> DonorTileCalculator {
        let mut donors = DonorTileCalculator::new();
        for (cell, entity) in layer.cells() {
            let loaded = world
                .get::<TileStateComponent>(entity)
                .is_some_and(|s| s.0 == TileState::Loaded);
            if !loaded || world.contains::<NonCacheable>(entity) {
                continue;
            }
            if let Some(TileComponent(tile)) = world.get::<TileComponent>(entity) {
                donors.add(cell, tile.clone());
            }
        }
        donors
    }

    fn load_cells(&mut self, world: &mut World, layer_entity: EntityId, cells: &[CellKey]) {
        // Detached while cells are spawned; put back below.
        let Some(mut layer) = world.remove::<TileLayer>(layer_entity) else {
            return;
        };
        let missing: Vec<CellKey> = cells
            .iter()
            .copied()
            .filter(|cell| layer.entity(*cell).is_none())
            .collect();
        if !missing.is_empty() {
            let donors = Self::donors(world, &layer);
            let kind = layer.kind();
            for cell in missing {
                let entity = world.spawn(format!("{kind:?} cell {cell}"));
                world.insert(entity, CellComponent(cell));
                world.insert(entity, LayerKindComponent(kind));
                world.insert(entity, TileComponent(donors.create_donor_tile(cell)));
                world.insert(entity, TileStateComponent(TileState::NotLoaded));
                world.insert(entity, RendererComponent(layer.renderer().clone()));
                layer.attach(cell, entity);
                self.request(world, &mut layer, entity, cell);
            }
        }
        world.insert(layer_entity, layer);
    }

    /// Move a `NotLoaded` cell entity to `Loading` and hand its request to the backend.
    fn request(
        &mut self,
        world: &mut World,
        layer: &mut TileLayer,
        entity: EntityId,
        cell: CellKey,
    ) {
        let request = RequestId(self.next_request);
        self.next_request += 1;
        world.insert(entity, TileStateComponent(TileState::Loading(request)));
        if let Some(stats) = world.singleton_mut::<TileStatistics>() {
            stats.requested += 1;
        }
        let kind = layer.kind();
        tracing::trace!(
            target: "livemap::tiles",
            %cell, ?kind, %entity, ?request,
            "tile.requested"
        );
        let reply = TileReply::new(kind, cell, request, self.sender.clone());
        layer.backend_mut().request(cell, reply);
    }
}

impl System<MapContext> for TileLoadingSystem {
    fn name(&self) -> &'static str {
        "tile_loading"
    }

    fn update(&mut self, world: &mut World, _ctx: &mut MapContext, _dt: Duration) {
        for response in self.receiver.try_iter() {
            Self::apply(world, response);
        }

        let Some(grid) = world.singleton::<ViewportGridState>() else {
            return;
        };
        if grid.to_load().is_empty() {
            return;
        }
        let mut cells: Vec<CellKey> = grid.to_load().iter().copied().collect();
        cells.sort_unstable();
        let mut layers = world.entities_with::<TileLayer>();
        layers.sort_unstable();
        for layer in layers {
            self.load_cells(world, layer, &cells);
        }
    }
}
