// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stand-in content for cells that are still loading.

use livemap_index::{CellKey, CellMap};

use super::tile::Tile;

/// Builds placeholder tiles for a cell from already loaded neighbors in the hierarchy.
///
/// Failed and non-cacheable cells must not be added: their content is not
/// something to show for any other cell.
#[derive(Clone, Debug, Default)]
pub struct DonorTileCalculator {
    loaded: CellMap<Tile>,
}

impl DonorTileCalculator {
    /// Create an empty calculator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `tile` available as a donor for `cell`.
    pub fn add(&mut self, cell: CellKey, tile: Tile) {
        self.loaded.insert(cell, tile);
    }

    /// Number of donor cells.
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    /// Whether there are no donor cells.
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// The best available content for `target`.
    ///
    /// In order of preference: the target's own tile, the part of its closest
    /// loaded ancestor that covers it, or a mosaic of its shallowest loaded
    /// descendants. [`Tile::Empty`] when none of those exist.
    pub fn create_donor_tile(&self, target: CellKey) -> Tile {
        if let Some(tile) = self.loaded.get(target) {
            return tile.clone();
        }
        if let Some((ancestor, tile)) = self.loaded.closest_ancestor(target) {
            if let Some(key) = target.relative_to(ancestor) {
                return Tile::Sub {
                    tile: Box::new(tile.clone()),
                    key,
                };
            }
        }
        let parts: Vec<(Tile, CellKey)> = self
            .loaded
            .shallowest_descendants(target)
            .filter_map(|(cell, tile)| Some((tile.clone(), cell.relative_to(target)?)))
            .collect();
        if parts.is_empty() {
            Tile::Empty
        } else {
            Tile::Composite(parts)
        }
    }
}
