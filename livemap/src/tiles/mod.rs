// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basemap tiles: content, loading, placeholders, and cache bookkeeping.

mod components;
mod donor;
mod fetch;
mod recency;
mod tile;

pub use components::{
    CellComponent, LayerKindComponent, NonCacheable, RendererCacheComponent, RendererComponent,
    TileComponent, TileEvents, TileLayer, TileState, TileStateComponent, TileStatistics,
    ViewportGridState,
};
pub use donor::DonorTileCalculator;
pub use fetch::{RequestId, SolidTileBackend, TileBackend, TileReply, TileResponse};
pub use recency::RecencyList;
pub use tile::{CellLayerKind, Snapshot, Tile};
