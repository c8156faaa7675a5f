// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The contract between the map and whatever produces tile content.

use crossbeam_channel::Sender;
use livemap_index::CellKey;

use super::tile::{CellLayerKind, Snapshot};
use crate::error::FetchError;

/// Identifies one request. A cell that is evicted and requested again gets a new id,
/// so a late reply to the first request can be told apart from the current one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

/// Outcome of one tile request.
#[derive(Debug)]
pub struct TileResponse {
    /// Layer the request was made for.
    pub layer: CellLayerKind,
    /// Requested cell.
    pub cell: CellKey,
    /// The request this answers.
    pub request: RequestId,
    /// Content or the reason there is none.
    pub result: Result<Snapshot, FetchError>,
}

/// Completion handle for a single request.
///
/// Backends may complete it from any thread, at any later time. The map
/// picks up the response on a subsequent tick. A reply that is dropped
/// without being completed leaves the cell loading until it is evicted.
#[derive(Debug)]
pub struct TileReply {
    layer: CellLayerKind,
    cell: CellKey,
    request: RequestId,
    sender: Sender<TileResponse>,
}

impl TileReply {
    pub(crate) fn new(
        layer: CellLayerKind,
        cell: CellKey,
        request: RequestId,
        sender: Sender<TileResponse>,
    ) -> Self {
        Self {
            layer,
            cell,
            request,
            sender,
        }
    }

    /// The requested cell.
    pub fn cell(&self) -> CellKey {
        self.cell
    }

    /// The layer kind of the request.
    pub fn layer(&self) -> CellLayerKind {
        self.layer
    }

    /// The request this reply completes.
    pub fn request(&self) -> RequestId {
        self.request
    }

    /// Deliver content.
    pub fn succeed(self, snapshot: Snapshot) {
        self.complete(Ok(snapshot));
    }

    /// Report a failure. The cell shows the layer's placeholder and is never reused as a donor.
    pub fn fail(self, error: FetchError) {
        self.complete(Err(error));
    }

    fn complete(self, result: Result<Snapshot, FetchError>) {
        let response = TileResponse {
            layer: self.layer,
            cell: self.cell,
            request: self.request,
            result,
        };
        if self.sender.send(response).is_err() {
            tracing::trace!(target: "livemap::tiles", cell = %self.cell, "tile.reply_dropped");
        }
    }
}

/// Source of tile content for one layer.
///
/// `request` must not block; it hands the [`TileReply`] to whatever performs
/// the fetch and returns. Retry policy, if any, lives here and not in the map.
pub trait TileBackend {
    /// Start producing content for `cell`.
    fn request(&mut self, cell: CellKey, reply: TileReply);
}

/// A backend that answers every request immediately with the same snapshot.
#[derive(Clone, Debug)]
pub struct SolidTileBackend {
    snapshot: Snapshot,
}

impl SolidTileBackend {
    /// Create the backend.
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }
}

impl TileBackend for SolidTileBackend {
    fn request(&mut self, _cell: CellKey, reply: TileReply) {
        reply.succeed(self.snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn solid_backend_replies_immediately() {
        let (tx, rx) = unbounded();
        let mut backend = SolidTileBackend::new(Snapshot::new(5, 256, 256));
        let cell: CellKey = "21".parse().unwrap();
        backend.request(cell, TileReply::new(CellLayerKind::Solid, cell, RequestId(4), tx));
        let response = rx.try_recv().unwrap();
        assert_eq!(response.cell, cell);
        assert_eq!(response.request, RequestId(4));
        assert_eq!(response.layer, CellLayerKind::Solid);
        assert_eq!(response.result.unwrap().id(), 5);
    }

    #[test]
    fn failures_travel_as_errors() {
        let (tx, rx) = unbounded();
        let cell = CellKey::ROOT;
        TileReply::new(CellLayerKind::Raster, cell, RequestId(0), tx)
            .fail(FetchError::Backend("timeout".into()));
        let response = rx.try_recv().unwrap();
        assert!(matches!(response.result, Err(FetchError::Backend(ref m)) if m == "timeout"));
    }

    #[test]
    fn replies_after_the_map_is_gone_are_ignored() {
        let (tx, rx) = unbounded();
        drop(rx);
        TileReply::new(CellLayerKind::Vector, CellKey::ROOT, RequestId(0), tx)
            .succeed(Snapshot::new(1, 1, 1));
    }
}
