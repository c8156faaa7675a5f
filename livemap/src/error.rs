// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::tiles::CellLayerKind;

/// Problems loading or validating a [`LiveMapConfig`](crate::LiveMapConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON did not parse.
    #[error("failed to parse map config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The file could not be read.
    #[error("failed to read map config from {path:?}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// `min_zoom` is above `max_zoom`.
    #[error("min_zoom {min} exceeds max_zoom {max}")]
    InvalidZoomRange {
        /// Configured minimum.
        min: u8,
        /// Configured maximum.
        max: u8,
    },
    /// `max_zoom` is deeper than cell keys can address.
    #[error("max_zoom {0} exceeds the deepest cell level {max}", max = livemap_index::MAX_LEVEL)]
    ZoomTooDeep(u8),
    /// Resampling precision must be finite and positive.
    #[error("resampling_precision must be finite and positive, got {0}")]
    InvalidPrecision(f64),
    /// At least one micro-task must run per tick.
    #[error("micro_task_quantum must be at least 1")]
    InvalidQuantum,
    /// Map and client dimensions must be finite and positive.
    #[error("{name} must be finite and positive, got {value}")]
    InvalidSize {
        /// Offending field.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Why a tile backend produced no content.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backend tried and failed.
    #[error("tile backend failed: {0}")]
    Backend(String),
    /// The backend does not serve this kind of layer.
    #[error("layer kind {0:?} is not supported by this backend")]
    Unsupported(CellLayerKind),
}

/// Misuse of the [`LiveMap`](crate::LiveMap) API.
#[derive(Debug, Error)]
pub enum MapError {
    /// Each layer kind may be added once; responses are routed by kind.
    #[error("a {0:?} tile layer already exists")]
    DuplicateLayer(CellLayerKind),
}
