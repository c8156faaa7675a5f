// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Map configuration, loadable from JSON.

use std::fs;
use std::path::Path;

use kurbo::Size;
use livemap_geometry::{Bounds, World};
use livemap_index::MAX_LEVEL;
use livemap_view::LoopAxes;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Options recognized by [`LiveMap`](crate::LiveMap).
///
/// Missing fields take their defaults, so `{}` is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveMapConfig {
    /// Cells kept for reuse after leaving the view. `None` keeps all of them.
    pub tile_cache_limit: Option<usize>,
    /// Lowest zoom the view accepts.
    pub min_zoom: u8,
    /// Highest zoom the view accepts.
    pub max_zoom: u8,
    /// Whether the map wraps horizontally.
    pub loop_x: bool,
    /// Whether the map wraps vertically.
    pub loop_y: bool,
    /// Maximum deviation, in world units, of resampled overlay geometry.
    pub resampling_precision: f64,
    /// Micro-tasks resumed per tick.
    pub micro_task_quantum: usize,
    /// World span of the square map.
    pub map_size: f64,
    /// Initial client area, in pixels.
    pub client_size: (f64, f64),
}

impl Default for LiveMapConfig {
    fn default() -> Self {
        Self {
            tile_cache_limit: Some(256),
            min_zoom: 1,
            max_zoom: 15,
            loop_x: true,
            loop_y: false,
            resampling_precision: livemap_geometry::DEFAULT_PRECISION,
            micro_task_quantum: 16,
            map_size: 256.0,
            client_size: (800.0, 600.0),
        }
    }
}

impl LiveMapConfig {
    /// Parse and validate JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Check that the values describe a usable map.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::InvalidZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if self.max_zoom > MAX_LEVEL {
            return Err(ConfigError::ZoomTooDeep(self.max_zoom));
        }
        if !(self.resampling_precision.is_finite() && self.resampling_precision > 0.0) {
            return Err(ConfigError::InvalidPrecision(self.resampling_precision));
        }
        if self.micro_task_quantum == 0 {
            return Err(ConfigError::InvalidQuantum);
        }
        for (name, value) in [
            ("map_size", self.map_size),
            ("client_size.width", self.client_size.0),
            ("client_size.height", self.client_size.1),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidSize { name, value });
            }
        }
        Ok(())
    }

    /// The world rectangle of the whole map.
    pub fn map_rect(&self) -> Bounds<World> {
        Bounds::new(0.0, 0.0, self.map_size, self.map_size)
    }

    /// Wrapping axes as flags.
    pub fn loop_axes(&self) -> LoopAxes {
        let mut axes = LoopAxes::empty();
        axes.set(LoopAxes::X, self.loop_x);
        axes.set(LoopAxes::Y, self.loop_y);
        axes
    }

    /// Initial client area.
    pub fn client_size(&self) -> Size {
        Size::new(self.client_size.0, self.client_size.1)
    }
}
