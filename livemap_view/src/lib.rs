// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LiveMap View: the viewport model of a tiled map.
//!
//! - [`ViewportHelper`]: the map rectangle plus a [`LoopAxes`] policy. It
//!   normalizes points (wrap on looping axes, clamp on the others), splits
//!   rectangles at the seam before cell lookup, finds every translated copy
//!   of an object that reaches the view, and computes bounding boxes that may
//!   straddle the seam.
//! - [`Viewport`]: position, zoom, and client size, with the derived world
//!   window and conversions between world and client coordinates.
//!
//! Coordinate math never fails: out-of-range input is wrapped or clamped.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Size;
//! use livemap_geometry::{Bounds, Coord, World};
//! use livemap_view::{LoopAxes, Viewport, ViewportHelper};
//!
//! let helper = ViewportHelper::new(Bounds::new(0.0, 0.0, 256.0, 256.0), LoopAxes::X);
//! let mut viewport = Viewport::new(helper, Size::new(800.0, 600.0), 1, 15);
//! viewport.set_zoom(3);
//! viewport.set_position(Coord::<World>::new(-10.0, 100.0));
//!
//! // Longitude wrapped around the seam.
//! assert_eq!(viewport.position().x, 246.0);
//! let center = viewport.get_view_coord(viewport.position());
//! assert_eq!((center.x, center.y), (400.0, 300.0));
//! assert!(!viewport.visible_cells().is_empty());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod helper;
mod viewport;

pub use helper::{LoopAxes, ViewportHelper, wrap};
pub use viewport::Viewport;
