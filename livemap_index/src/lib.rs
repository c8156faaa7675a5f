// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LiveMap Index: quad-key addressing for tiled maps.
//!
//! The map plane is partitioned into a quadtree of square cells. A cell at
//! zoom level `n` is addressed by a [`CellKey`]: a path of `n` quadrant digits
//! (`0` top-left, `1` top-right, `2` bottom-left, `3` bottom-right).
//!
//! - [`CellKey`]: compact, `Copy`, structurally compared key with parent,
//!   children, and ancestry queries, plus [`CellKey::compute_rect`] mapping a
//!   cell to its world rectangle.
//! - [`calculate_quad_keys`]: every cell of a zoom level overlapping a rectangle.
//! - [`CellMap`]: ordered map keyed by cells with closest-ancestor and
//!   descendant range queries, the building block for donor tile lookup.
//!
//! The index has no notion of wrap-around. Higher layers split rectangles that
//! cross the map seam before querying.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Rect;
//! use livemap_index::{CellKey, CellMap, calculate_quad_keys};
//!
//! let map_rect = Rect::new(0.0, 0.0, 256.0, 256.0);
//! let top_left: CellKey = "0".parse().unwrap();
//! assert_eq!(top_left.compute_rect(map_rect), Rect::new(0.0, 0.0, 128.0, 128.0));
//!
//! let visible = calculate_quad_keys(map_rect, Rect::new(10.0, 10.0, 20.0, 20.0), 3);
//! assert_eq!(visible.len(), 1);
//!
//! let mut cache = CellMap::new();
//! cache.insert("12".parse().unwrap(), "coarse");
//! let (ancestor, _) = cache.closest_ancestor("1230".parse().unwrap()).unwrap();
//! assert_eq!(ancestor.to_string(), "12");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod grid;
mod key;
mod map;

pub use grid::{calculate_quad_keys, visit_quad_keys};
pub use key::{CellKey, MAX_LEVEL, ParseCellKeyError, Quadrant};
pub use map::{CellMap, ShallowestDescendants};

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    #[test]
    fn quad_keys_match_compute_rect() {
        let map_rect = Rect::new(-180.0, -90.0, 180.0, 90.0);
        let query = Rect::new(-10.0, -5.0, 30.0, 12.0);
        for key in calculate_quad_keys(map_rect, query, 5) {
            assert_eq!(key.level(), 5);
            let cell = key.compute_rect(map_rect);
            assert!(cell.intersect(query).area() > 0.0, "{key} misses the query");
        }
    }

    #[test]
    fn children_tile_their_parent() {
        let map_rect = Rect::new(0.0, 0.0, 256.0, 256.0);
        let parent: CellKey = "213".parse().unwrap();
        let rect = parent.compute_rect(map_rect);
        let area: f64 = parent
            .children()
            .unwrap()
            .iter()
            .map(|c| c.compute_rect(map_rect).area())
            .sum();
        assert!((area - rect.area()).abs() < 1e-9);
        for child in parent.children().unwrap() {
            let r = child.compute_rect(map_rect);
            assert_eq!(r.union(rect), rect);
        }
    }
}
