// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile content and how it decomposes into image draws.

use kurbo::{Point, Rect};
use livemap_index::CellKey;
use serde::{Deserialize, Serialize};

use crate::render::Context2d;

/// The kind of content a basemap layer shows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellLayerKind {
    /// Vector tiles rendered locally.
    Vector,
    /// Pre-rendered raster tiles.
    Raster,
    /// A single color everywhere.
    Solid,
    /// Cell outlines and labels.
    Debug,
}

/// Handle to fully rendered raster content, owned by the drawing surface.
///
/// Cloning is cheap: only the handle is copied.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Snapshot {
    id: u64,
    width: u32,
    height: u32,
}

impl Snapshot {
    /// Create a handle.
    pub const fn new(id: u64, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    /// Surface-specific identifier.
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Pixel width.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel bounds.
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// What to draw for one cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Tile {
    /// Nothing to draw yet.
    #[default]
    Empty,
    /// Rendered content for exactly this cell.
    Snapshot(Snapshot),
    /// The part of `tile` covering the sub-cell `key` (relative to the tile's own cell).
    Sub {
        /// Coarser content.
        tile: Box<Tile>,
        /// Relative key of the region to show.
        key: CellKey,
    },
    /// Fragments, each drawn over the sub-cell given by its relative key.
    Composite(Vec<(Tile, CellKey)>),
}

const UNIT: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

/// Map `r` from the coordinate frame `from` into the frame `to`.
fn remap(r: Rect, from: Rect, to: Rect) -> Rect {
    let sx = to.width() / from.width();
    let sy = to.height() / from.height();
    let map = |p: Point| {
        Point::new(
            to.x0 + (p.x - from.x0) * sx,
            to.y0 + (p.y - from.y0) * sy,
        )
    };
    Rect::from_points(map(Point::new(r.x0, r.y0)), map(Point::new(r.x1, r.y1)))
}

impl Tile {
    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Snapshot(_) => false,
            Self::Sub { tile, .. } => tile.is_empty(),
            Self::Composite(parts) => parts.iter().all(|(t, _)| t.is_empty()),
        }
    }

    /// Draw the whole tile into `dst` (client pixels).
    pub fn draw(&self, ctx: &mut dyn Context2d, dst: Rect) {
        self.draw_region(ctx, UNIT, dst);
    }

    /// Draw the part `region` of this tile, in unit coordinates of its cell, into `dst`.
    fn draw_region(&self, ctx: &mut dyn Context2d, region: Rect, dst: Rect) {
        match self {
            Self::Empty => {}
            Self::Snapshot(snapshot) => {
                let src = remap(region, UNIT, snapshot.rect());
                ctx.draw_image(snapshot, src, dst);
            }
            Self::Sub { tile, key } => {
                tile.draw_region(ctx, key.compute_rect(region), dst);
            }
            Self::Composite(parts) => {
                for (tile, key) in parts {
                    let fragment = key.compute_rect(UNIT);
                    let overlap = fragment.intersect(region);
                    if overlap.area() <= 0.0 {
                        continue;
                    }
                    let part_dst = remap(overlap, region, dst);
                    let part_region = remap(overlap, fragment, UNIT);
                    tile.draw_region(ctx, part_region, part_dst);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DisplayList, DrawCommand};

    fn key(s: &str) -> CellKey {
        s.parse().unwrap()
    }

    fn images(list: &DisplayList) -> Vec<(u64, Rect, Rect)> {
        list.commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Image { snapshot, src, dst } => Some((snapshot.id(), *src, *dst)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn snapshot_draws_whole_image() {
        let mut list = DisplayList::new();
        let dst = Rect::new(10.0, 10.0, 266.0, 266.0);
        Tile::Snapshot(Snapshot::new(1, 256, 256)).draw(&mut list, dst);
        assert_eq!(images(&list), [(1, Rect::new(0.0, 0.0, 256.0, 256.0), dst)]);
    }

    #[test]
    fn sub_tile_crops_the_source() {
        let mut list = DisplayList::new();
        let dst = Rect::new(0.0, 0.0, 256.0, 256.0);
        let tile = Tile::Sub {
            tile: Box::new(Tile::Snapshot(Snapshot::new(2, 256, 256))),
            key: key("03"),
        };
        tile.draw(&mut list, dst);
        // "0" is the top-left quarter, "03" its bottom-right quarter.
        assert_eq!(
            images(&list),
            [(2, Rect::new(64.0, 64.0, 128.0, 128.0), dst)]
        );
    }

    #[test]
    fn composite_places_fragments() {
        let mut list = DisplayList::new();
        let dst = Rect::new(0.0, 0.0, 100.0, 100.0);
        let tile = Tile::Composite(vec![
            (Tile::Snapshot(Snapshot::new(1, 10, 10)), key("1")),
            (Tile::Snapshot(Snapshot::new(2, 10, 10)), key("32")),
            (Tile::Empty, key("0")),
        ]);
        tile.draw(&mut list, dst);
        assert_eq!(
            images(&list),
            [
                (1, Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(50.0, 0.0, 100.0, 50.0)),
                (2, Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(50.0, 75.0, 75.0, 100.0)),
            ]
        );
        assert!(!tile.is_empty());
        assert!(Tile::Composite(vec![(Tile::Empty, key("2"))]).is_empty());
    }
}
