// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping between world rectangles and the cell grid of one zoom level.

use hashbrown::HashSet;
use kurbo::Rect;

use crate::key::{CellKey, MAX_LEVEL};

/// Map a coordinate to a grid column/row, rounding towards -∞.
///
/// Values beyond the `i64` range saturate.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Grid indices are intentionally i64; out-of-range values are saturated."
)]
#[inline]
pub(crate) fn cell_floor(value: f64, origin: f64, cell_size: f64) -> i64 {
    debug_assert!(cell_size > 0.0, "grid cell_size must be strictly positive");
    let t = (value - origin) / cell_size;
    let coord = t as i64;

    // Round towards -∞ (the cast above has already truncated).
    if t < 0.0 && (coord as f64) > t {
        coord.saturating_sub(1)
    } else {
        coord
    }
}

/// Map a coordinate to a grid column/row, rounding towards +∞.
#[inline]
pub(crate) fn cell_ceil(value: f64, origin: f64, cell_size: f64) -> i64 {
    cell_floor(-value, -origin, cell_size).saturating_neg()
}

/// Inclusive range of grid indices whose cells overlap `[min, max)` with non-zero length.
fn index_range(min: f64, max: f64, origin: f64, cell_size: f64, count: i64) -> Option<(i64, i64)> {
    let first = cell_floor(min, origin, cell_size).max(0);
    let last = (cell_ceil(max, origin, cell_size) - 1).min(count - 1);
    (first <= last).then_some((first, last))
}

/// Every cell at `level` whose rectangle overlaps `rect`.
///
/// `map_rect` is the rectangle covered by the root cell. Cells that only touch
/// `rect` along an edge or a corner are not included, so adjacent query
/// rectangles never share cells. The index knows nothing about wrap-around:
/// parts of `rect` outside `map_rect` are ignored, and callers split seam
/// crossing rectangles before calling this.
///
/// ```rust
/// use kurbo::Rect;
/// use livemap_index::calculate_quad_keys;
///
/// let map = Rect::new(0.0, 0.0, 256.0, 256.0);
/// let keys = calculate_quad_keys(map, Rect::new(0.0, 0.0, 128.0, 128.0), 1);
/// assert_eq!(keys.len(), 1);
/// assert!(keys.contains(&"0".parse::<livemap_index::CellKey>().unwrap()));
/// ```
pub fn calculate_quad_keys(map_rect: Rect, rect: Rect, level: u8) -> HashSet<CellKey> {
    let mut out = HashSet::new();
    visit_quad_keys(map_rect, rect, level, |key| {
        out.insert(key);
    });
    out
}

/// Visit every cell at `level` overlapping `rect`, row by row.
///
/// See [`calculate_quad_keys`] for the overlap rule.
pub fn visit_quad_keys<F: FnMut(CellKey)>(map_rect: Rect, rect: Rect, level: u8, mut f: F) {
    let level = level.min(MAX_LEVEL);
    let clipped = rect.intersect(map_rect);
    if clipped.width() <= 0.0 || clipped.height() <= 0.0 {
        return;
    }
    let count = 1_i64 << level;
    #[allow(
        clippy::cast_precision_loss,
        reason = "cell counts up to 2^31 are exact in f64."
    )]
    let n = count as f64;
    let cell_w = map_rect.width() / n;
    let cell_h = map_rect.height() / n;
    let Some((col0, col1)) = index_range(clipped.x0, clipped.x1, map_rect.x0, cell_w, count)
    else {
        return;
    };
    let Some((row0, row1)) = index_range(clipped.y0, clipped.y1, map_rect.y0, cell_h, count)
    else {
        return;
    };
    for row in row0..=row1 {
        for col in col0..=col1 {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "indices are clamped to 0..2^level with level <= 31."
            )]
            f(CellKey::from_tile(col as u32, row as u32, level));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    const MAP: Rect = Rect::new(0.0, 0.0, 256.0, 256.0);

    fn sorted(keys: &HashSet<CellKey>) -> Vec<alloc::string::String> {
        let mut v: Vec<CellKey> = keys.iter().copied().collect();
        v.sort();
        v.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn whole_map_at_level_one() {
        let keys = calculate_quad_keys(MAP, MAP, 1);
        assert_eq!(sorted(&keys), ["0", "1", "2", "3"]);
    }

    #[test]
    fn edge_touching_cells_are_excluded() {
        // Exactly the top-left quadrant: its neighbours only touch its edges.
        let keys = calculate_quad_keys(MAP, Rect::new(0.0, 0.0, 128.0, 128.0), 1);
        assert_eq!(sorted(&keys), ["0"]);

        // A rect that straddles the vertical midline by a hair touches two cells.
        let keys = calculate_quad_keys(MAP, Rect::new(100.0, 10.0, 128.5, 20.0), 1);
        assert_eq!(sorted(&keys), ["0", "1"]);
    }

    #[test]
    fn degenerate_and_outside_rects_have_no_cells() {
        assert!(calculate_quad_keys(MAP, Rect::new(10.0, 10.0, 10.0, 50.0), 3).is_empty());
        assert!(calculate_quad_keys(MAP, Rect::new(300.0, 0.0, 400.0, 50.0), 3).is_empty());
        assert!(calculate_quad_keys(MAP, Rect::new(-100.0, 0.0, 0.0, 50.0), 3).is_empty());
    }

    #[test]
    fn partially_outside_rect_is_clamped() {
        let keys = calculate_quad_keys(MAP, Rect::new(-50.0, -50.0, 10.0, 10.0), 2);
        assert_eq!(sorted(&keys), ["00"]);
    }

    #[test]
    fn every_returned_cell_overlaps_the_query() {
        let query = Rect::new(33.0, 70.0, 190.0, 101.0);
        let keys = calculate_quad_keys(MAP, query, 4);
        for key in &keys {
            let r = key.compute_rect(MAP).intersect(query);
            assert!(r.area() > 0.0, "{key} does not overlap the query");
        }
        // 33..190 spans columns 2..=11, 70..101 spans rows 4..=6.
        assert_eq!(keys.len(), 10 * 3);
    }

    #[test]
    fn cell_floor_rounds_down_for_negatives() {
        assert_eq!(cell_floor(-0.5, 0.0, 1.0), -1);
        assert_eq!(cell_floor(-1.0, 0.0, 1.0), -1);
        assert_eq!(cell_floor(0.0, 0.0, 1.0), 0);
        assert_eq!(cell_floor(1e300, 0.0, 1.0), i64::MAX);
        assert_eq!(cell_ceil(0.5, 0.0, 1.0), 1);
        assert_eq!(cell_ceil(1.0, 0.0, 1.0), 1);
    }
}
