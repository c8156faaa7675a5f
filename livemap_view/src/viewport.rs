// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The viewport: what part of the world is on screen, and at what zoom.

use hashbrown::HashSet;
use kurbo::{Size, Vec2};
use livemap_geometry::{Bounds, Client, Coord, World};
use livemap_index::{CellKey, MAX_LEVEL};

use crate::helper::ViewportHelper;

/// Position, zoom, and client size of a map view.
///
/// The world-space [`window`](Self::window) is derived from the other three
/// and recomputed eagerly on every change, so it is never stale.
///
/// At zoom `z` one world unit spans `2^z` client pixels, and the visible
/// cells are those at quadtree level `z`.
#[derive(Clone, Debug)]
pub struct Viewport {
    helper: ViewportHelper,
    size: Size,
    position: Coord<World>,
    zoom: u8,
    min_zoom: u8,
    max_zoom: u8,
    window: Bounds<World>,
}

impl Viewport {
    /// Create a viewport centered on the map at `min_zoom`.
    ///
    /// # Panics
    ///
    /// Panics if `min_zoom > max_zoom` or `max_zoom` exceeds [`MAX_LEVEL`].
    pub fn new(helper: ViewportHelper, client_size: Size, min_zoom: u8, max_zoom: u8) -> Self {
        assert!(
            min_zoom <= max_zoom,
            "min_zoom ({min_zoom}) must not exceed max_zoom ({max_zoom})"
        );
        assert!(
            max_zoom <= MAX_LEVEL,
            "max_zoom ({max_zoom}) exceeds the deepest cell level ({MAX_LEVEL})"
        );
        let mut viewport = Self {
            helper,
            size: client_size,
            position: helper.map_rect().center(),
            zoom: min_zoom,
            min_zoom,
            max_zoom,
            window: Bounds::default(),
        };
        viewport.update_window();
        viewport
    }

    fn update_window(&mut self) {
        let half = Vec2::new(self.size.width, self.size.height) / (2.0 * self.zoom_scale());
        self.window = Bounds::from_corners(
            self.position.translate(-half),
            self.position.translate(half),
        );
    }

    /// The coordinate policy.
    #[must_use]
    pub const fn helper(&self) -> &ViewportHelper {
        &self.helper
    }

    /// Center of the view in world space.
    #[must_use]
    pub const fn position(&self) -> Coord<World> {
        self.position
    }

    /// Current zoom level.
    #[must_use]
    pub const fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Lowest allowed zoom.
    #[must_use]
    pub const fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    /// Highest allowed zoom.
    #[must_use]
    pub const fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Client size in pixels.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// The world rectangle currently on screen.
    ///
    /// On a looping axis this may extend past the map's edges.
    #[must_use]
    pub const fn window(&self) -> Bounds<World> {
        self.window
    }

    /// Client pixels per world unit, `2^zoom`.
    #[must_use]
    pub fn zoom_scale(&self) -> f64 {
        (1_u64 << self.zoom) as f64
    }

    /// Move the view center. Looping axes wrap, others clamp to the map.
    pub fn set_position(&mut self, position: Coord<World>) {
        self.position = self.helper.normalize(position);
        self.update_window();
    }

    /// Change the zoom, clamped to `[min_zoom, max_zoom]`.
    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.update_window();
    }

    /// Resize the client area.
    pub fn set_size(&mut self, size: Size) {
        self.size = size;
        self.update_window();
    }

    /// World point to client pixel.
    pub fn get_view_coord(&self, p: Coord<World>) -> Coord<Client> {
        let scale = self.zoom_scale();
        Coord::new(
            (p.x - self.position.x) * scale + self.size.width / 2.0,
            (p.y - self.position.y) * scale + self.size.height / 2.0,
        )
    }

    /// Client pixel to world point; the inverse of [`get_view_coord`](Self::get_view_coord).
    pub fn get_map_coord(&self, p: Coord<Client>) -> Coord<World> {
        let scale = self.zoom_scale();
        Coord::new(
            (p.x - self.size.width / 2.0) / scale + self.position.x,
            (p.y - self.size.height / 2.0) / scale + self.position.y,
        )
    }

    /// Client rectangle covered by a world rectangle.
    pub fn client_rect_of(&self, rect: Bounds<World>) -> Bounds<Client> {
        Bounds::from_corners(
            self.get_view_coord(rect.origin()),
            self.get_view_coord(Coord::new(rect.x1(), rect.y1())),
        )
    }

    /// Cells at the current zoom overlapping the window.
    pub fn visible_cells(&self) -> HashSet<CellKey> {
        self.helper.get_cells(self.window, self.zoom)
    }
}
