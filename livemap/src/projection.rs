// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spherical Web Mercator from lon/lat into the square world rectangle.

use std::f64::consts::PI;

use livemap_geometry::{Bounds, Coord, LonLat, World};

/// Latitudes beyond this are not representable; the square map ends here.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Projects degrees onto `map_rect`, longitude -180 at the left edge and
/// latitude [`MAX_LATITUDE`] at the top.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mercator {
    map_rect: Bounds<World>,
}

impl Mercator {
    /// Create a projection onto `map_rect`.
    pub fn new(map_rect: Bounds<World>) -> Self {
        Self { map_rect }
    }

    /// Project a point, `None` for non-finite input or latitudes past [`MAX_LATITUDE`].
    pub fn project(&self, p: Coord<LonLat>) -> Option<Coord<World>> {
        let (lon, lat) = (p.x, p.y);
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > MAX_LATITUDE {
            return None;
        }
        let u = (lon + 180.0) / 360.0;
        let phi = lat.to_radians();
        let v = 0.5 - ((PI / 4.0 + phi / 2.0).tan().ln()) / (2.0 * PI);
        Some(Coord::new(
            self.map_rect.x0() + u * self.map_rect.width(),
            self.map_rect.y0() + v.clamp(0.0, 1.0) * self.map_rect.height(),
        ))
    }

    /// Inverse of [`project`](Self::project).
    pub fn unproject(&self, p: Coord<World>) -> Coord<LonLat> {
        let u = (p.x - self.map_rect.x0()) / self.map_rect.width();
        let v = (p.y - self.map_rect.y0()) / self.map_rect.height();
        let lon = u * 360.0 - 180.0;
        let lat = (2.0 * ((0.5 - v) * 2.0 * PI).exp().atan() - PI / 2.0).to_degrees();
        Coord::new(lon, lat)
    }
}
