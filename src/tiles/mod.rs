//! Tile geometry, aggregation and encoding.
//!
//! Everything in this module is a pure function of its inputs: tile
//! coordinates map to EPSG:3857 envelopes, a hexagonal grid covers the plane,
//! filtered occurrence points are counted per hexagon and the result is
//! serialized as a Mapbox Vector Tile.

mod aggregate;
mod encode;
mod grid;
pub mod proj;

pub use aggregate::*;
pub use encode::*;
pub use grid::*;

use geo_types::{Coord, Rect};

use crate::config::{MAX_ZOOM, MIN_ZOOM};
use crate::errors::AppError;

/// A web-map tile address: origin top-left, y increases southward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCoordinate {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoordinate {
    /// Validate zoom and x/y ranges (`0 <= x,y < 2^zoom`).
    pub fn validate(&self) -> Result<(), AppError> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom) {
            return Err(AppError::InvalidZoom(format!(
                "zoom must be in [{}, {}], got {}",
                MIN_ZOOM, MAX_ZOOM, self.zoom
            )));
        }
        let side = 1u32 << self.zoom;
        if self.x >= side || self.y >= side {
            return Err(AppError::InvalidZoom(format!(
                "tile ({}, {}) out of range for zoom {}",
                self.x, self.y, self.zoom
            )));
        }
        Ok(())
    }

    /// The tile's spatial envelope in EPSG:3857 meters.
    pub fn envelope(&self) -> Rect<f64> {
        let half_world = proj::MERCATOR_HALF_WORLD;
        let tile_span = 2.0 * half_world / f64::from(1u32 << self.zoom);
        let min_x = -half_world + f64::from(self.x) * tile_span;
        let max_y = half_world - f64::from(self.y) * tile_span;
        Rect::new(
            Coord {
                x: min_x,
                y: max_y - tile_span,
            },
            Coord {
                x: min_x + tile_span,
                y: max_y,
            },
        )
    }
}
