//! Spherical (web) Mercator projection helpers.
//!
//! Storage and grid math use EPSG:3857 meters to avoid reprojection on every
//! query; EPSG:4326 degrees only appear at the JSON boundary.

use std::f64::consts::PI;

/// WGS84 spherical radius, meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the world span in EPSG:3857 (x and y both run ±this value).
pub const MERCATOR_HALF_WORLD: f64 = PI * EARTH_RADIUS;

/// EPSG:4326 degrees to EPSG:3857 meters.
pub fn lonlat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon.to_radians() * EARTH_RADIUS;
    let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS;
    (x, y)
}

/// EPSG:3857 meters back to EPSG:4326 degrees.
pub fn mercator_to_lonlat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}
