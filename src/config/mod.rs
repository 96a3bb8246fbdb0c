//! Configuration module for the biomap backend.
//!
//! Runtime settings are loaded from environment variables with sensible
//! defaults. Map/tile constants live in an explicit [`TileConfig`] structure
//! so tests can substitute alternate tables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key identifying trusted callers (enables the viewer context)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Tile/grid constants
    pub tiles: TileConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("BIOMAP_API_PSK").ok();

        let db_path = env::var("BIOMAP_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let bind_addr = env::var("BIOMAP_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid BIOMAP_BIND_ADDR format");

        let log_level = env::var("BIOMAP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            tiles: TileConfig::default(),
        }
    }
}

/// Smallest zoom level served.
pub const MIN_ZOOM: u8 = 1;
/// Largest zoom level served.
pub const MAX_ZOOM: u8 = 20;

/// Baseline hexagon edge length in meters per zoom level (index 0 = zoom 1).
/// Halves roughly every step down to a 5 m floor at zooms 17-20.
const HEX_SIZE_BASELINE: [f64; 20] = [
    320_000.0, 160_000.0, 80_000.0, 40_000.0, 20_000.0, 10_000.0, 5_000.0, 2_500.0, 1_250.0,
    675.0, 335.0, 160.0, 80.0, 40.0, 20.0, 10.0, 5.0, 5.0, 5.0, 5.0,
];

/// Immutable map/tile constants.
///
/// Adjust `hex_size_multiplier` to scale all zoom levels at once.
#[derive(Debug, Clone)]
pub struct TileConfig {
    /// Global multiplier applied to every baseline hexagon size
    pub hex_size_multiplier: f64,
    /// Hexagon edge length baseline per zoom, meters (index 0 = zoom 1)
    pub hex_size_baseline: [f64; 20],
    /// MVT coordinate extent per tile
    pub extent: u32,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            hex_size_multiplier: 2.0,
            hex_size_baseline: HEX_SIZE_BASELINE,
            extent: 4096,
        }
    }
}

impl TileConfig {
    /// Hexagon edge length in meters for a zoom level, or `None` outside [1, 20].
    pub fn hex_size(&self, zoom: u8) -> Option<f64> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            return None;
        }
        Some(self.hex_size_baseline[usize::from(zoom) - 1] * self.hex_size_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_size_table() {
        let tiles = TileConfig::default();

        assert_eq!(tiles.hex_size(1), Some(640_000.0));
        assert_eq!(tiles.hex_size(8), Some(5_000.0));
        assert_eq!(tiles.hex_size(17), Some(10.0));
        assert_eq!(tiles.hex_size(20), Some(10.0));
        assert_eq!(tiles.hex_size(0), None);
        assert_eq!(tiles.hex_size(21), None);
    }

    #[test]
    fn test_hex_size_monotonic_coarsening() {
        let tiles = TileConfig::default();

        for zoom in MIN_ZOOM..MAX_ZOOM {
            let coarse = tiles.hex_size(zoom).unwrap();
            let fine = tiles.hex_size(zoom + 1).unwrap();
            assert!(coarse >= fine, "size must not grow with zoom ({})", zoom);
        }
    }

    #[test]
    fn test_multiplier_scales_all_levels() {
        let tiles = TileConfig {
            hex_size_multiplier: 1.0,
            ..TileConfig::default()
        };
        assert_eq!(tiles.hex_size(1), Some(320_000.0));
        assert_eq!(tiles.hex_size(8), Some(2_500.0));
    }
}
