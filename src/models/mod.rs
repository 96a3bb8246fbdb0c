//! Data models for the biomap backend.
//!
//! Occurrences and areas carry geometry in EPSG:3857 (meters); JSON-facing
//! shapes expose EPSG:4326 coordinates.

mod area;
mod catalog;
mod occurrence;

pub use area::*;
pub use catalog::*;
pub use occurrence::*;
