//! Occurrence model: one geo-located observation record.

use chrono::NaiveDate;
use geo_types::{Coord, Point};
use serde::{Deserialize, Serialize};

use crate::tiles::proj;

/// A point observation record, as stored.
///
/// `x`/`y` are EPSG:3857 meters. Read-only from the aggregation core's
/// perspective; writes belong to the import subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub id: i64,
    pub gbif_id: i64,
    pub species_id: i64,
    pub dataset_id: i64,
    pub data_import_id: Option<i64>,
    pub date: NaiveDate,
    pub x: f64,
    pub y: f64,
}

impl Occurrence {
    /// Location as a projected (EPSG:3857) point.
    pub fn location(&self) -> Point<f64> {
        Point::from(Coord {
            x: self.x,
            y: self.y,
        })
    }
}

/// JSON shape of an occurrence in the paginated data-table endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceSummary {
    pub id: i64,
    pub gbif_id: i64,
    pub lat: f64,
    pub lon: f64,
    pub species_name: String,
    pub date: NaiveDate,
}

impl OccurrenceSummary {
    pub fn new(occ: &Occurrence, species_name: String) -> Self {
        let (lon, lat) = proj::mercator_to_lonlat(occ.x, occ.y);
        Self {
            id: occ.id,
            gbif_id: occ.gbif_id,
            lat,
            lon,
            species_name,
            date: occ.date,
        }
    }
}

/// One bar of the monthly occurrence histogram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub count: u64,
}
