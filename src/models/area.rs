//! Named area model: a multipolygon used for spatial filtering.

use geo_types::MultiPolygon;
use serde::Serialize;

/// A named area with an EPSG:3857 multipolygon geometry.
#[derive(Debug, Clone)]
pub struct Area {
    pub id: i64,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// JSON shape for the area list endpoint (geometry omitted).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSummary {
    pub id: i64,
    pub name: String,
}

impl From<&Area> for AreaSummary {
    fn from(area: &Area) -> Self {
        Self {
            id: area.id,
            name: area.name.clone(),
        }
    }
}
