//! Species and dataset catalog models.

use serde::{Deserialize, Serialize};

/// A species known to the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Species {
    pub id: i64,
    pub name: String,
    pub gbif_taxon_key: i64,
}

/// A source dataset occurrences were imported from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    pub gbif_id: String,
}
