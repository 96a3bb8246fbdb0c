//! Record store adapter.
//!
//! All occurrence consumers (tiles, counts, pages, histograms) go through
//! [`Repository::occurrences`] with a [`FilteredSet`], so every query path
//! applies exactly the same predicates. If a new filter dimension is added it
//! must be added there, and only there; otherwise observations returned on
//! the map and on other components (table, histogram, ...) will be
//! inconsistent.

use std::collections::BTreeMap;

use chrono::{Datelike, Utc};
use geo::{BooleanOps, Intersects};
use geo_types::MultiPolygon;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::auth::Viewer;
use crate::errors::AppError;
use crate::filters::{Filter, ViewStatus};
use crate::models::{Area, Dataset, MonthlyCount, Occurrence, Species};

/// A lazy description of the occurrences matching a filter.
///
/// Nothing is fetched until the set is handed to a repository method;
/// dimensions compose conjunctively, id membership within a dimension is
/// disjunctive. The seen/unseen dimension only applies when a viewer is
/// present and is silently ignored otherwise.
#[derive(Debug, Clone)]
pub struct FilteredSet {
    pub filter: Filter,
    pub viewer: Option<Viewer>,
}

impl FilteredSet {
    pub fn new(filter: Filter, viewer: Option<Viewer>) -> Self {
        Self { filter, viewer }
    }
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch the occurrences matching a filtered set, as one batched query.
    ///
    /// Scalar dimensions (species, dataset, import, dates, seen status) are
    /// evaluated by SQLite; the area predicate is a point-in-union test
    /// against the combined geometry of the named areas, run on the fetched
    /// rows. Union-then-test: a point inside several overlapping areas
    /// matches exactly once.
    pub async fn occurrences(&self, set: &FilteredSet) -> Result<Vec<Occurrence>, AppError> {
        let mut qb = filtered_occurrences_query(set);
        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut occurrences: Vec<Occurrence> = rows.iter().map(occurrence_from_row).collect();

        if !set.filter.area_ids.is_empty() {
            match self.area_union(&set.filter.area_ids).await? {
                Some(union) => {
                    occurrences.retain(|occ| occ.location().intersects(&union));
                }
                // Filtering on areas that don't exist matches nothing.
                None => occurrences.clear(),
            }
        }

        Ok(occurrences)
    }

    /// Count the occurrences matching a filtered set.
    ///
    /// Shares the fetch path with [`Repository::occurrences`] so the count
    /// can never drift from the list or the map.
    pub async fn count(&self, set: &FilteredSet) -> Result<u64, AppError> {
        Ok(self.occurrences(set).await?.len() as u64)
    }

    /// Occurrences per calendar month, chronologically ordered.
    pub async fn monthly_histogram(
        &self,
        set: &FilteredSet,
    ) -> Result<Vec<MonthlyCount>, AppError> {
        let mut buckets: BTreeMap<(i32, u32), u64> = BTreeMap::new();
        for occ in self.occurrences(set).await? {
            *buckets
                .entry((occ.date.year(), occ.date.month()))
                .or_insert(0) += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|((year, month), count)| MonthlyCount { year, month, count })
            .collect())
    }

    /// Union of the geometries of the given areas, `None` if none exist.
    async fn area_union(&self, area_ids: &[i64]) -> Result<Option<MultiPolygon<f64>>, AppError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT geometry FROM areas WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in area_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut union: Option<MultiPolygon<f64>> = None;
        for row in rows {
            let geometry: MultiPolygon<f64> = serde_json::from_str(row.get("geometry"))?;
            union = Some(match union {
                Some(combined) => combined.union(&geometry),
                None => geometry,
            });
        }
        Ok(union)
    }

    // ==================== CATALOG OPERATIONS ====================

    /// List all species.
    pub async fn list_species(&self) -> Result<Vec<Species>, AppError> {
        let rows = sqlx::query("SELECT id, name, gbif_taxon_key FROM species ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Species {
                id: row.get("id"),
                name: row.get("name"),
                gbif_taxon_key: row.get("gbif_taxon_key"),
            })
            .collect())
    }

    /// List all datasets.
    pub async fn list_datasets(&self) -> Result<Vec<Dataset>, AppError> {
        let rows = sqlx::query("SELECT id, name, gbif_id FROM datasets ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Dataset {
                id: row.get("id"),
                name: row.get("name"),
                gbif_id: row.get("gbif_id"),
            })
            .collect())
    }

    /// List all areas.
    pub async fn list_areas(&self) -> Result<Vec<Area>, AppError> {
        let rows = sqlx::query("SELECT id, name, geometry FROM areas ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let mut areas = Vec::with_capacity(rows.len());
        for row in rows {
            areas.push(Area {
                id: row.get("id"),
                name: row.get("name"),
                geometry: serde_json::from_str(row.get("geometry"))?,
            });
        }
        Ok(areas)
    }

    // ==================== WRITE SURFACE (importer / tests) ====================

    /// Insert a species and return it.
    pub async fn insert_species(
        &self,
        name: &str,
        gbif_taxon_key: i64,
    ) -> Result<Species, AppError> {
        let result = sqlx::query("INSERT INTO species (name, gbif_taxon_key) VALUES (?, ?)")
            .bind(name)
            .bind(gbif_taxon_key)
            .execute(&self.pool)
            .await?;

        Ok(Species {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            gbif_taxon_key,
        })
    }

    /// Insert a dataset and return it.
    pub async fn insert_dataset(&self, name: &str, gbif_id: &str) -> Result<Dataset, AppError> {
        let result = sqlx::query("INSERT INTO datasets (name, gbif_id) VALUES (?, ?)")
            .bind(name)
            .bind(gbif_id)
            .execute(&self.pool)
            .await?;

        Ok(Dataset {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            gbif_id: gbif_id.to_string(),
        })
    }

    /// Insert an occurrence (location in EPSG:3857 meters) and return its id.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_occurrence(
        &self,
        gbif_id: i64,
        species_id: i64,
        dataset_id: i64,
        data_import_id: Option<i64>,
        date: chrono::NaiveDate,
        x: f64,
        y: f64,
    ) -> Result<i64, AppError> {
        let result = sqlx::query(
            "INSERT INTO occurrences (gbif_id, species_id, dataset_id, data_import_id, date, x, y) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(gbif_id)
        .bind(species_id)
        .bind(dataset_id)
        .bind(data_import_id)
        .bind(date)
        .bind(x)
        .bind(y)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert an area with an EPSG:3857 multipolygon geometry.
    pub async fn insert_area(
        &self,
        name: &str,
        geometry: &MultiPolygon<f64>,
    ) -> Result<i64, AppError> {
        let result = sqlx::query("INSERT INTO areas (name, geometry) VALUES (?, ?)")
            .bind(name)
            .bind(serde_json::to_string(geometry)?)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Record that a viewer has seen an occurrence (idempotent).
    pub async fn mark_seen(&self, viewer: Viewer, occurrence_id: i64) -> Result<(), AppError> {
        sqlx::query(
            "INSERT OR IGNORE INTO record_views (user_id, occurrence_id, first_viewed_at) \
             VALUES (?, ?, ?)",
        )
        .bind(viewer.user_id)
        .bind(occurrence_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Build the one batched SELECT for a filtered set.
///
/// `WHERE 1 = 1` anchors the conjunction so every dimension appends uniformly.
fn filtered_occurrences_query(set: &FilteredSet) -> QueryBuilder<'static, Sqlite> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, gbif_id, species_id, dataset_id, data_import_id, date, x, y \
         FROM occurrences WHERE 1 = 1",
    );

    push_id_filter(&mut qb, "species_id", &set.filter.species_ids);
    push_id_filter(&mut qb, "dataset_id", &set.filter.dataset_ids);
    push_id_filter(&mut qb, "data_import_id", &set.filter.data_import_ids);

    if let Some(start) = set.filter.start_date {
        qb.push(" AND date >= ");
        qb.push_bind(start);
    }
    if let Some(end) = set.filter.end_date {
        qb.push(" AND date <= ");
        qb.push_bind(end);
    }

    // Seen/unseen needs an identified viewer; without one the dimension is
    // silently ignored, not an error.
    if let (Some(viewer), Some(status)) = (set.viewer, set.filter.status) {
        match status {
            ViewStatus::Seen => {
                qb.push(" AND id IN (SELECT occurrence_id FROM record_views WHERE user_id = ");
            }
            ViewStatus::Unseen => {
                qb.push(" AND id NOT IN (SELECT occurrence_id FROM record_views WHERE user_id = ");
            }
        }
        qb.push_bind(viewer.user_id);
        qb.push(")");
    }

    qb
}

fn push_id_filter(qb: &mut QueryBuilder<'static, Sqlite>, column: &str, ids: &[i64]) {
    if ids.is_empty() {
        return;
    }
    qb.push(format!(" AND {} IN (", column));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

fn occurrence_from_row(row: &sqlx::sqlite::SqliteRow) -> Occurrence {
    Occurrence {
        id: row.get("id"),
        gbif_id: row.get("gbif_id"),
        species_id: row.get("species_id"),
        dataset_id: row.get("dataset_id"),
        data_import_id: row.get("data_import_id"),
        date: row.get("date"),
        x: row.get("x"),
        y: row.get("y"),
    }
}
