//! Database module for SQLite persistence.
//!
//! The store holds the occurrence points (EPSG:3857), the named filter areas
//! and the per-viewer seen markers. The aggregation core only ever reads it.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS species (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            gbif_taxon_key INTEGER NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS datasets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            gbif_id TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Locations are stored as projected EPSG:3857 meters.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS occurrences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            gbif_id INTEGER NOT NULL,
            species_id INTEGER NOT NULL,
            dataset_id INTEGER NOT NULL,
            data_import_id INTEGER,
            date TEXT NOT NULL,
            x REAL NOT NULL,
            y REAL NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Area geometries are EPSG:3857 multipolygons, serialized as JSON.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS areas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            geometry TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS record_views (
            user_id INTEGER NOT NULL,
            occurrence_id INTEGER NOT NULL,
            first_viewed_at TEXT NOT NULL,
            PRIMARY KEY (user_id, occurrence_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Indexes for the filter dimensions hit on every tile request
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_occurrences_species ON occurrences(species_id);
        CREATE INDEX IF NOT EXISTS idx_occurrences_dataset ON occurrences(dataset_id);
        CREATE INDEX IF NOT EXISTS idx_occurrences_date ON occurrences(date);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
