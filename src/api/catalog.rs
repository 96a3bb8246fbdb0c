//! Catalog endpoints: species, datasets and filter areas known to the system.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::{AreaSummary, Dataset, Species};
use crate::AppState;

/// GET /api/species - All species, ordered by name.
pub async fn species_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<Species>>, AppError> {
    Ok(Json(state.repo.list_species().await?))
}

/// GET /api/datasets - All datasets, ordered by name.
pub async fn datasets_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<Dataset>>, AppError> {
    Ok(Json(state.repo.list_datasets().await?))
}

/// GET /api/areas - All filter areas (geometry omitted).
pub async fn areas_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<AreaSummary>>, AppError> {
    let areas = state.repo.list_areas().await?;
    Ok(Json(areas.iter().map(AreaSummary::from).collect()))
}
