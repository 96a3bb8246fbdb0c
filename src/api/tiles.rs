//! Map tile endpoints: hexagon-binned vector tiles and grid statistics.

use axum::{
    extract::{Path, RawQuery, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;

use super::extract_int_param;
use crate::auth::Viewer;
use crate::db::FilteredSet;
use crate::errors::AppError;
use crate::filters::Filter;
use crate::tiles::{aggregate, encode_tile, HexGrid, TileCoordinate, MVT_CONTENT_TYPE};
use crate::AppState;

/// GET /tiles/{zoom}/{x}/{y} - Hexagon-aggregated occurrence counts as MVT.
///
/// Filters are honoured; an empty tile is a zero-length body.
pub async fn hexagon_grid_tile(
    State(state): State<AppState>,
    Extension(viewer): Extension<Option<Viewer>>,
    Path((zoom, x, y)): Path<(u8, u32, u32)>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let coordinate = TileCoordinate { zoom, x, y };
    coordinate.validate()?;
    let filter = Filter::from_query_string(query.as_deref().unwrap_or(""))?;
    let grid = grid_for_zoom(&state, zoom)?;

    let set = FilteredSet::new(filter, viewer);
    let occurrences = state.repo.occurrences(&set).await?;

    let envelope = coordinate.envelope();
    let result = aggregate(
        occurrences.iter().map(|occ| occ.location()),
        &grid,
        Some(&envelope),
    );
    let bytes = encode_tile(&result, &envelope, state.config.tiles.extent)?;

    Ok(([(header::CONTENT_TYPE, MVT_CONTENT_TYPE)], bytes).into_response())
}

/// Min/max occurrence count per hexagon for a zoom level.
#[derive(Debug, Serialize)]
pub struct MinMaxResponse {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

/// GET /tiles/min-max?zoom=N - Count bounds for choropleth coloring.
///
/// Computed over the full data extent rather than any viewport, so the
/// figures stay comparable while panning. Both values are `null` when no
/// occurrence matches the filters (zero-count cells never exist).
pub async fn hexagon_grid_min_max(
    State(state): State<AppState>,
    Extension(viewer): Extension<Option<Viewer>>,
    RawQuery(query): RawQuery,
) -> Result<Json<MinMaxResponse>, AppError> {
    let query = query.unwrap_or_default();
    let zoom = extract_int_param(&query, "zoom")?
        .ok_or_else(|| AppError::InvalidParameter("zoom: required parameter missing".into()))?;
    let zoom = u8::try_from(zoom)
        .map_err(|_| AppError::InvalidZoom(format!("zoom out of range: {}", zoom)))?;
    let filter = Filter::from_query_string(&query)?;
    let grid = grid_for_zoom(&state, zoom)?;

    let set = FilteredSet::new(filter, viewer);
    let occurrences = state.repo.occurrences(&set).await?;

    let result = aggregate(occurrences.iter().map(|occ| occ.location()), &grid, None);
    let (min, max) = match result.min_max() {
        Some((min, max)) => (Some(min), Some(max)),
        None => (None, None),
    };

    Ok(Json(MinMaxResponse { min, max }))
}

fn grid_for_zoom(state: &AppState, zoom: u8) -> Result<HexGrid, AppError> {
    let size = state
        .config
        .tiles
        .hex_size(zoom)
        .ok_or_else(|| AppError::InvalidZoom(format!("zoom out of range: {}", zoom)))?;
    HexGrid::new(size)
}
