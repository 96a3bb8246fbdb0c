//! Occurrence list endpoints: paginated data table, counter, histogram.
//!
//! These consume the exact same [`FilteredSet`] as the tile endpoints, which
//! is what keeps the map and the table consistent.

use std::collections::HashMap;

use axum::{
    extract::{RawQuery, State},
    Extension, Json,
};
use serde::Serialize;

use super::{extract_int_param, extract_str_param};
use crate::auth::Viewer;
use crate::db::FilteredSet;
use crate::errors::AppError;
use crate::filters::Filter;
use crate::models::{MonthlyCount, Occurrence, OccurrenceSummary};
use crate::AppState;

/// Occurrences per page when the caller doesn't say.
const DEFAULT_PAGE_SIZE: i64 = 50;
/// Hard cap on the page size.
const MAX_PAGE_SIZE: i64 = 500;

/// One page of filtered occurrences.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrencePage {
    pub results: Vec<OccurrenceSummary>,
    pub page_number: u64,
    pub first_page: u64,
    pub last_page: u64,
    pub total_results_count: u64,
}

/// GET /api/occurrences - Paginated filtered occurrences (data tables, ...).
///
/// An out-of-range `page_number` (negative or past the end) returns the last
/// page. No matching occurrences: `totalResultsCount == 0`, empty `results`.
pub async fn occurrences_page(
    State(state): State<AppState>,
    Extension(viewer): Extension<Option<Viewer>>,
    RawQuery(query): RawQuery,
) -> Result<Json<OccurrencePage>, AppError> {
    let query = query.unwrap_or_default();
    let filter = Filter::from_query_string(&query)?;
    let limit = extract_int_param(&query, "limit")?
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE) as u64;
    let page_param = extract_int_param(&query, "page_number")?;
    let order = extract_str_param(&query, "order");

    let set = FilteredSet::new(filter, viewer);
    let mut occurrences = state.repo.occurrences(&set).await?;
    sort_occurrences(&mut occurrences, order.as_deref())?;

    let total = occurrences.len() as u64;
    let last_page = total.div_ceil(limit).max(1);
    let page_number = match page_param {
        None => 1,
        Some(p) if p < 1 || p as u64 > last_page => last_page,
        Some(p) => p as u64,
    };
    let offset = ((page_number - 1) * limit) as usize;

    let species_names: HashMap<i64, String> = state
        .repo
        .list_species()
        .await?
        .into_iter()
        .map(|species| (species.id, species.name))
        .collect();

    let results = occurrences
        .iter()
        .skip(offset)
        .take(limit as usize)
        .map(|occ| {
            let name = species_names
                .get(&occ.species_id)
                .cloned()
                .unwrap_or_default();
            OccurrenceSummary::new(occ, name)
        })
        .collect();

    Ok(Json(OccurrencePage {
        results,
        page_number,
        first_page: 1,
        last_page,
        total_results_count: total,
    }))
}

/// Count of filtered occurrences.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// GET /api/occurrences/count - Count the occurrences matching the filters.
pub async fn occurrences_count(
    State(state): State<AppState>,
    Extension(viewer): Extension<Option<Viewer>>,
    RawQuery(query): RawQuery,
) -> Result<Json<CountResponse>, AppError> {
    let filter = Filter::from_query_string(query.as_deref().unwrap_or(""))?;
    let set = FilteredSet::new(filter, viewer);
    let count = state.repo.count(&set).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /api/occurrences/monthly-histogram - Filtered counts per month,
/// chronologically ordered.
pub async fn occurrences_monthly_histogram(
    State(state): State<AppState>,
    Extension(viewer): Extension<Option<Viewer>>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<MonthlyCount>>, AppError> {
    let filter = Filter::from_query_string(query.as_deref().unwrap_or(""))?;
    let set = FilteredSet::new(filter, viewer);
    let histogram = state.repo.monthly_histogram(&set).await?;
    Ok(Json(histogram))
}

fn sort_occurrences(occurrences: &mut [Occurrence], order: Option<&str>) -> Result<(), AppError> {
    let Some(order) = order else {
        return Ok(());
    };
    let (key, descending) = match order.strip_prefix('-') {
        Some(stripped) => (stripped, true),
        None => (order, false),
    };
    match key {
        "id" => occurrences.sort_by_key(|occ| occ.id),
        "gbif_id" => occurrences.sort_by_key(|occ| occ.gbif_id),
        "date" => occurrences.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id))),
        other => {
            return Err(AppError::InvalidParameter(format!(
                "order: unsupported sort key {:?}",
                other
            )))
        }
    }
    if descending {
        occurrences.reverse();
    }
    Ok(())
}
