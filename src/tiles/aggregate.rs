//! Spatial aggregation: count filtered occurrence points per hexagon.

use std::collections::{HashMap, HashSet};

use geo_types::{Point, Polygon, Rect};

use super::{HexCellId, HexGrid};

/// One non-empty hexagon in an aggregation result.
#[derive(Debug, Clone)]
pub struct HexCell {
    pub id: HexCellId,
    pub geometry: Polygon<f64>,
    pub count: u64,
}

/// The outcome of one aggregation call.
///
/// Only hexagons with at least one matching point appear; zero-count cells
/// are never materialized, so an empty result is how "no data" is
/// represented. Cell order is not guaranteed.
#[derive(Debug, Clone, Default)]
pub struct AggregationResult {
    pub cells: Vec<HexCell>,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total number of points across all cells.
    pub fn total_count(&self) -> u64 {
        self.cells.iter().map(|c| c.count).sum()
    }

    /// Min/max count over non-empty cells, `None` when there is no data.
    ///
    /// Callers must keep "no data" distinct from a `(0, 0)` answer.
    pub fn min_max(&self) -> Option<(u64, u64)> {
        let mut counts = self.cells.iter().map(|c| c.count);
        let first = counts.next()?;
        let (min, max) = counts.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c)));
        Some((min, max))
    }
}

/// Join points against the hexagon grid and count per cell.
///
/// With a viewport, the grid is generated over the viewport envelope and only
/// those cells are kept; a kept cell still counts all of its points,
/// including points lying outside the viewport (the grid covers the envelope,
/// the join counts every filtered point). Without a viewport the grid covers
/// the full data extent, which makes min/max figures comparable across zoom
/// changes.
pub fn aggregate<I>(points: I, grid: &HexGrid, viewport: Option<&Rect<f64>>) -> AggregationResult
where
    I: IntoIterator<Item = Point<f64>>,
{
    let mut counts: HashMap<HexCellId, u64> = HashMap::new();
    for point in points {
        *counts.entry(grid.cell_at(point.0)).or_insert(0) += 1;
    }

    let covering: Option<HashSet<HexCellId>> = viewport
        .map(|envelope| grid.cells_covering(envelope).into_iter().collect());

    let cells = counts
        .into_iter()
        .filter(|(id, _)| covering.as_ref().map_or(true, |grid_cells| grid_cells.contains(id)))
        .map(|(id, count)| HexCell {
            id,
            geometry: grid.polygon(id),
            count,
        })
        .collect();

    AggregationResult { cells }
}
