//! Regular flat-top hexagonal grid over the EPSG:3857 plane.
//!
//! The tiling is anchored at the projection origin, so a given cell size
//! always produces the same cells no matter which tile or viewport is being
//! rendered. Cells are addressed by axial coordinates `(q, r)`: column `q`
//! centers are spaced `1.5 * size` apart in x, rows `sqrt(3) * size` apart in
//! y, odd columns shifted by half a row.

use geo::Intersects;
use geo_types::{Coord, LineString, Polygon, Rect};

use crate::errors::AppError;

/// Axial address of one hexagon cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexCellId {
    pub q: i64,
    pub r: i64,
}

/// A hexagonal tiling with a fixed edge length (meters).
#[derive(Debug, Clone)]
pub struct HexGrid {
    size: f64,
}

impl HexGrid {
    /// Build a grid for the given hexagon edge length.
    ///
    /// A non-positive or non-finite size is a configuration error (the fixed
    /// zoom table never produces one) and is rejected before any geometry
    /// work.
    pub fn new(size: f64) -> Result<Self, AppError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(AppError::Encoding(format!(
                "degenerate hexagon cell size: {}",
                size
            )));
        }
        Ok(Self { size })
    }

    /// The cell containing a point.
    ///
    /// Nearest-center assignment: for a regular hexagonal tiling the Voronoi
    /// region of a center is exactly its hexagon, so this matches an
    /// intersects-style spatial join. Points exactly on a shared edge resolve
    /// deterministically to one of the adjacent cells.
    pub fn cell_at(&self, point: Coord<f64>) -> HexCellId {
        let q = (2.0 / 3.0) * point.x / self.size;
        let r = (-1.0 / 3.0) * point.x / self.size + (SQRT3 / 3.0) * point.y / self.size;
        axial_round(q, r)
    }

    /// Center of a cell, meters.
    pub fn center(&self, cell: HexCellId) -> Coord<f64> {
        Coord {
            x: 1.5 * self.size * cell.q as f64,
            y: SQRT3 * self.size * (cell.r as f64 + cell.q as f64 / 2.0),
        }
    }

    /// The cell's hexagon: 6 distinct vertices, ring closed by construction.
    pub fn polygon(&self, cell: HexCellId) -> Polygon<f64> {
        let c = self.center(cell);
        let ring: Vec<Coord<f64>> = VERTEX_OFFSETS
            .iter()
            .map(|&(dx, dy)| Coord {
                x: c.x + dx * self.size,
                y: c.y + dy * self.size,
            })
            .collect();
        Polygon::new(LineString::from(ring), vec![])
    }

    /// All cells whose hexagon intersects the envelope (boundary inclusive).
    ///
    /// Scans the index ranges whose bounding boxes can touch the envelope,
    /// then keeps the cells whose actual hexagon intersects it.
    pub fn cells_covering(&self, envelope: &Rect<f64>) -> Vec<HexCellId> {
        let s = self.size;
        let row = SQRT3 * s;
        let env_poly = envelope.to_polygon();

        let q_min = ((envelope.min().x - s) / (1.5 * s)).ceil() as i64;
        let q_max = ((envelope.max().x + s) / (1.5 * s)).floor() as i64;

        let mut cells = Vec::new();
        for q in q_min..=q_max {
            let col_offset = q as f64 / 2.0;
            let r_min = ((envelope.min().y - row / 2.0) / row - col_offset).ceil() as i64;
            let r_max = ((envelope.max().y + row / 2.0) / row - col_offset).floor() as i64;
            for r in r_min..=r_max {
                let cell = HexCellId { q, r };
                if self.polygon(cell).intersects(&env_poly) {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}

const SQRT3: f64 = 1.732_050_807_568_877_2;

/// Flat-top unit hexagon vertices, counter-clockwise from the east vertex.
const VERTEX_OFFSETS: [(f64, f64); 6] = [
    (1.0, 0.0),
    (0.5, SQRT3 / 2.0),
    (-0.5, SQRT3 / 2.0),
    (-1.0, 0.0),
    (-0.5, -SQRT3 / 2.0),
    (0.5, -SQRT3 / 2.0),
];

/// Round fractional axial coordinates to the nearest cell (cube rounding).
fn axial_round(q: f64, r: f64) -> HexCellId {
    let x = q;
    let z = r;
    let y = -x - z;

    let mut rx = x.round();
    let ry = y.round();
    let mut rz = z.round();

    let dx = (rx - x).abs();
    let dy = (ry - y).abs();
    let dz = (rz - z).abs();

    // Reset the component with the largest rounding error; when that
    // component is y the axial pair (q, r) is already consistent.
    if dx > dy && dx > dz {
        rx = -ry - rz;
    } else if dy <= dz {
        rz = -rx - ry;
    }

    HexCellId {
        q: rx as i64,
        r: rz as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Intersects;

    #[test]
    fn test_origin_cell_geometry() {
        let grid = HexGrid::new(1.0).unwrap();
        let origin = HexCellId { q: 0, r: 0 };
        assert_eq!(grid.center(origin), Coord { x: 0.0, y: 0.0 });

        let poly = grid.polygon(origin);
        // 6 distinct vertices + the closing point
        assert_eq!(poly.exterior().0.len(), 7);
        assert_eq!(poly.exterior().0.first(), poly.exterior().0.last());
    }

    #[test]
    fn test_cell_at_matches_containment() {
        let grid = HexGrid::new(250.0).unwrap();
        for &(x, y) in &[
            (0.0, 0.0),
            (100.0, 200.0),
            (-731.0, 415.0),
            (567_187.3, 6_531_468.4),
            (-485_328.5, -6_559_137.2),
        ] {
            let p = Coord { x, y };
            let cell = grid.cell_at(p);
            assert!(
                grid.polygon(cell).intersects(&geo_types::Point::from(p)),
                "point {:?} not inside its assigned hexagon {:?}",
                p,
                cell
            );
        }
    }

    #[test]
    fn test_adjacent_points_split_between_cells() {
        let grid = HexGrid::new(10.0).unwrap();
        // Two points more than one hexagon diameter apart never share a cell.
        let a = grid.cell_at(Coord { x: 0.0, y: 0.0 });
        let b = grid.cell_at(Coord { x: 25.0, y: 0.0 });
        assert_ne!(a, b);
    }

    #[test]
    fn test_degenerate_size_rejected() {
        assert!(HexGrid::new(0.0).is_err());
        assert!(HexGrid::new(-5.0).is_err());
        assert!(HexGrid::new(f64::NAN).is_err());
    }

    #[test]
    fn test_cells_covering_contains_inner_point_cell() {
        let grid = HexGrid::new(100.0).unwrap();
        let envelope = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1000.0, y: 1000.0 });
        let covering = grid.cells_covering(&envelope);

        let inner = grid.cell_at(Coord { x: 512.0, y: 512.0 });
        assert!(covering.contains(&inner));

        // Everything returned really does intersect the envelope.
        let env_poly = envelope.to_polygon();
        for cell in &covering {
            assert!(grid.polygon(*cell).intersects(&env_poly));
        }
    }

    #[test]
    fn test_cells_covering_excludes_far_cells() {
        let grid = HexGrid::new(100.0).unwrap();
        let envelope = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1000.0, y: 1000.0 });
        let covering = grid.cells_covering(&envelope);

        let far = grid.cell_at(Coord { x: 10_000.0, y: 10_000.0 });
        assert!(!covering.contains(&far));
    }
}
