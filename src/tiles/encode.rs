//! Mapbox Vector Tile serialization of aggregation results.

use geo_types::{Coord, Rect};
use mvt::{GeomEncoder, GeomType, Tile};

use super::AggregationResult;
use crate::errors::AppError;

/// Layer name carried by every non-empty tile.
pub const TILE_LAYER_NAME: &str = "default";

/// MIME type of the tile response body.
pub const MVT_CONTENT_TYPE: &str = "application/vnd.mapbox-vector-tile";

/// Serialize an aggregation result into MVT bytes.
///
/// One feature per non-empty hexagon: a Polygon ring of 6 distinct vertices
/// (decoders add the closing pair, giving the canonical 7 coordinate pairs)
/// and one integer `count` property. Coordinates are mapped affinely into the
/// tile-local space; hexagons are never clipped, so partially-covered cells
/// keep their shape. An empty result serializes to the canonical empty tile:
/// a payload with no layers that decodes to an empty structure.
pub fn encode_tile(
    result: &AggregationResult,
    envelope: &Rect<f64>,
    extent: u32,
) -> Result<Vec<u8>, AppError> {
    let mut tile = Tile::new(extent);
    if result.is_empty() {
        return Ok(tile.to_bytes()?);
    }

    let span_x = envelope.width();
    let span_y = envelope.height();
    if span_x <= 0.0 || span_y <= 0.0 {
        return Err(AppError::Encoding(format!(
            "degenerate tile envelope: {} x {}",
            span_x, span_y
        )));
    }

    let mut layer = tile.create_layer(TILE_LAYER_NAME);
    for (index, cell) in result.cells.iter().enumerate() {
        let ring = &cell.geometry.exterior().0;
        // The ring is closed; the final duplicate vertex is implied by the
        // MVT ClosePath command.
        let distinct = ring.len().saturating_sub(1);
        if distinct < 3 {
            return Err(AppError::Encoding(format!(
                "degenerate hexagon with {} vertices",
                distinct
            )));
        }

        let mut encoder = GeomEncoder::new(GeomType::Polygon);
        for vertex in &ring[..distinct] {
            let (tx, ty) = to_tile_space(*vertex, envelope, extent);
            encoder = encoder.point(tx, ty)?;
        }
        let geometry = encoder.complete()?.encode()?;

        let mut feature = layer.into_feature(geometry);
        feature.set_id(index as u64 + 1);
        feature.add_tag_sint("count", cell.count as i64);
        layer = feature.into_layer();
    }
    tile.add_layer(layer)?;

    Ok(tile.to_bytes()?)
}

/// Map an EPSG:3857 coordinate into tile-local space (y axis flipped).
fn to_tile_space(vertex: Coord<f64>, envelope: &Rect<f64>, extent: u32) -> (f64, f64) {
    let extent = f64::from(extent);
    let tx = (vertex.x - envelope.min().x) / envelope.width() * extent;
    let ty = (envelope.max().y - vertex.y) / envelope.height() * extent;
    (tx, ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{aggregate, HexGrid};
    use geo_types::Point;

    fn envelope() -> Rect<f64> {
        Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10_000.0, y: 10_000.0 })
    }

    #[test]
    fn test_empty_result_is_canonical_empty_tile() {
        let bytes = encode_tile(&AggregationResult::default(), &envelope(), 4096).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_single_cell_tile_roundtrip() {
        use geozero::mvt::{Message, Tile};

        let grid = HexGrid::new(500.0).unwrap();
        let result = aggregate(
            vec![
                Point::from(Coord { x: 5_000.0, y: 5_000.0 }),
                Point::from(Coord { x: 5_010.0, y: 5_020.0 }),
            ],
            &grid,
            Some(&envelope()),
        );
        let bytes = encode_tile(&result, &envelope(), 4096).unwrap();

        let tile = Tile::decode(&bytes[..]).unwrap();
        assert_eq!(tile.layers.len(), 1);
        let layer = &tile.layers[0];
        assert_eq!(layer.name, TILE_LAYER_NAME);
        assert_eq!(layer.extent.unwrap_or(4096), 4096);
        assert_eq!(layer.features.len(), 1);

        // count == 2
        let feature = &layer.features[0];
        let count_key = layer.keys.iter().position(|k| k == "count").unwrap() as u32;
        let value_index = feature
            .tags
            .chunks(2)
            .find(|pair| pair[0] == count_key)
            .map(|pair| pair[1])
            .unwrap();
        assert_eq!(layer.values[value_index as usize].sint_value, Some(2));
    }

    #[test]
    fn test_hexagon_encodes_six_distinct_vertices() {
        use geozero::mvt::{Message, Tile};

        let grid = HexGrid::new(500.0).unwrap();
        let result = aggregate(
            vec![Point::from(Coord { x: 5_000.0, y: 5_000.0 })],
            &grid,
            Some(&envelope()),
        );
        let bytes = encode_tile(&result, &envelope(), 4096).unwrap();

        let tile = Tile::decode(&bytes[..]).unwrap();
        let geometry = &tile.layers[0].features[0].geometry;

        // MoveTo(1 point), LineTo(5 points), ClosePath: 6 distinct vertices,
        // which decodes to 7 coordinate pairs.
        assert_eq!(geometry[0], (1 << 3) | 1, "MoveTo with 1 point");
        assert_eq!(geometry[3], (5 << 3) | 2, "LineTo with 5 points");
        assert_eq!(*geometry.last().unwrap(), (1 << 3) | 7, "ClosePath");
        assert_eq!(geometry.len(), 1 + 2 + 1 + 10 + 1);
    }

    #[test]
    fn test_degenerate_envelope_rejected() {
        let grid = HexGrid::new(500.0).unwrap();
        let result = aggregate(
            vec![Point::from(Coord { x: 5_000.0, y: 5_000.0 })],
            &grid,
            None,
        );
        let flat = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 10.0 });
        assert!(encode_tile(&result, &flat, 4096).is_err());
    }
}
