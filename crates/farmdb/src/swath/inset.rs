//! Negative-offset (inset) morphological buffer.

use anyhow::{anyhow, ensure, Result};
use geo::orient::{Direction, Orient};
use geo::{BooleanOps, LineString, MultiPolygon, Polygon};

use crate::geom::Meters;
use crate::swath::validity::{self, ValidityFailure};

/// Vertices per full circle when rounding offset corners, matching the
/// original guidance tooling's buffer strategy.
pub const CIRCLE_POINTS: f64 = 32.0;

/// Smallest inset distance worth computing.
pub const MIN_OFFSET: Meters = Meters(1.0);

/// Shrink `poly` inward by `offset`.
///
/// The result may equal the input shrunk inward, split into several disjoint
/// polygons where narrow waists collapse, or be empty when the polygon is
/// everywhere narrower than `2 * offset` (an empty multipolygon, not an
/// error).
pub fn inset(poly: &Polygon<f64>, offset: Meters) -> Result<MultiPolygon<f64>> {
    ensure!(
        offset >= MIN_OFFSET,
        "inset offset must be at least {MIN_OFFSET} (got {offset})"
    );
    if let Err(failure) = validity::check_polygon(poly) {
        return Err(anyhow!("invalid geometry: {failure}"));
    }

    // Erosion of (shell minus holes) = eroded shell minus dilated holes.
    let shrunk = offset_rings(poly.exterior(), -offset)?;
    let mut grown_holes: Vec<Polygon<f64>> = Vec::new();
    for hole in poly.interiors() {
        // Interior rings are stored clockwise; the offset engine expects CCW.
        let mut coords = hole.0.clone();
        coords.reverse();
        grown_holes.extend(offset_rings(&LineString::new(coords), offset)?);
    }

    let shrunk = MultiPolygon::new(shrunk);
    let result = if grown_holes.is_empty() {
        shrunk
    } else {
        shrunk.difference(&MultiPolygon::new(grown_holes))
    };
    let result = cleanup(result).orient(Direction::Default);

    match validity::check_multi_polygon(&result) {
        Ok(()) | Err(ValidityFailure::WrongOrientation) => Ok(result),
        Err(failure) => Err(anyhow!("invalid geometry after inset: {failure}")),
    }
}

/// Offset a closed CCW ring, dropping degenerate output rings.
///
/// `offset_polygon` is pinned to an old `geo-types` release incompatible
/// with the `geo-types` version this crate otherwise uses, so rings are
/// translated across the two identical-shape coordinate types at the
/// boundary of this call.
fn offset_rings(ring: &LineString<f64>, offset: Meters) -> Result<Vec<Polygon<f64>>> {
    let legacy_ring = geo_types_04::LineString(
        ring.0
            .iter()
            .map(|c| geo_types_04::Coordinate { x: c.x, y: c.y })
            .collect(),
    );
    let rings = offset_polygon::offset_polygon(&legacy_ring, offset.get(), CIRCLE_POINTS)
        .map_err(|_| anyhow!("inset buffer did not converge"))?;
    Ok(rings
        .into_iter()
        .filter(|r| r.0.len() >= 4)
        .map(|r| {
            let coords: Vec<geo::Coord<f64>> = r
                .0
                .into_iter()
                .map(|c| geo::Coord { x: c.x, y: c.y })
                .collect();
            Polygon::new(LineString::new(coords), Vec::new())
        })
        .collect())
}

/// Drop consecutive duplicate vertices and rings left with fewer than four
/// coordinates.
fn cleanup(mp: MultiPolygon<f64>) -> MultiPolygon<f64> {
    fn dedup(ring: &LineString<f64>) -> LineString<f64> {
        let mut coords: Vec<geo::Coord<f64>> = Vec::with_capacity(ring.0.len());
        for &c in &ring.0 {
            if coords.last() != Some(&c) {
                coords.push(c);
            }
        }
        if coords.first() != coords.last() {
            if let Some(&first) = coords.first() {
                coords.push(first);
            }
        }
        LineString::new(coords)
    }

    MultiPolygon::new(
        mp.into_iter()
            .filter_map(|poly| {
                let (exterior, interiors) = poly.into_inner();
                let exterior = dedup(&exterior);
                if exterior.0.len() < 4 {
                    return None;
                }
                let interiors = interiors
                    .iter()
                    .map(dedup)
                    .filter(|r| r.0.len() >= 4)
                    .collect();
                Some(Polygon::new(exterior, interiors))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon, Area};

    fn square(size: f64) -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: size, y: 0.0),
            (x: size, y: size),
            (x: 0.0, y: size),
            (x: 0.0, y: 0.0),
        ]
    }

    #[test]
    fn rejects_sub_meter_offset() {
        assert!(inset(&square(100.0), Meters(0.5)).is_err());
    }

    #[test]
    fn square_shrinks_to_square() {
        let result = inset(&square(100.0), Meters(5.0)).unwrap();
        assert_eq!(result.0.len(), 1);
        let area = result.unsigned_area();
        assert!((area - 90.0 * 90.0).abs() < 1.0, "area was {area}");
    }

    #[test]
    fn narrow_rectangle_collapses_to_nothing() {
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 200.0, y: 0.0),
            (x: 200.0, y: 8.0),
            (x: 0.0, y: 8.0),
            (x: 0.0, y: 0.0),
        ];
        let result = inset(&poly, Meters(5.0)).unwrap();
        assert!(result.0.is_empty());
    }

    #[test]
    fn area_decreases_monotonically() {
        let poly = square(100.0);
        let mut last = poly.unsigned_area();
        for d in [2.0, 5.0, 10.0, 20.0, 40.0] {
            let area = inset(&poly, Meters(d)).unwrap().unsigned_area();
            assert!(area < last, "inset by {d} m grew the area");
            last = area;
        }
    }

    #[test]
    fn hole_grows_into_the_result() {
        let poly = Polygon::new(
            square(100.0).exterior().clone(),
            vec![line_string![
                // Clockwise, as interiors are stored.
                (x: 40.0, y: 40.0),
                (x: 40.0, y: 60.0),
                (x: 60.0, y: 60.0),
                (x: 60.0, y: 40.0),
                (x: 40.0, y: 40.0),
            ]],
        );
        let result = inset(&poly, Meters(2.0)).unwrap();
        assert_eq!(result.0.len(), 1);
        assert_eq!(result.0[0].interiors().len(), 1);
        // 96x96 outer minus a 24x24 hole with rounded corners.
        let area = result.unsigned_area();
        let expected = 96.0 * 96.0 - (24.0 * 24.0 - (16.0 - 4.0 * std::f64::consts::PI));
        assert!((area - expected).abs() < 2.0, "area was {area}");
    }
}
