//! Conversions between the farm model and `geo-types` geometry.

use anyhow::{anyhow, ensure, Result};
use geo::orient::{Direction, Orient};

use crate::geom::LatLon;
use crate::swath::validity::{self, ValidityFailure};

use super::{LineString, Polygon};

/// Ring coordinates (x = longitude, y = latitude), closed.
fn ring_coords(ring: &LineString) -> Vec<geo::Coord<f64>> {
    let mut coords: Vec<geo::Coord<f64>> = ring.points.iter().map(|p| p.pos.coord()).collect();
    if !coords.is_empty() && coords.first() != coords.last() {
        coords.push(coords[0]);
    }
    coords
}

impl Polygon {
    /// Close every ring and normalize winding in place: exterior
    /// counter-clockwise, holes clockwise. Point types and attributes ride
    /// along with their vertices.
    pub fn correct(&mut self) {
        fn close(ring: &mut LineString) {
            if let (Some(first), Some(last)) = (ring.points.first(), ring.points.last()) {
                if first.pos != last.pos {
                    let first = first.clone();
                    ring.points.push(first);
                }
            }
        }
        fn winding(ring: &LineString) -> f64 {
            let coords: Vec<geo::Coord<f64>> =
                ring.points.iter().map(|p| p.pos.coord()).collect();
            validity::signed_area(&coords)
        }

        close(&mut self.outer);
        if winding(&self.outer) < 0.0 {
            self.outer.points.reverse();
        }
        for ring in &mut self.inners {
            close(ring);
            if winding(ring) > 0.0 {
                ring.points.reverse();
            }
        }
    }

    /// Geometry-library polygon with rings closed and oriented, without any
    /// validity demands. For measurement and serialization of boundaries as
    /// they stand.
    pub fn to_geo_lenient(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(
            geo::LineString::new(ring_coords(&self.outer)),
            self.inners.iter().map(|r| geo::LineString::new(ring_coords(r))).collect(),
        )
        .orient(Direction::Default)
    }

    /// Validated geometry-library polygon, ready for the swath pipeline.
    pub fn to_geo(&self) -> Result<geo::Polygon<f64>> {
        ensure!(!self.outer.is_empty(), "polygon has no exterior ring");
        let poly = self.to_geo_lenient();
        match validity::check_polygon(&poly) {
            Ok(()) | Err(ValidityFailure::WrongOrientation) => Ok(poly),
            Err(failure) => Err(anyhow!("invalid polygon: {failure}")),
        }
    }
}

/// Geodetic paths of one swath as a geometry-library multi-linestring.
pub fn paths_to_geo(paths: &[Vec<LatLon>]) -> geo::MultiLineString<f64> {
    geo::MultiLineString::new(
        paths
            .iter()
            .map(|p| geo::LineString::new(p.iter().map(|pt| pt.coord()).collect()))
            .collect(),
    )
}

/// The inverse of [`paths_to_geo`].
pub fn paths_from_geo(paths: &geo::MultiLineString<f64>) -> Vec<Vec<LatLon>> {
    paths
        .0
        .iter()
        .map(|ls| ls.0.iter().map(|&c| LatLon::from_coord(c)).collect())
        .collect()
}
