//! Local planar projection for a geographic polygon.
//!
//! An azimuthal equidistant projection on the WGS-84 ellipsoid, centred on
//! the polygon's envelope, is locally accurate to well under the buffer
//! offsets this crate works with (fields are small against the ellipsoid).

use anyhow::{anyhow, Context, Result};
use geo::{BoundingRect, Coord, MapCoords, MultiLineString, Polygon};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

/// Paired geographic / planar coordinate reference systems.
pub struct LocalProjection {
    geographic: Proj,
    planar: Proj,
}

impl LocalProjection {
    /// Build a projection centred on the envelope of `poly` (degrees,
    /// x = longitude, y = latitude).
    pub fn for_polygon(poly: &Polygon<f64>) -> Result<Self> {
        let origin = poly
            .bounding_rect()
            .ok_or_else(|| anyhow!("cannot project an empty polygon"))?
            .center();

        let geographic = {
            let proj_string = "+proj=longlat +ellps=WGS84 +no_defs +type=crs";
            Proj::from_proj_string(proj_string)
                .with_context(|| format!("failed to build geographic CRS: {proj_string}"))?
        };

        let planar = {
            let proj_string = format!(
                "+proj=aeqd +ellps=WGS84 +lat_0={} +lon_0={} +x_0=0 +y_0=0 +units=m +no_defs +type=crs",
                origin.y, origin.x
            );
            Proj::from_proj_string(&proj_string)
                .with_context(|| format!("failed to build planar CRS: {proj_string}"))?
        };

        Ok(LocalProjection { geographic, planar })
    }

    /// Degrees in, metres out, point-wise.
    pub fn forward<G>(&self, geom: &G) -> Result<G>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geom.try_map_coords(|coord: Coord<f64>| {
            let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
            transform(&self.geographic, &self.planar, &mut point)
                .context("projection transform failed")?;
            Ok::<_, anyhow::Error>(Coord { x: point.0, y: point.1 })
        })
    }

    /// Metres in, degrees out, point-wise.
    pub fn inverse<G>(&self, geom: &G) -> Result<G>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geom.try_map_coords(|coord: Coord<f64>| {
            let mut point = (coord.x, coord.y, 0.0);
            transform(&self.planar, &self.geographic, &mut point)
                .context("inverse projection transform failed")?;
            Ok::<_, anyhow::Error>(Coord {
                x: point.0.to_degrees(),
                y: point.1.to_degrees(),
            })
        })
    }

    /// Convenience for the multipath bundles the orchestrator moves around.
    pub fn inverse_paths(&self, paths: &MultiLineString<f64>) -> Result<MultiLineString<f64>> {
        self.inverse(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    /// 0.001 degrees of latitude is about 111 m.
    fn small_field() -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 45.0),
            (x: 0.0013, y: 45.0),
            (x: 0.0013, y: 45.0009),
            (x: 0.0, y: 45.0009),
            (x: 0.0, y: 45.0),
        ]
    }

    #[test]
    fn forward_lands_near_the_origin() {
        let poly = small_field();
        let proj = LocalProjection::for_polygon(&poly).unwrap();
        let planar = proj.forward(&poly).unwrap();
        for c in planar.exterior().0.iter() {
            assert!(c.x.abs() < 200.0 && c.y.abs() < 200.0, "coordinate {c:?}");
        }
    }

    #[test]
    fn round_trip_is_sub_micrometre() {
        let poly = small_field();
        let proj = LocalProjection::for_polygon(&poly).unwrap();
        let there = proj.forward(&poly).unwrap();
        let back = proj.inverse(&there).unwrap();
        for (a, b) in poly.exterior().0.iter().zip(back.exterior().0.iter()) {
            // One micrometre is about 9e-12 degrees of latitude.
            assert!((a.x - b.x).abs() < 1e-11);
            assert!((a.y - b.y).abs() < 1e-11);
        }
    }
}
