//! The boundary-inset swath generator.
//!
//! Pipeline: project the field boundary to a local planar frame, shrink it
//! inward by the requested offset, clean the result up, break every
//! resulting ring at its convex corners, and hand the pieces back as open
//! guidance paths in geographic coordinates.

pub mod corners;
pub mod extract;
pub mod inset;
pub mod proj;
pub mod simplify;
pub mod validity;

use anyhow::Result;
use geo::orient::{Direction, Orient};
use geo::{LineString, MultiLineString, Polygon};

use crate::geom::Meters;

pub use proj::LocalProjection;

/// Default cleanup tolerance applied to the inset before corner detection.
pub const DEFAULT_SIMPLIFY_TOLERANCE: Meters = Meters(0.10);

/// The swaths generated for one inset polygon: the outer ring's paths first,
/// then one bundle per hole, in ring order.
#[derive(Clone, Debug)]
pub struct PolygonSwaths {
    pub outer: MultiLineString<f64>,
    pub inners: Vec<MultiLineString<f64>>,
}

impl PolygonSwaths {
    /// Total number of swath paths across the outer ring and all holes.
    pub fn path_count(&self) -> usize {
        self.outer.0.len() + self.inners.iter().map(|mp| mp.0.len()).sum::<usize>()
    }
}

/// Swaths along the inset of a geographic polygon (degrees, x = longitude).
///
/// Projects to a local planar frame, runs the planar pipeline, and projects
/// the swaths back. An inset that collapses to nothing yields an empty
/// vector.
pub fn boundary_swaths(
    poly: &Polygon<f64>,
    offset: Meters,
    tolerance: Meters,
) -> Result<Vec<PolygonSwaths>> {
    let proj = LocalProjection::for_polygon(poly)?;
    let poly_xy = proj.forward(poly)?;
    let planar = boundary_swaths_xy(&poly_xy, offset, tolerance)?;
    planar
        .into_iter()
        .map(|set| {
            Ok(PolygonSwaths {
                outer: proj.inverse_paths(&set.outer)?,
                inners: set
                    .inners
                    .iter()
                    .map(|mp| proj.inverse_paths(mp))
                    .collect::<Result<_>>()?,
            })
        })
        .collect()
}

/// Planar overload of [`boundary_swaths`]: the polygon is already in a
/// metre-unit frame.
pub fn boundary_swaths_xy(
    poly: &Polygon<f64>,
    offset: Meters,
    tolerance: Meters,
) -> Result<Vec<PolygonSwaths>> {
    let inset_mp = inset::inset(poly, offset)?;
    let simp_mp = simplify::simplify(&inset_mp, tolerance)?;
    // The simplifier may hand back a wrong-orientation result.
    let simp_mp = simp_mp.orient(Direction::Default);

    let mut out = Vec::with_capacity(simp_mp.0.len());
    for poly in simp_mp {
        let (exterior, interiors) = poly.into_inner();
        out.push(PolygonSwaths {
            outer: ring_swaths(exterior)?,
            inners: interiors
                .into_iter()
                .map(ring_swaths)
                .collect::<Result<_>>()?,
        });
    }
    Ok(out)
}

/// Corner-partition one ring into its swath paths.
fn ring_swaths(mut ring: LineString<f64>) -> Result<MultiLineString<f64>> {
    let mut corner_list = corners::find_ring_corners(&ring)?;
    corners::adjust_corners(&mut ring, &mut corner_list);
    Ok(extract::extract_swaths(&ring, &corner_list))
}
