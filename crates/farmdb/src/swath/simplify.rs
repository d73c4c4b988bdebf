//! Douglas-Peucker simplification with tolerance back-off.

use anyhow::{bail, ensure, Result};
use geo::{LineString, MultiPolygon, Polygon, Simplify};

use crate::geom::Meters;
use crate::swath::validity::{self, ValidityFailure};

/// Tolerances below this are not meaningful for field geometry.
pub const MIN_TOLERANCE: Meters = Meters(0.01);

/// Geometries the back-off simplifier accepts: Douglas-Peucker plus a
/// validity classification for the retry decision.
pub trait SimplifyBackoff: Clone {
    fn simplify_once(&self, tolerance: Meters) -> Self;
    fn classify(&self) -> Result<(), ValidityFailure>;
}

impl SimplifyBackoff for LineString<f64> {
    fn simplify_once(&self, tolerance: Meters) -> Self {
        self.simplify(&tolerance.get())
    }

    fn classify(&self) -> Result<(), ValidityFailure> {
        validity::check_ring(self)
    }
}

impl SimplifyBackoff for Polygon<f64> {
    fn simplify_once(&self, tolerance: Meters) -> Self {
        self.simplify(&tolerance.get())
    }

    fn classify(&self) -> Result<(), ValidityFailure> {
        validity::check_polygon(self)
    }
}

impl SimplifyBackoff for MultiPolygon<f64> {
    fn simplify_once(&self, tolerance: Meters) -> Self {
        self.simplify(&tolerance.get())
    }

    fn classify(&self) -> Result<(), ValidityFailure> {
        validity::check_multi_polygon(self)
    }
}

/// Simplify `geom`, halving the tolerance while the result self-intersects
/// or loses too many points. A wrong-orientation result is returned as-is
/// (the caller re-orients). If no tolerance down to [`MIN_TOLERANCE`]
/// produces a usable result, the original geometry is returned unchanged.
pub fn simplify<G: SimplifyBackoff>(geom: &G, tolerance: Meters) -> Result<G> {
    ensure!(
        tolerance >= MIN_TOLERANCE,
        "simplify tolerance must be at least {MIN_TOLERANCE} (got {tolerance})"
    );
    let mut tolerance = tolerance;
    while tolerance >= MIN_TOLERANCE {
        let simp = geom.simplify_once(tolerance);
        match simp.classify() {
            Ok(()) | Err(ValidityFailure::WrongOrientation) => return Ok(simp),
            Err(ValidityFailure::SelfIntersection) | Err(ValidityFailure::FewPoints) => {}
            Err(failure) => bail!("simplify produced invalid geometry: {failure}"),
        }
        tolerance = tolerance / 2.0;
    }
    Ok(geom.clone())
}
