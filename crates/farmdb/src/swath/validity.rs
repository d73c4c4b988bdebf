//! Classifying geometry validity checks.
//!
//! The simplifier's back-off loop branches on *which* way a geometry is
//! invalid, so failures are reported as a kind rather than a bare error.
//! Structural failures (point counts, closure, intersections, containment)
//! are reported before orientation: a caller that tolerates
//! `WrongOrientation` must still see everything else.

use std::fmt;

use geo::line_intersection::line_intersection;
use geo::{Contains, Intersects, Line, LineString, MultiPolygon, Point, Polygon};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidityFailure {
    FewPoints,
    NotClosed,
    SelfIntersection,
    WrongOrientation,
    HoleOutsideShell,
    OverlappingHoles,
    OverlappingPolygons,
}

impl fmt::Display for ValidityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ValidityFailure::FewPoints => "too few points",
            ValidityFailure::NotClosed => "ring is not closed",
            ValidityFailure::SelfIntersection => "self-intersections",
            ValidityFailure::WrongOrientation => "wrong orientation",
            ValidityFailure::HoleOutsideShell => "interior ring outside the exterior ring",
            ValidityFailure::OverlappingHoles => "interior rings overlap",
            ValidityFailure::OverlappingPolygons => "polygons overlap",
        };
        f.write_str(msg)
    }
}

/// Signed shoelace area of a coordinate list (positive for CCW).
pub(crate) fn signed_area(pts: &[geo::Coord<f64>]) -> f64 {
    let mut a = 0.0;
    for w in pts.windows(2) {
        a += w[0].x * w[1].y - w[1].x * w[0].y;
    }
    a / 2.0
}

/// Check one ring: closed, at least 4 coordinates, no self-intersection.
pub fn check_ring(ring: &LineString<f64>) -> Result<(), ValidityFailure> {
    if ring.0.len() < 4 {
        return Err(ValidityFailure::FewPoints);
    }
    if ring.0.first() != ring.0.last() {
        return Err(ValidityFailure::NotClosed);
    }
    if ring_self_intersects(ring) {
        return Err(ValidityFailure::SelfIntersection);
    }
    Ok(())
}

/// Check a polygon: every ring valid, holes strictly inside the shell and
/// pairwise disjoint, then orientation (exterior CCW, interiors CW).
pub fn check_polygon(poly: &Polygon<f64>) -> Result<(), ValidityFailure> {
    check_ring(poly.exterior())?;
    for hole in poly.interiors() {
        check_ring(hole)?;
    }

    let shell = Polygon::new(poly.exterior().clone(), Vec::new());
    for hole in poly.interiors() {
        if hole.intersects(poly.exterior()) {
            return Err(ValidityFailure::SelfIntersection);
        }
        for &c in hole.0.iter().take(hole.0.len() - 1) {
            if !shell.contains(&Point::from(c)) {
                return Err(ValidityFailure::HoleOutsideShell);
            }
        }
    }
    let holes = poly.interiors();
    for i in 0..holes.len() {
        for j in i + 1..holes.len() {
            if holes[i].intersects(&holes[j]) {
                return Err(ValidityFailure::OverlappingHoles);
            }
            let a = Polygon::new(holes[i].clone(), Vec::new());
            let b = Polygon::new(holes[j].clone(), Vec::new());
            if a.contains(&Point::from(holes[j].0[0])) || b.contains(&Point::from(holes[i].0[0])) {
                return Err(ValidityFailure::OverlappingHoles);
            }
        }
    }

    if signed_area(&poly.exterior().0) <= 0.0 {
        return Err(ValidityFailure::WrongOrientation);
    }
    for hole in poly.interiors() {
        if signed_area(&hole.0) >= 0.0 {
            return Err(ValidityFailure::WrongOrientation);
        }
    }
    Ok(())
}

/// Check a multipolygon: every member valid, member boundaries disjoint.
pub fn check_multi_polygon(mp: &MultiPolygon<f64>) -> Result<(), ValidityFailure> {
    // Structural checks on every member before any orientation verdict.
    let mut orientation = Ok(());
    for poly in &mp.0 {
        match check_polygon(poly) {
            Err(ValidityFailure::WrongOrientation) => orientation = Err(ValidityFailure::WrongOrientation),
            other => other?,
        }
    }
    for i in 0..mp.0.len() {
        for j in i + 1..mp.0.len() {
            if mp.0[i].exterior().intersects(mp.0[j].exterior()) {
                return Err(ValidityFailure::OverlappingPolygons);
            }
        }
    }
    orientation
}

/// Whether any two non-adjacent segments of a closed ring touch.
///
/// Segments are pruned by their x-interval after sorting, so rings that are
/// not pathological stay close to O(n log n).
fn ring_self_intersects(ring: &LineString<f64>) -> bool {
    let n = ring.0.len() - 1; // number of segments
    let seg = |i: usize| Line::new(ring.0[i], ring.0[i + 1]);

    let mut order: Vec<usize> = (0..n).collect();
    let min_x = |i: usize| ring.0[i].x.min(ring.0[i + 1].x);
    let max_x = |i: usize| ring.0[i].x.max(ring.0[i + 1].x);
    order.sort_unstable_by(|&a, &b| min_x(a).total_cmp(&min_x(b)));

    for (k, &i) in order.iter().enumerate() {
        let hi = max_x(i);
        for &j in &order[k + 1..] {
            if min_x(j) > hi {
                break;
            }
            // Ring-adjacent segments share an endpoint by construction.
            let (lo, hj) = if i < j { (i, j) } else { (j, i) };
            if hj == lo + 1 || (lo == 0 && hj == n - 1) {
                continue;
            }
            if line_intersection(seg(i), seg(j)).is_some() {
                return true;
            }
        }
    }
    false
}
