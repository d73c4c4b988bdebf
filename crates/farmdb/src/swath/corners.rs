//! Convex-corner detection for inset rings.
//!
//! Corners are found on an aggressively simplified copy of the ring and then
//! mapped back to the nearest vertices of the original, so that short jitter
//! along an edge never reads as a corner while the reported indices stay
//! addressable in the full ring.

use anyhow::Result;
use geo::{Coord, LineString};

use crate::geom::Meters;
use crate::swath::simplify::simplify;
use crate::swath::validity::signed_area;

/// Douglas-Peucker tolerance used before corner detection.
pub const SIMPLIFY_FOR_CORNERS: Meters = Meters(10.0);

/// Minimum heading change that counts as a corner.
pub const CORNER_ANGLE_DEG: f64 = 45.0;

#[inline]
fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

#[inline]
fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.x + a.y * b.y
}

#[inline]
fn dist2(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let d = b - a;
    d.x * d.x + d.y * d.y
}

/// Indices of the convex corners of a closed ring.
///
/// The turn at vertex `i` is the signed angle between the incoming and
/// outgoing edges; a corner turns by at least 45 degrees in the direction of
/// the ring's own winding (left on a CCW ring, right on a CW ring), i.e.
/// toward the convex side.
pub(crate) fn corners_of_simplified(ring: &LineString<f64>) -> Vec<usize> {
    debug_assert!(ring.0.len() >= 3);
    debug_assert_eq!(ring.0.first(), ring.0.last());

    let threshold = CORNER_ANGLE_DEG.to_radians();
    let winding = if signed_area(&ring.0) >= 0.0 { 1.0 } else { -1.0 };
    let n = ring.0.len() - 1;

    let mut corners = Vec::new();
    let mut curr = ring.0[0] - ring.0[n - 1]; // closing edge
    for i in 0..n {
        let prev = curr;
        curr = ring.0[i + 1] - ring.0[i];
        let turn = cross(prev, curr).atan2(dot(prev, curr));
        if winding * turn >= threshold {
            corners.push(i);
        }
    }
    corners
}

/// Map corner points of the simplified ring to vertex indices of the
/// original ring.
///
/// Scans forward from a moving cursor so that matches stay in ring order and
/// two simplified corners never claim the same original vertex; ties go to
/// the lowest index. The result is sorted and deduplicated.
pub(crate) fn map_corners_to_original(
    orig: &LineString<f64>,
    simp: &LineString<f64>,
    simp_corners: &[usize],
) -> Vec<usize> {
    let mut out = Vec::with_capacity(simp_corners.len());
    if orig.0.is_empty() || simp.0.is_empty() || simp_corners.is_empty() {
        return out;
    }

    let n = orig.0.len() - 1; // unique vertices
    let mut start = 0usize;
    for &si in simp_corners {
        if start >= n {
            break;
        }
        let corner = simp.0[si];
        let mut best_i = start;
        let mut best_d2 = dist2(orig.0[start], corner);
        for i in start + 1..n {
            let d2 = dist2(orig.0[i], corner);
            if d2 < best_d2 {
                best_d2 = d2;
                best_i = i;
            }
        }
        out.push(best_i);
        start = best_i + 1;
    }

    out.sort_unstable();
    out.dedup();
    out
}

/// Find the corners of `ring`: simplify at 10 m, detect, map back.
pub fn find_ring_corners(ring: &LineString<f64>) -> Result<Vec<usize>> {
    let simp = simplify(ring, SIMPLIFY_FOR_CORNERS)?;
    let simp_corners = corners_of_simplified(&simp);
    Ok(map_corners_to_original(ring, &simp, &simp_corners))
}

/// Normalize a ring and its corner list so the ring starts at a corner and
/// carries at least two corners.
///
/// The ring is rotated by the cheaper of two moves: forward so the first
/// corner lands on index 0, or backward so the last corner does (in which
/// case that corner becomes 0 and is dropped from the back). With fewer than
/// two corners, the vertex farthest from `ring[0]` is appended.
///
/// Postconditions (violations are bugs): `corners[0] == 0`, at least two
/// corners, strictly increasing, every index below `ring.len() - 1`.
pub fn adjust_corners(ring: &mut LineString<f64>, corners: &mut Vec<usize>) {
    ring.0.pop(); // drop the closing duplicate while rotating

    let len = ring.0.len();
    if corners.is_empty() {
        corners.push(0);
    }
    if corners[0] != 0 {
        let shift_fwd = corners[0] as isize;
        let shift_back = *corners.last().unwrap() as isize - len as isize;
        if shift_fwd < -shift_back {
            for c in corners.iter_mut() {
                *c -= shift_fwd as usize;
            }
            ring.0.rotate_left(shift_fwd as usize);
        } else {
            let shift = (-shift_back) as usize;
            corners.pop();
            for c in corners.iter_mut() {
                *c += shift;
            }
            corners.insert(0, 0);
            ring.0.rotate_left(len - shift);
        }
    }
    if corners.len() < 2 {
        let origin = ring.0[0];
        let mut far_i = 1;
        let mut far_d2 = dist2(ring.0[1], origin);
        for (i, &c) in ring.0.iter().enumerate().skip(2) {
            let d2 = dist2(c, origin);
            if d2 > far_d2 {
                far_i = i;
                far_d2 = d2;
            }
        }
        corners.push(far_i);
    }

    ring.0.push(ring.0[0]); // close again

    assert_eq!(corners[0], 0);
    assert!(corners.len() >= 2);
    assert!(corners.windows(2).all(|w| w[0] < w[1]));
    assert!(*corners.last().unwrap() < ring.0.len() - 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    fn ccw_square() -> LineString<f64> {
        line_string![
            (x: 0.0, y: 0.0),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 100.0),
            (x: 0.0, y: 100.0),
            (x: 0.0, y: 0.0),
        ]
    }

    fn cw_square() -> LineString<f64> {
        line_string![
            (x: 0.0, y: 0.0),
            (x: 0.0, y: 100.0),
            (x: 100.0, y: 100.0),
            (x: 100.0, y: 0.0),
            (x: 0.0, y: 0.0),
        ]
    }

    #[test]
    fn square_corners_detected_both_windings() {
        assert_eq!(corners_of_simplified(&ccw_square()), vec![0, 1, 2, 3]);
        assert_eq!(corners_of_simplified(&cw_square()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn shallow_bend_is_not_a_corner() {
        // 30 degree bend at index 1, right angles elsewhere.
        let ring = line_string![
            (x: 0.0, y: 0.0),
            (x: 50.0, y: 0.0),
            (x: 93.3, y: 25.0),
            (x: 0.0, y: 120.0),
            (x: 0.0, y: 0.0),
        ];
        let corners = corners_of_simplified(&ring);
        assert!(!corners.contains(&1));
        assert!(corners.contains(&0));
    }

    #[test]
    fn reflex_vertex_is_not_a_corner() {
        // An L-shape traversed CCW: the notch at index 3 turns away from the
        // winding direction.
        let ring = line_string![
            (x: 0.0, y: 0.0),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 50.0),
            (x: 50.0, y: 50.0),
            (x: 50.0, y: 100.0),
            (x: 0.0, y: 100.0),
            (x: 0.0, y: 0.0),
        ];
        let corners = corners_of_simplified(&ring);
        assert_eq!(corners, vec![0, 1, 2, 4, 5]);
    }

    #[test]
    fn mapping_finds_nearest_original_vertices() {
        // Original ring with mid-edge vertices; simplified is the plain square.
        let orig = line_string![
            (x: 0.0, y: 0.0),
            (x: 50.0, y: 0.2),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 50.0),
            (x: 100.0, y: 100.0),
            (x: 50.0, y: 100.0),
            (x: 0.0, y: 100.0),
            (x: 0.0, y: 0.0),
        ];
        let simp = ccw_square();
        let mapped = map_corners_to_original(&orig, &simp, &[0, 1, 2, 3]);
        assert_eq!(mapped, vec![0, 2, 4, 6]);
    }

    #[test]
    fn mapping_never_reuses_a_vertex() {
        // Both simplified corners are nearest to original vertex 1; the
        // cursor forces the second match onward.
        let orig = line_string![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.5, y: 0.1),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
            (x: 0.0, y: 0.0),
        ];
        let simp = line_string![
            (x: 10.0, y: 0.0),
            (x: 10.1, y: 0.0),
            (x: 5.0, y: 12.0),
            (x: 10.0, y: 0.0),
        ];
        let mapped = map_corners_to_original(&orig, &simp, &[0, 1]);
        assert_eq!(mapped, vec![1, 2]);
    }

    #[test]
    fn adjust_rotates_forward_to_first_corner() {
        let mut ring = ccw_square();
        let mut corners = vec![1, 2];
        adjust_corners(&mut ring, &mut corners);
        assert_eq!(corners, vec![0, 1]);
        assert_eq!(ring.0[0], geo::Coord { x: 100.0, y: 0.0 });
        assert_eq!(ring.0.first(), ring.0.last());
        assert_eq!(ring.0.len(), 5);
    }

    #[test]
    fn adjust_prefers_the_shorter_backward_move_on_ties_going_back() {
        // Corners [1, 2, 3] on a square: forward and backward shifts are both
        // one vertex; the backward move wins ties, mapping corner 3 to 0.
        let mut ring = ccw_square();
        let mut corners = vec![1, 2, 3];
        adjust_corners(&mut ring, &mut corners);
        assert_eq!(corners, vec![0, 2, 3]);
        assert_eq!(ring.0[0], geo::Coord { x: 0.0, y: 100.0 });
    }

    #[test]
    fn adjust_rotates_backward_when_cheaper() {
        // Six unique vertices, corners [4, 5]: backward shift of 1 beats a
        // forward shift of 4; corner 5 becomes the new start.
        let mut ring = line_string![
            (x: 0.0, y: 0.0),
            (x: 50.0, y: 0.0),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 100.0),
            (x: 50.0, y: 100.0),
            (x: 0.0, y: 100.0),
            (x: 0.0, y: 0.0),
        ];
        let mut corners = vec![4, 5];
        adjust_corners(&mut ring, &mut corners);
        assert_eq!(corners, vec![0, 5]);
        assert_eq!(ring.0[0], geo::Coord { x: 0.0, y: 100.0 });
    }

    #[test]
    fn adjust_invents_corners_for_a_circle() {
        // 64-gon: no 45 degree turns anywhere.
        let mut coords: Vec<geo::Coord<f64>> = (0..64)
            .map(|i| {
                let a = 2.0 * std::f64::consts::PI * (i as f64) / 64.0;
                geo::Coord { x: 100.0 * a.cos(), y: 100.0 * a.sin() }
            })
            .collect();
        coords.push(coords[0]);
        let mut ring = LineString::new(coords);
        let mut corners = Vec::new();
        adjust_corners(&mut ring, &mut corners);
        assert_eq!(corners[0], 0);
        assert_eq!(corners.len(), 2);
        // Second corner is the antipode.
        assert_eq!(corners[1], 32);
    }

    #[test]
    fn find_corners_sees_through_jitter() {
        // A 100 m square whose edges carry 1 m jitter vertices: the 10 m
        // pre-simplification must hide them.
        let mut coords = Vec::new();
        for (a, b) in [
            ((0.0, 0.0), (100.0, 0.0)),
            ((100.0, 0.0), (100.0, 100.0)),
            ((100.0, 100.0), (0.0, 100.0)),
            ((0.0, 100.0), (0.0, 0.0)),
        ] {
            for k in 0..10 {
                let t = k as f64 / 10.0;
                let x = a.0 + (b.0 - a.0) * t;
                let y = a.1 + (b.1 - a.1) * t;
                let off = if k % 2 == 0 { 0.0 } else { 1.0 };
                let (nx, ny) = ((b.1 - a.1) / 100.0, (a.0 - b.0) / 100.0);
                coords.push(geo::Coord { x: x + nx * off, y: y + ny * off });
            }
        }
        coords.push(coords[0]);
        let ring = LineString::new(coords);

        let corners = find_ring_corners(&ring).unwrap();
        assert_eq!(corners.len(), 4);
        // Each detected corner sits within 2 m of a true square corner.
        for &c in &corners {
            let p = ring.0[c];
            let near = [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]
                .iter()
                .any(|&(x, y)| dist2(p, geo::Coord { x, y }) < 4.0);
            assert!(near, "corner {c} at {p:?} is far from every square corner");
        }
    }
}
