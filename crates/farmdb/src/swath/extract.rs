//! Partition a ring into open swath paths between consecutive corners.

use geo::{LineString, MultiLineString};

/// Split a closed ring into one open path per corner pair.
///
/// Each path runs from one corner to the next, inclusive, so adjacent swaths
/// share their corner vertex; the final path runs from the last corner
/// through the closing vertex. Together the paths cover every ring edge
/// exactly once, and `swaths.len() == corners.len()`.
///
/// `corners` must satisfy the corner-adjustment postconditions; a violation
/// here is a bug in the caller.
pub fn extract_swaths(ring: &LineString<f64>, corners: &[usize]) -> MultiLineString<f64> {
    assert!(corners.len() >= 2);
    assert_eq!(corners[0], 0);
    assert_eq!(ring.0.first(), ring.0.last());
    assert!(*corners.last().unwrap() < ring.0.len() - 1);

    let mut swaths = Vec::with_capacity(corners.len());
    for pair in corners.windows(2) {
        swaths.push(LineString::new(ring.0[pair[0]..=pair[1]].to_vec()));
    }
    let last = *corners.last().unwrap();
    swaths.push(LineString::new(ring.0[last..].to_vec()));
    MultiLineString::new(swaths)
}
