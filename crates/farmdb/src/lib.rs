#![doc = "ISO 11783-10 farm data model and boundary-inset swath generator"]

pub mod geom;
pub mod io;
pub mod model;
pub mod swath;

#[doc(inline)]
pub use geom::{Degrees, LatLon, Meters};

#[doc(inline)]
pub use model::FarmDb;

#[doc(inline)]
pub use swath::{boundary_swaths, boundary_swaths_xy, PolygonSwaths, DEFAULT_SIMPLIFY_TOLERANCE};
