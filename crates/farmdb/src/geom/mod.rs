//! Unit-carrying scalars and the geodetic point type.
//!
//! Lengths and angles are distinct newtypes so they cannot be mixed in
//! arithmetic; planar geometry uses `geo-types` coordinates that are metres
//! by construction of the local projection.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use anyhow::{bail, Result};

const METERS_PER_FOOT: f64 = 0.3048;

/// A length in metres.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Meters(pub f64);

impl Meters {
    pub const ZERO: Self = Meters(0.0);

    #[inline]
    pub const fn new(value: f64) -> Self { Meters(value) }

    /// Convert from international feet.
    #[inline]
    pub fn from_feet(feet: f64) -> Self { Meters(feet * METERS_PER_FOOT) }

    #[inline]
    pub const fn get(self) -> f64 { self.0 }
}

impl Add for Meters {
    type Output = Meters;
    fn add(self, rhs: Meters) -> Meters { Meters(self.0 + rhs.0) }
}

impl Sub for Meters {
    type Output = Meters;
    fn sub(self, rhs: Meters) -> Meters { Meters(self.0 - rhs.0) }
}

impl AddAssign for Meters {
    fn add_assign(&mut self, rhs: Meters) { self.0 += rhs.0; }
}

impl SubAssign for Meters {
    fn sub_assign(&mut self, rhs: Meters) { self.0 -= rhs.0; }
}

impl Neg for Meters {
    type Output = Meters;
    fn neg(self) -> Meters { Meters(-self.0) }
}

impl Mul<f64> for Meters {
    type Output = Meters;
    fn mul(self, rhs: f64) -> Meters { Meters(self.0 * rhs) }
}

impl Div<f64> for Meters {
    type Output = Meters;
    fn div(self, rhs: f64) -> Meters { Meters(self.0 / rhs) }
}

/// Ratio of two lengths is dimensionless.
impl Div<Meters> for Meters {
    type Output = f64;
    fn div(self, rhs: Meters) -> f64 { self.0 / rhs.0 }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} m", self.0)
    }
}

/// An angle in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Degrees(pub f64);

impl Degrees {
    #[inline]
    pub const fn new(value: f64) -> Self { Degrees(value) }

    #[inline]
    pub fn from_radians(radians: f64) -> Self { Degrees(radians.to_degrees()) }

    #[inline]
    pub const fn get(self) -> f64 { self.0 }

    #[inline]
    pub fn to_radians(self) -> f64 { self.0.to_radians() }
}

impl Add for Degrees {
    type Output = Degrees;
    fn add(self, rhs: Degrees) -> Degrees { Degrees(self.0 + rhs.0) }
}

impl Sub for Degrees {
    type Output = Degrees;
    fn sub(self, rhs: Degrees) -> Degrees { Degrees(self.0 - rhs.0) }
}

impl Neg for Degrees {
    type Output = Degrees;
    fn neg(self) -> Degrees { Degrees(-self.0) }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\u{00b0}", self.0)
    }
}

/// A geodetic point on the WGS-84 ellipsoid.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LatLon {
    pub lat: Degrees,
    pub lon: Degrees,
}

impl LatLon {
    #[inline]
    pub const fn new(lat: Degrees, lon: Degrees) -> Self { LatLon { lat, lon } }

    /// Construct with range validation: lat in [-90, 90], lon in (-180, 180].
    pub fn try_new(lat: Degrees, lon: Degrees) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat.0) {
            bail!("latitude out of range: {lat}");
        }
        if lon.0 <= -180.0 || lon.0 > 180.0 {
            bail!("longitude out of range: {lon}");
        }
        Ok(LatLon { lat, lon })
    }

    /// The `geo-types` coordinate for this point (x = longitude, y = latitude).
    #[inline]
    pub fn coord(self) -> geo::Coord<f64> {
        geo::Coord { x: self.lon.0, y: self.lat.0 }
    }

    /// The inverse of [`LatLon::coord`].
    #[inline]
    pub fn from_coord(c: geo::Coord<f64>) -> Self {
        LatLon { lat: Degrees(c.y), lon: Degrees(c.x) }
    }
}
