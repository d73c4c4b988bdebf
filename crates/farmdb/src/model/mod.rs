//! The farm relational model: customers, farms, fields and their geometry.
//!
//! `FarmDb` owns everything; farms and fields refer back to their owners by
//! index into the database's vectors. Codecs build the model, the inset
//! operation replaces each field's swaths, codecs serialize it back out.

mod convert;

pub use convert::{paths_from_geo, paths_to_geo};

use anyhow::{Context, Result};
use geo::GeodesicArea;

use crate::geom::{Degrees, LatLon, Meters};
use crate::swath::{boundary_swaths, DEFAULT_SIMPLIFY_TOLERANCE};

/// Attribute pass-through, in document order.
pub type Attrs = Vec<(String, String)>;

/// ISO 11783 point types (PNT attribute `A`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointType {
    Flag,
    Other,
    Access,
    Storage,
    Obstacle,
    GuideA,
    GuideB,
    GuideCenter,
    GuidePoint,
    Field,
    Base,
}

impl PointType {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            1 => PointType::Flag,
            2 => PointType::Other,
            3 => PointType::Access,
            4 => PointType::Storage,
            5 => PointType::Obstacle,
            6 => PointType::GuideA,
            7 => PointType::GuideB,
            8 => PointType::GuideCenter,
            9 => PointType::GuidePoint,
            10 => PointType::Field,
            11 => PointType::Base,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        match self {
            PointType::Flag => 1,
            PointType::Other => 2,
            PointType::Access => 3,
            PointType::Storage => 4,
            PointType::Obstacle => 5,
            PointType::GuideA => 6,
            PointType::GuideB => 7,
            PointType::GuideCenter => 8,
            PointType::GuidePoint => 9,
            PointType::Field => 10,
            PointType::Base => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PointType::Flag => "Flag",
            PointType::Other => "Other",
            PointType::Access => "Access",
            PointType::Storage => "Storage",
            PointType::Obstacle => "Obstacle",
            PointType::GuideA => "GuideA",
            PointType::GuideB => "GuideB",
            PointType::GuideCenter => "GuideCenter",
            PointType::GuidePoint => "GuidePoint",
            PointType::Field => "Field",
            PointType::Base => "Base",
        }
    }
}

/// ISO 11783 line-string types (LSG attribute `A`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStringType {
    Exterior,
    Interior,
    TramLine,
    Sampling,
    Guidance,
    Drainage,
    Fence,
    Flag,
    Obstacle,
}

impl LineStringType {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            1 => LineStringType::Exterior,
            2 => LineStringType::Interior,
            3 => LineStringType::TramLine,
            4 => LineStringType::Sampling,
            5 => LineStringType::Guidance,
            6 => LineStringType::Drainage,
            7 => LineStringType::Fence,
            8 => LineStringType::Flag,
            9 => LineStringType::Obstacle,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        match self {
            LineStringType::Exterior => 1,
            LineStringType::Interior => 2,
            LineStringType::TramLine => 3,
            LineStringType::Sampling => 4,
            LineStringType::Guidance => 5,
            LineStringType::Drainage => 6,
            LineStringType::Fence => 7,
            LineStringType::Flag => 8,
            LineStringType::Obstacle => 9,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LineStringType::Exterior => "Exterior",
            LineStringType::Interior => "Interior",
            LineStringType::TramLine => "TramLine",
            LineStringType::Sampling => "Sampling",
            LineStringType::Guidance => "Guidance",
            LineStringType::Drainage => "Drainage",
            LineStringType::Fence => "Fence",
            LineStringType::Flag => "Flag",
            LineStringType::Obstacle => "Obstacle",
        }
    }
}

/// ISO 11783 polygon types (PLN attribute `A`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolygonType {
    Boundary,
    Treatment,
    Water,
    Building,
    Road,
    Obstacle,
    Flag,
    Other,
    Field,
    Headland,
    Buffer,
    Windbreak,
}

impl PolygonType {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            1 => PolygonType::Boundary,
            2 => PolygonType::Treatment,
            3 => PolygonType::Water,
            4 => PolygonType::Building,
            5 => PolygonType::Road,
            6 => PolygonType::Obstacle,
            7 => PolygonType::Flag,
            8 => PolygonType::Other,
            9 => PolygonType::Field,
            10 => PolygonType::Headland,
            11 => PolygonType::Buffer,
            12 => PolygonType::Windbreak,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        match self {
            PolygonType::Boundary => 1,
            PolygonType::Treatment => 2,
            PolygonType::Water => 3,
            PolygonType::Building => 4,
            PolygonType::Road => 5,
            PolygonType::Obstacle => 6,
            PolygonType::Flag => 7,
            PolygonType::Other => 8,
            PolygonType::Field => 9,
            PolygonType::Headland => 10,
            PolygonType::Buffer => 11,
            PolygonType::Windbreak => 12,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PolygonType::Boundary => "Boundary",
            PolygonType::Treatment => "Treatment",
            PolygonType::Water => "Water",
            PolygonType::Building => "Building",
            PolygonType::Road => "Road",
            PolygonType::Obstacle => "Obstacle",
            PolygonType::Flag => "Flag",
            PolygonType::Other => "Other",
            PolygonType::Field => "Field",
            PolygonType::Headland => "Headland",
            PolygonType::Buffer => "Buffer",
            PolygonType::Windbreak => "Windbreak",
        }
    }
}

/// Guidance pattern types (GPN attribute `C`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwathType {
    AB,
    APlus,
    Curve,
    Pivot,
    Spiral,
}

impl SwathType {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            1 => SwathType::AB,
            2 => SwathType::APlus,
            3 => SwathType::Curve,
            4 => SwathType::Pivot,
            5 => SwathType::Spiral,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        match self {
            SwathType::AB => 1,
            SwathType::APlus => 2,
            SwathType::Curve => 3,
            SwathType::Pivot => 4,
            SwathType::Spiral => 5,
        }
    }
}

/// Guidance propagation direction (GPN attribute `E`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwathDirection {
    Both,
    Left,
    Right,
    None,
}

impl SwathDirection {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            1 => SwathDirection::Both,
            2 => SwathDirection::Left,
            3 => SwathDirection::Right,
            4 => SwathDirection::None,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        match self {
            SwathDirection::Both => 1,
            SwathDirection::Left => 2,
            SwathDirection::Right => 3,
            SwathDirection::None => 4,
        }
    }
}

/// Guidance extension (GPN attribute `F`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwathExtension {
    Both,
    First,
    Last,
    None,
}

impl SwathExtension {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            1 => SwathExtension::Both,
            2 => SwathExtension::First,
            3 => SwathExtension::Last,
            4 => SwathExtension::None,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        match self {
            SwathExtension::Both => 1,
            SwathExtension::First => 2,
            SwathExtension::Last => 3,
            SwathExtension::None => 4,
        }
    }
}

/// GNSS fix method (GPN attribute `I`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwathMethod {
    NoGps,
    Gnss,
    Dgnss,
    PreciseGnss,
    RtkInt,
    RtkFloat,
    DeadReckoning,
    Manual,
    Simulation,
    DesktopSoftware,
    Other,
}

impl SwathMethod {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => SwathMethod::NoGps,
            1 => SwathMethod::Gnss,
            2 => SwathMethod::Dgnss,
            3 => SwathMethod::PreciseGnss,
            4 => SwathMethod::RtkInt,
            5 => SwathMethod::RtkFloat,
            6 => SwathMethod::DeadReckoning,
            7 => SwathMethod::Manual,
            8 => SwathMethod::Simulation,
            16 => SwathMethod::DesktopSoftware,
            17 => SwathMethod::Other,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        match self {
            SwathMethod::NoGps => 0,
            SwathMethod::Gnss => 1,
            SwathMethod::Dgnss => 2,
            SwathMethod::PreciseGnss => 3,
            SwathMethod::RtkInt => 4,
            SwathMethod::RtkFloat => 5,
            SwathMethod::DeadReckoning => 6,
            SwathMethod::Manual => 7,
            SwathMethod::Simulation => 8,
            SwathMethod::DesktopSoftware => 16,
            SwathMethod::Other => 17,
        }
    }
}

/// A typed geodetic point (PNT).
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub ty: PointType,
    pub pos: LatLon,
    pub other_attrs: Attrs,
}

impl Point {
    pub fn new(pos: LatLon, ty: PointType) -> Self {
        Point { ty, pos, other_attrs: Vec::new() }
    }
}

/// A typed point sequence (LSG).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct LineString {
    pub ty: Option<LineStringType>,
    pub points: Vec<Point>,
    pub other_attrs: Attrs,
}

impl LineString {
    pub fn from_path(ty: LineStringType, pt_ty: PointType, path: &[LatLon]) -> Self {
        LineString {
            ty: Some(ty),
            points: path.iter().map(|&p| Point::new(p, pt_ty)).collect(),
            other_attrs: Vec::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    #[inline]
    pub fn len(&self) -> usize { self.points.len() }
}

/// A boundary polygon (PLN): one exterior ring plus holes.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub ty: PolygonType,
    pub outer: LineString,
    pub inners: Vec<LineString>,
    pub other_attrs: Attrs,
}

impl Polygon {
    pub fn from_rings(outer: &[LatLon], inners: &[Vec<LatLon>]) -> Self {
        Polygon {
            ty: PolygonType::Boundary,
            outer: LineString::from_path(LineStringType::Exterior, PointType::Field, outer),
            inners: inners
                .iter()
                .map(|r| LineString::from_path(LineStringType::Interior, PointType::Field, r))
                .collect(),
            other_attrs: Vec::new(),
        }
    }
}

/// A guidance swath: one inset ring's open paths under a single name.
#[derive(Clone, Debug, PartialEq)]
pub struct Swath {
    pub name: String,
    pub ty: SwathType,
    pub direction: Option<SwathDirection>,
    pub extension: Option<SwathExtension>,
    pub heading: Option<Degrees>,
    pub method: Option<SwathMethod>,
    pub other_attrs: Attrs,
    pub paths: Vec<Vec<LatLon>>,
}

impl Swath {
    pub fn curve(name: String, paths: Vec<Vec<LatLon>>) -> Self {
        Swath {
            name,
            ty: SwathType::Curve,
            direction: None,
            extension: None,
            heading: None,
            method: None,
            other_attrs: Vec::new(),
            paths,
        }
    }
}

/// CTR element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Customer {
    pub name: String,
    pub other_attrs: Attrs,
}

/// FRM element; `customer` indexes into [`FarmDb::customers`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Farm {
    pub name: String,
    pub customer: Option<usize>,
    pub other_attrs: Attrs,
}

/// PFD element; back-references index into the database vectors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Field {
    pub name: String,
    pub code: String,
    pub area: u32,
    pub customer: Option<usize>,
    pub farm: Option<usize>,
    pub other_attrs: Attrs,
    pub parts: Vec<Polygon>,
    pub swaths: Vec<Swath>,
}

impl Field {
    /// Order boundary parts by descending geodesic area, largest first.
    pub fn sort_parts_by_area(&mut self) {
        let mut keyed: Vec<(f64, Polygon)> = self
            .parts
            .drain(..)
            .map(|p| (p.to_geo_lenient().geodesic_area_unsigned(), p))
            .collect();
        keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        self.parts = keyed.into_iter().map(|(_, p)| p).collect();
    }
}

/// VPN value preset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Value {
    pub id: String,
    pub offset: i32,
    pub scale: f64,
    pub decimals: i32,
    pub units: String,
    pub color: String,
    pub other_attrs: Attrs,
}

/// The ISO 11783-10 task data document.
#[derive(Clone, Debug)]
pub struct FarmDb {
    pub version_major: i32,
    pub version_minor: i32,
    /// -1 means "unset": the attribute is omitted on write.
    pub data_transfer_origin: i32,
    pub sw_vendor: String,
    pub sw_version: String,
    pub other_attrs: Attrs,
    pub customers: Vec<Customer>,
    pub farms: Vec<Farm>,
    pub fields: Vec<Field>,
    pub values: Vec<Value>,
}

impl Default for FarmDb {
    fn default() -> Self {
        FarmDb {
            version_major: 3,
            version_minor: 0,
            data_transfer_origin: -1,
            sw_vendor: String::new(),
            sw_version: String::new(),
            other_attrs: Vec::new(),
            customers: Vec::new(),
            farms: Vec::new(),
            fields: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl FarmDb {
    /// Replace every field's swaths with inset guidance at `offset`.
    ///
    /// Component naming, per field: part `f` (from 1) gets the base name
    /// `name` for the first part and `name F<f>` after that; when one part's
    /// inset splits into several polygons they are suffixed `_<n>`; hole
    /// swaths are `name I<i>` with `i` counting up across the whole field.
    pub fn inset(&mut self, name: &str, offset: Meters) -> Result<()> {
        self.inset_with_tolerance(name, offset, DEFAULT_SIMPLIFY_TOLERANCE)
    }

    pub fn inset_with_tolerance(
        &mut self,
        name: &str,
        offset: Meters,
        tolerance: Meters,
    ) -> Result<()> {
        for field in &mut self.fields {
            let mut swaths = Vec::new();
            let mut hole_index = 0usize;
            for (part_no, part) in field.parts.iter().enumerate() {
                let base = if part_no == 0 {
                    name.to_string()
                } else {
                    format!("{name} F{}", part_no + 1)
                };
                let poly = part
                    .to_geo()
                    .with_context(|| format!("field \"{}\" part {}", field.name, part_no + 1))?;
                let sets = boundary_swaths(&poly, offset, tolerance)
                    .with_context(|| format!("field \"{}\" part {}", field.name, part_no + 1))?;
                let split = sets.len() > 1;
                for (n, set) in sets.into_iter().enumerate() {
                    let outer_name = if split {
                        format!("{base}_{}", n + 1)
                    } else {
                        base.clone()
                    };
                    swaths.push(Swath::curve(outer_name, convert::paths_from_geo(&set.outer)));
                    for inner in &set.inners {
                        hole_index += 1;
                        swaths.push(Swath::curve(
                            format!("{name} I{hole_index}"),
                            convert::paths_from_geo(inner),
                        ));
                    }
                }
            }
            field.swaths = swaths;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Degrees;

    /// Build a geodetic ring from metre offsets around 45N 0E.
    fn ring_at_45n(points: &[(f64, f64)]) -> Vec<LatLon> {
        const M_PER_DEG_LAT: f64 = 111_132.0;
        let m_per_deg_lon: f64 = 111_320.0 * 45.0_f64.to_radians().cos();
        let mut out: Vec<LatLon> = points
            .iter()
            .map(|&(x, y)| LatLon::new(Degrees(45.0 + y / M_PER_DEG_LAT), Degrees(x / m_per_deg_lon)))
            .collect();
        if out.first() != out.last() {
            out.push(out[0]);
        }
        out
    }

    fn square_part(size: f64) -> Polygon {
        Polygon::from_rings(
            &ring_at_45n(&[(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)]),
            &[],
        )
    }

    fn square_part_with_holes(size: f64) -> Polygon {
        Polygon::from_rings(
            &ring_at_45n(&[(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)]),
            &[
                ring_at_45n(&[(20.0, 20.0), (20.0, 40.0), (40.0, 40.0), (40.0, 20.0)]),
                ring_at_45n(&[(60.0, 60.0), (60.0, 80.0), (80.0, 80.0), (80.0, 60.0)]),
            ],
        )
    }

    #[test]
    fn inset_names_follow_the_part_and_hole_rules() {
        let mut db = FarmDb::default();
        db.fields.push(Field {
            name: "North 40".into(),
            parts: vec![square_part_with_holes(200.0), square_part(100.0)],
            ..Field::default()
        });

        db.inset("Inset", Meters(2.0)).unwrap();

        let names: Vec<&str> = db.fields[0].swaths.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Inset", "Inset I1", "Inset I2", "Inset F2"]);
        assert!(db.fields[0].swaths.iter().all(|s| s.ty == SwathType::Curve));
    }

    #[test]
    fn split_part_names_carry_numeric_suffixes() {
        // Two 60 m lobes joined by an 8 m neck that a 5 m inset severs.
        let outer = ring_at_45n(&[
            (0.0, 0.0),
            (60.0, 0.0),
            (60.0, 26.0),
            (100.0, 26.0),
            (100.0, 0.0),
            (160.0, 0.0),
            (160.0, 60.0),
            (100.0, 60.0),
            (100.0, 34.0),
            (60.0, 34.0),
            (60.0, 60.0),
            (0.0, 60.0),
        ]);
        let mut db = FarmDb::default();
        db.fields.push(Field {
            name: "Dumbbell".into(),
            parts: vec![Polygon {
                ty: PolygonType::Boundary,
                outer: LineString::from_path(LineStringType::Exterior, PointType::Field, &outer),
                inners: Vec::new(),
                other_attrs: Vec::new(),
            }],
            ..Field::default()
        });

        db.inset("Inset", Meters(5.0)).unwrap();

        let names: Vec<&str> = db.fields[0].swaths.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Inset_1", "Inset_2"]);
    }

    #[test]
    fn inset_replaces_previous_swaths() {
        let mut db = FarmDb::default();
        db.fields.push(Field {
            name: "West".into(),
            parts: vec![square_part(100.0)],
            swaths: vec![Swath::curve("Old".into(), Vec::new())],
            ..Field::default()
        });

        db.inset("New", Meters(5.0)).unwrap();
        let names: Vec<&str> = db.fields[0].swaths.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["New"]);
        assert!(!db.fields[0].swaths[0].paths.is_empty());
    }

    #[test]
    fn collapsed_part_contributes_no_swaths() {
        let mut db = FarmDb::default();
        db.fields.push(Field {
            name: "Sliver".into(),
            parts: vec![Polygon::from_rings(
                &ring_at_45n(&[(0.0, 0.0), (200.0, 0.0), (200.0, 8.0), (0.0, 8.0)]),
                &[],
            )],
            ..Field::default()
        });

        db.inset("Inset", Meters(5.0)).unwrap();
        assert!(db.fields[0].swaths.is_empty());
    }

    #[test]
    fn sort_parts_by_area_puts_largest_first() {
        let mut field = Field {
            name: "Split".into(),
            parts: vec![square_part(50.0), square_part(200.0), square_part(100.0)],
            ..Field::default()
        };
        field.sort_parts_by_area();
        let first = field.parts[0].outer.len();
        assert_eq!(first, 5);
        // Largest square ends up in front.
        assert_eq!(field.parts[0], square_part(200.0));
        assert_eq!(field.parts[2], square_part(50.0));
    }
}
