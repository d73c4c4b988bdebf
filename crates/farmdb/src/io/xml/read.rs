//! ISO 11783-10 XML parsing.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

use crate::geom::{Degrees, LatLon};
use crate::model::{
    Attrs, Customer, Farm, FarmDb, Field, LineString, LineStringType, Point, PointType, Polygon,
    PolygonType, Swath, SwathDirection, SwathExtension, SwathMethod, SwathType, Value,
};

use super::{parse_document, XmlElem};

pub(crate) const ROOT: &str = "ISO11783_TaskData";

fn missing_attr(elem: &XmlElem, key: &str) -> anyhow::Error {
    anyhow!("attribute \"{key}\" is missing on <{}>", elem.name)
}

fn invalid_attr(elem: &XmlElem, key: &str, value: &str) -> anyhow::Error {
    anyhow!("invalid attribute \"{key}\" = {value} on <{}>", elem.name)
}

fn require_attr<'a>(elem: &'a XmlElem, key: &str) -> Result<&'a str> {
    match elem.attr(key) {
        Some(v) if !v.is_empty() => Ok(v),
        Some(v) => Err(invalid_attr(elem, key, v)),
        None => Err(missing_attr(elem, key)),
    }
}

fn require_parsed<T: FromStr>(elem: &XmlElem, key: &str) -> Result<T> {
    let raw = require_attr(elem, key)?;
    raw.parse().map_err(|_| invalid_attr(elem, key, raw))
}

fn parse_code<T>(elem: &XmlElem, key: &str, from_code: fn(i32) -> Option<T>) -> Result<T> {
    let raw = require_attr(elem, key)?;
    raw.parse::<i32>()
        .ok()
        .and_then(from_code)
        .ok_or_else(|| invalid_attr(elem, key, raw))
}

/// Attributes not in `known`, in document order.
fn other_attrs(elem: &XmlElem, known: &[&str]) -> Attrs {
    elem.attrs
        .iter()
        .filter(|(k, _)| !known.contains(&k.as_str()))
        .cloned()
        .collect()
}

/// Numeric part of an id like `CTR12` (the original also tolerated `CTR-12`).
fn parse_id(prefix: &str, raw: &str) -> Option<i32> {
    let digits = raw.strip_prefix(prefix)?;
    let digits = digits.strip_prefix('-').unwrap_or(digits);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn find_index(ids: &[i32], id: i32) -> Option<usize> {
    ids.iter().position(|&known| known == id)
}

fn parse_point(elem: &XmlElem, expected: Option<&[PointType]>) -> Result<Point> {
    let ty = parse_code(elem, "A", PointType::from_code)?;
    let lat = Degrees(require_parsed::<f64>(elem, "C")?);
    let lon = Degrees(require_parsed::<f64>(elem, "D")?);
    let pos = LatLon::try_new(lat, lon).map_err(|e| anyhow!("<PNT>: {e}"))?;
    if let Some(allowed) = expected {
        if !allowed.contains(&ty) {
            bail!("<PNT>: unexpected point type: {}", ty.name());
        }
    }
    Ok(Point {
        ty,
        pos,
        other_attrs: other_attrs(elem, &["A", "C", "D"]),
    })
}

fn parse_ring(elem: &XmlElem, expected_pt: PointType) -> Result<LineString> {
    let ty = parse_code(elem, "A", LineStringType::from_code)?;
    let mut ring = LineString {
        ty: Some(ty),
        points: Vec::new(),
        other_attrs: other_attrs(elem, &["A"]),
    };
    for child in &elem.children {
        if child.name == "PNT" {
            ring.points.push(parse_point(child, Some(&[expected_pt]))?);
        } else {
            eprintln!("LineString: element ignored: {}", child.name);
        }
    }
    Ok(ring)
}

fn parse_boundary(elem: &XmlElem) -> Result<Polygon> {
    let ty = parse_code(elem, "A", PolygonType::from_code)?;
    if ty != PolygonType::Boundary {
        bail!("<PLN>: unexpected polygon type: {}", ty.name());
    }
    let mut outer: Option<LineString> = None;
    let mut inners = Vec::new();
    for child in &elem.children {
        if child.name != "LSG" {
            eprintln!("Polygon: element ignored: {}", child.name);
            continue;
        }
        let ring = parse_ring(child, PointType::Field)?;
        match ring.ty {
            Some(LineStringType::Exterior) => {
                if outer.is_some() {
                    bail!("<PLN>: multiple exterior rings");
                }
                outer = Some(ring);
            }
            Some(LineStringType::Interior) => inners.push(ring),
            Some(other) => bail!("<PLN>: unexpected LineString type: {}", other.name()),
            None => unreachable!("parse_ring always sets the type"),
        }
    }
    let outer = outer.ok_or_else(|| anyhow!("<PLN>: missing exterior ring"))?;
    if outer.len() < 4 {
        bail!("<PLN>: exterior ring too small");
    }
    for ring in &inners {
        if ring.len() < 4 {
            bail!("<PLN>: interior ring too small");
        }
    }
    Ok(Polygon {
        ty,
        outer,
        inners,
        other_attrs: other_attrs(elem, &["A"]),
    })
}

/// One guidance path: GuideA first, GuidePoints between, GuideB last.
fn parse_swath_path(elem: &XmlElem) -> Result<Vec<LatLon>> {
    let ty = parse_code(elem, "A", LineStringType::from_code)?;
    if ty != LineStringType::Guidance {
        bail!("<LSG>: guidance line expected, got {}", ty.name());
    }
    let mut path = Vec::new();
    let mut first = true;
    let mut closed = false;
    for child in &elem.children {
        if child.name != "PNT" {
            eprintln!("Swath path: element ignored: {}", child.name);
            continue;
        }
        let point = parse_point(child, None)?;
        let bad = match point.ty {
            PointType::GuideA => !first || closed,
            PointType::GuidePoint => first || closed,
            PointType::GuideB => {
                let bad = first || closed;
                closed = true;
                bad
            }
            _ => true,
        };
        if bad {
            bail!("<LSG>: unexpected point type in guidance line: {}", point.ty.name());
        }
        first = false;
        path.push(point.pos);
    }
    Ok(path)
}

/// A GGP guide group: one GPN pattern holding the swath's guidance paths.
fn parse_guide(elem: &XmlElem) -> Result<Swath> {
    let id_raw = require_attr(elem, "A")?;
    let id = parse_id("GGP", id_raw).ok_or_else(|| anyhow!("<GGP>: invalid guide id: {id_raw}"))?;
    let name = require_attr(elem, "B")?.to_string();
    for (k, _) in other_attrs(elem, &["A", "B"]) {
        eprintln!("Guide: attribute ignored: {k}");
    }

    let mut swath: Option<Swath> = None;
    for child in &elem.children {
        if child.name != "GPN" {
            eprintln!("Guide: element ignored: {}", child.name);
            continue;
        }
        if swath.is_some() {
            bail!("<GGP>: more than one guidance pattern");
        }
        let gpn_id_raw = require_attr(child, "A")?;
        let gpn_id = parse_id("GPN", gpn_id_raw)
            .ok_or_else(|| anyhow!("<GPN>: invalid pattern id: {gpn_id_raw}"))?;
        if gpn_id != id {
            bail!("<GPN>: pattern id mismatch: {id_raw} != {gpn_id_raw}");
        }
        if let Some(name2) = child.attr("B") {
            if name2 != name {
                eprintln!("Guide: name mismatch ignored: {name} != {name2}");
            }
        }
        let mut parsed = Swath {
            name: name.clone(),
            ty: parse_code(child, "C", SwathType::from_code)?,
            direction: None,
            extension: None,
            heading: None,
            method: None,
            other_attrs: Vec::new(),
            paths: Vec::new(),
        };
        for (k, v) in &child.attrs {
            match k.as_str() {
                "A" | "B" | "C" => {}
                "E" => {
                    parsed.direction = Some(
                        v.parse::<i32>()
                            .ok()
                            .and_then(SwathDirection::from_code)
                            .ok_or_else(|| invalid_attr(child, "E", v))?,
                    )
                }
                "F" => {
                    parsed.extension = Some(
                        v.parse::<i32>()
                            .ok()
                            .and_then(SwathExtension::from_code)
                            .ok_or_else(|| invalid_attr(child, "F", v))?,
                    )
                }
                "G" => {
                    parsed.heading =
                        Some(Degrees(v.parse().map_err(|_| invalid_attr(child, "G", v))?))
                }
                "I" => {
                    parsed.method = Some(
                        v.parse::<i32>()
                            .ok()
                            .and_then(SwathMethod::from_code)
                            .ok_or_else(|| invalid_attr(child, "I", v))?,
                    )
                }
                _ => parsed.other_attrs.push((k.clone(), v.clone())),
            }
        }
        for path_elem in &child.children {
            if path_elem.name == "LSG" {
                parsed.paths.push(parse_swath_path(path_elem)?);
            } else {
                eprintln!("Guide: pattern element ignored: {}", path_elem.name);
            }
        }
        if parsed.paths.is_empty() {
            bail!("<GPN>: missing guidance path");
        }
        swath = Some(parsed);
    }
    swath.ok_or_else(|| anyhow!("<GGP>: missing guidance pattern"))
}

fn parse_value(elem: &XmlElem) -> Result<Value> {
    Ok(Value {
        id: require_attr(elem, "A")?.to_string(),
        offset: require_parsed(elem, "B")?,
        scale: require_parsed(elem, "C")?,
        decimals: require_parsed(elem, "D")?,
        units: elem.attr("E").unwrap_or_default().to_string(),
        color: elem.attr("F").unwrap_or_default().to_string(),
        other_attrs: other_attrs(elem, &["A", "B", "C", "D", "E", "F"]),
    })
}

/// Parse a whole task-data document.
pub fn read_str(text: &str) -> Result<FarmDb> {
    let root = parse_document(text)?;
    if root.name != ROOT {
        bail!("missing root <{ROOT}>");
    }

    let mut db = FarmDb {
        version_major: require_parsed(&root, "VersionMajor")?,
        version_minor: require_parsed(&root, "VersionMinor")?,
        ..FarmDb::default()
    };

    for (k, v) in &root.attrs {
        match k.as_str() {
            "VersionMajor" | "VersionMinor" => {}
            "DataTransferOrigin" => {
                db.data_transfer_origin = v.parse().map_err(|_| invalid_attr(&root, k, v))?
            }
            "ManagementSoftwareManufacturer" => db.sw_vendor = v.clone(),
            "ManagementSoftwareVersion" => db.sw_version = v.clone(),
            _ => db.other_attrs.push((k.clone(), v.clone())),
        }
    }
    if db.version_major < 0 || db.version_minor < 0 {
        bail!("missing VersionMajor/VersionMinor");
    }

    let mut customer_ids: Vec<i32> = Vec::new();
    let mut farm_ids: Vec<i32> = Vec::new();
    let mut field_ids: Vec<i32> = Vec::new();

    for child in &root.children {
        match child.name.as_str() {
            "CTR" => {
                let id_raw = require_attr(child, "A")?;
                let id = parse_id("CTR", id_raw)
                    .ok_or_else(|| anyhow!("invalid customer id: {id_raw}"))?;
                if customer_ids.contains(&id) {
                    bail!("duplicate customer: {id_raw}");
                }
                customer_ids.push(id);
                db.customers.push(Customer {
                    name: require_attr(child, "B")?.to_string(),
                    other_attrs: other_attrs(child, &["A", "B"]),
                });
            }
            "FRM" => {
                let id_raw = require_attr(child, "A")?;
                let id =
                    parse_id("FRM", id_raw).ok_or_else(|| anyhow!("invalid farm id: {id_raw}"))?;
                if farm_ids.contains(&id) {
                    bail!("duplicate farm: {id_raw}");
                }
                let mut farm = Farm {
                    name: require_attr(child, "B")?.to_string(),
                    customer: None,
                    other_attrs: Vec::new(),
                };
                for (k, v) in &child.attrs {
                    match k.as_str() {
                        "A" | "B" => {}
                        "I" => {
                            let ctr = parse_id("CTR", v)
                                .and_then(|ctr_id| find_index(&customer_ids, ctr_id))
                                .ok_or_else(|| anyhow!("farm {id_raw}: invalid customer id: {v}"))?;
                            farm.customer = Some(ctr);
                        }
                        _ => farm.other_attrs.push((k.clone(), v.clone())),
                    }
                }
                farm_ids.push(id);
                db.farms.push(farm);
            }
            "PFD" => {
                let id_raw = require_attr(child, "A")?;
                let id = parse_id("PFD", id_raw)
                    .ok_or_else(|| anyhow!("invalid field id: {id_raw}"))?;
                if field_ids.contains(&id) {
                    bail!("duplicate field: {id_raw}");
                }
                let mut field = Field {
                    name: require_attr(child, "C")?.to_string(),
                    area: require_parsed(child, "D")?,
                    ..Field::default()
                };
                for (k, v) in &child.attrs {
                    match k.as_str() {
                        "A" | "C" | "D" => {}
                        "B" => field.code = v.clone(),
                        "E" => {
                            let ctr = parse_id("CTR", v)
                                .and_then(|ctr_id| find_index(&customer_ids, ctr_id))
                                .ok_or_else(|| {
                                    anyhow!("field {id_raw}: invalid customer id: {v}")
                                })?;
                            field.customer = Some(ctr);
                        }
                        "F" => {
                            let frm = parse_id("FRM", v)
                                .and_then(|frm_id| find_index(&farm_ids, frm_id))
                                .ok_or_else(|| anyhow!("field {id_raw}: invalid farm id: {v}"))?;
                            field.farm = Some(frm);
                        }
                        _ => field.other_attrs.push((k.clone(), v.clone())),
                    }
                }
                if let Some(farm) = field.farm {
                    if db.farms[farm].customer != field.customer {
                        bail!("field {id_raw}: field/farm customer mismatch");
                    }
                }
                for elem in &child.children {
                    match elem.name.as_str() {
                        "PLN" => field
                            .parts
                            .push(parse_boundary(elem).with_context(|| format!("field {id_raw}"))?),
                        "GGP" => field
                            .swaths
                            .push(parse_guide(elem).with_context(|| format!("field {id_raw}"))?),
                        other => eprintln!("Field: element ignored: {other}"),
                    }
                }
                field.sort_parts_by_area();
                field_ids.push(id);
                db.fields.push(field);
            }
            "VPN" => db.values.push(parse_value(child)?),
            other => eprintln!("Root: element ignored: {other}"),
        }
    }

    Ok(db)
}
