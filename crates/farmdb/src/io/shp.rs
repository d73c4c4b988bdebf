//! Strict ESRI Shapefile importer.
//!
//! The schema is fixed: polygon shapes with a DBF of exactly
//! `fid, CLIENTNAME, FARM_NAME, FIELD_NAME, WITH_HOLES`. Ring points are
//! taken literally — no closure, no reordering — apart from the final
//! orientation pass; part 0 is the outer ring, the rest are holes.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{Reader, Shape};

use crate::geom::{Degrees, LatLon};
use crate::model::{Customer, Farm, FarmDb, Field, LineString, LineStringType, Point, PointType,
                   Polygon, PolygonType};

const DBF_SCHEMA: [&str; 5] = ["fid", "CLIENTNAME", "FARM_NAME", "FIELD_NAME", "WITH_HOLES"];

fn record_err(path: &Path, record: usize, msg: impl std::fmt::Display) -> anyhow::Error {
    anyhow!("{}({}): {msg}", path.display(), record + 1)
}

/// A required, non-empty text field of a DBF record.
fn require_string(path: &Path, record: &Record, index: usize, name: &str) -> Result<String> {
    match record.get(name) {
        Some(FieldValue::Character(Some(s))) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(record_err(path, index, format!("missing or empty DBF field '{name}'"))),
    }
}

fn check_dbf_schema(path: &Path, dbf_path: &Path) -> Result<usize> {
    let mut reader = shapefile::dbase::Reader::from_path(dbf_path)
        .with_context(|| format!("cannot open DBF {}", dbf_path.display()))?;

    let names: Vec<String> = reader.fields().iter().map(|f| f.name().to_string()).collect();
    if names.len() != DBF_SCHEMA.len() {
        bail!(
            "{}: DBF field count mismatch: expected {}, got {}",
            path.display(),
            DBF_SCHEMA.len(),
            names.len()
        );
    }
    for (i, (got, expected)) in names.iter().zip(DBF_SCHEMA).enumerate() {
        if got != expected {
            bail!(
                "{}: DBF schema mismatch at field index {i}: expected '{expected}', got '{got}'",
                path.display()
            );
        }
    }
    Ok(reader.iter_records().count())
}

/// Ring points copied literally, `(lon, lat)` in degrees.
fn ring_from_points(
    path: &Path,
    record: usize,
    ty: LineStringType,
    points: &[shapefile::Point],
) -> Result<LineString> {
    let mut ring = LineString {
        ty: Some(ty),
        points: Vec::with_capacity(points.len()),
        other_attrs: Vec::new(),
    };
    for pt in points {
        let pos = LatLon::try_new(Degrees(pt.y), Degrees(pt.x))
            .map_err(|e| record_err(path, record, e))?;
        ring.points.push(Point::new(pos, PointType::Field));
    }
    Ok(ring)
}

/// Read a strict shapefile set into a farm database.
pub fn read_shapefile(path: &Path) -> Result<FarmDb> {
    if path.extension().and_then(|e| e.to_str()) != Some("shp") {
        bail!("{}: expected a .shp file", path.display());
    }
    let shx_path = path.with_extension("shx");
    let dbf_path = path.with_extension("dbf");
    if !path.exists() {
        bail!("{}: file does not exist", path.display());
    }
    if !shx_path.exists() {
        bail!("{}: missing required sibling .shx file", path.display());
    }
    if !dbf_path.exists() {
        bail!("{}: missing required sibling .dbf file", path.display());
    }

    let dbf_records = check_dbf_schema(path, &dbf_path)?;

    let mut reader = Reader::from_path(path)
        .with_context(|| format!("cannot open shapefile {}", path.display()))?;
    let shape_count = reader.shape_count()?;
    if shape_count != dbf_records {
        bail!(
            "{}: record count mismatch: SHP has {shape_count}, DBF has {dbf_records}",
            path.display()
        );
    }

    let mut db = FarmDb::default();
    let mut customers_by_name: HashMap<String, usize> = HashMap::new();
    let mut farms_by_key: HashMap<(String, String), usize> = HashMap::new();
    let mut fields_by_key: HashMap<(String, String, String), usize> = HashMap::new();

    for (i, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result
            .map_err(|e| record_err(path, i, format!("error reading shape and record: {e}")))?;

        let client_name = require_string(path, &record, i, "CLIENTNAME")?;
        let farm_name = require_string(path, &record, i, "FARM_NAME")?;
        let field_name = require_string(path, &record, i, "FIELD_NAME")?;

        let customer = *customers_by_name.entry(client_name.clone()).or_insert_with(|| {
            db.customers.push(Customer { name: client_name.clone(), other_attrs: Vec::new() });
            db.customers.len() - 1
        });

        let farm_key = (client_name.clone(), farm_name.clone());
        let farm = *farms_by_key.entry(farm_key).or_insert_with(|| {
            db.farms.push(Farm {
                name: farm_name.clone(),
                customer: Some(customer),
                other_attrs: Vec::new(),
            });
            db.farms.len() - 1
        });
        if db.farms[farm].customer != Some(customer) {
            return Err(record_err(path, i, "farm/customer mismatch for this record"));
        }

        let field_key = (client_name.clone(), farm_name.clone(), field_name.clone());
        let field = *fields_by_key.entry(field_key).or_insert_with(|| {
            db.fields.push(Field {
                name: field_name.clone(),
                customer: Some(customer),
                farm: Some(farm),
                ..Field::default()
            });
            db.fields.len() - 1
        });
        if db.fields[field].farm != Some(farm) {
            return Err(record_err(path, i, "field/farm mismatch for this record"));
        }
        if db.fields[field].customer != Some(customer) {
            return Err(record_err(path, i, "field/customer mismatch for this record"));
        }

        let polygon = match shape {
            Shape::Polygon(polygon) => polygon,
            other => {
                return Err(record_err(
                    path,
                    i,
                    format!("unsupported shape type: {} (only polygons are allowed)", other.shapetype()),
                ))
            }
        };
        let rings = polygon.rings();
        if rings.is_empty() {
            return Err(record_err(path, i, "polygon has no rings"));
        }

        let mut part = Polygon {
            ty: PolygonType::Boundary,
            outer: ring_from_points(path, i, LineStringType::Exterior, rings[0].points())?,
            inners: Vec::with_capacity(rings.len() - 1),
            other_attrs: Vec::new(),
        };
        for ring in &rings[1..] {
            part.inners
                .push(ring_from_points(path, i, LineStringType::Interior, ring.points())?);
        }
        part.correct();
        db.fields[field].parts.push(part);
    }

    Ok(db)
}
