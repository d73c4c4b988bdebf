//! ISO 11783-10 XML serialization.

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::geom::LatLon;
use crate::model::{FarmDb, LineString, LineStringType, Point, PointType, Polygon, Swath};

use super::read::ROOT;

type XmlWriter = Writer<Vec<u8>>;

fn write_point(w: &mut XmlWriter, point: &Point) -> Result<()> {
    let mut pnt = BytesStart::new("PNT");
    pnt.push_attribute(("A", point.ty.code().to_string().as_str()));
    pnt.push_attribute(("C", point.pos.lat.get().to_string().as_str()));
    pnt.push_attribute(("D", point.pos.lon.get().to_string().as_str()));
    for (k, v) in &point.other_attrs {
        pnt.push_attribute((k.as_str(), v.as_str()));
    }
    w.write_event(Event::Empty(pnt))?;
    Ok(())
}

fn write_ring(w: &mut XmlWriter, ring: &LineString, ty: LineStringType) -> Result<()> {
    let mut lsg = BytesStart::new("LSG");
    lsg.push_attribute(("A", ty.code().to_string().as_str()));
    for (k, v) in &ring.other_attrs {
        lsg.push_attribute((k.as_str(), v.as_str()));
    }
    w.write_event(Event::Start(lsg))?;
    for point in &ring.points {
        write_point(w, point)?;
    }
    w.write_event(Event::End(BytesEnd::new("LSG")))?;
    Ok(())
}

fn write_boundary(w: &mut XmlWriter, poly: &Polygon) -> Result<()> {
    let mut pln = BytesStart::new("PLN");
    pln.push_attribute(("A", poly.ty.code().to_string().as_str()));
    for (k, v) in &poly.other_attrs {
        pln.push_attribute((k.as_str(), v.as_str()));
    }
    w.write_event(Event::Start(pln))?;
    write_ring(w, &poly.outer, LineStringType::Exterior)?;
    for ring in &poly.inners {
        write_ring(w, ring, LineStringType::Interior)?;
    }
    w.write_event(Event::End(BytesEnd::new("PLN")))?;
    Ok(())
}

/// A guidance path: GuideA first, GuidePoints between, GuideB last.
fn write_swath_path(w: &mut XmlWriter, path: &[LatLon]) -> Result<()> {
    let mut lsg = BytesStart::new("LSG");
    lsg.push_attribute(("A", LineStringType::Guidance.code().to_string().as_str()));
    w.write_event(Event::Start(lsg))?;
    for (i, &pos) in path.iter().enumerate() {
        let ty = if i == 0 {
            PointType::GuideA
        } else if i == path.len() - 1 {
            PointType::GuideB
        } else {
            PointType::GuidePoint
        };
        write_point(w, &Point::new(pos, ty))?;
    }
    w.write_event(Event::End(BytesEnd::new("LSG")))?;
    Ok(())
}

fn write_swath(w: &mut XmlWriter, swath: &Swath, id: i32) -> Result<()> {
    let mut ggp = BytesStart::new("GGP");
    ggp.push_attribute(("A", format!("GGP{id}").as_str()));
    let name = if swath.name.is_empty() {
        format!("Swath{id}")
    } else {
        swath.name.clone()
    };
    ggp.push_attribute(("B", name.as_str()));
    w.write_event(Event::Start(ggp))?;

    let mut gpn = BytesStart::new("GPN");
    gpn.push_attribute(("A", format!("GPN{id}").as_str()));
    gpn.push_attribute(("B", name.as_str()));
    gpn.push_attribute(("C", swath.ty.code().to_string().as_str()));
    let direction = swath.direction.unwrap_or(crate::model::SwathDirection::Both);
    gpn.push_attribute(("E", direction.code().to_string().as_str()));
    let extension = swath.extension.unwrap_or(crate::model::SwathExtension::Both);
    gpn.push_attribute(("F", extension.code().to_string().as_str()));
    let heading = swath.heading.unwrap_or_default();
    gpn.push_attribute(("G", heading.get().to_string().as_str()));
    let method = swath.method.unwrap_or(crate::model::SwathMethod::NoGps);
    gpn.push_attribute(("I", method.code().to_string().as_str()));
    for (k, v) in &swath.other_attrs {
        gpn.push_attribute((k.as_str(), v.as_str()));
    }
    w.write_event(Event::Start(gpn))?;
    for path in &swath.paths {
        write_swath_path(w, path)?;
    }
    w.write_event(Event::End(BytesEnd::new("GPN")))?;
    w.write_event(Event::End(BytesEnd::new("GGP")))?;
    Ok(())
}

/// The original tooling's value-preset table, emitted when a document
/// carries no VPN elements of its own.
const DEFAULT_VALUES: [(i32, &str, i32, &str); 9] = [
    (0, "0.001", 2, "l"),
    (0, "0.001", 2, "kg"),
    (0, "0.01", 2, "l/ha"),
    (0, "0.01", 2, "kg/ha"),
    (0, "1", 0, "sds/m^2"),
    (0, "1", 0, "mm"),
    (0, "1", 0, "N/m"),
    (0, "1", 0, "sds"),
    (0, "1", 0, "\u{00b0}"),
];

/// Serialize the whole document (declaration, two-space indent).
pub fn write_document(db: &FarmDb) -> Result<Vec<u8>> {
    if db.version_major < 0 || db.version_minor < 0 {
        bail!("invalid version: {}.{}", db.version_major, db.version_minor);
    }

    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .context("cannot serialize XML declaration")?;

    let mut root = BytesStart::new(ROOT);
    root.push_attribute(("VersionMajor", db.version_major.to_string().as_str()));
    root.push_attribute(("VersionMinor", db.version_minor.to_string().as_str()));
    root.push_attribute(("ManagementSoftwareManufacturer", db.sw_vendor.as_str()));
    root.push_attribute(("ManagementSoftwareVersion", db.sw_version.as_str()));
    if db.data_transfer_origin != -1 {
        root.push_attribute(("DataTransferOrigin", db.data_transfer_origin.to_string().as_str()));
    }
    for (k, v) in &db.other_attrs {
        root.push_attribute((k.as_str(), v.as_str()));
    }
    w.write_event(Event::Start(root))?;

    for (i, customer) in db.customers.iter().enumerate() {
        let mut ctr = BytesStart::new("CTR");
        ctr.push_attribute(("A", format!("CTR{}", i + 1).as_str()));
        ctr.push_attribute(("B", customer.name.as_str()));
        for (k, v) in &customer.other_attrs {
            ctr.push_attribute((k.as_str(), v.as_str()));
        }
        w.write_event(Event::Empty(ctr))?;
    }

    for (i, farm) in db.farms.iter().enumerate() {
        let mut frm = BytesStart::new("FRM");
        frm.push_attribute(("A", format!("FRM{}", i + 1).as_str()));
        frm.push_attribute(("B", farm.name.as_str()));
        if let Some(customer) = farm.customer {
            frm.push_attribute(("I", format!("CTR{}", customer + 1).as_str()));
        }
        for (k, v) in &farm.other_attrs {
            frm.push_attribute((k.as_str(), v.as_str()));
        }
        w.write_event(Event::Empty(frm))?;
    }

    let mut swath_id = 0;
    for (i, field) in db.fields.iter().enumerate() {
        let mut pfd = BytesStart::new("PFD");
        pfd.push_attribute(("A", format!("PFD{}", i + 1).as_str()));
        if !field.code.is_empty() {
            pfd.push_attribute(("B", field.code.as_str()));
        }
        pfd.push_attribute(("C", field.name.as_str()));
        pfd.push_attribute(("D", field.area.to_string().as_str()));
        if let Some(customer) = field.customer {
            pfd.push_attribute(("E", format!("CTR{}", customer + 1).as_str()));
        }
        if let Some(farm) = field.farm {
            pfd.push_attribute(("F", format!("FRM{}", farm + 1).as_str()));
        }
        for (k, v) in &field.other_attrs {
            pfd.push_attribute((k.as_str(), v.as_str()));
        }
        w.write_event(Event::Start(pfd))?;
        for part in &field.parts {
            write_boundary(&mut w, part)?;
        }
        for swath in &field.swaths {
            swath_id += 1;
            write_swath(&mut w, swath, swath_id)?;
        }
        w.write_event(Event::End(BytesEnd::new("PFD")))?;
    }

    if db.values.is_empty() {
        for (i, &(offset, scale, decimals, units)) in DEFAULT_VALUES.iter().enumerate() {
            let mut vpn = BytesStart::new("VPN");
            vpn.push_attribute(("A", format!("VPN{}", i + 1).as_str()));
            vpn.push_attribute(("B", offset.to_string().as_str()));
            vpn.push_attribute(("C", scale));
            vpn.push_attribute(("D", decimals.to_string().as_str()));
            vpn.push_attribute(("E", units));
            w.write_event(Event::Empty(vpn))?;
        }
    } else {
        for value in &db.values {
            let mut vpn = BytesStart::new("VPN");
            vpn.push_attribute(("A", value.id.as_str()));
            vpn.push_attribute(("B", value.offset.to_string().as_str()));
            vpn.push_attribute(("C", value.scale.to_string().as_str()));
            vpn.push_attribute(("D", value.decimals.to_string().as_str()));
            if !value.units.is_empty() {
                vpn.push_attribute(("E", value.units.as_str()));
            }
            if !value.color.is_empty() {
                vpn.push_attribute(("F", value.color.as_str()));
            }
            for (k, v) in &value.other_attrs {
                vpn.push_attribute((k.as_str(), v.as_str()));
            }
            w.write_event(Event::Empty(vpn))?;
        }
    }

    w.write_event(Event::End(BytesEnd::new(ROOT)))?;
    Ok(w.into_inner())
}
