// Round-trip and output-format tests for the ISO 11783-10 and WKT codecs.

use std::io::Read;

use farmdb::io::{wkt, xml, zip};
use farmdb::{FarmDb, Meters};

const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ISO11783_TaskData VersionMajor="4" VersionMinor="2" ManagementSoftwareManufacturer="Acme" ManagementSoftwareVersion="1.2" DataTransferOrigin="1" ProprietaryRoot="yes">
  <CTR A="CTR1" B="Jones Farms" Phone="555-0100"/>
  <FRM A="FRM1" B="Home Farm" I="CTR1"/>
  <PFD A="PFD1" C="North 40" D="162000" E="CTR1" F="FRM1">
    <PLN A="1">
      <LSG A="1">
        <PNT A="10" C="45.0000" D="0.0000"/>
        <PNT A="10" C="45.0000" D="0.0013"/>
        <PNT A="10" C="45.0009" D="0.0013"/>
        <PNT A="10" C="45.0009" D="0.0000"/>
        <PNT A="10" C="45.0000" D="0.0000"/>
      </LSG>
    </PLN>
    <XYZ A="mystery"/>
  </PFD>
  <VPN A="VPN1" B="0" C="0.001" D="2" E="l"/>
</ISO11783_TaskData>
"#;

#[test]
fn sample_document_parses_into_the_model() {
    let db = xml::read_str(SAMPLE).unwrap();
    assert_eq!(db.version_major, 4);
    assert_eq!(db.version_minor, 2);
    assert_eq!(db.data_transfer_origin, 1);
    assert_eq!(db.sw_vendor, "Acme");
    assert_eq!(db.sw_version, "1.2");
    assert_eq!(db.other_attrs, vec![("ProprietaryRoot".to_string(), "yes".to_string())]);

    assert_eq!(db.customers.len(), 1);
    assert_eq!(db.customers[0].name, "Jones Farms");
    assert_eq!(
        db.customers[0].other_attrs,
        vec![("Phone".to_string(), "555-0100".to_string())]
    );

    assert_eq!(db.farms.len(), 1);
    assert_eq!(db.farms[0].customer, Some(0));

    assert_eq!(db.fields.len(), 1);
    let field = &db.fields[0];
    assert_eq!(field.name, "North 40");
    assert_eq!(field.area, 162_000);
    assert_eq!(field.customer, Some(0));
    assert_eq!(field.farm, Some(0));
    assert_eq!(field.parts.len(), 1);
    assert_eq!(field.parts[0].outer.len(), 5);
    assert!(field.parts[0].inners.is_empty());

    assert_eq!(db.values.len(), 1);
    assert_eq!(db.values[0].scale, 0.001);
}

#[test]
fn document_round_trips_through_write_and_reparse() {
    let db = xml::read_str(SAMPLE).unwrap();
    let out = xml::write_document(&db).unwrap();
    let text = String::from_utf8(out).unwrap();
    let again = xml::read_str(&text).unwrap();

    assert_eq!(again.version_major, db.version_major);
    assert_eq!(again.version_minor, db.version_minor);
    assert_eq!(again.data_transfer_origin, db.data_transfer_origin);
    assert_eq!(again.sw_vendor, db.sw_vendor);
    assert_eq!(again.other_attrs, db.other_attrs);
    assert_eq!(again.customers, db.customers);
    assert_eq!(again.farms, db.farms);
    assert_eq!(again.values, db.values);
    assert_eq!(again.fields.len(), db.fields.len());
    assert_eq!(again.fields[0].parts, db.fields[0].parts);
    assert_eq!(again.fields[0].name, db.fields[0].name);
}

#[test]
fn bad_documents_are_rejected() {
    // Missing version.
    assert!(xml::read_str(r#"<ISO11783_TaskData VersionMinor="0"/>"#).is_err());
    // Wrong root.
    assert!(xml::read_str(r#"<TaskData VersionMajor="3" VersionMinor="0"/>"#).is_err());
    // Bad customer id.
    assert!(xml::read_str(
        r#"<ISO11783_TaskData VersionMajor="3" VersionMinor="0"><CTR A="CUST1" B="x"/></ISO11783_TaskData>"#
    )
    .is_err());
    // Duplicate customer id.
    assert!(xml::read_str(
        r#"<ISO11783_TaskData VersionMajor="3" VersionMinor="0"><CTR A="CTR1" B="x"/><CTR A="CTR1" B="y"/></ISO11783_TaskData>"#
    )
    .is_err());
    // Dangling farm reference.
    assert!(xml::read_str(
        r#"<ISO11783_TaskData VersionMajor="3" VersionMinor="0"><FRM A="FRM1" B="x" I="CTR9"/></ISO11783_TaskData>"#
    )
    .is_err());
    // Ring with too few points.
    assert!(xml::read_str(
        r#"<ISO11783_TaskData VersionMajor="3" VersionMinor="0">
            <PFD A="PFD1" C="f" D="0"><PLN A="1"><LSG A="1">
              <PNT A="10" C="45.0" D="0.0"/>
              <PNT A="10" C="45.1" D="0.1"/>
              <PNT A="10" C="45.0" D="0.0"/>
            </LSG></PLN></PFD></ISO11783_TaskData>"#
    )
    .is_err());
    // Latitude out of range.
    assert!(xml::read_str(
        r#"<ISO11783_TaskData VersionMajor="3" VersionMinor="0">
            <PFD A="PFD1" C="f" D="0"><PLN A="1"><LSG A="1">
              <PNT A="10" C="95.0" D="0.0"/>
              <PNT A="10" C="45.1" D="0.1"/>
              <PNT A="10" C="45.1" D="0.0"/>
              <PNT A="10" C="95.0" D="0.0"/>
            </LSG></PLN></PFD></ISO11783_TaskData>"#
    )
    .is_err());
}

#[test]
fn inset_swaths_round_trip_through_the_guidance_elements() {
    let mut db = xml::read_str(SAMPLE).unwrap();
    db.inset("Inset", Meters::from_feet(12.5)).unwrap();
    assert_eq!(db.fields[0].swaths.len(), 1);
    let paths = db.fields[0].swaths[0].paths.clone();
    assert!(!paths.is_empty());

    let out = xml::write_document(&db).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("<GGP A=\"GGP1\" B=\"Inset\">"));
    assert!(text.contains("GPN"));

    let again = xml::read_str(&text).unwrap();
    assert_eq!(again.fields[0].swaths.len(), 1);
    assert_eq!(again.fields[0].swaths[0].name, "Inset");
    let round = &again.fields[0].swaths[0].paths;
    assert_eq!(round.len(), paths.len());
    for (a, b) in round.iter().zip(&paths) {
        assert_eq!(a.len(), b.len());
        for (p, q) in a.iter().zip(b) {
            assert!((p.lat.get() - q.lat.get()).abs() < 1e-9);
            assert!((p.lon.get() - q.lon.get()).abs() < 1e-9);
        }
    }
}

#[test]
fn wkt_output_lists_boundaries_then_swaths() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("out.wkt");

    let mut db = xml::read_str(SAMPLE).unwrap();
    db.inset("Inset", Meters::from_feet(12.5)).unwrap();
    wkt::write_file(&db, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1 + db.fields[0].swaths.len());

    let boundary: Vec<&str> = lines[0].splitn(3, '\t').collect();
    assert_eq!(boundary[0], "North 40");
    assert_eq!(boundary[1], "Boundary");
    assert!(boundary[2].starts_with("POLYGON"));

    let swath: Vec<&str> = lines[1].splitn(3, '\t').collect();
    assert_eq!(swath[0], "North 40");
    assert_eq!(swath[1], "Inset");
    assert!(swath[2].starts_with("MULTILINESTRING"));
}

#[test]
fn zip_archive_round_trips_the_document() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("TASKDATA.zip");

    let db = xml::read_str(SAMPLE).unwrap();
    let document = xml::write_document(&db).unwrap();
    zip::write_archive(&path, &document).unwrap();

    // The archive holds exactly TASKDATA/TASKDATA.XML.
    let file = std::fs::File::open(&path).unwrap();
    let mut archive = ::zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 1);
    let mut entry = archive.by_name("TASKDATA/TASKDATA.XML").unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    drop(entry);
    assert_eq!(text.as_bytes(), &document[..]);

    let again = FarmDb::read(&path).unwrap();
    assert_eq!(again.customers, db.customers);
    assert_eq!(again.fields[0].parts, db.fields[0].parts);
}
