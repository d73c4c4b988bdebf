//! Well-Known-Text tabular output.
//!
//! One tab-separated line per boundary part and per swath:
//! `<field> TAB <part name> TAB <wkt>`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use wkt::ToWkt;

use crate::model::{paths_to_geo, FarmDb};

pub fn write_file(db: &FarmDb, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("cannot write {}", path.display()))?;
    let mut w = BufWriter::new(file);

    for field in &db.fields {
        let suffixed = field.parts.len() > 1;
        for (i, part) in field.parts.iter().enumerate() {
            let part_name = if suffixed {
                format!("Boundary F{}", i + 1)
            } else {
                "Boundary".to_string()
            };
            writeln!(
                w,
                "{}\t{}\t{}",
                field.name,
                part_name,
                part.to_geo_lenient().wkt_string()
            )?;
        }
        for swath in &field.swaths {
            writeln!(
                w,
                "{}\t{}\t{}",
                field.name,
                swath.name,
                paths_to_geo(&swath.paths).wkt_string()
            )?;
        }
    }

    w.flush().with_context(|| format!("cannot write {}", path.display()))
}
