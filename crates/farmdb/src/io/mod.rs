//! Codecs: ISO 11783-10 XML, ESRI Shapefile, zip archives, WKT.

pub mod shp;
pub mod wkt;
pub mod xml;
pub mod zip;

use std::path::Path;

use anyhow::{bail, Result};

use crate::model::FarmDb;

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

impl FarmDb {
    /// Read task data from `path`, dispatching on the extension:
    /// `.xml`/`.XML` (ISO 11783-10), `.shp` (strict shapefile set), or
    /// `.zip` (archived task data or shapefile set).
    pub fn read(path: &Path) -> Result<FarmDb> {
        match extension(path) {
            "xml" | "XML" => xml::read_file(path),
            "shp" => shp::read_shapefile(path),
            "zip" => zip::read_archive(path),
            other => bail!(
                "{}: unsupported input extension \"{other}\" (expected .xml, .shp, or .zip)",
                path.display()
            ),
        }
    }

    /// Write task data to `path`: `.wkt`/`.WKT` tabular output, `.xml`/`.XML`
    /// plain XML, or `.zip` holding `TASKDATA/TASKDATA.XML`.
    pub fn write(&self, path: &Path) -> Result<()> {
        match extension(path) {
            "wkt" | "WKT" => wkt::write_file(self, path),
            "xml" | "XML" => xml::write_file(self, path),
            "zip" => {
                let document = xml::write_document(self)?;
                zip::write_archive(path, &document)
            }
            other => bail!(
                "{}: unsupported output extension \"{other}\" (expected .xml, .wkt, or .zip)",
                path.display()
            ),
        }
    }
}
