//! Zip archive input and output.
//!
//! A task-data archive holds `TASKDATA/TASKDATA.XML`. Anything else is
//! treated as a zipped shapefile set: the members are extracted to a scoped
//! temporary directory and handed to the shapefile reader.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::io::{shp, xml};
use crate::model::FarmDb;

pub(crate) const TASKDATA_ENTRY: &str = "TASKDATA/TASKDATA.XML";

/// Read task data out of a zip archive.
pub fn read_archive(path: &Path) -> Result<FarmDb> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("cannot read zip {}", path.display()))?;

    match archive.by_name(TASKDATA_ENTRY) {
        Ok(mut entry) => {
            let mut text = String::new();
            entry
                .read_to_string(&mut text)
                .with_context(|| format!("{}: cannot extract {TASKDATA_ENTRY}", path.display()))?;
            return xml::read_str(&text)
                .with_context(|| format!("{}:{TASKDATA_ENTRY}", path.display()));
        }
        Err(ZipError::FileNotFound) => {}
        Err(e) => {
            return Err(e).with_context(|| format!("{}: cannot read {TASKDATA_ENTRY}", path.display()))
        }
    }

    read_zipped_shapefile(path, &mut archive)
}

fn read_zipped_shapefile(path: &Path, archive: &mut ZipArchive<File>) -> Result<FarmDb> {
    let entries = archive.len();
    if entries < 3 {
        bail!("{}: zip contains too few entries", path.display());
    }
    if entries > 8 {
        bail!("{}: zip contains too many entries", path.display());
    }

    let mut names: Vec<String> = Vec::with_capacity(entries);
    for i in 0..entries {
        names.push(archive.by_index(i)?.name().to_string());
    }
    let shp_name = names
        .iter()
        .find(|n| Path::new(n).extension().is_some_and(|e| e == "shp"))
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{}: cannot find a .shp entry", path.display()))?;

    let sibling = |ext: &str| -> String {
        Path::new(&shp_name)
            .with_extension(ext)
            .to_string_lossy()
            .into_owned()
    };
    let shx_name = sibling("shx");
    let dbf_name = sibling("dbf");
    if !names.contains(&shx_name) || !names.contains(&dbf_name) {
        bail!("{}: cannot find the .shx and .dbf entries", path.display());
    }

    let tmp = tempfile::tempdir().context("cannot create temporary directory")?;
    let stem = Path::new(&shp_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "shapes".to_string());
    let out_base = tmp.path().join(stem);

    let mut extract = |entry: &str, ext: &str| -> Result<PathBuf> {
        let out_path = out_base.with_extension(ext);
        let mut entry = archive
            .by_name(entry)
            .with_context(|| format!("{}: cannot read entry {entry}", path.display()))?;
        let mut out = File::create(&out_path)
            .with_context(|| format!("cannot create {}", out_path.display()))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("cannot extract to {}", out_path.display()))?;
        Ok(out_path)
    };

    let out_shp = extract(&shp_name, "shp")?;
    extract(&shx_name, "shx")?;
    extract(&dbf_name, "dbf")?;
    for ext in ["prj", "cpg"] {
        let name = sibling(ext);
        if names.contains(&name) {
            extract(&name, ext)?;
        }
    }

    // The temp directory lives until this returns; the model owns no files.
    shp::read_shapefile(&out_shp)
}

/// Write an XML document as the single `TASKDATA/TASKDATA.XML` entry.
pub fn write_archive(path: &Path, document: &[u8]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot write {}", path.display()))?;
    let mut writer = ZipWriter::new(file);
    writer
        .start_file(TASKDATA_ENTRY, SimpleFileOptions::default())
        .with_context(|| format!("{}: cannot start {TASKDATA_ENTRY}", path.display()))?;
    writer
        .write_all(document)
        .with_context(|| format!("{}: cannot write {TASKDATA_ENTRY}", path.display()))?;
    writer
        .finish()
        .with_context(|| format!("{}: cannot finish archive", path.display()))?;
    Ok(())
}
