//! ISO 11783-10 XML codec.
//!
//! Parsing goes through a small in-memory element tree so attribute order is
//! preserved for round-tripping; the writer streams straight to the output.

mod read;
mod write;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::model::{Attrs, FarmDb};

pub use read::read_str;
pub use write::write_document;

/// One parsed XML element: name, attributes in document order, child
/// elements in document order.
#[derive(Clone, Debug, Default)]
pub(crate) struct XmlElem {
    pub name: String,
    pub attrs: Attrs,
    pub children: Vec<XmlElem>,
}

impl XmlElem {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a document into its root element.
pub(crate) fn parse_document(text: &str) -> Result<XmlElem> {
    fn elem_from(e: &quick_xml::events::BytesStart<'_>) -> Result<XmlElem> {
        let mut elem = XmlElem {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            ..XmlElem::default()
        };
        for attr in e.attributes() {
            let attr = attr.context("malformed attribute")?;
            elem.attrs.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                attr.unescape_value().context("malformed attribute value")?.into_owned(),
            ));
        }
        Ok(elem)
    }

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElem> = Vec::new();
    let mut root: Option<XmlElem> = None;
    loop {
        match reader.read_event().context("XML parse error")? {
            Event::Start(e) => stack.push(elem_from(&e)?),
            Event::Empty(e) => {
                let elem = elem_from(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(elem),
                    None if root.is_none() => root = Some(elem),
                    None => bail!("XML parse error: multiple root elements"),
                }
            }
            Event::End(_) => {
                let elem = stack.pop().context("XML parse error: unbalanced element")?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(elem),
                    None if root.is_none() => root = Some(elem),
                    None => bail!("XML parse error: multiple root elements"),
                }
            }
            Event::Eof => break,
            // Text, comments, declarations and processing instructions carry
            // nothing the task-data model keeps.
            _ => {}
        }
    }
    if !stack.is_empty() {
        bail!("XML parse error: unterminated element <{}>", stack.last().unwrap().name);
    }
    root.ok_or_else(|| anyhow::anyhow!("XML parse error: no root element"))
}

/// Read a task-data document from a plain `.xml` file.
pub fn read_file(path: &Path) -> Result<FarmDb> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    read_str(&text).with_context(|| format!("{}", path.display()))
}

/// Write a task-data document to a plain `.xml` file.
pub fn write_file(db: &FarmDb, path: &Path) -> Result<()> {
    let document = write_document(db)?;
    fs::write(path, document).with_context(|| format!("cannot write {}", path.display()))
}
