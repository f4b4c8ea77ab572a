//! Tolerant XLSX reader
//!
//! Reads the first worksheet of a container back into rows. Row elements are
//! taken in document order (their `r` attribute is ignored), cells are placed
//! by the column letters of their reference, and interior gaps are filled
//! with `Empty`. A missing container, worksheet or shared-string part reads
//! as empty rather than failing.

use crate::address::{letters_to_index, MAX_COLUMN};
use crate::codec::{decode, RawCell};
use crate::writer::{SHEET_PATH, WORKBOOK_PATH, WORKBOOK_RELS_PATH};
use crate::XlsxError;
use dayblock_core::{CellValue, Row};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";

/// Read rows from a container on disk; a missing file yields no rows
pub fn read_workbook_file(path: &Path) -> Result<Vec<Row>, XlsxError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no existing workbook");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err.into()),
    };
    read_workbook(file)
}

/// Read rows from an in-memory container
pub fn read_workbook_bytes(bytes: &[u8]) -> Result<Vec<Row>, XlsxError> {
    read_workbook(Cursor::new(bytes))
}

/// Read rows from any seekable container source
pub fn read_workbook<R: Read + Seek>(source: R) -> Result<Vec<Row>, XlsxError> {
    let mut archive = ZipArchive::new(source)?;

    let shared_strings = match read_part(&mut archive, SHARED_STRINGS_PATH)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet_path = first_sheet_path(&mut archive);
    let Some(sheet) = read_part(&mut archive, &sheet_path)? else {
        debug!(part = %sheet_path, "workbook has no worksheet part");
        return Ok(Vec::new());
    };

    let rows = parse_sheet(&sheet, &shared_strings)?;
    debug!(
        rows = rows.len(),
        shared_strings = shared_strings.len(),
        part = %sheet_path,
        "read worksheet"
    );
    Ok(rows)
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, XlsxError> {
    match archive.by_name(name) {
        Ok(mut part) => {
            let mut xml = String::new();
            part.read_to_string(&mut xml)?;
            Ok(Some(xml))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, XlsxError> {
    for attr in element.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Relationship id of the first `<sheet>` in the workbook part
fn first_sheet_rel_id(workbook: &str) -> Result<Option<String>, XlsxError> {
    let mut reader = Reader::from_str(workbook);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                return attribute(&e, b"id");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn relationship_target(rels: &str, rel_id: &str) -> Result<Option<String>, XlsxError> {
    let mut reader = Reader::from_str(rels);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attribute(&e, b"Id")?.as_deref() == Some(rel_id) {
                    return attribute(&e, b"Target");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Locate the first worksheet through the workbook relationships, falling
/// back to the conventional part name when anything along the way is missing
fn first_sheet_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> String {
    let resolve = |archive: &mut ZipArchive<R>| -> Result<Option<String>, XlsxError> {
        let Some(workbook) = read_part(archive, WORKBOOK_PATH)? else {
            return Ok(None);
        };
        let Some(rel_id) = first_sheet_rel_id(&workbook)? else {
            return Ok(None);
        };
        let Some(rels) = read_part(archive, WORKBOOK_RELS_PATH)? else {
            return Ok(None);
        };
        Ok(relationship_target(&rels, &rel_id)?.map(|target| match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("xl/{}", target),
        }))
    };

    match resolve(archive) {
        Ok(Some(path)) => path,
        Ok(None) => SHEET_PATH.to_string(),
        Err(err) => {
            debug!(error = %err, "could not resolve worksheet part; using default");
            SHEET_PATH.to_string()
        }
    }
}

/// Parse the shared-string table into one string per `<si>`
///
/// Rich-text runs inside an entry are concatenated; phonetic hints are skipped.
pub fn parse_shared_strings(xml: &str) -> Result<Vec<String>, XlsxError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = !in_phonetic,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(e) if in_text => {
                if let Some(entry) = current.as_mut() {
                    entry.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) if in_text => {
                if let Some(entry) = current.as_mut() {
                    entry.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

fn raw_cell(element: &BytesStart<'_>) -> Result<RawCell, XlsxError> {
    Ok(RawCell {
        reference: attribute(element, b"r")?.unwrap_or_default(),
        cell_type: attribute(element, b"t")?,
        value: None,
        inline: None,
    })
}

/// Put a decoded cell at the column named by its reference
fn place_cell(row: &mut Row, raw: &RawCell, shared_strings: &[String]) {
    let column = letters_to_index(&raw.reference);
    if column == 0 || column > MAX_COLUMN {
        debug!(reference = %raw.reference, "skipping cell with malformed reference");
        return;
    }
    let idx = column as usize - 1;
    if row.len() <= idx {
        row.resize(idx + 1, CellValue::Empty);
    }
    row[idx] = decode(raw, shared_strings);
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Inline,
}

/// Parse worksheet XML into rows
pub fn parse_sheet(xml: &str, shared_strings: &[String]) -> Result<Vec<Row>, XlsxError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut rows = Vec::new();
    let mut row: Option<Row> = None;
    let mut cell: Option<RawCell> = None;
    let mut target = TextTarget::None;
    let mut in_inline = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => row = Some(Row::new()),
                b"c" => cell = Some(raw_cell(&e)?),
                b"v" => {
                    if let Some(c) = cell.as_mut() {
                        c.value.get_or_insert_with(String::new);
                        target = TextTarget::Value;
                    }
                }
                b"is" => {
                    if let Some(c) = cell.as_mut() {
                        c.inline.get_or_insert_with(String::new);
                        in_inline = true;
                    }
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_inline && !in_phonetic => target = TextTarget::Inline,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => rows.push(Row::new()),
                b"c" => {
                    let raw = raw_cell(&e)?;
                    if let Some(r) = row.as_mut() {
                        place_cell(r, &raw, shared_strings);
                    }
                }
                _ => {}
            },
            Event::Text(e) if target != TextTarget::None => {
                let text = e.unescape()?;
                if let Some(c) = cell.as_mut() {
                    let slot = if target == TextTarget::Value {
                        &mut c.value
                    } else {
                        &mut c.inline
                    };
                    slot.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::CData(e) if target != TextTarget::None => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                if let Some(c) = cell.as_mut() {
                    let slot = if target == TextTarget::Value {
                        &mut c.value
                    } else {
                        &mut c.inline
                    };
                    slot.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => target = TextTarget::None,
                b"is" => in_inline = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let (Some(raw), Some(r)) = (cell.take(), row.as_mut()) {
                        place_cell(r, &raw, shared_strings);
                    }
                }
                b"row" => rows.push(row.take().unwrap_or_default()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rows)
}
