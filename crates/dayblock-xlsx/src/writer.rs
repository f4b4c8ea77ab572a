//! Deterministic XLSX writer
//!
//! Produces the smallest package a spreadsheet application will open:
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! xl/workbook.xml
//! xl/_rels/workbook.xml.rels
//! xl/worksheets/sheet1.xml
//! xl/styles.xml
//! ```
//!
//! All text is written as inline strings, so there is no shared-string part.
//! Entries are always written in the order above with a fixed timestamp, which
//! makes the output a pure function of the rows.

use crate::address::cell_ref;
use crate::codec::encode;
use crate::XlsxError;
use dayblock_core::{CellValue, Row};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Sheet name used when none is configured
pub const DEFAULT_SHEET_NAME: &str = "Results";

pub(crate) const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";
pub(crate) const ROOT_RELS_PATH: &str = "_rels/.rels";
pub(crate) const WORKBOOK_PATH: &str = "xl/workbook.xml";
pub(crate) const WORKBOOK_RELS_PATH: &str = "xl/_rels/workbook.xml.rels";
pub(crate) const SHEET_PATH: &str = "xl/worksheets/sheet1.xml";
pub(crate) const STYLES_PATH: &str = "xl/styles.xml";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
  <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
</Types>
"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>
"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>
"#;

// One default font, the two mandatory fills, one empty border, one cell format
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="1">
    <font>
      <sz val="11"/>
      <color theme="1"/>
      <name val="Calibri"/>
      <family val="2"/>
      <scheme val="minor"/>
    </font>
  </fonts>
  <fills count="2">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
  </fills>
  <borders count="1">
    <border><left/><right/><top/><bottom/><diagonal/></border>
  </borders>
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>
  <cellXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
  </cellXfs>
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
</styleSheet>
"#;

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="{}" sheetId="1" r:id="rId1"/>
  </sheets>
</workbook>
"#,
        escape(sheet_name)
    )
}

fn push_row(xml: &mut String, row_number: u32, cells: &[CellValue]) {
    let populated: Vec<String> = cells
        .iter()
        .enumerate()
        .filter(|(_, value)| !value.is_empty())
        .map(|(idx, value)| encode(value, row_number, idx as u32 + 1))
        .collect();

    if populated.is_empty() {
        xml.push_str(&format!("    <row r=\"{}\"/>\n", row_number));
        return;
    }
    xml.push_str(&format!("    <row r=\"{}\">\n", row_number));
    for cell in populated {
        xml.push_str("      ");
        xml.push_str(&cell);
        xml.push('\n');
    }
    xml.push_str("    </row>\n");
}

/// Worksheet part for `header` (row 1) followed by `rows` (row 2 onward)
///
/// Empty cells are skipped entirely; a row with no populated cells is
/// written as an empty `<row/>` so that separators keep their position.
pub fn sheet_xml(header: &[String], rows: &[Row]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\n",
    );

    let width = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0) as u32;
    let height = rows.len() as u32 + 1;
    if width > 0 {
        xml.push_str(&format!(
            "  <dimension ref=\"A1:{}\"/>\n",
            cell_ref(height, width)
        ));
    }

    xml.push_str("  <sheetData>\n");
    let header_cells: Row = header.iter().map(|h| CellValue::text(h.as_str())).collect();
    push_row(&mut xml, 1, &header_cells);
    for (idx, row) in rows.iter().enumerate() {
        push_row(&mut xml, idx as u32 + 2, row);
    }
    xml.push_str("  </sheetData>\n</worksheet>\n");
    xml
}

/// Build the complete container in memory
///
/// Never fails on row shape; errors come only from the ZIP encoder.
pub fn write_workbook(
    header: &[String],
    rows: &[Row],
    sheet_name: &str,
) -> Result<Vec<u8>, XlsxError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let parts: [(&str, String); 6] = [
        (CONTENT_TYPES_PATH, CONTENT_TYPES_XML.to_string()),
        (ROOT_RELS_PATH, ROOT_RELS_XML.to_string()),
        (WORKBOOK_PATH, workbook_xml(sheet_name)),
        (WORKBOOK_RELS_PATH, WORKBOOK_RELS_XML.to_string()),
        (SHEET_PATH, sheet_xml(header, rows)),
        (STYLES_PATH, STYLES_XML.to_string()),
    ];

    for (path, body) in &parts {
        zip.start_file(*path, options)?;
        zip.write_all(body.as_bytes())?;
    }

    let bytes = zip.finish()?.into_inner();
    debug!(
        rows = rows.len() + 1,
        bytes = bytes.len(),
        "built workbook container"
    );
    Ok(bytes)
}
