//! Cell value ↔ worksheet `<c>` element
//!
//! The writer only ever produces three shapes: an empty `<c r=".."/>`, a
//! numeric `<v>` payload, and an inline string. The decoder also accepts
//! the shared-string, boolean, error and formula-string forms other tools
//! emit.

use crate::address::cell_ref;
use dayblock_core::{format_number, CellValue};
use quick_xml::escape::partial_escape;

/// A `<c>` element as found in a worksheet, before interpretation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawCell {
    /// `r` attribute, e.g. `C12`
    pub reference: String,
    /// `t` attribute, if present
    pub cell_type: Option<String>,
    /// Text of the `<v>` child
    pub value: Option<String>,
    /// Concatenated `<t>` runs of an `<is>` child
    pub inline: Option<String>,
}

fn inline_string(reference: &str, text: &str) -> String {
    // Spreadsheet applications trim edge whitespace unless told otherwise
    let space = if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        r#" xml:space="preserve""#
    } else {
        ""
    };
    format!(
        r#"<c r="{}" t="inlineStr"><is><t{}>{}</t></is></c>"#,
        reference,
        space,
        partial_escape(text)
    )
}

/// Encode one cell at 1-based `row` and `column`
pub fn encode(value: &CellValue, row: u32, column: u32) -> String {
    let reference = cell_ref(row, column);
    match value {
        CellValue::Bool(b) => inline_string(&reference, if *b { "TRUE" } else { "FALSE" }),
        CellValue::Number(n) => match format_number(*n) {
            Some(payload) => format!(r#"<c r="{}"><v>{}</v></c>"#, reference, payload),
            None => format!(r#"<c r="{}"/>"#, reference),
        },
        CellValue::Text(s) if !s.is_empty() => inline_string(&reference, s),
        CellValue::Empty | CellValue::Text(_) => format!(r#"<c r="{}"/>"#, reference),
    }
}

fn parse_number(payload: &str) -> CellValue {
    match payload.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::text(payload),
    }
}

/// Decode a raw cell, resolving `t="s"` through `shared_strings`
///
/// An out-of-range or unparsable shared-string index decodes to `Empty`.
pub fn decode(raw: &RawCell, shared_strings: &[String]) -> CellValue {
    match raw.cell_type.as_deref() {
        Some("inlineStr") => CellValue::text(raw.inline.clone().unwrap_or_default()),
        Some("s") => raw
            .value
            .as_deref()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|idx| shared_strings.get(idx))
            .map_or(CellValue::Empty, |s| CellValue::text(s.as_str())),
        Some("b") => match raw.value.as_deref().map(str::trim) {
            Some("1") => CellValue::Bool(true),
            Some("0") => CellValue::Bool(false),
            Some(other) => CellValue::text(other),
            None => CellValue::Empty,
        },
        Some("str" | "e") => CellValue::text(raw.value.clone().unwrap_or_default()),
        _ => match raw.value.as_deref() {
            Some(v) if !v.is_empty() => parse_number(v),
            // Some writers tag numbers as inline strings without the type
            _ => raw
                .inline
                .as_deref()
                .map_or(CellValue::Empty, CellValue::text),
        },
    }
}
