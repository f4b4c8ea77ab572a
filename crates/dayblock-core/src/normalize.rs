//! Repair and shape rows read back from a stored document
//!
//! Older writers prepended extra columns before `date`. [`normalize_rows`]
//! shifts such documents back into place when it can prove the shift is
//! lossless, and leaves them alone otherwise.

use crate::{CellValue, Row};
use tracing::{debug, warn};

/// Header the repair anchors on, whatever the rest of the header list says
pub const DATE_HEADER: &str = "date";

fn header_token(cell: &CellValue) -> String {
    cell.to_string().trim().to_lowercase()
}

/// Undo a column shift left by an older writer version
///
/// The first row is treated as the header row. If its `date` column sits at
/// offset `k > 0` and every row is empty in columns `0..k`, all rows are
/// left-truncated by `k`. Any non-empty cell before the offset means the
/// shift cannot be undone safely, and the rows are returned unchanged.
pub fn normalize_rows(rows: Vec<Row>, headers: &[String]) -> Vec<Row> {
    let Some(first) = rows.first() else {
        return rows;
    };

    let Some(offset) = first.iter().position(|c| header_token(c) == DATE_HEADER) else {
        return rows;
    };
    if offset == 0 {
        return rows;
    }

    let lossless = rows
        .iter()
        .all(|row| row.iter().take(offset).all(CellValue::is_empty));
    if !lossless {
        warn!(
            offset,
            "header row is shifted but leading columns hold data; leaving document as is"
        );
        return rows;
    }

    debug!(
        offset,
        expected_header = is_header_row(&first[offset..], headers),
        "removing leading columns left by an older writer"
    );
    rows.into_iter()
        .map(|row| row.into_iter().skip(offset).collect())
        .collect()
}

/// True when the row's leading cells spell out `headers` (trimmed, case-insensitive)
pub fn is_header_row(row: &[CellValue], headers: &[String]) -> bool {
    if row.is_empty() || row.len() < headers.len() {
        return false;
    }
    row.iter()
        .zip(headers)
        .all(|(cell, header)| header_token(cell) == header.trim().to_lowercase())
}

/// Drop the header row if the document starts with one
pub fn strip_header(mut rows: Vec<Row>, headers: &[String]) -> Vec<Row> {
    if rows.first().is_some_and(|row| is_header_row(row, headers)) {
        rows.remove(0);
    }
    rows
}

/// Pad with `Empty` up to `width`, truncating anything beyond it
pub fn pad_row(mut row: Row, width: usize) -> Row {
    row.resize(width, CellValue::Empty);
    row
}
