//! End-to-end update: read, normalize, split, merge, write
//!
//! The stored document is treated as an immutable snapshot. Nothing is
//! edited in place; the merged rows are handed to the store in one `write`.

use crate::assemble::AssembledBlock;
use crate::blocks::{merge_blocks, split_blocks};
use crate::normalize::{normalize_rows, pad_row, strip_header};
use crate::{CellValue, SheetStore, StoreError};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Summary of one update run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    /// Rows in the current day's block
    pub rows_written: usize,
    /// Data rows in the rewritten document, separators included
    pub document_rows: usize,
    /// Day blocks in the rewritten document
    pub blocks: usize,
    /// Whether a block for the run date already existed
    pub replaced: bool,
    /// Historical blocks discarded because their date repeated
    pub dropped_duplicates: usize,
    /// Date key the block was merged under (empty when no record had one)
    pub run_date: String,
    /// Per-location diagnostics, passed through untouched
    pub errors: Vec<String>,
}

/// Merge `block` into the document held by `store` and write it back
///
/// Fails only when the store fails; per-location fetch errors in `block`
/// are reported, never acted on.
pub fn run_update<S: SheetStore + ?Sized>(
    store: &mut S,
    headers: &[String],
    block: &AssembledBlock,
) -> Result<RunReport, StoreError> {
    let width = headers.len();
    let run_date = block.run_date.clone().unwrap_or_default();
    if run_date.is_empty() {
        warn!("no record carried a date; merging under an empty key");
    } else if NaiveDate::parse_from_str(&run_date, "%Y-%m-%d").is_err() {
        warn!(run_date = %run_date, "run date is not an ISO-8601 calendar date");
    }

    let existing = store.read()?;
    let existing = normalize_rows(existing, headers);
    let history: Vec<_> = strip_header(existing, headers)
        .into_iter()
        .map(|row| pad_row(row, width))
        .collect();

    let blocks = split_blocks(&history);
    let outcome = merge_blocks(&blocks, &CellValue::text(run_date.as_str()), &block.rows, width);

    store.write(headers, &outcome.rows)?;

    info!(
        target_doc = %store.describe(),
        run_date = %run_date,
        rows = block.rows.len(),
        blocks = outcome.blocks,
        replaced = outcome.replaced,
        "document updated"
    );

    Ok(RunReport {
        rows_written: block.rows.len(),
        document_rows: outcome.rows.len(),
        blocks: outcome.blocks,
        replaced: outcome.replaced,
        dropped_duplicates: outcome.dropped_duplicates,
        run_date,
        errors: block.errors.clone(),
    })
}
