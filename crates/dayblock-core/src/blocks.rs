//! Day-block splitting and merging
//!
//! A stored document is a sequence of day-blocks, each terminated by one
//! blank row. [`split_blocks`] recovers the blocks from flat rows and
//! [`merge_blocks`] produces the next flat row sequence with the current
//! run's block inserted or swapped in place.

use crate::normalize::pad_row;
use crate::{is_blank_row, row_key, CellValue, DayBlock, Row};
use tracing::{debug, warn};

/// Partition header-less rows into contiguous day-blocks
///
/// Blank rows only separate blocks and are never stored. A dated row closes
/// an open block whose (non-empty) key differs. Rows with an empty key extend
/// whatever block is open, or open one under the empty key; such an orphan
/// block is adopted by the next dated row.
pub fn split_blocks(rows: &[Row]) -> Vec<DayBlock> {
    let mut blocks = Vec::new();
    let mut current_rows: Vec<Row> = Vec::new();
    let mut current_key: Option<CellValue> = None;

    for row in rows {
        if is_blank_row(row) {
            if !current_rows.is_empty() {
                let key = current_key.take().unwrap_or_default();
                blocks.push(DayBlock::new(key, std::mem::take(&mut current_rows)));
            }
            current_key = None;
            continue;
        }

        let key = row_key(row);
        if !key.is_empty() {
            let open_under_other_date = current_key
                .as_ref()
                .is_some_and(|open| !open.is_empty() && *open != key);
            if !current_rows.is_empty() && open_under_other_date {
                let open = current_key.take().unwrap_or_default();
                blocks.push(DayBlock::new(open, std::mem::take(&mut current_rows)));
            }
            current_key = Some(key);
        } else if current_key.is_none() {
            current_key = Some(CellValue::Empty);
        }
        current_rows.push(row.clone());
    }

    if !current_rows.is_empty() {
        blocks.push(DayBlock::new(current_key.unwrap_or_default(), current_rows));
    }

    debug!(blocks = blocks.len(), "split history into day blocks");
    blocks
}

/// Result of merging the current block into history
#[derive(Clone, Debug, PartialEq)]
pub struct MergeOutcome {
    /// Final data rows (header excluded), each block followed by one blank row
    pub rows: Vec<Row>,
    /// Whether an existing block with the run's key was replaced in place
    pub replaced: bool,
    /// Number of blocks in the output
    pub blocks: usize,
    /// Historical blocks discarded because their key was already seen
    pub dropped_duplicates: usize,
}

/// Stamp the block key onto every row and fix the row width
fn finalize_block(key: &CellValue, rows: &[Row], width: usize) -> Vec<Row> {
    if key.is_empty() {
        return rows.iter().map(|row| pad_row(row.clone(), width)).collect();
    }
    rows.iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            let mut row = row.clone();
            row[0] = key.clone();
            pad_row(row, width)
        })
        .collect()
}

/// Merge the current run's rows into the historical blocks
///
/// Historical keys keep their first-seen order; a later block repeating a
/// key is dropped. If `run_key` already exists its block is replaced in
/// place, otherwise the new block is appended last. Every emitted row is
/// `width` cells wide and every block ends with one blank row.
pub fn merge_blocks(
    history: &[DayBlock],
    run_key: &CellValue,
    fresh_rows: &[Row],
    width: usize,
) -> MergeOutcome {
    let run_key = run_key.clone().normalized();
    let mut ordered: Vec<(&CellValue, &[Row])> = Vec::with_capacity(history.len() + 1);
    let mut dropped_duplicates = 0;

    for block in history {
        if ordered.iter().any(|(key, _)| **key == block.key) {
            warn!(
                key = %block.key,
                rows = block.rows.len(),
                "dropping repeated day block from history"
            );
            dropped_duplicates += 1;
            continue;
        }
        ordered.push((&block.key, block.rows.as_slice()));
    }

    let replaced = match ordered.iter_mut().find(|(key, _)| **key == run_key) {
        Some(slot) => {
            slot.1 = fresh_rows;
            true
        }
        None => false,
    };
    if !replaced {
        ordered.push((&run_key, fresh_rows));
    }

    let blank = vec![CellValue::Empty; width];
    let mut rows = Vec::new();
    for (key, block_rows) in &ordered {
        rows.extend(finalize_block(key, block_rows, width));
        rows.push(blank.clone());
    }

    debug!(
        blocks = ordered.len(),
        replaced,
        dropped_duplicates,
        "merged current day block"
    );

    MergeOutcome {
        rows,
        replaced,
        blocks: ordered.len(),
        dropped_duplicates,
    }
}
