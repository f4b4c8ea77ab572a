//! In-memory [`SheetStore`]
//!
//! Stands in for a hosted spreadsheet: whole-sheet read, whole-sheet
//! replace, no knowledge of day-blocks.

use crate::{CellValue, Row, SheetStore, StoreError};

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    rows: Vec<Row>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with raw rows (header included, if any)
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self { rows, writes: 0 }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of completed `write` calls
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SheetStore for MemoryStore {
    fn read(&self) -> Result<Vec<Row>, StoreError> {
        Ok(self.rows.clone())
    }

    fn write(&mut self, header: &[String], rows: &[Row]) -> Result<(), StoreError> {
        let mut all = Vec::with_capacity(rows.len() + 1);
        all.push(header.iter().map(|h| CellValue::text(h.as_str())).collect());
        all.extend(rows.iter().cloned());
        self.rows = all;
        self.writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
