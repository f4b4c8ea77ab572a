//! File-backed [`SheetStore`]
//!
//! The container is built completely in memory, written to a temporary file
//! beside the destination and renamed over it, so a failed run never leaves
//! a half-written workbook behind.

use crate::reader::read_workbook_file;
use crate::writer::{write_workbook, DEFAULT_SHEET_NAME};
use dayblock_core::{Row, SheetStore, StoreError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// What to do when an existing workbook cannot be decoded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadPolicy {
    /// Treat it as empty history; the next write replaces it
    #[default]
    Reset,
    /// Fail the run and leave the file alone
    Abort,
}

#[derive(Clone, Debug)]
pub struct XlsxStore {
    path: PathBuf,
    sheet_name: String,
    on_unreadable: ReadPolicy,
}

impl XlsxStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            on_unreadable: ReadPolicy::default(),
        }
    }

    /// Set the name of the single sheet written to the workbook
    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    pub fn on_unreadable(mut self, policy: ReadPolicy) -> Self {
        self.on_unreadable = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SheetStore for XlsxStore {
    fn read(&self) -> Result<Vec<Row>, StoreError> {
        match read_workbook_file(&self.path) {
            Ok(rows) => Ok(rows),
            Err(err) => match self.on_unreadable {
                ReadPolicy::Reset => {
                    warn!(
                        path = %self.path.display(),
                        error = %err,
                        "existing workbook is unreadable; starting from empty history"
                    );
                    Ok(Vec::new())
                }
                ReadPolicy::Abort => Err(err.into()),
            },
        }
    }

    fn write(&mut self, header: &[String], rows: &[Row]) -> Result<(), StoreError> {
        let bytes = write_workbook(header, rows, &self.sheet_name)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(&bytes)?;
        staged.as_file().sync_all()?;
        staged
            .persist(&self.path)
            .map_err(|err| StoreError::Io(err.error))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "workbook replaced");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
