//! # dayblock-xlsx
//!
//! XLSX persistence for the dayblock weather ledger.
//!
//! This crate provides:
//! - A1 column addressing (`address`)
//! - Cell value ↔ `<c>` element conversion (`codec`)
//! - A minimal deterministic container writer (`writer`)
//! - A tolerant reader that also understands shared strings (`reader`)
//! - `XlsxStore`, a file-backed `SheetStore` with atomic replacement
//!
//! ## Example
//!
//! ```rust
//! use dayblock_core::CellValue;
//! use dayblock_xlsx::{read_workbook_bytes, write_workbook, DEFAULT_SHEET_NAME};
//!
//! let header = vec!["date".to_string(), "concelho".to_string()];
//! let rows = vec![vec![CellValue::text("2024-01-01"), CellValue::text("Peniche")]];
//!
//! let bytes = write_workbook(&header, &rows, DEFAULT_SHEET_NAME).unwrap();
//! let back = read_workbook_bytes(&bytes).unwrap();
//! assert_eq!(back[1], rows[0]);
//! ```

pub mod address;
pub mod codec;
pub mod reader;
pub mod store;
pub mod writer;

pub use address::{cell_ref, index_to_letters, letters_to_index};
pub use reader::{read_workbook, read_workbook_bytes, read_workbook_file};
pub use store::{ReadPolicy, XlsxStore};
pub use writer::{write_workbook, DEFAULT_SHEET_NAME};

use dayblock_core::StoreError;
use thiserror::Error;

/// Container encoding/decoding error
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl From<XlsxError> for StoreError {
    fn from(err: XlsxError) -> Self {
        match err {
            XlsxError::Io(io) => Self::Io(io),
            other => Self::Malformed(other.to_string()),
        }
    }
}
