//! # dayblock-core
//!
//! Data model and merge engine for the dayblock weather ledger.
//!
//! This crate provides:
//! - Domain types: `CellValue`, `Row`, `DayBlock`, `WeatherRecord`
//! - Core traits: `SheetStore` (persistence backend), `ForecastSource` (upstream fetch)
//! - The day-block pipeline: normalize, split, merge
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use dayblock_core::{merge_blocks, split_blocks, CellValue};
//!
//! let history = vec![
//!     vec![CellValue::text("2024-01-01"), CellValue::text("A")],
//!     vec![],
//!     vec![CellValue::text("2024-01-02"), CellValue::text("B")],
//!     vec![],
//! ];
//! let blocks = split_blocks(&history);
//! let fresh = vec![vec![CellValue::text("2024-01-02"), CellValue::text("C")]];
//! let outcome = merge_blocks(&blocks, &CellValue::text("2024-01-02"), &fresh, 2);
//!
//! assert!(outcome.replaced);
//! assert_eq!(outcome.rows.len(), 4);
//! assert_eq!(outcome.rows[2][1], CellValue::text("C"));
//! ```

pub mod assemble;
pub mod blocks;
pub mod normalize;
pub mod pipeline;
pub mod store;

pub use assemble::{assemble_block, collect_outcomes, AssembledBlock, FetchOutcome};
pub use blocks::{merge_blocks, split_blocks, MergeOutcome};
pub use normalize::{is_header_row, normalize_rows, pad_row, strip_header, DATE_HEADER};
pub use pipeline::{run_update, RunReport};
pub use store::MemoryStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Column names of the persisted document, in on-disk order
pub const HEADERS: [&str; 8] = [
    "date",
    "concelho",
    "t_min_c",
    "t_max_c",
    "wind_max_kmh",
    "wind_max_dir",
    "wind_second_max_kmh",
    "wind_second_max_dir",
];

/// Locations fetched when no configuration overrides them
pub const DEFAULT_LOCATIONS: [&str; 8] = [
    "Sobral de Monte Agraco",
    "Torres Vedras",
    "Lourinha",
    "Caldas da Rainha",
    "Cadaval",
    "Bombarral",
    "Peniche",
    "Obidos",
];

/// Owned copy of [`HEADERS`]
pub fn default_headers() -> Vec<String> {
    HEADERS.iter().map(|h| (*h).to_string()).collect()
}

// ============================================================================
// Cell values
// ============================================================================

/// A single spreadsheet cell
///
/// `Empty` and empty `Text` mean the same thing on disk; use [`CellValue::text`]
/// to build text cells so that the empty case collapses to `Empty`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Text cell, or `Empty` when the text is empty
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    /// Number cell, or `Empty` for a missing measurement
    pub fn number(value: Option<f64>) -> Self {
        value.map_or(Self::Empty, Self::Number)
    }

    /// True for `Empty` and for empty text
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Collapse empty text into `Empty`
    pub fn normalized(self) -> Self {
        if self.is_empty() {
            Self::Empty
        } else {
            self
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Format a number the way it is stored: integral values as plain integers,
/// everything else with exactly one fractional digit.
///
/// Returns `None` for NaN and infinities, which have no cell representation.
pub fn format_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    // Round first so that a payload like "10.0" is never emitted for 9.96
    let rounded = (value * 10.0).round() / 10.0;
    let value = if rounded.is_finite() { rounded } else { value };
    if value.fract() == 0.0 && value.abs() < 1e15 {
        // -0.0 prints as "-0" otherwise
        Some(format!("{}", value as i64))
    } else {
        Some(format!("{:.1}", value))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::Number(n) => f.write_str(&format_number(*n).unwrap_or_default()),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One spreadsheet row; position is the only column addressing scheme
pub type Row = Vec<CellValue>;

/// True when every cell in the row is empty (zero-width rows included)
pub fn is_blank_row(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_empty)
}

/// The date key of a row: its first cell, or `Empty` for a zero-width row
pub fn row_key(row: &[CellValue]) -> CellValue {
    row.first().cloned().unwrap_or_default().normalized()
}

// ============================================================================
// Day blocks
// ============================================================================

/// A contiguous run of rows belonging to one date key
#[derive(Clone, Debug, PartialEq)]
pub struct DayBlock {
    /// Date key shared by the block (may be `Empty` for orphan continuation rows)
    pub key: CellValue,
    /// Rows in document order, separators excluded
    pub rows: Vec<Row>,
}

impl DayBlock {
    pub fn new(key: CellValue, rows: Vec<Row>) -> Self {
        Self { key, rows }
    }
}

// ============================================================================
// Upstream records
// ============================================================================

/// Daily summary for one location, as produced by the weather collaborator
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// ISO-8601 calendar date of the forecast day
    #[serde(default)]
    pub date: String,
    /// Resolved location name
    pub concelho: String,
    #[serde(default)]
    pub t_min_c: Option<f64>,
    #[serde(default)]
    pub t_max_c: Option<f64>,
    #[serde(default)]
    pub wind_max_kmh: Option<f64>,
    /// Comma-joined compass tokens, e.g. `"NW,WNW"`
    #[serde(default)]
    pub wind_max_dir: String,
    #[serde(default)]
    pub wind_second_max_kmh: Option<f64>,
    #[serde(default)]
    pub wind_second_max_dir: String,
}

impl WeatherRecord {
    /// Placeholder for a location whose fetch failed: name only, no measurements
    pub fn placeholder(concelho: impl Into<String>) -> Self {
        Self {
            concelho: concelho.into(),
            ..Self::default()
        }
    }

    /// Row in [`HEADERS`] order
    pub fn to_row(&self) -> Row {
        vec![
            CellValue::text(self.date.as_str()),
            CellValue::text(self.concelho.as_str()),
            CellValue::number(self.t_min_c),
            CellValue::number(self.t_max_c),
            CellValue::number(self.wind_max_kmh),
            CellValue::text(self.wind_max_dir.as_str()),
            CellValue::number(self.wind_second_max_kmh),
            CellValue::text(self.wind_second_max_dir.as_str()),
        ]
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Persistence backend for the whole document
///
/// `read` returns every stored row including the header row; `write` replaces
/// the entire stored content in one step. A file-backed container and a hosted
/// spreadsheet are interchangeable behind this trait.
pub trait SheetStore {
    /// Load all rows; a missing document is an empty one
    fn read(&self) -> Result<Vec<Row>, StoreError>;

    /// Replace the document with `header` followed by `rows`
    fn write(&mut self, header: &[String], rows: &[Row]) -> Result<(), StoreError>;

    /// Human-readable location of the document, for reporting
    fn describe(&self) -> String;
}

/// Upstream weather lookup for one location
pub trait ForecastSource {
    fn fetch(&self, location: &str) -> Result<WeatherRecord, FetchError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Persistence error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Per-location fetch failure; never aborts a run
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("geocode_not_found")]
    GeocodeNotFound,

    #[error("no_data")]
    NoData,

    #[error("{0}")]
    Upstream(String),
}

// ============================================================================
// Tests
// ============================================================================
