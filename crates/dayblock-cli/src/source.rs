//! Forecast records supplied as a JSON file
//!
//! The file holds what the weather collaborator produced for one run:
//!
//! ```json
//! [
//!   {"location": "Peniche", "record": {"date": "2024-05-01", "concelho": "Peniche", "t_max_c": 18.4}},
//!   {"location": "Obidos", "error": "geocode_not_found"}
//! ]
//! ```

use anyhow::{Context, Result};
use dayblock_core::{FetchError, ForecastSource, WeatherRecord};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Entry {
    location: String,
    #[serde(default)]
    record: Option<WeatherRecord>,
    #[serde(default)]
    error: Option<String>,
}

/// Looks locations up in a pre-fetched JSON file
#[derive(Debug, Default)]
pub struct JsonRecordSource {
    entries: HashMap<String, Result<WeatherRecord, String>>,
}

impl JsonRecordSource {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read records file {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse records file {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<Entry> = serde_json::from_str(json)?;
        let mut entries = HashMap::with_capacity(raw.len());
        for entry in raw {
            let value = match (entry.record, entry.error) {
                (Some(record), _) => Ok(record),
                (None, Some(error)) => Err(error),
                (None, None) => Err(FetchError::NoData.to_string()),
            };
            // First entry for a location wins
            entries.entry(entry.location).or_insert(value);
        }
        Ok(Self { entries })
    }
}

impl ForecastSource for JsonRecordSource {
    fn fetch(&self, location: &str) -> Result<WeatherRecord, FetchError> {
        match self.entries.get(location) {
            Some(Ok(record)) => Ok(record.clone()),
            Some(Err(reason)) => Err(match reason.as_str() {
                "geocode_not_found" => FetchError::GeocodeNotFound,
                "no_data" => FetchError::NoData,
                other => FetchError::Upstream(other.to_string()),
            }),
            None => Err(FetchError::NoData),
        }
    }
}
