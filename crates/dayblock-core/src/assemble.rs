//! Build the current run's block from per-location fetch results

use crate::{FetchError, ForecastSource, Row, WeatherRecord};
use std::time::Duration;
use tracing::{debug, warn};

/// Result of fetching one configured location
#[derive(Debug)]
pub struct FetchOutcome {
    pub location: String,
    pub result: Result<WeatherRecord, FetchError>,
}

impl FetchOutcome {
    pub fn ok(location: impl Into<String>, record: WeatherRecord) -> Self {
        Self {
            location: location.into(),
            result: Ok(record),
        }
    }

    pub fn failed(location: impl Into<String>, error: FetchError) -> Self {
        Self {
            location: location.into(),
            result: Err(error),
        }
    }
}

/// Rows for the current day plus the diagnostics of failed locations
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssembledBlock {
    /// One row per configured location, in configuration order
    pub rows: Vec<Row>,
    /// `"{location}: {reason}"` for every failed location
    pub errors: Vec<String>,
    /// First non-empty date among successful records
    pub run_date: Option<String>,
}

/// Query `source` for each location in turn, pausing `delay` between calls
pub fn collect_outcomes<S: ForecastSource + ?Sized>(
    source: &S,
    locations: &[String],
    delay: Duration,
) -> Vec<FetchOutcome> {
    let mut outcomes = Vec::with_capacity(locations.len());
    for (idx, location) in locations.iter().enumerate() {
        if idx > 0 && !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let result = source.fetch(location);
        if let Err(err) = &result {
            warn!(location = %location, error = %err, "forecast fetch failed");
        }
        outcomes.push(FetchOutcome {
            location: location.clone(),
            result,
        });
    }
    outcomes
}

/// Turn fetch outcomes into block rows
///
/// A failed location still contributes a row carrying only its configured
/// name, so the block always has one row per location.
pub fn assemble_block(outcomes: Vec<FetchOutcome>) -> AssembledBlock {
    let mut block = AssembledBlock::default();
    for outcome in outcomes {
        let record = match outcome.result {
            Ok(record) => {
                if block.run_date.is_none() && !record.date.is_empty() {
                    block.run_date = Some(record.date.clone());
                }
                record
            }
            Err(err) => {
                block.errors.push(format!("{}: {}", outcome.location, err));
                WeatherRecord::placeholder(outcome.location)
            }
        };
        block.rows.push(record.to_row());
    }
    debug!(
        rows = block.rows.len(),
        errors = block.errors.len(),
        run_date = block.run_date.as_deref().unwrap_or(""),
        "assembled current block"
    );
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellValue;
    use std::collections::HashMap;

    struct FixedSource(HashMap<String, WeatherRecord>);

    impl ForecastSource for FixedSource {
        fn fetch(&self, location: &str) -> Result<WeatherRecord, FetchError> {
            self.0.get(location).cloned().ok_or(FetchError::GeocodeNotFound)
        }
    }

    fn record(date: &str, name: &str, t_max: f64) -> WeatherRecord {
        WeatherRecord {
            date: date.into(),
            concelho: name.into(),
            t_max_c: Some(t_max),
            ..WeatherRecord::default()
        }
    }

    #[test]
    fn failed_locations_keep_their_row() {
        let mut records = HashMap::new();
        records.insert("Peniche".to_string(), record("2024-05-01", "Peniche", 18.4));
        let source = FixedSource(records);
        let locations = vec!["Cadaval".to_string(), "Peniche".to_string()];

        let block = assemble_block(collect_outcomes(&source, &locations, Duration::ZERO));

        assert_eq!(block.rows.len(), 2);
        assert_eq!(block.rows[0][0], CellValue::Empty);
        assert_eq!(block.rows[0][1], CellValue::text("Cadaval"));
        assert_eq!(block.rows[1][3], CellValue::Number(18.4));
        assert_eq!(block.errors, vec!["Cadaval: geocode_not_found".to_string()]);
        assert_eq!(block.run_date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn run_date_is_first_dated_record() {
        let outcomes = vec![
            FetchOutcome::ok("A", record("", "A", 1.0)),
            FetchOutcome::ok("B", record("2024-05-02", "B", 2.0)),
            FetchOutcome::ok("C", record("2024-05-03", "C", 3.0)),
        ];
        let block = assemble_block(outcomes);
        assert_eq!(block.run_date.as_deref(), Some("2024-05-02"));
        assert!(block.errors.is_empty());
    }

    #[test]
    fn all_failed_has_no_run_date() {
        let outcomes = vec![FetchOutcome::failed("A", FetchError::Upstream("timed out".into()))];
        let block = assemble_block(outcomes);
        assert_eq!(block.run_date, None);
        assert_eq!(block.errors, vec!["A: timed out".to_string()]);
    }
}
