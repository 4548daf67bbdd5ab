//! Historical temperature/humidity samples used to train the hourly model.

use std::{collections::HashSet, fs::File, io::Read, path::Path};

use csv::ReaderBuilder;
use serde::Deserialize;

use crate::error::{ForecastError, Result};

const TEMP_COLUMN: &str = "Temp";
const HUMIDITY_COLUMN: &str = "Humidity";

/// Cell values read as missing, in addition to an empty cell.
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoricalSample {
    pub temperature: f64,
    pub humidity: f64,
    /// False when any other column of the row is missing. Such a row still
    /// supplies the next-hour target for the row before it, but is never used
    /// as a training input itself.
    pub complete: bool,
}

impl HistoricalSample {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self { temperature, humidity, complete: true }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(rename = "Temp", deserialize_with = "csv::invalid_option")]
    temp: Option<f64>,
    #[serde(rename = "Humidity", deserialize_with = "csv::invalid_option")]
    humidity: Option<f64>,
}

/// Read the history CSV at `path`.
///
/// Rows with an empty or non-numeric `Temp`/`Humidity` are dropped, as are
/// repeated (Temp, Humidity) pairs; the first occurrence wins and file order
/// is kept. `0.0` and `-0.0` are the same value. A gap in any other column
/// marks the sample incomplete instead of dropping it.
pub fn load_history(path: &Path) -> Result<Vec<HistoricalSample>> {
    let file = File::open(path).map_err(|e| ForecastError::history(path, e))?;
    read_history(file, path)
}

pub(crate) fn read_history<R: Read>(reader: R, path: &Path) -> Result<Vec<HistoricalSample>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers().map_err(|e| ForecastError::history(path, e))?.clone();
    for column in [TEMP_COLUMN, HUMIDITY_COLUMN] {
        if !headers.iter().any(|h| h == column) {
            return Err(ForecastError::history(path, format!("missing `{column}` column")));
        }
    }

    let mut seen = HashSet::new();
    let mut samples = Vec::new();
    let mut skipped = 0usize;

    for record in rdr.records() {
        let record = record.map_err(|e| ForecastError::history(path, e))?;
        let row: HistoryRow =
            record.deserialize(Some(&headers)).map_err(|e| ForecastError::history(path, e))?;
        let (Some(temperature), Some(humidity)) = (row.temp, row.humidity) else {
            skipped += 1;
            continue;
        };
        if temperature.is_nan() || humidity.is_nan() {
            skipped += 1;
            continue;
        }
        // Adding 0.0 folds -0.0 into 0.0 so both hash alike.
        if !seen.insert(((temperature + 0.0).to_bits(), (humidity + 0.0).to_bits())) {
            skipped += 1;
            continue;
        }
        let complete = record.iter().all(|cell| !is_missing(cell));
        samples.push(HistoricalSample { temperature, humidity, complete });
    }

    tracing::debug!(path = %path.display(), kept = samples.len(), skipped, "history loaded");
    Ok(samples)
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}
