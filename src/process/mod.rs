// src/process/mod.rs
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::error::{MacroError, Result};

pub mod cube;
pub mod date_parser;
pub mod utils;
pub mod write;

use cube::{DataCube, LOCATION, TIME_PERIOD};
use date_parser::Frequency;
pub use write::write_indicator_table;

/// A single observed value. The API mostly sends numbers; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => n.as_f64().map_or(CellValue::Missing, CellValue::Number),
            Some(Value::String(s)) => CellValue::Text(s.clone()),
            Some(Value::Bool(b)) => CellValue::Text(b.to_string()),
            Some(Value::Null) | None => CellValue::Missing,
            Some(other) => CellValue::Text(other.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Missing => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub timestamp: chrono::NaiveDate,
    pub country: String,
    pub value: CellValue,
}

/// All observations of one endpoint. `value_column` is the lower-cased subject label.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    pub name: String,
    pub value_column: String,
    pub rows: Vec<ObservationRow>,
}

fn missing(endpoint: &str, dimension: &str) -> MacroError {
    MacroError::MissingDimension {
        endpoint: endpoint.to_string(),
        dimension: dimension.to_string(),
    }
}

/// Sort key for an observation key. Fields that are not integers sort last and are
/// rejected when the key is resolved.
fn key_order(key: &str) -> Vec<usize> {
    key.split(':')
        .map(|f| f.trim().parse().unwrap_or(usize::MAX))
        .collect()
}

/// Decode one data-cube document into `(timestamp, country, value)` rows.
///
/// Period labels are normalized to the last day of their quarter or month; the whole
/// table is quarterly as soon as one label starts with `Q`.
#[instrument(level = "debug", skip(document))]
pub fn extract_document(document: &Value, endpoint: &str) -> Result<IndicatorTable> {
    let cube = DataCube::from_value(endpoint, document)?;

    let location = cube
        .axis(LOCATION)
        .ok_or_else(|| missing(endpoint, LOCATION))?;
    let time = cube
        .time_axis()
        .ok_or_else(|| missing(endpoint, TIME_PERIOD))?;
    let subject = cube
        .subject_label()
        .ok_or_else(|| missing(endpoint, "SUBJECT/VAR"))?;
    let observations = cube.observations().ok_or_else(|| MacroError::InvalidObservationKey {
        endpoint: endpoint.to_string(),
        key: String::new(),
        reason: "document has no data set".into(),
    })?;

    // numeric key order keeps each series chronological (`0:0:2` before `0:0:10`)
    let mut entries: Vec<_> = observations.iter().collect();
    entries.sort_by_cached_key(|(key, _)| key_order(key));

    let mut raw = Vec::with_capacity(entries.len());
    for (key, values) in entries {
        let fields: Vec<&str> = key.split(':').collect();
        let invalid = |reason: String| MacroError::InvalidObservationKey {
            endpoint: endpoint.to_string(),
            key: key.clone(),
            reason,
        };
        let country = location.label(&fields).map_err(invalid)?;
        let period = time.label(&fields).map_err(invalid)?;
        raw.push((period, country, CellValue::from_json(values.first())));
    }

    let frequency = Frequency::detect(raw.iter().map(|(p, _, _)| *p));
    debug!(?frequency, observations = raw.len(), "decoded observation keys");

    let rows = raw
        .into_iter()
        .map(|(period, country, value)| {
            Ok(ObservationRow {
                timestamp: date_parser::period_end(period, frequency)?,
                country: country.to_string(),
                value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(IndicatorTable {
        name: endpoint.to_string(),
        value_column: subject.to_lowercase(),
        rows,
    })
}

/// Extract `document` and persist it under `dir`. Nothing is written if extraction fails.
pub fn extract_and_write(
    document: &Value,
    endpoint: &str,
    dir: &Path,
) -> Result<(IndicatorTable, PathBuf)> {
    let table = extract_document(document, endpoint)?;
    let path = write_indicator_table(&table, dir)?;
    info!(endpoint, rows = table.rows.len(), path = %path.display(), "indicator table written");
    Ok((table, path))
}
