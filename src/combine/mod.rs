// src/combine/mod.rs
//
// Reads every per-endpoint CSV back, fans each table out into one column per country,
// and lines all of them up on a shared daily calendar.

use chrono::NaiveDate;
use glob::{glob, Pattern};
use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

use crate::error::{MacroError, Result};
use crate::process::{
    utils::{clean_str, parse_finite},
    CellValue, IndicatorTable, ObservationRow,
};

pub mod calendar;
pub mod table;

pub use calendar::Calendar;
pub use table::{Column, CombinedTable};

const TIMESTAMP: &str = "timestamp";
const COUNTRY: &str = "country";

fn invalid(path: &Path, reason: impl Into<String>) -> MacroError {
    MacroError::InvalidTable {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn parse_cell(raw: &str) -> CellValue {
    let s = clean_str(raw);
    if s.is_empty() {
        CellValue::Missing
    } else if let Some(n) = parse_finite(s) {
        CellValue::Number(n)
    } else {
        CellValue::Text(s.to_string())
    }
}

/// Read one `timestamp,country,<value>` file written by the extractor.
pub fn read_indicator_csv(path: &Path) -> Result<IndicatorTable> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = rdr.headers()?.clone();

    let ts_idx = headers
        .iter()
        .position(|h| h == TIMESTAMP)
        .ok_or_else(|| invalid(path, "no `timestamp` column"))?;
    let country_idx = headers
        .iter()
        .position(|h| h == COUNTRY)
        .ok_or_else(|| invalid(path, "no `country` column"))?;
    let mut value_cols = (0..headers.len()).filter(|i| *i != ts_idx && *i != country_idx);
    let value_idx = value_cols
        .next()
        .ok_or_else(|| invalid(path, "no value column"))?;
    if value_cols.next().is_some() {
        warn!(path = %path.display(), "extra columns ignored; only the first value column is used");
    }

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_ts = clean_str(record.get(ts_idx).unwrap_or_default());
        // accept `YYYY-MM-DD` with or without a trailing time
        let timestamp = NaiveDate::parse_from_str(raw_ts.get(..10).unwrap_or(raw_ts), "%Y-%m-%d")
            .map_err(|e| invalid(path, format!("row {}: timestamp `{}`: {}", i + 1, raw_ts, e)))?;
        rows.push(ObservationRow {
            timestamp,
            country: clean_str(record.get(country_idx).unwrap_or_default()).to_string(),
            value: parse_cell(record.get(value_idx).unwrap_or_default()),
        });
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(IndicatorTable {
        name,
        value_column: headers[value_idx].to_string(),
        rows,
    })
}

/// Load every `*.csv` under `dir`, in file-name order. A missing directory is an error so
/// that a wrong path never produces an empty combined table.
#[instrument(level = "info", skip(dir), fields(dir = %dir.as_ref().display()))]
pub fn get_csv<P: AsRef<Path>>(dir: P) -> Result<Vec<IndicatorTable>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(MacroError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("indicator directory {} does not exist", dir.display()),
        )));
    }

    let pattern = format!("{}/*.csv", Pattern::escape(&dir.to_string_lossy()));
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in glob(&pattern)? {
        match entry {
            Ok(p) => paths.push(p),
            Err(e) => warn!(error = %e, "cannot read glob entry; skipped"),
        }
    }
    paths.sort();

    let tables = paths
        .iter()
        .map(|p| read_indicator_csv(p))
        .collect::<Result<Vec<_>>>()?;
    info!(tables = tables.len(), "loaded indicator tables");
    Ok(tables)
}

/// The join backbone: one row per day from `start` through `today`.
pub fn create_timestamp_index(start: NaiveDate, today: NaiveDate) -> Calendar {
    Calendar::new(start, today)
}

/// Fan `table` out into `"<column>: <country>"` columns aligned on `calendar`.
///
/// Countries keep first-appearance order. Dates outside the calendar are dropped. A repeated
/// `(timestamp, country)` pair keeps its last value. The per-country copies of `country`
/// itself are removed before returning.
pub fn split_table(table: &IndicatorTable, calendar: &Calendar) -> CombinedTable {
    let mut countries: Vec<&str> = Vec::new();
    let mut by_country: HashMap<&str, Vec<&ObservationRow>> = HashMap::new();
    for row in &table.rows {
        by_country
            .entry(row.country.as_str())
            .or_insert_with(|| {
                countries.push(row.country.as_str());
                Vec::new()
            })
            .push(row);
    }

    let mut out = CombinedTable::on_calendar(calendar);
    let mut dropped = 0usize;
    for country in countries {
        let mut country_cells = vec![None; calendar.len()];
        let mut value_cells = vec![None; calendar.len()];
        for row in &by_country[country] {
            let Some(i) = calendar.position(row.timestamp) else {
                dropped += 1;
                continue;
            };
            if value_cells[i].is_some() || country_cells[i].is_some() {
                warn!(table = %table.name, country, date = %row.timestamp, "duplicate observation; keeping last");
            }
            country_cells[i] = Some(country.to_string());
            value_cells[i] = row.value.to_text();
        }
        out.columns.push(Column {
            name: format!("{}: {}", COUNTRY, country),
            cells: country_cells,
        });
        out.columns.push(Column {
            name: format!("{}: {}", table.value_column, country),
            cells: value_cells,
        });
    }
    if dropped > 0 {
        debug!(table = %table.name, dropped, "observations outside calendar");
    }

    let remnant = format!("{}: ", COUNTRY);
    out.columns.retain(|c| !c.name.starts_with(&remnant));
    out
}

/// Split every table and join the results column-wise onto `calendar`.
pub fn join_tables(
    tables: &[IndicatorTable],
    calendar: &Calendar,
    drop_empty: bool,
) -> Result<CombinedTable> {
    let mut combined = CombinedTable::on_calendar(calendar);
    for table in tables {
        combined.extend(split_table(table, calendar).columns)?;
    }
    if drop_empty {
        let before = combined.num_rows();
        combined = combined.drop_empty_rows();
        debug!(dropped = before - combined.num_rows(), "empty rows removed");
    }
    Ok(combined)
}

/// Load `dir`, combine onto `[start, today]` and write the result to `out_path`.
#[instrument(level = "info", skip_all, fields(dir = %dir.as_ref().display(), out = %out_path.as_ref().display()))]
pub fn join_csv<P: AsRef<Path>, Q: AsRef<Path>>(
    dir: P,
    out_path: Q,
    start: NaiveDate,
    today: NaiveDate,
    drop_empty: bool,
) -> Result<CombinedTable> {
    let tables = get_csv(&dir)?;
    let calendar = create_timestamp_index(start, today);
    let combined = join_tables(&tables, &calendar, drop_empty)?;
    combined.write_csv(out_path.as_ref())?;
    info!(
        rows = combined.num_rows(),
        columns = combined.columns.len(),
        "combined table written"
    );
    Ok(combined)
}
