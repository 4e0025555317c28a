use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    csv::WriterBuilder,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, instrument};

use super::utils::{dates_to_array, string_cells_to_array};
use super::{CellValue, IndicatorTable};
use crate::error::Result;

/// `timestamp: Date32, country: Utf8, <value_column>: Float64 | Utf8`
pub fn indicator_batch(table: &IndicatorTable) -> Result<RecordBatch> {
    let all_numeric = table
        .rows
        .iter()
        .all(|r| !matches!(r.value, CellValue::Text(_)));

    let (value_type, values): (DataType, ArrayRef) = if all_numeric {
        let arr: Float64Array = table.rows.iter().map(|r| r.value.as_f64()).collect();
        (DataType::Float64, Arc::new(arr))
    } else {
        let cells: Vec<Option<String>> = table.rows.iter().map(|r| r.value.to_text()).collect();
        (
            DataType::Utf8,
            string_cells_to_array(cells.iter().map(|c| c.as_deref()), &DataType::Utf8),
        )
    };

    let schema = Schema::new(vec![
        Field::new("timestamp", DataType::Date32, false),
        Field::new("country", DataType::Utf8, false),
        Field::new(&table.value_column, value_type, true),
    ]);
    let timestamps = dates_to_array(table.rows.iter().map(|r| r.timestamp));
    let countries: StringArray = table.rows.iter().map(|r| Some(r.country.as_str())).collect();

    RecordBatch::try_new(
        Arc::new(schema),
        vec![timestamps, Arc::new(countries) as ArrayRef, values],
    )
    .map_err(Into::into)
}

/// Serialize `batch` as CSV with a header row and write it to `path`, replacing any old file.
/// The parent directory is created when missing.
pub fn write_batch_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = WriterBuilder::new().with_header(true).build(&mut buf);
        writer.write(batch)?;
    }
    fs::write(path, &buf)?;
    debug!(path = %path.display(), rows = batch.num_rows(), bytes = buf.len(), "wrote csv");
    Ok(())
}

/// Persist `table` as `<dir>/<name>.csv`. Returns the path written.
#[instrument(level = "info", skip(table, dir), fields(table = %table.name, rows = table.rows.len()))]
pub fn write_indicator_table(table: &IndicatorTable, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format!("{}.csv", table.name));
    let batch = indicator_batch(table)?;
    write_batch_csv(&batch, &path)?;
    Ok(path)
}
