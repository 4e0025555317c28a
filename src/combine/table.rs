use arrow::{
    array::ArrayRef,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use std::{collections::HashSet, path::Path, sync::Arc};

use super::calendar::Calendar;
use crate::error::{MacroError, Result};
use crate::process::utils::{dates_to_array, infer_arrow_dtype, string_cells_to_array};
use crate::process::write::write_batch_csv;

/// One `"<indicator>: <country>"` column; `cells[i]` belongs to `index[i]` of its table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Option<String>>,
}

fn retain_rows<T>(values: Vec<T>, keep: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(keep)
        .filter_map(|(v, k)| k.then_some(v))
        .collect()
}

/// A date index plus any number of equally long data columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTable {
    pub index: Vec<NaiveDate>,
    pub columns: Vec<Column>,
}

impl CombinedTable {
    /// No data columns, one row per calendar day.
    pub fn on_calendar(calendar: &Calendar) -> Self {
        Self {
            index: calendar.days().collect(),
            columns: Vec::new(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Append columns, rejecting names already present.
    pub fn extend(&mut self, columns: Vec<Column>) -> Result<()> {
        let mut names: HashSet<String> = self.columns.iter().map(|c| c.name.clone()).collect();
        for col in columns {
            debug_assert_eq!(col.cells.len(), self.index.len());
            if !names.insert(col.name.clone()) {
                return Err(MacroError::DuplicateColumn(col.name));
            }
            self.columns.push(col);
        }
        Ok(())
    }

    /// Keep only rows where at least one data column has a value.
    pub fn drop_empty_rows(self) -> Self {
        let keep: Vec<bool> = (0..self.index.len())
            .map(|i| self.columns.iter().any(|c| c.cells[i].is_some()))
            .collect();
        Self {
            index: retain_rows(self.index, &keep),
            columns: self
                .columns
                .into_iter()
                .map(|c| Column {
                    name: c.name,
                    cells: retain_rows(c.cells, &keep),
                })
                .collect(),
        }
    }

    /// `timestamp: Date32` followed by each column as Float64 (all numeric) or Utf8.
    pub fn to_batch(&self) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(self.columns.len() + 1);
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len() + 1);

        fields.push(Field::new("timestamp", DataType::Date32, false));
        arrays.push(dates_to_array(self.index.iter().copied()));

        for col in &self.columns {
            let cells = || col.cells.iter().map(|c| c.as_deref());
            let dtype = infer_arrow_dtype(cells());
            arrays.push(string_cells_to_array(cells(), &dtype));
            fields.push(Field::new(&col.name, dtype, true));
        }

        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(Into::into)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        write_batch_csv(&self.to_batch()?, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table() -> CombinedTable {
        let cal = Calendar::new(ymd(2020, 1, 1), ymd(2020, 1, 3));
        let mut t = CombinedTable::on_calendar(&cal);
        t.extend(vec![
            Column {
                name: "gdp: Australia".into(),
                cells: vec![None, Some("1.5".into()), None],
            },
            Column {
                name: "cpi: Japan".into(),
                cells: vec![None, None, Some("x".into())],
            },
        ])
        .unwrap();
        t
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut t = table();
        let err = t
            .extend(vec![Column {
                name: "gdp: Australia".into(),
                cells: vec![None; 3],
            }])
            .unwrap_err();
        assert!(matches!(err, MacroError::DuplicateColumn(ref n) if n == "gdp: Australia"));
    }

    #[test]
    fn empty_rows_dropped() {
        let t = table().drop_empty_rows();
        assert_eq!(t.index, vec![ymd(2020, 1, 2), ymd(2020, 1, 3)]);
        assert_eq!(t.column("gdp: Australia").unwrap().cells.len(), 2);
    }

    #[test]
    fn batch_types_follow_cells() {
        let batch = table().to_batch().unwrap();
        let schema = batch.schema();
        assert_eq!(schema.field(0).name(), "timestamp");
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
        assert_eq!(batch.num_rows(), 3);
    }
}
