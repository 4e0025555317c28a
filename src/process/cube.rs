// src/process/cube.rs
//
// Typed view of an SDMX-JSON data cube: a flat map of `i:j:k` keys to value arrays,
// plus per-dimension label lists that the key indices point into.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{MacroError, Result};

pub const LOCATION: &str = "LOCATION";
pub const TIME_PERIOD: &str = "TIME_PERIOD";
pub const SUBJECT: &str = "SUBJECT";
pub const VAR: &str = "VAR";

#[derive(Debug, Deserialize)]
pub struct DataCube {
    #[serde(rename = "dataSets")]
    pub data_sets: Vec<DataSet>,
    pub structure: Structure,
}

#[derive(Debug, Deserialize)]
pub struct DataSet {
    #[serde(default)]
    pub observations: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub struct Structure {
    pub dimensions: Dimensions,
}

#[derive(Debug, Deserialize)]
pub struct Dimensions {
    #[serde(default)]
    pub observation: Vec<Dimension>,
}

#[derive(Debug, Deserialize)]
pub struct Dimension {
    pub id: String,
    #[serde(rename = "keyPosition", default)]
    pub key_position: Option<usize>,
    #[serde(default)]
    pub values: Vec<DimensionValue>,
}

#[derive(Debug, Deserialize)]
pub struct DimensionValue {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Which field of a split observation key selects a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyField {
    At(usize),
    Last,
}

/// A dimension resolved against the observation key layout.
#[derive(Debug)]
pub struct Axis<'a> {
    pub id: &'a str,
    pub field: KeyField,
    pub labels: Vec<&'a str>,
}

impl<'a> Axis<'a> {
    fn new(dim: &'a Dimension, field: KeyField) -> Self {
        Self {
            id: &dim.id,
            field,
            labels: dim.values.iter().map(|v| v.name.as_str()).collect(),
        }
    }

    /// Label selected by `fields` (an observation key split on `:`).
    pub fn label(&self, fields: &[&str]) -> std::result::Result<&'a str, String> {
        let raw = match self.field {
            KeyField::At(i) => fields.get(i).copied(),
            KeyField::Last => fields.last().copied(),
        }
        .ok_or_else(|| format!("no key field for {}", self.id))?;
        let idx: usize = raw
            .trim()
            .parse()
            .map_err(|_| format!("{} index `{}` is not an integer", self.id, raw))?;
        self.labels.get(idx).copied().ok_or_else(|| {
            format!(
                "{} index {} out of range ({} labels)",
                self.id,
                idx,
                self.labels.len()
            )
        })
    }
}

impl DataCube {
    pub fn from_value(endpoint: &str, value: &Value) -> Result<Self> {
        DataCube::deserialize(value).map_err(|source| MacroError::InvalidDocument {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    fn dimensions(&self) -> &[Dimension] {
        &self.structure.dimensions.observation
    }

    fn find(&self, id: &str) -> Option<(usize, &Dimension)> {
        self.dimensions().iter().enumerate().find(|(_, d)| d.id == id)
    }

    /// Dimension `id`, keyed by its `keyPosition` (or its list position when that is absent).
    pub fn axis(&self, id: &str) -> Option<Axis<'_>> {
        self.find(id)
            .map(|(pos, dim)| Axis::new(dim, KeyField::At(dim.key_position.unwrap_or(pos))))
    }

    /// The time axis. An explicit `TIME_PERIOD` dimension wins; otherwise the last
    /// dimension is taken as time and is read from the last key field.
    pub fn time_axis(&self) -> Option<Axis<'_>> {
        self.axis(TIME_PERIOD).or_else(|| {
            self.dimensions()
                .last()
                .map(|dim| Axis::new(dim, KeyField::Last))
        })
    }

    /// First label of the `SUBJECT` dimension, falling back to `VAR`.
    pub fn subject_label(&self) -> Option<&str> {
        self.find(SUBJECT)
            .or_else(|| self.find(VAR))
            .and_then(|(_, dim)| dim.values.first())
            .map(|v| v.name.as_str())
    }

    pub fn observations(&self) -> Option<&BTreeMap<String, Vec<Value>>> {
        self.data_sets.first().map(|ds| &ds.observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cube(dims: Value) -> DataCube {
        let doc = json!({
            "dataSets": [{ "observations": {} }],
            "structure": { "dimensions": { "observation": dims } }
        });
        DataCube::from_value("T", &doc).unwrap()
    }

    #[test]
    fn axis_uses_key_position() {
        let c = cube(json!([
            { "id": "SUBJECT", "keyPosition": 1, "values": [{ "id": "GDP", "name": "GDP" }] },
            { "id": "LOCATION", "keyPosition": 0, "values": [{ "name": "Australia" }, { "name": "Japan" }] }
        ]));
        let loc = c.axis(LOCATION).unwrap();
        assert_eq!(loc.field, KeyField::At(0));
        assert_eq!(loc.label(&["1", "0", "4"]).unwrap(), "Japan");
    }

    #[test]
    fn time_axis_falls_back_to_last_dimension() {
        let c = cube(json!([
            { "id": "LOCATION", "keyPosition": 0, "values": [{ "name": "Australia" }] },
            { "id": "TIME", "keyPosition": 5, "values": [{ "name": "Q1-2020" }, { "name": "Q2-2020" }] }
        ]));
        let t = c.time_axis().unwrap();
        assert_eq!(t.field, KeyField::Last);
        assert_eq!(t.label(&["0", "0", "1"]).unwrap(), "Q2-2020");
    }

    #[test]
    fn explicit_time_period_wins() {
        let c = cube(json!([
            { "id": "TIME_PERIOD", "keyPosition": 0, "values": [{ "name": "Jan-2020" }, { "name": "Feb-2020" }] },
            { "id": "LOCATION", "keyPosition": 1, "values": [{ "name": "Australia" }] }
        ]));
        let t = c.time_axis().unwrap();
        assert_eq!(t.field, KeyField::At(0));
        assert_eq!(t.label(&["1", "0"]).unwrap(), "Feb-2020");
    }

    #[test]
    fn subject_falls_back_to_var() {
        let c = cube(json!([
            { "id": "VAR", "values": [{ "name": "Unemployment rate" }, { "name": "Other" }] }
        ]));
        assert_eq!(c.subject_label(), Some("Unemployment rate"));
        assert!(cube(json!([{ "id": "MEASURE", "values": [] }]))
            .subject_label()
            .is_none());
    }

    #[test]
    fn label_errors_are_descriptive() {
        let c = cube(json!([
            { "id": "LOCATION", "keyPosition": 0, "values": [{ "name": "Australia" }] }
        ]));
        let loc = c.axis(LOCATION).unwrap();
        assert!(loc.label(&["x"]).unwrap_err().contains("not an integer"));
        assert!(loc.label(&["3"]).unwrap_err().contains("out of range"));
    }
}
