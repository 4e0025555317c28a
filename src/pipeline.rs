// src/pipeline.rs
//
// update locators → fetch → extract each document → combine

use chrono::NaiveDate;
use serde_json::Value;
use std::{collections::BTreeMap, path::Path};
use tracing::{error, info, instrument};

use crate::combine;
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{fetch_documents, urls::update_locators, DocumentSource, Pause};
use crate::process::extract_and_write;

/// What a run produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub documents: usize,
    pub tables_written: usize,
    /// `(endpoint, error)` for every document that could not be extracted.
    pub failures: Vec<(String, String)>,
    pub combined_rows: usize,
    pub combined_columns: usize,
}

/// Extract and persist every document. One bad document does not stop the others.
pub fn extract_all(
    documents: &BTreeMap<String, Value>,
    dir: &Path,
) -> (usize, Vec<(String, String)>) {
    let mut written = 0;
    let mut failures = Vec::new();
    for (endpoint, doc) in documents {
        match extract_and_write(doc, endpoint, dir) {
            Ok(_) => written += 1,
            Err(e) => {
                error!(%endpoint, error = %e, "extraction failed");
                failures.push((endpoint.clone(), e.to_string()));
            }
        }
    }
    (written, failures)
}

/// Full run against `source`, writing per-endpoint tables and the combined table.
#[instrument(level = "info", skip_all, fields(locators = locators.len(), today = %today))]
pub fn run<S, P>(
    config: &Config,
    source: &S,
    pause: &mut P,
    locators: &[String],
    today: NaiveDate,
) -> Result<RunSummary>
where
    S: DocumentSource + ?Sized,
    P: Pause + ?Sized,
{
    config.validate()?;
    let locators = update_locators(locators, today);
    let documents = fetch_documents(
        source,
        pause,
        &locators,
        config.batch_size,
        config.cooldown(),
    )?;

    let (tables_written, failures) = extract_all(&documents, &config.indicators_dir);
    let combined = combine::join_csv(
        &config.indicators_dir,
        &config.combined_path,
        config.calendar_start,
        today,
        config.drop_empty_rows,
    )?;

    let summary = RunSummary {
        documents: documents.len(),
        tables_written,
        failures,
        combined_rows: combined.num_rows(),
        combined_columns: combined.columns.len(),
    };
    info!(?summary, "run complete");
    Ok(summary)
}

/// Rebuild the combined table from whatever is already in `indicators_dir`.
pub fn combine_only(config: &Config, today: NaiveDate) -> Result<combine::CombinedTable> {
    combine::join_csv(
        &config.indicators_dir,
        &config.combined_path,
        config.calendar_start,
        today,
        config.drop_empty_rows,
    )
}
