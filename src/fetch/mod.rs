// src/fetch/mod.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::{collections::BTreeMap, time::Duration};
use tracing::{debug, info, instrument, warn};

use crate::error::{MacroError, Result};

pub mod source;
pub mod urls;

pub use source::{DocumentSource, HttpSource, Pause, Response, ThreadPause};

static ENDPOINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"data/(.*?)(?:/AUS|\.AUS)").unwrap());

/// Name a locator's output: the path between `data/` and the country segment, `/` → `_`.
///
/// `.../data/MEI_CLI/LOLITOAA.AUS+USA.M/all` → `MEI_CLI_LOLITOAA`
pub fn endpoint_name(locator: &str) -> Result<String> {
    ENDPOINT_RE
        .captures(locator)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace('/', "_"))
        .ok_or_else(|| MacroError::MalformedLocator(locator.to_string()))
}

/// Fetch every locator, `batch_size` at a time, pausing for `cooldown` between batches.
///
/// Bodies that are not JSON are logged and left out of the result. A malformed locator or a
/// network failure stops the whole run.
#[instrument(level = "info", skip_all, fields(locators = locators.len(), batch_size = batch_size))]
pub fn fetch_documents<S, P>(
    source: &S,
    pause: &mut P,
    locators: &[String],
    batch_size: usize,
    cooldown: Duration,
) -> Result<BTreeMap<String, Value>>
where
    S: DocumentSource + ?Sized,
    P: Pause + ?Sized,
{
    if batch_size == 0 {
        return Err(MacroError::Config("batch_size must be at least 1".into()));
    }

    let batches = locators.len().div_ceil(batch_size);
    let mut documents = BTreeMap::new();

    for (i, batch) in locators.chunks(batch_size).enumerate() {
        debug!(batch = i + 1, of = batches, size = batch.len(), "fetching batch");
        for locator in batch {
            let name = endpoint_name(locator)?;
            let resp = source.get(locator)?;
            match serde_json::from_str::<Value>(&resp.body) {
                Ok(doc) => {
                    if documents.insert(name.clone(), doc).is_some() {
                        warn!(endpoint = %name, %locator, "endpoint fetched twice; keeping latest");
                    }
                }
                Err(e) => {
                    warn!(%locator, status = resp.status, error = %e, "error decoding JSON response; skipped");
                }
            }
        }
        if i + 1 < batches {
            pause.pause(cooldown);
        }
    }

    info!(documents = documents.len(), "fetch complete");
    Ok(documents)
}
