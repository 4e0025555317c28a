use std::path::PathBuf;

use arrow::error::ArrowError;

/// Errors raised by the fetch, extract and combine stages.
#[derive(Debug, thiserror::Error)]
pub enum MacroError {
    /// Locator does not contain a `data/<name>/AUS` style endpoint segment.
    #[error("cannot derive endpoint name from locator `{0}`")]
    MalformedLocator(String),

    /// Network-level failure; the response never arrived.
    #[error("GET {locator} failed: {source}")]
    Request {
        locator: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed (TLS backend, invalid user agent).
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A required structural dimension is absent from the document.
    #[error("document `{endpoint}` has no {dimension} dimension")]
    MissingDimension { endpoint: String, dimension: String },

    #[error("document `{endpoint}` has invalid observation key `{key}`: {reason}")]
    InvalidObservationKey {
        endpoint: String,
        key: String,
        reason: String,
    },

    #[error("unrecognised period label `{0}`")]
    InvalidPeriod(String),

    /// Document JSON does not follow the data-cube layout.
    #[error("document `{endpoint}` is not a data cube: {source}")]
    InvalidDocument {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("table {path:?}: {reason}")]
    InvalidTable { path: PathBuf, reason: String },

    #[error("column `{0}` produced by more than one table")]
    DuplicateColumn(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Glob(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, MacroError>;
