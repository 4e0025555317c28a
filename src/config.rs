use chrono::NaiveDate;
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::error::{MacroError, Result};

/// Browser-like agent; the statistics API rejects obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/51.0.2704.103 Safari/537.36";

/// Runtime settings. Every field has a default so an empty (or absent) YAML file is valid.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory receiving one `<endpoint>.csv` per fetched document.
    pub indicators_dir: PathBuf,
    /// Destination of the combined wide table.
    pub combined_path: PathBuf,
    /// Requests issued before each cooldown.
    pub batch_size: usize,
    pub cooldown_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// First day of the combined calendar.
    pub calendar_start: NaiveDate,
    /// Drop calendar rows with no data in any column.
    pub drop_empty_rows: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indicators_dir: PathBuf::from("macro-indicators"),
            combined_path: PathBuf::from("macro-indicators-concatenated.csv"),
            batch_size: 120,
            cooldown_secs: 60,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            calendar_start: NaiveDate::from_ymd_opt(2008, 12, 31).expect("valid epoch"),
            drop_empty_rows: false,
        }
    }
}

impl Config {
    /// Load from a YAML file; missing keys keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: Config = if text.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(text)?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(MacroError::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
