use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use macroscraper::{
    config::Config,
    fetch::{HttpSource, ThreadPause},
    pipeline,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fetch macro-economic indicators and combine them into one daily table"
)]
struct Args {
    /// File with one API locator per line; `#` starts a comment.
    locators: Option<PathBuf>,
    /// Optional YAML configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Drop calendar rows with no data in any column.
    #[arg(long)]
    drop_empty: bool,
    /// Skip fetching; rebuild the combined table from existing indicator files.
    #[arg(long)]
    combine_only: bool,
}

fn read_locators(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading locators from {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    let args = Args::parse();

    // ─── 2) configuration ────────────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => Config::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if args.drop_empty {
        config.drop_empty_rows = true;
    }
    let today = Local::now().date_naive();

    // ─── 3) combine existing tables only ─────────────────────────────
    if args.combine_only {
        let combined = pipeline::combine_only(&config, today).context("combining tables")?;
        info!(
            rows = combined.num_rows(),
            columns = combined.columns.len(),
            path = %config.combined_path.display(),
            "done"
        );
        return Ok(());
    }

    // ─── 4) full run ─────────────────────────────────────────────────
    let locators_path = args
        .locators
        .as_ref()
        .context("a locators file is required unless --combine-only is given")?;
    let locators = read_locators(locators_path)?;
    info!(count = locators.len(), "locators loaded");

    let source = HttpSource::new(&config.user_agent, config.request_timeout())
        .context("building HTTP client")?;
    let summary = pipeline::run(&config, &source, &mut ThreadPause, &locators, today)
        .context("pipeline run")?;

    for (endpoint, err) in &summary.failures {
        error!(%endpoint, %err, "not included in combined table");
    }
    info!(
        documents = summary.documents,
        tables = summary.tables_written,
        rows = summary.combined_rows,
        columns = summary.combined_columns,
        "all done"
    );
    Ok(())
}
