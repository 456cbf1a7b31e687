//! trf CLI application entry point
//!
//! Reads timestamps from the first and last lines of each file and prints the
//! paths of files whose time range overlaps the requested one.
//!
//! # Usage
//!
//! ```bash
//! # Logs written to today
//! trf -e '%Y-%m-%d %H:%M:%S' today *.log
//!
//! # Paths from stdin, 8 workers, the last 30 minutes
//! find . -name '*.log' | trf -j 8 -f - -- -30m
//!
//! # Explicit window, without touching the cache
//! trf --cache '' '2024-03-01 08:00:00,2024-03-01 18:00:00' app.log
//! ```
//!
//! # Configuration
//!
//! Defaults are read from the user's config directory
//! (`~/.config/trf/config.toml` on Linux) or from `--config`.

use chrono::Local;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use trf::{
    TrfError,
    cache::Cache,
    cli::{Cli, build_extractors, range::parse_time_range},
    config::TrfConfig,
    filter::{Filter, FilterConfig},
    output::{Reporter, StderrReporter},
};

type Result<T> = std::result::Result<T, TrfError>;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            StderrReporter::new(false).error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => TrfConfig::config_path()?,
    };
    let settings = cli.apply(TrfConfig::load(&config_path)?);

    if settings.extractors.is_empty() {
        return Err(TrfError::InvalidInput(
            "no extractor given (use -e/--extractor or set 'extractors' in the config file)".into(),
        ));
    }
    let extractors = build_extractors(&settings.extractors)?;
    let time_range = parse_time_range(&cli.range, Local::now())?;
    let mut input = cli.input()?;

    let reporter: Arc<dyn Reporter> = Arc::new(StderrReporter::new(settings.debug));
    let cache = Cache::open(&settings.cache_file, settings.cache, Arc::clone(&reporter));

    let config = FilterConfig {
        time_range,
        extractors,
        lines: settings.lines,
        concurrency: settings.jobs(),
    };
    let result = Filter::new(config, &cache, Arc::clone(&reporter)).run(input.as_mut(), io::stdout());
    cache.close();

    let stats = result?;
    reporter.debug(&format!(
        "paths:{} cache hits:{} extracted:{} skipped:{} emitted:{}",
        stats.paths, stats.cache_hits, stats.extracted, stats.skipped, stats.emitted
    ));
    Ok(())
}
