//! Command-line interface definitions and parsing
//!
//! `trf [OPTIONS] <RANGE> [FILES]...`
//!
//! Prints every file whose contents span a time range overlapping `RANGE`.
//! Paths come from `FILES`, or one per line from `--file` (`-` for standard
//! input). Command-line values override the configuration file.
//!
//! # Examples
//!
//! ```bash
//! # Files with entries from today
//! trf -e '%Y-%m-%d %H:%M:%S' today /var/log/app/*.log
//!
//! # Last two hours; a range starting with '-' goes after `--`
//! find /var/log -name '*.log' | trf -f - -j 8 -- -2h
//!
//! # Syslog style lines, timestamp picked out by a capture group
//! trf -e '^(\w{3} [ \d]\d \d\d:\d\d:\d\d)@%b %e %H:%M:%S' 2024-03-01,2024-03-02 syslog*
//! ```

pub mod range;

use crate::cache::CacheMode;
use crate::config::TrfConfig;
use crate::extract::{Extractor, ExtractorError};
use crate::input::{Input, ListInput, ReaderInput};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "trf")]
#[command(about = "Filter files by the time range of their contents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Time range: today, yesterday or FROM[,TO] (use `--` before a range starting with '-')
    #[arg(value_name = "RANGE")]
    pub range: String,

    /// Files to check (ignored with --file)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Timestamp extractor as `pattern@format` or `format` (repeatable)
    #[arg(short = 'e', long = "extractor", value_name = "SPEC")]
    pub extractors: Vec<String>,

    /// Read paths from FILE, one per line ('-' for stdin)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Concurrent extractions
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// Non-empty lines examined at each end of a file
    #[arg(short = 'n', long = "lines", value_name = "N")]
    pub lines: Option<usize>,

    /// Print debug trace lines
    #[arg(long = "debug")]
    pub debug: bool,

    /// Cache mode: '' (off), r, w or rw
    #[arg(long = "cache", value_name = "MODE")]
    pub cache: Option<CacheMode>,

    /// Cache database location
    #[arg(long = "cache-file", value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Configuration file
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Overlay the command-line values on `config`
    #[must_use]
    pub fn apply(&self, mut config: TrfConfig) -> TrfConfig {
        if !self.extractors.is_empty() {
            config.extractors.clone_from(&self.extractors);
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(lines) = self.lines {
            config.lines = lines;
        }
        if let Some(cache) = self.cache {
            config.cache = cache;
        }
        if let Some(cache_file) = &self.cache_file {
            config.cache_file.clone_from(cache_file);
        }
        config.debug |= self.debug;
        config
    }

    /// Source of paths to scan
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the `--file` list cannot be opened.
    pub fn input(&self) -> io::Result<Box<dyn Input>> {
        match self.file.as_deref() {
            Some(file) if file == Path::new("-") => {
                Ok(Box::new(ReaderInput::new(io::stdin().lock())))
            }
            Some(file) => Ok(Box::new(ReaderInput::new(BufReader::new(File::open(file)?)))),
            None => Ok(Box::new(ListInput::new(self.files.clone()))),
        }
    }
}

/// Build extractors from their specs, in order
///
/// # Errors
///
/// Returns `ExtractorError` for the first spec with an invalid pattern.
pub fn build_extractors(specs: &[String]) -> Result<Vec<Extractor>, ExtractorError> {
    specs.iter().map(|spec| spec.parse()).collect()
}
