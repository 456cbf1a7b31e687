//! trf - filter files by the time range of their contents
//!
//! This library reads timestamps from the first and last lines of each file,
//! keeps only files whose time range overlaps a query range, and remembers
//! extracted ranges in an embedded database so unchanged files are not read
//! again on the next run.

use thiserror::Error;

pub mod cache;
pub mod cli;
pub mod config;
pub mod extract;
pub mod filter;
pub mod input;
pub mod output;
pub mod time_range;

#[cfg(test)]
pub mod testing;

pub use time_range::TimeRange;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum TrfError {
    /// Extractor specification error
    #[error("Invalid extractor: {0}")]
    ExtractorError(#[from] extract::ExtractorError),
    /// Time range expression error
    #[error("Invalid time range: {0}")]
    RangeError(#[from] cli::range::RangeError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Worker pool could not be started
    #[error("Worker pool error: {0}")]
    PoolError(#[from] rayon::ThreadPoolBuildError),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
