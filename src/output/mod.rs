//! Diagnostics reporting
//!
//! This module provides a backend-agnostic interface for diagnostic messages,
//! so the scan engine can log to standard error in the CLI and to an
//! in-memory buffer in tests.
//!
//! Every message is emitted as a single line, prefixed with its level:
//!
//! ```text
//! error: extracting file time range failed (file:'/var/log/a.log', reason:'...')
//! warning: no timestamp found (file:'/var/log/b.log', side:tail, lines:3)
//! debug: path: 'b.log'
//! ```

use colored::Colorize;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Trait for diagnostic output
///
/// Implementations must be shareable between scan workers, the cache janitor
/// and the reading thread, and must never interleave two messages.
pub trait Reporter: Send + Sync {
    /// Per-item failure (the item is skipped, the run continues)
    fn error(&self, message: &str);

    /// Non-fatal data quality or cache issue
    fn warning(&self, message: &str);

    /// Trace detail, dropped unless debug logging is enabled
    fn debug(&self, message: &str);
}

/// Message level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Debug,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
            Self::Debug => f.write_str("debug"),
        }
    }
}

/// CLI implementation - writes to stderr
///
/// # Examples
///
/// ```
/// use trf::output::{Reporter, StderrReporter};
///
/// let reporter = StderrReporter::new(false);
/// reporter.error("stat file failed");
/// reporter.debug("not printed");
/// ```
pub struct StderrReporter {
    debug: bool,
}

impl StderrReporter {
    /// Create a new stderr reporter
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl Reporter for StderrReporter {
    fn error(&self, message: &str) {
        eprintln!("{} {message}", "error:".red());
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {message}", "warning:".yellow());
    }

    fn debug(&self, message: &str) {
        if self.debug {
            eprintln!("{} {}", "debug:".dimmed(), message);
        }
    }
}

/// Buffered reporter that keeps every message in memory
///
/// Clones share the same buffer, so one clone can be handed to the engine
/// while another inspects what was reported.
#[derive(Clone, Default)]
pub struct BufferedReporter {
    messages: Arc<Mutex<Vec<(Level, String)>>>,
}

impl BufferedReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all messages reported so far
    #[must_use]
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of one level
    #[must_use]
    pub fn of_level(&self, level: Level) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }

    /// Whether any message of `level` contains `needle`
    #[must_use]
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.of_level(level).iter().any(|m| m.contains(needle))
    }

    fn push(&self, level: Level, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

impl Reporter for BufferedReporter {
    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }

    fn warning(&self, message: &str) {
        self.push(Level::Warning, message);
    }

    fn debug(&self, message: &str) {
        self.push(Level::Debug, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display() {
        assert_eq!(Level::Error.to_string(), "error");
        assert_eq!(Level::Warning.to_string(), "warning");
        assert_eq!(Level::Debug.to_string(), "debug");
    }

    #[test]
    fn test_buffered_reporter_shares_buffer() {
        let reporter = BufferedReporter::new();
        let handle: Arc<dyn Reporter> = Arc::new(reporter.clone());

        handle.error("first");
        handle.warning("second");
        handle.debug("third");

        assert_eq!(
            reporter.messages(),
            vec![
                (Level::Error, "first".to_string()),
                (Level::Warning, "second".to_string()),
                (Level::Debug, "third".to_string()),
            ]
        );
        assert!(reporter.contains(Level::Warning, "sec"));
        assert!(!reporter.contains(Level::Error, "sec"));
    }

    #[test]
    fn test_buffered_reporter_from_threads() {
        let reporter = BufferedReporter::new();
        std::thread::scope(|s| {
            for i in 0..8 {
                let reporter = reporter.clone();
                s.spawn(move || reporter.error(&format!("worker {i}")));
            }
        });
        assert_eq!(reporter.of_level(Level::Error).len(), 8);
    }

    #[test]
    fn test_reporter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StderrReporter>();
        assert_send_sync::<BufferedReporter>();
    }
}
