//! Extraction pipeline
//!
//! Runs an ordered list of extractors over candidate lines: the head of a
//! file yields its start, the tail its end.

use super::Extractor;
use super::reader::read_lines;
use crate::output::Reporter;
use crate::time_range::TimeRange;
use chrono::{DateTime, Local};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Which end of a file the candidate lines came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Head,
    Tail,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("head"),
            Self::Tail => f.write_str("tail"),
        }
    }
}

/// Ordered extractors plus the number of lines to examine per side
pub struct Pipeline {
    extractors: Vec<Extractor>,
    lines: usize,
    reporter: Arc<dyn Reporter>,
}

impl Pipeline {
    #[must_use]
    pub fn new(extractors: Vec<Extractor>, lines: usize, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            extractors,
            lines,
            reporter,
        }
    }

    /// First timestamp any extractor finds, trying lines in order and
    /// extractors in order for each line
    ///
    /// Returns `None` (unknown) and reports a warning when nothing matches.
    pub fn extract_time(&self, lines: &[String], file: &Path, side: Side) -> Option<DateTime<Local>> {
        for (i, line) in lines.iter().enumerate() {
            for (j, extractor) in self.extractors.iter().enumerate() {
                if let Some(t) = extractor.extract(line) {
                    self.reporter
                        .debug(&format!("  extractor {j} hit on {side} line {i} -> {line}"));
                    return Some(t);
                }
                self.reporter
                    .debug(&format!("  extractor {j} miss on {side} line {i} -> {line}"));
            }
        }

        self.reporter.warning(&format!(
            "no timestamp found (file:'{}', side:{side}, lines:{})",
            file.display(),
            lines.len()
        ));
        None
    }

    /// Time range covered by the file at `file`
    ///
    /// Returns `None` after reporting an error when the file cannot be read or
    /// its start lies after its end.
    pub fn extract_time_range(&self, file: &Path) -> Option<TimeRange> {
        let lines = match read_lines(file, self.lines) {
            Ok(lines) => lines,
            Err(e) => {
                self.reporter.error(&format!(
                    "extracting file time range failed (file:'{}', reason:'{e}')",
                    file.display()
                ));
                return None;
            }
        };

        let range = TimeRange::new(
            self.extract_time(&lines.head, file, Side::Head),
            self.extract_time(&lines.tail, file, Side::Tail),
        );
        if range.is_inverted() {
            self.reporter.error(&format!(
                "file time range is inverted (file:'{}', range:{range})",
                file.display()
            ));
            return None;
        }
        Some(range)
    }
}
