//! Timestamp extraction
//!
//! An [`Extractor`] pairs an optional regular expression with a `strftime`
//! style time format. The regex narrows a line down to the text holding the
//! timestamp (its first capture group, or the whole match when it has none),
//! and the format reads that text as a local timestamp.
//!
//! Extractors are built once from the command line and shared read-only by
//! all scan workers.
//!
//! # Examples
//!
//! ```
//! use trf::extract::Extractor;
//!
//! let extractor: Extractor = r"^(\d{4}-\d{2}-\d{2})@%Y-%m-%d".parse().unwrap();
//! assert!(extractor.extract("2023-01-05 boot").is_some());
//! assert!(extractor.extract("boot").is_none());
//! ```

pub mod error;
pub mod pipeline;
pub mod reader;

pub use error::ExtractorError;
pub use pipeline::{Pipeline, Side};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;
use std::str::FromStr;

/// Rewrites applied to user formats before handing them to chrono
const FORMAT_SUBSTITUTIONS: &[(&str, &str)] = &[
    // Fraction written after a literal dot, e.g. `%S.%f`
    (".%f", "%.f"),
];

/// Translate a user time format into a chrono parsing template
///
/// Unknown placeholders are left untouched.
#[must_use]
pub fn convert_time_format(format: &str) -> String {
    FORMAT_SUBSTITUTIONS
        .iter()
        .fold(format.to_string(), |f, (from, to)| f.replace(from, to))
}

/// Pattern and time format pair
#[derive(Debug, Clone)]
pub struct Extractor {
    pattern: Option<Regex>,
    format: String,
}

impl Extractor {
    /// Build an extractor; an empty `pattern` means the whole line is parsed
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::InvalidPattern` if the pattern is not a valid regex.
    pub fn new(pattern: &str, format: &str) -> Result<Self, ExtractorError> {
        let pattern = if pattern.is_empty() {
            None
        } else {
            let regex = Regex::new(pattern)
                .map_err(|e| ExtractorError::regex_compile(pattern, &e.to_string()))?;
            Some(regex)
        };

        Ok(Self {
            pattern,
            format: convert_time_format(format),
        })
    }

    /// The chrono template this extractor parses with
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Extract a timestamp from `line`
    ///
    /// Time-only formats are anchored to the current day.
    #[must_use]
    pub fn extract(&self, line: &str) -> Option<DateTime<Local>> {
        self.extract_on(line, Local::now().date_naive())
    }

    /// Same as [`extract`](Self::extract), anchoring time-only formats to `today`
    #[must_use]
    pub fn extract_on(&self, line: &str, today: NaiveDate) -> Option<DateTime<Local>> {
        let text = self.candidate(line)?;
        parse_local(text, &self.format, today)
    }

    fn candidate<'l>(&self, line: &'l str) -> Option<&'l str> {
        let Some(regex) = &self.pattern else {
            return Some(line);
        };

        let captures = regex.captures(line)?;
        if captures.len() > 1 {
            Some(captures.get(1).map_or("", |m| m.as_str()))
        } else {
            captures.get(0).map(|m| m.as_str())
        }
    }
}

impl FromStr for Extractor {
    type Err = ExtractorError;

    /// Parse `pattern@format`, or a bare `format`
    ///
    /// Splits at the first `@`, so formats may contain `@` but patterns may not.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        match spec.split_once('@') {
            Some((pattern, format)) => Self::new(pattern, format),
            None => Self::new("", spec),
        }
    }
}

fn parse_local(text: &str, format: &str, today: NaiveDate) -> Option<DateTime<Local>> {
    if let Ok(t) = DateTime::parse_from_str(text, format) {
        return Some(t.with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(text, format)
        .or_else(|_| NaiveDate::parse_from_str(text, format).map(|d| d.and_time(NaiveTime::MIN)))
        .or_else(|_| NaiveTime::parse_from_str(text, format).map(|t| today.and_time(t)))
        .ok()?;

    Local.from_local_datetime(&naive).earliest()
}
