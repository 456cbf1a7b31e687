//! Time range expressions
//!
//! Parses the query range given on the command line:
//!
//! - `today`, `yesterday`: that whole local day
//! - `FROM[,TO]`: each point is empty (now), `-` (unbounded), `+DUR` / `-DUR`
//!   (offset from the other point), `YYYY-MM-DD HH:MM:SS`,
//!   `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD` or `HH:MM:SS` (today)
//!
//! Offsets are applied to the concrete `FROM` if there is one, else to the
//! concrete `TO`, else to now. A missing `TO` means now.
//!
//! ```
//! use chrono::{Local, TimeZone};
//! use trf::cli::range::parse_time_range;
//!
//! let now = Local.with_ymd_and_hms(2023, 1, 5, 12, 0, 0).unwrap();
//! let range = parse_time_range("-1h30m", now).unwrap();
//! assert_eq!(range.to_string(), "[2023-01-05 10:30:00, 2023-01-05 12:00:00]");
//! ```

use crate::time_range::TimeRange;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Length of `YYYY-MM-DD HH:MM:SS`
const DATE_TIME_LEN: usize = 19;

/// Errors produced while parsing a time range expression
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RangeError {
    /// More than two comma separated points
    #[error("incorrect time range '{0}'")]
    Incorrect(String),
    /// A point is neither a date, a time, an offset nor `-`
    #[error("invalid time point '{0}'")]
    InvalidPoint(String),
    /// An offset could not be read as a duration
    #[error("invalid duration '{0}'")]
    InvalidDuration(String),
    /// The resolved start lies after the resolved end
    #[error("time range '{0}' starts after it ends")]
    Inverted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Point {
    Unbounded,
    At(DateTime<Local>),
    Offset(TimeDelta),
}

impl Point {
    const fn concrete(self) -> Option<DateTime<Local>> {
        match self {
            Self::At(t) => Some(t),
            Self::Unbounded | Self::Offset(_) => None,
        }
    }

    fn resolve(self, reference: DateTime<Local>) -> Result<Option<DateTime<Local>>, RangeError> {
        match self {
            Self::Unbounded => Ok(None),
            Self::At(t) => Ok(Some(t)),
            Self::Offset(offset) => reference
                .checked_add_signed(offset)
                .map(Some)
                .ok_or_else(|| RangeError::InvalidDuration(offset.to_string())),
        }
    }
}

/// Parse a time range expression relative to `now`
///
/// # Errors
///
/// Returns `RangeError` if the expression has more than two points, a point
/// cannot be parsed, or the resolved range is inverted.
pub fn parse_time_range(expr: &str, now: DateTime<Local>) -> Result<TimeRange, RangeError> {
    match expr {
        "today" => return whole_day(now.date_naive(), expr),
        "yesterday" => {
            let day = now
                .date_naive()
                .pred_opt()
                .ok_or_else(|| RangeError::Incorrect(expr.to_string()))?;
            return whole_day(day, expr);
        }
        _ => {}
    }

    let parts: Vec<&str> = expr.split(',').collect();
    let (from, to) = match parts.as_slice() {
        [from] => (*from, ""),
        [from, to] => (*from, *to),
        _ => return Err(RangeError::Incorrect(expr.to_string())),
    };

    let from = parse_point(from, now)?;
    let to = parse_point(to, now)?;
    let reference = from.concrete().or(to.concrete()).unwrap_or(now);

    let range = TimeRange::new(from.resolve(reference)?, to.resolve(reference)?);
    if range.is_inverted() {
        return Err(RangeError::Inverted(expr.to_string()));
    }
    Ok(range)
}

fn whole_day(day: NaiveDate, expr: &str) -> Result<TimeRange, RangeError> {
    let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
        .ok_or_else(|| RangeError::Incorrect(expr.to_string()))?;
    let from = local(day.and_time(NaiveTime::MIN), expr)?;
    let to = local(day.and_time(last), expr)?;
    Ok(TimeRange::new(Some(from), Some(to)))
}

fn local(naive: NaiveDateTime, text: &str) -> Result<DateTime<Local>, RangeError> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| RangeError::InvalidPoint(text.to_string()))
}

fn parse_point(text: &str, now: DateTime<Local>) -> Result<Point, RangeError> {
    if text.is_empty() {
        return Ok(Point::At(now));
    }
    if text == "-" {
        return Ok(Point::Unbounded);
    }
    if let Some(rest) = text.strip_prefix('+') {
        return Ok(Point::Offset(parse_duration(rest)?));
    }
    if let Some(rest) = text.strip_prefix('-') {
        return Ok(Point::Offset(-parse_duration(rest)?));
    }

    // Date and time may be separated by a space or a `T`.
    if text.len() == DATE_TIME_LEN && text.is_char_boundary(10) && text.is_char_boundary(11) {
        let joined = format!("{}T{}", &text[..10], &text[11..]);
        if let Ok(naive) = NaiveDateTime::parse_from_str(&joined, DATE_TIME_FORMAT) {
            return local(naive, text).map(Point::At);
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return local(day.and_time(NaiveTime::MIN), text).map(Point::At);
    }
    if let Ok(time) = NaiveTime::parse_from_str(text, TIME_FORMAT) {
        return local(now.date_naive().and_time(time), text).map(Point::At);
    }
    Err(RangeError::InvalidPoint(text.to_string()))
}

/// Parse a duration such as `90s`, `1h30m` or `1.5h`
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is accepted.
///
/// # Errors
///
/// Returns `RangeError::InvalidDuration` for anything else.
pub fn parse_duration(text: &str) -> Result<TimeDelta, RangeError> {
    let invalid = || RangeError::InvalidDuration(text.to_string());
    if text == "0" {
        return Ok(TimeDelta::zero());
    }
    if text.is_empty() {
        return Err(invalid());
    }

    let mut nanos = 0f64;
    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];
        nanos += value * scale;
    }

    if !nanos.is_finite() || nanos > i64::MAX as f64 {
        return Err(invalid());
    }
    #[allow(clippy::cast_possible_truncation)]
    let nanos = nanos.round() as i64;
    Ok(TimeDelta::nanoseconds(nanos))
}
