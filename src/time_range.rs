//! Time range model
//!
//! A [`TimeRange`] is a pair of optional local timestamps. A missing bound
//! means "unbounded" on that side: `from: None` reaches back indefinitely and
//! `to: None` reaches forward indefinitely. Ranges are plain values; every
//! file scan produces its own.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format used when rendering a range bound
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Interval between two optional timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Option<DateTime<Local>>,
    pub to: Option<DateTime<Local>>,
}

impl TimeRange {
    #[must_use]
    pub const fn new(from: Option<DateTime<Local>>, to: Option<DateTime<Local>>) -> Self {
        Self { from, to }
    }

    /// Range without any constraint on either side
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { from: None, to: None }
    }

    /// Both bounds are missing
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Both bounds are present and `from` comes after `to`
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from > to)
    }

    /// Check whether two ranges overlap
    ///
    /// A fully unbounded range on either side matches everything. A missing
    /// `to` extends to positive infinity and a missing `from` to negative
    /// infinity, with one exception: when `self` has only `from` missing, the
    /// answer depends solely on whether `other` is internally ordered. `[-, t]`
    /// therefore matches any well-formed range, even one starting after `t`.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        if self.is_unbounded() || other.is_unbounded() {
            return true;
        }

        match (self.from, self.to) {
            (None, _) => match (other.from, other.to) {
                (Some(from), Some(to)) => to >= from,
                _ => true,
            },
            (Some(from), None) => other.to.is_none_or(|to| from <= to),
            (Some(from), Some(to)) => {
                other.to.is_none_or(|other_to| from <= other_to)
                    && other.from.is_none_or(|other_from| to >= other_from)
            }
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |bound: Option<DateTime<Local>>| {
            bound.map_or_else(|| "-".to_string(), |t| t.format(DISPLAY_FORMAT).to_string())
        };
        write!(f, "[{}, {}]", render(self.from), render(self.to))
    }
}
