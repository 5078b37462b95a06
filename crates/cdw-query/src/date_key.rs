//! Integer-encoded date keys.
//!
//! Fact tables store dates as `YYYYMMDD` integers (`20240131`). Keys of zero
//! or below are sentinels for unknown or invalid dates and must never fall
//! inside a range filter.

use crate::error::QueryError;
use chrono::{Datelike, NaiveDate};

/// Encode a calendar date as a date key.
pub fn date_key(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

/// True for keys that mark an unknown date.
pub fn is_sentinel(key: i64) -> bool {
    key <= 0
}

/// Optional inclusive bounds on a date-key column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl DateRange {
    /// No bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build a range, rejecting `since` after `until`.
    pub fn new(since: Option<NaiveDate>, until: Option<NaiveDate>) -> Result<Self, QueryError> {
        if let (Some(s), Some(u)) = (since, until)
            && s > u
        {
            return Err(QueryError::invalid_argument(format!(
                "since ({}) is after until ({})",
                s, u
            )));
        }
        Ok(Self { since, until })
    }

    /// Parse ISO `YYYY-MM-DD` bounds. Blank strings count as absent.
    pub fn parse(since: Option<&str>, until: Option<&str>) -> Result<Self, QueryError> {
        Self::new(parse_bound("since", since)?, parse_bound("until", until)?)
    }

    /// True when neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    /// SQL predicates over `column`, sentinel exclusion first. Empty when
    /// unbounded.
    pub fn predicates(&self, column: &str) -> Vec<String> {
        if self.is_unbounded() {
            return Vec::new();
        }
        let mut predicates = vec![format!("{} > 0", column)];
        if let Some(since) = self.since {
            predicates.push(format!("{} >= {}", column, date_key(since)));
        }
        if let Some(until) = self.until {
            predicates.push(format!("{} <= {}", column, date_key(until)));
        }
        predicates
    }
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, QueryError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                QueryError::invalid_argument(format!(
                    "{} must be a date in YYYY-MM-DD form, got '{}'",
                    name, v
                ))
            }),
    }
}
