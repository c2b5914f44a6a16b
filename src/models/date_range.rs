//! Half-open date range model.
//!
//! A stay occupies the nights from check-in up to, but not including, the
//! check-out date. Two back-to-back stays where one guest checks out on the
//! same day the next guest checks in therefore do not conflict.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A half-open interval of calendar dates `[start, end)`.
///
/// The constructor enforces `start < end`, so every `DateRange` covers at
/// least one night. Deserialization goes through the same check.
///
/// # Example
///
/// ```
/// use stay_engine::models::DateRange;
/// use chrono::NaiveDate;
///
/// let first = DateRange::new(
///     NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
/// ).unwrap();
/// let second = DateRange::new(
///     NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
/// ).unwrap();
///
/// assert_eq!(first.nights(), 5);
/// assert!(!first.overlaps(&second));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    #[serde(alias = "check_in")]
    start: NaiveDate,
    #[serde(alias = "check_out")]
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = EngineError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// Creates a range, rejecting empty or inverted intervals.
    pub fn new(start: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        if start >= end {
            return Err(EngineError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The check-in date (inclusive).
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// The check-out date (exclusive).
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of nights covered. Always at least 1.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Returns true if the two ranges share at least one night.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if the night starting on `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Returns true if `other` lies entirely within this range.
    pub fn contains_range(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
