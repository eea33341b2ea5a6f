//! Inclusive calendar-day ranges

use chrono::{Days, NaiveDate};
use eyre::{Result, eyre};

/// Every calendar day from `start` to `end`, both inclusive.
///
/// Iteration advances exactly one day at a time. A range whose start lies
/// after its end is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// January 1 of `start_year` through December 31 of `end_year`.
    ///
    /// # Errors
    /// Returns an error if either year is outside chrono's supported range
    pub fn years(start_year: i32, end_year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(start_year, 1, 1)
            .ok_or_else(|| eyre!("Invalid start year: {}", start_year))?;
        let end = NaiveDate::from_ymd_opt(end_year, 12, 31)
            .ok_or_else(|| eyre!("Invalid end year: {}", end_year))?;
        Ok(Self::new(start, end))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of days in the range.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() as usize + 1
        }
    }

    pub fn iter(&self) -> DateIter {
        DateIter {
            next: (!self.is_empty()).then_some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = DateIter;

    fn into_iter(self) -> DateIter {
        self.iter()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Iterator over a [`DateRange`].
#[derive(Debug, Clone)]
pub struct DateIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DateIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current
            .checked_add_days(Days::new(1))
            .filter(|next| *next <= self.end);
        Some(current)
    }
}
