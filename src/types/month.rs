use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// A calendar month, the unit the diary pages are published in.
///
/// Ordering follows the calendar: years first, then months.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Month(pub i32, pub u32);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonthParseError {
    #[error("Expected a month in MM.YYYY form, got '{0}'")]
    Format(String),
    #[error("Month number {0} is outside 1..=12")]
    OutOfRange(u32),
    #[error("Year {0} is outside the supported calendar range")]
    YearOutOfRange(i32),
}

impl Month {
    pub fn new(month: u32, year: i32) -> Result<Self, MonthParseError> {
        if !(1..=12).contains(&month) {
            return Err(MonthParseError::OutOfRange(month));
        }
        if !(NaiveDate::MIN.year()..=NaiveDate::MAX.year()).contains(&year) {
            return Err(MonthParseError::YearOutOfRange(year));
        }
        Ok(Self(year, month))
    }

    pub fn year(self) -> i32 {
        self.0
    }

    pub fn month(self) -> u32 {
        self.1
    }

    /// The month following this one, rolling over into January of the next year.
    pub fn next(self) -> Self {
        if self.1 == 12 {
            Self(self.0.saturating_add(1), 1)
        } else {
            Self(self.0, self.1 + 1)
        }
    }

    /// Inclusive number of months from `self` to `end`. Zero when `end` precedes `self`.
    pub fn months_until(self, end: Month) -> u32 {
        let diff = (i64::from(end.0) - i64::from(self.0)) * 12 + i64::from(end.1)
            - i64::from(self.1)
            + 1;
        u32::try_from(diff.max(0)).unwrap_or(u32::MAX)
    }

    /// `YYYYMM`, as used in output file names.
    pub fn compact(self) -> String {
        format!("{:04}{:02}", self.0, self.1)
    }

    /// `MM.YYYY`, the form users type and status lines show.
    pub fn dotted(self) -> String {
        format!("{:02}.{:04}", self.1, self.0)
    }
}

impl From<NaiveDate> for Month {
    fn from(date: NaiveDate) -> Self {
        Self(date.year(), date.month())
    }
}

impl FromStr for Month {
    type Err = MonthParseError;

    /// Parses `MM.YYYY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, year) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| MonthParseError::Format(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| MonthParseError::Format(s.to_string()))?;
        let year: i32 = year
            .parse()
            .map_err(|_| MonthParseError::Format(s.to_string()))?;
        Month::new(month, year)
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0, self.1)
    }
}
