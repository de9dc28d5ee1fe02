//! Calendar helpers for describing analysis windows: `Year`, `Month` and the
//! `AnyDate` trait that resolves them (or plain dates) into inclusive date ranges.

use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Year(pub i32);

impl Year {
    pub fn get(self) -> i32 {
        self.0
    }
}

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Month(pub i32, pub u32);

impl Month {
    pub fn year(self) -> i32 {
        self.0
    }
    pub fn month(self) -> u32 {
        self.1
    }
    pub fn new(month: u32, year: i32) -> Self {
        Self(year, month)
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0, self.1)
    }
}

/// An inclusive range of calendar dates.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StartEndDate {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Anything that can be resolved to an inclusive range of dates.
///
/// A single date resolves to itself; a `Year` or `Month` to its first and last day.
/// Strings are parsed as `YYYY-MM-DD`.
pub trait AnyDate {
    fn get_date_range(self) -> Option<StartEndDate>;
}

impl AnyDate for NaiveDate {
    fn get_date_range(self) -> Option<StartEndDate> {
        Some(StartEndDate {
            start: self,
            end: self,
        })
    }
}

impl AnyDate for &str {
    fn get_date_range(self) -> Option<StartEndDate> {
        NaiveDate::parse_from_str(self.trim(), "%Y-%m-%d")
            .ok()?
            .get_date_range()
    }
}

impl AnyDate for String {
    fn get_date_range(self) -> Option<StartEndDate> {
        self.as_str().get_date_range()
    }
}

impl AnyDate for Year {
    fn get_date_range(self) -> Option<StartEndDate> {
        Some(StartEndDate {
            start: NaiveDate::from_ymd_opt(self.0, 1, 1)?,
            end: NaiveDate::from_ymd_opt(self.0, 12, 31)?,
        })
    }
}

impl AnyDate for Month {
    fn get_date_range(self) -> Option<StartEndDate> {
        let year = self.year();
        let month = self.month();
        Some(StartEndDate {
            start: NaiveDate::from_ymd_opt(year, month, 1)?,
            end: NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)?)?,
        })
    }
}

pub(crate) fn days_in_month(year: i32, month: u32) -> Option<u32> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let (next_month_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let first_day_of_next_month = NaiveDate::from_ymd_opt(next_month_year, next_month, 1)?;
    let last_day_of_current_month = first_day_of_next_month - Duration::days(1);
    Some(last_day_of_current_month.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2023, 12), Some(31));
        assert_eq!(days_in_month(2023, 13), None);
    }

    #[test]
    fn test_month_range() {
        let range = Month::new(4, 2022).get_date_range().unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2022, 4, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2022, 4, 30).unwrap());
    }

    #[test]
    fn test_str_range() {
        let range = "2021-10-01".get_date_range().unwrap();
        assert_eq!(range.start, range.end);
        assert!("01/10/2021".get_date_range().is_none());
    }
}
