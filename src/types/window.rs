use crate::series::error::SeriesError;
use crate::types::period::AnyDate;
use chrono::{Days, NaiveDate, NaiveDateTime};

/// The analysis window: an inclusive range of calendar days.
///
/// The last day is covered through its following midnight, so the instant at which
/// the window closes is [`Window::cutoff`], not `end` itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Window {
    start: NaiveDate,
    end: NaiveDate,
}

impl Window {
    /// Creates a window from any two date-like bounds.
    ///
    /// The window starts at the first day of `start` and ends at the last day of `end`,
    /// so `Window::new(Year(2022), Year(2023))` covers both years.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::DateParsing`] if a bound cannot be resolved and
    /// [`SeriesError::InvalidWindow`] if the window would end before it starts.
    ///
    /// # Examples
    ///
    /// ```
    /// use gastp::{Month, Window};
    ///
    /// let window = Window::new("2021-01-05", "2021-01-15").unwrap();
    /// assert_eq!(window.num_days(), 11);
    ///
    /// let february = Window::new(Month::new(2, 2024), Month::new(2, 2024)).unwrap();
    /// assert_eq!(february.num_days(), 29);
    /// ```
    pub fn new(start: impl AnyDate, end: impl AnyDate) -> Result<Self, SeriesError> {
        let start = start.get_date_range().ok_or(SeriesError::DateParsing)?.start;
        let end = end.get_date_range().ok_or(SeriesError::DateParsing)?.end;
        if end < start {
            return Err(SeriesError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Midnight at the start of the day after `end`.
    pub fn cutoff(&self) -> NaiveDateTime {
        self.cutoff_date().and_time(chrono::NaiveTime::MIN)
    }

    pub(crate) fn cutoff_date(&self) -> NaiveDate {
        self.end.checked_add_days(Days::new(1)).unwrap_or(self.end)
    }

    /// Midnight at the start of `start`.
    pub fn start_instant(&self) -> NaiveDateTime {
        self.start.and_time(chrono::NaiveTime::MIN)
    }

    /// Number of days in the window, `(end - start).days + 1`.
    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Every day of the window in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.num_days())
    }
}
