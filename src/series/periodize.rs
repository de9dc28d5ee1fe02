//! Converts a clipped step function into a dense series with one value per calendar day.

use crate::series::step_function::StepFunction;
use crate::types::record::{StreamKey, StreamLabels};
use crate::types::window::Window;
use chrono::{NaiveDate, NaiveDateTime};

/// One stream reconstructed over an analysis window, one entry per calendar day.
///
/// The days are implicit: entry `i` belongs to `start + i days`, so the series is
/// contiguous by construction and always spans the whole window it was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    key: StreamKey,
    labels: StreamLabels,
    start: NaiveDate,
    values: Vec<Option<f64>>,
    last_updates: Vec<Option<NaiveDateTime>>,
    /// The boundary from which each day's value is valid.
    period_from: Vec<Option<NaiveDateTime>>,
}

impl DailySeries {
    pub fn key(&self) -> &StreamKey {
        &self.key
    }

    pub fn labels(&self) -> &StreamLabels {
        &self.labels
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.values.len())
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn last_updates(&self) -> &[Option<NaiveDateTime>] {
        &self.last_updates
    }

    pub fn period_from(&self) -> &[Option<NaiveDateTime>] {
        &self.period_from
    }

    /// `(date, value)` pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.dates().zip(self.values.iter().copied())
    }

    /// The value on `date`, or `None` if the day is outside the series or has no value.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        let offset = (date - self.start).num_days();
        usize::try_from(offset)
            .ok()
            .and_then(|i| self.values.get(i).copied().flatten())
    }
}

/// Moves every element one position up and wraps the first element around to
/// the end: `b[i] = a[i + 1]`, `b[n - 1] = a[0]`.
fn shift_last_row_to_first<T: Clone>(a: &[T]) -> Vec<T> {
    let mut b = a.to_vec();
    if !b.is_empty() {
        b.rotate_left(1);
    }
    b
}

struct Boundary {
    date: NaiveDate,
    period_from: NaiveDateTime,
    value: Option<f64>,
    last_update: Option<NaiveDateTime>,
}

impl StepFunction {
    /// Converts the step function into a [`DailySeries`] covering `window`.
    ///
    /// A step function is indexed by period *end*; each value is first moved onto the
    /// boundary its period *starts* at. Boundaries are then reduced to calendar days,
    /// where a later boundary on the same day replaces an earlier one, and every day of
    /// the window takes the value of the last boundary on or before it.
    ///
    /// If period boundaries are not aligned to days and change within a day across
    /// revisions, reducing to days discards the earlier sub-daily part.
    pub fn periodize(&self, window: &Window) -> DailySeries {
        let values = shift_last_row_to_first(
            &self.steps.iter().map(|s| s.value).collect::<Vec<_>>(),
        );
        let last_updates = shift_last_row_to_first(
            &self.steps.iter().map(|s| s.last_update).collect::<Vec<_>>(),
        );

        let mut boundaries: Vec<Boundary> = Vec::with_capacity(self.steps.len());
        for ((step, value), last_update) in self.steps.iter().zip(values).zip(last_updates) {
            let boundary = Boundary {
                date: step.period_to.date(),
                period_from: step.period_to,
                value,
                last_update,
            };
            match boundaries.last_mut() {
                Some(previous) if previous.date == boundary.date => *previous = boundary,
                _ => boundaries.push(boundary),
            }
        }

        let days = window.num_days();
        let mut series = DailySeries {
            key: self.key.clone(),
            labels: self.labels(),
            start: window.start(),
            values: Vec::with_capacity(days),
            last_updates: Vec::with_capacity(days),
            period_from: Vec::with_capacity(days),
        };

        let mut in_effect: Option<&Boundary> = None;
        let mut pending = boundaries.iter().peekable();
        for day in window.days() {
            while let Some(next) = pending.next_if(|b| b.date <= day) {
                in_effect = Some(next);
            }
            series.values.push(in_effect.and_then(|b| b.value));
            series.last_updates.push(in_effect.and_then(|b| b.last_update));
            series.period_from.push(in_effect.map(|b| b.period_from));
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::test_support::{at, date, key, record};

    #[test]
    fn test_shift_last_row_to_first() {
        assert_eq!(shift_last_row_to_first(&[1, 2, 3, 4]), vec![2, 3, 4, 1]);
        assert_eq!(shift_last_row_to_first(&[7]), vec![7]);
        assert!(shift_last_row_to_first::<i32>(&[]).is_empty());
    }

    #[test]
    fn test_boundary_clipping_example() {
        let window = Window::new("2021-01-05", "2021-01-15").unwrap();
        let records = [
            record("2021-01-01", "2021-01-10", Some(10.0), "2021-01-10 09:00"),
            record("2021-01-10", "2021-01-20", Some(20.0), "2021-01-20 09:00"),
        ];
        let series = StepFunction::build(key(), &records)
            .clipped(&window)
            .periodize(&window);

        assert_eq!(series.len(), 11);
        assert_eq!(series.start(), date("2021-01-05"));
        assert_eq!(series.dates().last(), Some(date("2021-01-15")));
        assert_eq!(series.values()[..5], [Some(10.0); 5]);
        assert_eq!(series.values()[5..], [Some(20.0); 6]);
        assert_eq!(series.period_from()[0], Some(at("2021-01-05")));
        assert_eq!(series.last_updates()[10], Some(at("2021-01-20 09:00")));
    }

    #[test]
    fn test_gap_is_missing_and_trailing_days_are_missing() {
        let window = Window::new("2021-01-01", "2021-01-08").unwrap();
        let records = [
            record("2021-01-01", "2021-01-03", Some(1.0), "2021-01-03 10:00"),
            record("2021-01-04", "2021-01-06", Some(2.0), "2021-01-06 10:00"),
        ];
        let series = StepFunction::build(key(), &records)
            .clipped(&window)
            .periodize(&window);
        assert_eq!(
            series.values(),
            &[
                Some(1.0),
                Some(1.0),
                None,
                Some(2.0),
                Some(2.0),
                None,
                None,
                None
            ]
        );
    }

    #[test]
    fn test_sub_daily_boundaries_keep_last_of_day() {
        let window = Window::new("2021-10-01", "2021-10-03").unwrap();
        let records = [
            record("2021-09-30 06:00", "2021-10-01 06:00", Some(1.0), "2021-10-01 10:00"),
            record("2021-10-01 06:00", "2021-10-01 07:00", Some(2.0), "2021-10-01 10:00"),
            record("2021-10-01 07:00", "2021-10-02 07:00", Some(3.0), "2021-10-02 10:00"),
        ];
        let series = StepFunction::build(key(), &records)
            .clipped(&window)
            .periodize(&window);
        assert_eq!(series.values(), &[Some(3.0), None, None]);
        assert_eq!(series.period_from()[0], Some(at("2021-10-01 07:00")));
    }

    #[test]
    fn test_empty_stream_spans_window() {
        let window = Window::new("2021-01-01", "2021-01-31").unwrap();
        let series = StepFunction::build(key(), &[]).periodize(&window);
        assert_eq!(series.len(), 31);
        assert!(series.values().iter().all(Option::is_none));
    }

    #[test]
    fn test_window_after_known_data_is_all_missing() {
        let window = Window::new("2021-02-01", "2021-02-03").unwrap();
        let records = [record("2021-01-01", "2021-01-05", Some(1.0), "2021-01-05 10:00")];
        let series = StepFunction::build(key(), &records)
            .clipped(&window)
            .periodize(&window);
        assert_eq!(series.values(), &[None, None, None]);
    }

    #[test]
    fn test_value_on() {
        let window = Window::new("2021-01-05", "2021-01-15").unwrap();
        let records = [record("2021-01-01", "2021-01-20", Some(4.0), "2021-01-20 09:00")];
        let series = StepFunction::build(key(), &records)
            .clipped(&window)
            .periodize(&window);
        assert_eq!(series.value_on(date("2021-01-07")), Some(4.0));
        assert_eq!(series.value_on(date("2021-01-04")), None);
        assert_eq!(series.value_on(date("2021-01-16")), None);
    }
}
