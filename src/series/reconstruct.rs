//! Runs grouping, step-building, clipping and periodizing over a whole record store.

use crate::series::error::SeriesError;
use crate::series::grouper::group_by_stream;
use crate::series::periodize::DailySeries;
use crate::series::step_function::StepFunction;
use crate::types::record::RawRecord;
use crate::types::window::Window;
use log::{debug, info};
use tokio::task::JoinSet;

/// Whether a record can contribute anything to `window`: it must not end before
/// the window starts nor start after the window's cutoff.
fn touches_window(record: &RawRecord, window: &Window) -> bool {
    record.period_to >= window.start_instant() && record.period_from <= window.cutoff()
}

/// Builds and clips the step function of every stream with data around `window`.
///
/// Records are pre-filtered to those overlapping the window (inclusive at both ends),
/// grouped by stream, deduplicated into step functions and clipped. The result is
/// ordered by stream key. Streams without any record near the window do not appear.
pub fn reindex_by_period_endtime(records: &[RawRecord], window: &Window) -> Vec<StepFunction> {
    let relevant = records
        .iter()
        .filter(|r| touches_window(r, window))
        .cloned();
    group_by_stream(relevant)
        .into_iter()
        .map(|(key, members)| StepFunction::build(key, &members).clipped(window))
        .collect()
}

/// Periodizes previously reindexed step functions onto `window`.
pub fn periodize(step_functions: &[StepFunction], window: &Window) -> Vec<DailySeries> {
    step_functions
        .iter()
        .map(|steps| steps.periodize(window))
        .collect()
}

/// Reconstructs one dense daily series per stream over `window`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gastp::{reindex_and_periodize, Indicator, RawRecord, Window};
///
/// let midnight = |d| NaiveDate::from_ymd_opt(2021, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let flow = |from, to, value| RawRecord {
///     indicator: Indicator::PhysicalFlow,
///     operator_key: "DE-TSO-0001".into(),
///     operator_label: "GASCADE".into(),
///     point_key: "ITP-00111".into(),
///     point_label: "Greifswald".into(),
///     direction_key: "entry".into(),
///     period_from: midnight(from),
///     period_to: midnight(to),
///     last_update: Some(midnight(to)),
///     value: Some(value),
/// };
///
/// let records = vec![flow(1, 10, 100.0), flow(10, 20, 200.0)];
/// let window = Window::new("2021-01-05", "2021-01-15").unwrap();
/// let series = reindex_and_periodize(&records, &window);
///
/// assert_eq!(series.len(), 1);
/// assert_eq!(series[0].len(), 11);
/// assert_eq!(series[0].values()[0], Some(100.0));
/// assert_eq!(series[0].values()[10], Some(200.0));
/// ```
pub fn reindex_and_periodize(records: &[RawRecord], window: &Window) -> Vec<DailySeries> {
    let series = periodize(&reindex_by_period_endtime(records, window), window);
    info!(
        "Reconstructed {} streams over {} days from {} records",
        series.len(),
        window.num_days(),
        records.len()
    );
    series
}

/// Same as [`reindex_and_periodize`], with every stream processed on its own
/// blocking task. All tasks are joined before returning; the output is ordered
/// by stream key regardless of completion order.
///
/// # Errors
///
/// Returns [`SeriesError::TaskJoin`] if a worker task panics or is cancelled.
pub async fn reindex_and_periodize_concurrent(
    records: Vec<RawRecord>,
    window: Window,
) -> Result<Vec<DailySeries>, SeriesError> {
    let total = records.len();
    let groups = group_by_stream(records.into_iter().filter(|r| touches_window(r, &window)));
    debug!("Spawning {} stream tasks", groups.len());

    let mut tasks = JoinSet::new();
    for (key, members) in groups {
        tasks.spawn_blocking(move || {
            StepFunction::build(key, &members)
                .clipped(&window)
                .periodize(&window)
        });
    }

    let mut series = Vec::with_capacity(tasks.len());
    while let Some(result) = tasks.join_next().await {
        series.push(result?);
    }
    series.sort_by(|a, b| a.key().cmp(b.key()));

    info!(
        "Reconstructed {} streams over {} days from {} records",
        series.len(),
        window.num_days(),
        total
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::test_support::{date, record};
    use crate::types::indicator::Indicator;

    fn store() -> Vec<RawRecord> {
        let mut records = vec![
            record("2020-12-01", "2020-12-20", Some(9.0), "2020-12-20 10:00"),
            record("2021-01-01", "2021-01-10", Some(1.0), "2021-01-10 10:00"),
            record("2021-01-10", "2021-01-20", Some(2.0), "2021-01-20 10:00"),
            record("2021-01-10", "2021-01-20", Some(2.5), "2021-01-21 10:00"),
            record("2021-02-01", "2021-02-10", Some(3.0), "2021-02-10 10:00"),
        ];
        let mut exit = record("2021-01-01", "2021-01-31", Some(-4.0), "2021-01-31 10:00");
        exit.direction_key = "exit".to_string();
        records.push(exit);
        let mut booked = record("2021-01-01", "2021-01-31", Some(50.0), "2021-01-31 10:00");
        booked.indicator = Indicator::FirmBooked;
        records.push(booked);
        records
    }

    #[test]
    fn test_prefilter_drops_far_records() {
        let window = Window::new("2021-01-05", "2021-01-15").unwrap();
        let steps = reindex_by_period_endtime(&store(), &window);
        assert_eq!(steps.len(), 3);
        let entry = steps
            .iter()
            .find(|s| s.key().direction_key == "entry" && s.key().indicator == Indicator::PhysicalFlow)
            .unwrap();
        assert_eq!(entry.len(), 3);
        assert_eq!(entry.steps()[0].period_to.date(), date("2021-01-05"));
        assert_eq!(entry.steps()[2].period_to.date(), date("2021-01-16"));
    }

    #[test]
    fn test_every_series_spans_window() {
        let window = Window::new("2021-01-05", "2021-01-15").unwrap();
        for series in reindex_and_periodize(&store(), &window) {
            assert_eq!(series.len(), 11);
            assert_eq!(series.start(), date("2021-01-05"));
        }
    }

    #[test]
    fn test_revision_applies_after_reconstruction() {
        let window = Window::new("2021-01-05", "2021-01-15").unwrap();
        let series = reindex_and_periodize(&store(), &window);
        let entry = series
            .iter()
            .find(|s| s.key().direction_key == "entry" && s.key().indicator == Indicator::PhysicalFlow)
            .unwrap();
        assert_eq!(entry.value_on(date("2021-01-09")), Some(1.0));
        assert_eq!(entry.value_on(date("2021-01-12")), Some(2.5));
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() -> Result<(), SeriesError> {
        let window = Window::new("2021-01-01", "2021-02-28")?;
        let sequential = reindex_and_periodize(&store(), &window);
        let concurrent = reindex_and_periodize_concurrent(store(), window).await?;
        assert_eq!(sequential, concurrent);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_empty_store() -> Result<(), SeriesError> {
        let window = Window::new("2021-01-01", "2021-01-02")?;
        assert!(reindex_and_periodize_concurrent(Vec::new(), window).await?.is_empty());
        Ok(())
    }
}
