//! Turns the records of one stream into an ordered step function indexed by period end.

use crate::types::record::{RawRecord, StreamKey, StreamLabels};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};

/// One boundary of a step function: `value` is the value valid *up to* `period_to`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub period_to: NaiveDateTime,
    pub value: Option<f64>,
    pub last_update: Option<NaiveDateTime>,
    pub labels: StreamLabels,
}

/// A stream resolved into a step function over its canonical timeline.
///
/// There is one [`Step`] per distinct instant at which any record of the stream starts
/// or ends, in strictly increasing order. Values are missing exactly at instants where
/// no authoritative record ends; descriptive labels are filled on every step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFunction {
    pub(crate) key: StreamKey,
    pub(crate) steps: Vec<Step>,
}

impl StepFunction {
    /// Builds the step function of one stream.
    ///
    /// All `records` are expected to share `key`; grouping is the caller's job
    /// (see [`crate::group_by_stream`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use gastp::{Indicator, RawRecord, StepFunction};
    ///
    /// let at = |d| NaiveDate::from_ymd_opt(2021, 1, d).unwrap().and_hms_opt(6, 0, 0).unwrap();
    /// let record = RawRecord {
    ///     indicator: Indicator::PhysicalFlow,
    ///     operator_key: "DE-TSO-0001".into(),
    ///     operator_label: "GASCADE".into(),
    ///     point_key: "ITP-00111".into(),
    ///     point_label: "Greifswald".into(),
    ///     direction_key: "entry".into(),
    ///     period_from: at(1),
    ///     period_to: at(2),
    ///     last_update: Some(at(2)),
    ///     value: Some(1230.0),
    /// };
    ///
    /// let steps = StepFunction::build(record.stream_key(), &[record]);
    /// assert_eq!(steps.len(), 2);
    /// assert_eq!(steps.steps()[0].value, None);
    /// assert_eq!(steps.steps()[1].value, Some(1230.0));
    /// ```
    pub fn build(key: StreamKey, records: &[RawRecord]) -> Self {
        let timeline: BTreeSet<NaiveDateTime> = records
            .iter()
            .flat_map(|r| [r.period_from, r.period_to])
            .collect();

        let latest: BTreeMap<NaiveDateTime, RawRecord> = latest_revisions(records)
            .into_iter()
            .map(|r| (r.period_to, r))
            .collect();

        let rows: Vec<(NaiveDateTime, Option<&RawRecord>)> = timeline
            .into_iter()
            .map(|instant| (instant, latest.get(&instant)))
            .collect();

        let labels = fill_labels(rows.iter().map(|(_, r)| r.map(RawRecord::labels)).collect());

        let steps = rows
            .into_iter()
            .zip(labels)
            .map(|((period_to, record), labels)| Step {
                period_to,
                value: record.and_then(|r| r.value),
                last_update: record.and_then(|r| r.last_update),
                labels,
            })
            .collect();

        Self { key, steps }
    }

    pub fn key(&self) -> &StreamKey {
        &self.key
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Labels of the stream, or empty labels if the step function has no steps.
    pub fn labels(&self) -> StreamLabels {
        self.steps
            .first()
            .map(|s| s.labels.clone())
            .unwrap_or_default()
    }

    /// The records this step function describes: one per pair of consecutive
    /// steps, spanning from the earlier instant to the later one and carrying
    /// the later step's value and revision. Gaps come out as records without a value.
    pub fn to_records(&self) -> Vec<RawRecord> {
        self.steps
            .windows(2)
            .map(|pair| RawRecord {
                indicator: self.key.indicator,
                operator_key: self.key.operator_key.clone(),
                operator_label: pair[1].labels.operator_label.clone(),
                point_key: self.key.point_key.clone(),
                point_label: pair[1].labels.point_label.clone(),
                direction_key: self.key.direction_key.clone(),
                period_from: pair[0].period_to,
                period_to: pair[1].period_to,
                last_update: pair[1].last_update,
                value: pair[1].value,
            })
            .collect()
    }
}

/// Keeps, for every distinct `period_to`, only the record with the latest
/// `last_update`. The result is ordered by `period_to`.
///
/// Records without a revision timestamp lose against any dated revision; among
/// equally dated revisions the one appearing last in the input wins.
pub fn latest_revisions(records: &[RawRecord]) -> Vec<RawRecord> {
    let mut sorted: Vec<&RawRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.period_to
            .cmp(&b.period_to)
            .then_with(|| a.last_update.cmp(&b.last_update))
    });

    let mut latest: Vec<RawRecord> = Vec::with_capacity(sorted.len());
    for record in sorted {
        match latest.last_mut() {
            Some(previous) if previous.period_to == record.period_to => *previous = record.clone(),
            _ => latest.push(record.clone()),
        }
    }
    latest
}

/// Forward fill, then backward fill.
fn fill_labels(mut labels: Vec<Option<StreamLabels>>) -> Vec<StreamLabels> {
    let mut carry: Option<StreamLabels> = None;
    for slot in labels.iter_mut() {
        if slot.is_some() {
            carry.clone_from(slot);
        } else {
            slot.clone_from(&carry);
        }
    }
    carry = None;
    for slot in labels.iter_mut().rev() {
        if slot.is_some() {
            carry.clone_from(slot);
        } else {
            slot.clone_from(&carry);
        }
    }
    labels.into_iter().map(Option::unwrap_or_default).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::test_support::{at, key, record};

    #[test]
    fn test_timeline_includes_every_boundary() {
        let records = vec![
            record("2021-01-01", "2021-01-03", Some(1.0), "2021-01-03 10:00"),
            record("2021-01-05", "2021-01-07", Some(2.0), "2021-01-07 10:00"),
        ];
        let steps = StepFunction::build(key(), &records);
        let instants: Vec<NaiveDateTime> = steps.steps().iter().map(|s| s.period_to).collect();
        assert_eq!(
            instants,
            vec![at("2021-01-01"), at("2021-01-03"), at("2021-01-05"), at("2021-01-07")]
        );
        let values: Vec<Option<f64>> = steps.steps().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![None, Some(1.0), None, Some(2.0)]);
    }

    #[test]
    fn test_latest_revision_wins() {
        let records = vec![
            record("2021-01-01", "2021-01-02", Some(5.0), "2021-01-02 12:00"),
            record("2021-01-01", "2021-01-02", Some(7.0), "2021-01-03 08:00"),
            record("2021-01-01", "2021-01-02", Some(6.0), "2021-01-02 18:00"),
        ];
        let latest = latest_revisions(&records);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].value, Some(7.0));

        let steps = StepFunction::build(key(), &records);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps.steps()[1].value, Some(7.0));
        assert_eq!(steps.steps()[1].last_update, Some(at("2021-01-03 08:00")));
    }

    #[test]
    fn test_undated_revision_loses() {
        let mut undated = record("2021-01-01", "2021-01-02", Some(9.0), "2021-01-02 12:00");
        undated.last_update = None;
        let records = vec![
            record("2021-01-01", "2021-01-02", Some(5.0), "2021-01-02 12:00"),
            undated,
        ];
        assert_eq!(latest_revisions(&records)[0].value, Some(5.0));
    }

    #[test]
    fn test_labels_are_filled_on_gap_rows() {
        let records = vec![
            record("2021-01-01", "2021-01-03", Some(1.0), "2021-01-03 10:00"),
            record("2021-01-05", "2021-01-07", Some(2.0), "2021-01-07 10:00"),
        ];
        let steps = StepFunction::build(key(), &records);
        let expected = records[0].labels();
        assert!(steps.steps().iter().all(|s| s.labels == expected));
    }

    #[test]
    fn test_rebuilding_is_idempotent() {
        let records = vec![
            record("2021-01-01", "2021-01-02", Some(5.0), "2021-01-02 12:00"),
            record("2021-01-01", "2021-01-02", Some(7.0), "2021-01-03 08:00"),
            record("2021-01-02", "2021-01-04", None, "2021-01-04 08:00"),
            record("2021-01-06", "2021-01-07", Some(3.0), "2021-01-07 08:00"),
        ];
        let once = StepFunction::build(key(), &records);
        let twice = StepFunction::build(key(), &once.to_records());
        assert_eq!(once, twice);

        let deduped = latest_revisions(&records);
        assert_eq!(latest_revisions(&deduped), deduped);
    }

    #[test]
    fn test_empty_stream() {
        let steps = StepFunction::build(key(), &[]);
        assert!(steps.is_empty());
        assert!(steps.to_records().is_empty());
        assert_eq!(steps.labels(), StreamLabels::default());
    }
}
