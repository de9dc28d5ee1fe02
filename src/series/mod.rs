pub mod clip;
pub mod error;
pub mod grouper;
pub mod periodize;
pub mod reconstruct;
pub mod step_function;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::indicator::Indicator;
    use crate::types::record::{RawRecord, StreamKey};
    use chrono::{NaiveDate, NaiveDateTime};

    pub(crate) fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Accepts `YYYY-MM-DD` (midnight) or `YYYY-MM-DD HH:MM`.
    pub(crate) fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .unwrap_or_else(|_| date(s).and_hms_opt(0, 0, 0).unwrap())
    }

    pub(crate) fn key() -> StreamKey {
        StreamKey {
            indicator: Indicator::PhysicalFlow,
            operator_key: "DE-TSO-0001".to_string(),
            point_key: "ITP-00111".to_string(),
            direction_key: "entry".to_string(),
        }
    }

    pub(crate) fn record(from: &str, to: &str, value: Option<f64>, updated: &str) -> RawRecord {
        let key = key();
        RawRecord {
            indicator: key.indicator,
            operator_key: key.operator_key,
            operator_label: "GASCADE".to_string(),
            point_key: key.point_key,
            point_label: "Greifswald".to_string(),
            direction_key: key.direction_key,
            period_from: at(from),
            period_to: at(to),
            last_update: Some(at(updated)),
            value,
        }
    }
}
