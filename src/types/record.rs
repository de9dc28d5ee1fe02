//! Raw records as reported by the platform, and the keys used to group them into streams.

use crate::types::indicator::Indicator;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One reported measurement, valid over the half-open interval `[period_from, period_to)`.
///
/// Several records may share the same interval end; the one with the latest
/// `last_update` is authoritative and all others are superseded revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub indicator: Indicator,
    pub operator_key: String,
    pub operator_label: String,
    pub point_key: String,
    pub point_label: String,
    pub direction_key: String,
    pub period_from: NaiveDateTime,
    pub period_to: NaiveDateTime,
    /// Revision timestamp. Records without one lose against any dated revision.
    #[serde(rename = "lastUpdateDateTime")]
    pub last_update: Option<NaiveDateTime>,
    pub value: Option<f64>,
}

impl RawRecord {
    pub fn stream_key(&self) -> StreamKey {
        StreamKey {
            indicator: self.indicator,
            operator_key: self.operator_key.clone(),
            point_key: self.point_key.clone(),
            direction_key: self.direction_key.clone(),
        }
    }

    pub fn labels(&self) -> StreamLabels {
        StreamLabels {
            operator_label: self.operator_label.clone(),
            point_label: self.point_label.clone(),
        }
    }
}

/// Identity of a stream: one indicator reported at one network point.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StreamKey {
    pub indicator: Indicator,
    pub operator_key: String,
    pub point_key: String,
    pub direction_key: String,
}

impl StreamKey {
    pub fn network_point(&self) -> NetworkPoint {
        NetworkPoint {
            operator_key: self.operator_key.clone(),
            point_key: self.point_key.clone(),
            direction_key: self.direction_key.clone(),
        }
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}/{}",
            self.indicator, self.operator_key, self.point_key, self.direction_key
        )
    }
}

/// A physical reporting point and flow direction, independent of the indicator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkPoint {
    pub operator_key: String,
    pub point_key: String,
    pub direction_key: String,
}

impl NetworkPoint {
    pub fn new(
        operator_key: impl Into<String>,
        point_key: impl Into<String>,
        direction_key: impl Into<String>,
    ) -> Self {
        Self {
            operator_key: operator_key.into(),
            point_key: point_key.into(),
            direction_key: direction_key.into(),
        }
    }

    pub fn matches(&self, key: &StreamKey) -> bool {
        self.operator_key == key.operator_key
            && self.point_key == key.point_key
            && self.direction_key == key.direction_key
    }

    /// The concatenated, lower-cased identifier the platform API expects in
    /// its `pointDirection` parameter.
    pub fn api_id(&self) -> String {
        format!("{}{}{}", self.operator_key, self.point_key, self.direction_key).to_lowercase()
    }
}

impl fmt::Display for NetworkPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.operator_key, self.point_key, self.direction_key)
    }
}

/// Descriptive, stream-invariant fields carried along for display purposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLabels {
    pub operator_label: String,
    pub point_label: String,
}
