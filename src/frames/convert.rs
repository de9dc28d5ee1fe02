//! Moves records, daily series and edge tables in and out of polars frames.

use crate::frames::error::FrameError;
use crate::series::periodize::DailySeries;
use crate::types::indicator::Indicator;
use crate::types::record::{NetworkPoint, RawRecord};
use crate::types::strategy::StrategyCell;
use crate::types::topology::{Topology, TopologyRow};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashMap;

pub const DATE: &str = "date";
pub const INDICATOR: &str = "indicator";
pub const OPERATOR_KEY: &str = "operatorKey";
pub const OPERATOR_LABEL: &str = "operatorLabel";
pub const POINT_KEY: &str = "pointKey";
pub const POINT_LABEL: &str = "pointLabel";
pub const DIRECTION_KEY: &str = "directionKey";
pub const PERIOD_FROM: &str = "periodFrom";
pub const PERIOD_TO: &str = "periodTo";
pub const LAST_UPDATE: &str = "lastUpdateDateTime";
pub const VALUE: &str = "value";
pub const EDGE_NAME: &str = "edge_name";
pub const EDGE_DISPLAY_NAME: &str = "edge_display_name";
pub const FROM_NODE: &str = "from_node";
pub const TO_NODE: &str = "to_node";

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

pub(crate) fn date_column(name: &str, dates: &[NaiveDate]) -> PolarsResult<Column> {
    let days: Vec<i32> = dates
        .iter()
        .map(|d| (*d - epoch()).num_days() as i32)
        .collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?.into())
}

pub(crate) fn datetime_column(name: &str, values: &[Option<NaiveDateTime>]) -> PolarsResult<Column> {
    let millis: Vec<Option<i64>> = values
        .iter()
        .map(|v| v.map(|dt| dt.and_utc().timestamp_millis()))
        .collect();
    Ok(Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .into())
}

pub(crate) fn read_dates(column: &Column) -> PolarsResult<Vec<Option<NaiveDate>>> {
    let days = column.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    Ok(days
        .i32()?
        .into_iter()
        .map(|d| d.map(|d| epoch() + Duration::days(d as i64)))
        .collect())
}

pub(crate) fn read_f64(column: &Column) -> PolarsResult<Vec<Option<f64>>> {
    let values = column.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

pub(crate) fn read_strings(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    let values = column.cast(&DataType::String)?;
    Ok(values
        .str()?
        .into_iter()
        .map(|s| s.map(str::to_string))
        .collect())
}

/// Parses a platform timestamp. Offsets are dropped, keeping the local wall-clock time.
pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Reads a timestamp column, whether polars already parsed it or it is still text.
pub(crate) fn read_datetimes(
    name: &str,
    column: &Column,
) -> Result<Vec<Option<NaiveDateTime>>, FrameError> {
    if column.dtype() == &DataType::String {
        return column
            .str()?
            .into_iter()
            .map(|cell| match cell {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => parse_timestamp(raw).map(Some).ok_or_else(|| FrameError::Timestamp {
                    column: name.to_string(),
                    value: raw.to_string(),
                }),
            })
            .collect();
    }
    let millis = column
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .cast(&DataType::Int64)?;
    Ok(millis
        .i64()?
        .into_iter()
        .map(|ms| ms.and_then(DateTime::from_timestamp_millis).map(|dt| dt.naive_utc()))
        .collect())
}

fn required<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, FrameError> {
    df.column(name)
        .map_err(|e| FrameError::ColumnNotFound(name.to_string(), e))
}

fn present<T>(values: Vec<Option<T>>, column: &str) -> Result<Vec<T>, FrameError> {
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| FrameError::MissingValue {
                column: column.to_string(),
                row,
            })
        })
        .collect()
}

/// Builds a raw frame with the platform's column names.
pub fn records_to_frame(records: &[RawRecord]) -> PolarsResult<DataFrame> {
    let text = |f: fn(&RawRecord) -> &str| records.iter().map(f).collect::<Vec<&str>>();
    let period_from: Vec<Option<NaiveDateTime>> = records.iter().map(|r| Some(r.period_from)).collect();
    let period_to: Vec<Option<NaiveDateTime>> = records.iter().map(|r| Some(r.period_to)).collect();
    let last_update: Vec<Option<NaiveDateTime>> = records.iter().map(|r| r.last_update).collect();

    DataFrame::new(vec![
        Series::new(INDICATOR.into(), text(|r| r.indicator.label())).into(),
        Series::new(OPERATOR_KEY.into(), text(|r| &r.operator_key)).into(),
        Series::new(OPERATOR_LABEL.into(), text(|r| &r.operator_label)).into(),
        Series::new(POINT_KEY.into(), text(|r| &r.point_key)).into(),
        Series::new(POINT_LABEL.into(), text(|r| &r.point_label)).into(),
        Series::new(DIRECTION_KEY.into(), text(|r| &r.direction_key)).into(),
        datetime_column(PERIOD_FROM, &period_from)?,
        datetime_column(PERIOD_TO, &period_to)?,
        datetime_column(LAST_UPDATE, &last_update)?,
        Series::new(
            VALUE.into(),
            records.iter().map(|r| r.value).collect::<Vec<Option<f64>>>(),
        )
        .into(),
    ])
}

/// Reads raw records back from a frame with the platform's column names.
///
/// The label and revision columns are optional. Indicators may be given by
/// either their platform name or their short name.
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<RawRecord>, FrameError> {
    let indicators = present(read_strings(required(df, INDICATOR)?)?, INDICATOR)?
        .iter()
        .map(|s| s.parse::<Indicator>())
        .collect::<Result<Vec<_>, _>>()?;
    let operator_keys = present(read_strings(required(df, OPERATOR_KEY)?)?, OPERATOR_KEY)?;
    let point_keys = present(read_strings(required(df, POINT_KEY)?)?, POINT_KEY)?;
    let direction_keys = present(read_strings(required(df, DIRECTION_KEY)?)?, DIRECTION_KEY)?;
    let period_from = present(read_datetimes(PERIOD_FROM, required(df, PERIOD_FROM)?)?, PERIOD_FROM)?;
    let period_to = present(read_datetimes(PERIOD_TO, required(df, PERIOD_TO)?)?, PERIOD_TO)?;
    let values = read_f64(required(df, VALUE)?)?;

    let height = df.height();
    let optional_text = |name: &str| -> Result<Vec<String>, FrameError> {
        match df.column(name) {
            Ok(column) => Ok(read_strings(column)?
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect()),
            Err(_) => Ok(vec![String::new(); height]),
        }
    };
    let operator_labels = optional_text(OPERATOR_LABEL)?;
    let point_labels = optional_text(POINT_LABEL)?;
    let last_updates = match df.column(LAST_UPDATE) {
        Ok(column) => read_datetimes(LAST_UPDATE, column)?,
        Err(_) => vec![None; height],
    };

    let mut records = Vec::with_capacity(height);
    for i in 0..height {
        records.push(RawRecord {
            indicator: indicators[i],
            operator_key: operator_keys[i].clone(),
            operator_label: operator_labels[i].clone(),
            point_key: point_keys[i].clone(),
            point_label: point_labels[i].clone(),
            direction_key: direction_keys[i].clone(),
            period_from: period_from[i],
            period_to: period_to[i],
            last_update: last_updates[i],
            value: values[i],
        });
    }
    Ok(records)
}

/// Stacks daily series into one long frame with a `date` column and the stream key columns.
pub fn series_to_frame(series: &[DailySeries]) -> PolarsResult<DataFrame> {
    let mut dates = Vec::new();
    let mut indicator = Vec::new();
    let mut operator_key = Vec::new();
    let mut operator_label = Vec::new();
    let mut point_key = Vec::new();
    let mut point_label = Vec::new();
    let mut direction_key = Vec::new();
    let mut period_from = Vec::new();
    let mut last_update = Vec::new();
    let mut value = Vec::new();

    for s in series {
        let key = s.key();
        let labels = s.labels();
        for ((date, v), (from, updated)) in s
            .iter()
            .zip(s.period_from().iter().zip(s.last_updates()))
        {
            dates.push(date);
            indicator.push(key.indicator.label());
            operator_key.push(key.operator_key.as_str());
            operator_label.push(labels.operator_label.as_str());
            point_key.push(key.point_key.as_str());
            point_label.push(labels.point_label.as_str());
            direction_key.push(key.direction_key.as_str());
            period_from.push(*from);
            last_update.push(*updated);
            value.push(v);
        }
    }

    DataFrame::new(vec![
        date_column(DATE, &dates)?,
        Series::new(INDICATOR.into(), indicator).into(),
        Series::new(OPERATOR_KEY.into(), operator_key).into(),
        Series::new(OPERATOR_LABEL.into(), operator_label).into(),
        Series::new(POINT_KEY.into(), point_key).into(),
        Series::new(POINT_LABEL.into(), point_label).into(),
        Series::new(DIRECTION_KEY.into(), direction_key).into(),
        datetime_column(PERIOD_FROM, &period_from)?,
        datetime_column(LAST_UPDATE, &last_update)?,
        Series::new(VALUE.into(), value).into(),
    ])
}

/// Builds a topology from a frame with one row per network point.
///
/// Strategy columns are recognised by indicator short name; indicators without a
/// column count as excluded. Cells are read as text, so `1`, `1.0` and `sum` are
/// all understood. Rows without an edge name are dropped.
pub fn topology_from_frame(df: &DataFrame) -> Result<Topology, FrameError> {
    let text = |name: &str| -> Result<Vec<String>, FrameError> {
        Ok(read_strings(required(df, name)?)?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect())
    };
    let edge_names = text(EDGE_NAME)?;
    let from_nodes = text(FROM_NODE)?;
    let to_nodes = text(TO_NODE)?;
    let operator_keys = text(OPERATOR_KEY)?;
    let point_keys = text(POINT_KEY)?;
    let direction_keys = text(DIRECTION_KEY)?;
    let display_names = match df.column(EDGE_DISPLAY_NAME) {
        Ok(column) => read_strings(column)?,
        Err(_) => vec![None; df.height()],
    };

    let mut cells: Vec<(Indicator, Vec<Option<String>>)> = Vec::new();
    for indicator in Indicator::ALL {
        if let Ok(column) = df.column(indicator.column()) {
            cells.push((indicator, read_strings(column)?));
        }
    }

    let rows = (0..df.height())
        .map(|i| TopologyRow {
            edge_name: edge_names[i].trim().to_string(),
            edge_display_name: display_names[i]
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            from_node: from_nodes[i].clone(),
            to_node: to_nodes[i].clone(),
            point: NetworkPoint::new(
                operator_keys[i].as_str(),
                point_keys[i].as_str(),
                direction_keys[i].as_str(),
            ),
            strategies: cells
                .iter()
                .map(|(indicator, column)| {
                    let raw = column[i].as_deref().unwrap_or_default();
                    (*indicator, StrategyCell::parse(raw))
                })
                .filter(|(_, cell)| !cell.is_excluded())
                .collect::<HashMap<_, _>>(),
        })
        .collect();
    Ok(Topology::new(rows))
}

/// The topology as a frame, with a text strategy column for every indicator.
pub fn topology_to_frame(topology: &Topology) -> PolarsResult<DataFrame> {
    let rows = topology.rows();
    let text = |f: fn(&TopologyRow) -> &str| rows.iter().map(f).collect::<Vec<&str>>();
    let mut columns: Vec<Column> = vec![
        Series::new(EDGE_NAME.into(), text(|r| &r.edge_name)).into(),
        Series::new(
            EDGE_DISPLAY_NAME.into(),
            rows.iter()
                .map(|r| r.edge_display_name.as_deref())
                .collect::<Vec<Option<&str>>>(),
        )
        .into(),
        Series::new(FROM_NODE.into(), text(|r| &r.from_node)).into(),
        Series::new(TO_NODE.into(), text(|r| &r.to_node)).into(),
        Series::new(OPERATOR_KEY.into(), text(|r| &r.point.operator_key)).into(),
        Series::new(POINT_KEY.into(), text(|r| &r.point.point_key)).into(),
        Series::new(DIRECTION_KEY.into(), text(|r| &r.point.direction_key)).into(),
    ];
    for indicator in Indicator::ALL {
        let cells: Vec<String> = rows.iter().map(|r| cell_text(r.cell(indicator))).collect();
        columns.push(Series::new(indicator.column().into(), cells).into());
    }
    DataFrame::new(columns)
}

fn cell_text(cell: &StrategyCell) -> String {
    match cell {
        StrategyCell::Exclude => "0".to_string(),
        StrategyCell::Take => "1".to_string(),
        StrategyCell::Missing => String::new(),
        StrategyCell::Unrecognized(tag) => tag.clone(),
        other => other
            .strategy()
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

/// Renames edge-keyed columns to the display names the topology gives them.
/// Other columns, and edges without a display name, are left as they are.
pub fn display(mut df: DataFrame, topology: &Topology) -> PolarsResult<DataFrame> {
    let renames: Vec<(String, String)> = df
        .get_column_names()
        .into_iter()
        .map(|name| (name.to_string(), topology.display_name(name.as_str()).to_string()))
        .filter(|(old, new)| old != new)
        .collect();
    for (old, new) in renames {
        df.rename(&old, new.into())?;
    }
    Ok(df)
}
