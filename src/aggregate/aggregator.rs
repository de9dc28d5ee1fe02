//! Combines reconstructed streams into one daily series per edge.

use crate::aggregate::edge::EdgePlan;
use crate::aggregate::error::AggregateError;
use crate::frames::convert::{date_column, read_dates, read_f64, DATE, VALUE};
use crate::series::periodize::DailySeries;
use crate::types::indicator::Indicator;
use crate::types::topology::Topology;
use bon::builder;
use chrono::NaiveDate;
use log::{debug, info, warn};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Daily values of a set of edges over the union of their dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeTable {
    dates: Vec<NaiveDate>,
    edges: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl EdgeTable {
    fn from_edges(per_edge: Vec<(String, BTreeMap<NaiveDate, Option<f64>>)>) -> Self {
        let dates: Vec<NaiveDate> = per_edge
            .iter()
            .flat_map(|(_, values)| values.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns = per_edge
            .iter()
            .map(|(_, values)| {
                dates
                    .iter()
                    .map(|d| values.get(d).copied().flatten())
                    .collect()
            })
            .collect();
        Self {
            dates,
            edges: per_edge.into_iter().map(|(edge, _)| edge).collect(),
            columns,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Edge names, in the order they were requested.
    pub fn edges(&self) -> &[String] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn column(&self, edge: &str) -> Option<&[Option<f64>]> {
        self.edges
            .iter()
            .position(|e| e == edge)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn value(&self, date: NaiveDate, edge: &str) -> Option<f64> {
        let row = self.dates.binary_search(&date).ok()?;
        self.column(edge).and_then(|values| values[row])
    }

    /// A wide frame: a `date` column followed by one column per edge.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(self.edges.len() + 1);
        columns.push(date_column(DATE, &self.dates)?);
        for (edge, values) in self.edges.iter().zip(&self.columns) {
            columns.push(Series::new(edge.as_str().into(), values).into());
        }
        DataFrame::new(columns)
    }
}

fn reduce(plan: &EdgePlan, members: &[&DailySeries]) -> PolarsResult<BTreeMap<NaiveDate, Option<f64>>> {
    let Some(reduction) = plan.strategy.reduction() else {
        return Ok(members
            .first()
            .map(|series| {
                series
                    .iter()
                    .map(|(date, value)| (date, value.filter(|v| !v.is_nan())))
                    .collect()
            })
            .unwrap_or_default());
    };

    let (dates, values): (Vec<NaiveDate>, Vec<Option<f64>>) = members
        .iter()
        .flat_map(|series| series.iter())
        .map(|(date, value)| (date, value.filter(|v| !v.is_nan())))
        .unzip();
    let long = DataFrame::new(vec![
        date_column(DATE, &dates)?,
        Series::new(VALUE.into(), values).into(),
    ])?;

    let reduced = long
        .lazy()
        .group_by([col(DATE)])
        .agg([reduction.alias(VALUE)])
        .sort([DATE], SortMultipleOptions::default())
        .collect()?;

    let dates = read_dates(reduced.column(DATE)?)?;
    let values = read_f64(reduced.column(VALUE)?)?;
    Ok(dates
        .into_iter()
        .zip(values)
        .filter_map(|(date, value)| date.map(|d| (d, value)))
        .collect())
}

/// Aggregates the reconstructed streams of `indicator` into one daily series per edge.
///
/// Every edge's strategy is resolved from the topology before anything is reduced,
/// so an ambiguous topology fails without partial output. Edges with no contributing
/// topology rows are skipped. Edges whose member streams are absent from `series` are
/// skipped with a warning, unless `quiet` is set.
///
/// Reductions ignore missing values, and NaN counts as missing for every strategy:
/// a day on which every member is missing sums to `0` and has no mean, minimum,
/// maximum or taken value.
///
/// # Arguments
///
/// * `.edges(&[&str])`: **Required.** Edges to aggregate; the table keeps this order.
/// * `.topology(&Topology)`: **Required.** Member points and strategy cells per edge.
/// * `.series(&[DailySeries])`: **Required.** Reconstructed streams, typically from [`crate::reindex_and_periodize`].
/// * `.indicator(Indicator)`: **Required.** Selects both the member streams and the strategy column.
/// * `.quiet(bool)`: Optional. Suppresses the warning for edges without data. Defaults to `false`.
///
/// # Returns
///
/// An [`EdgeTable`] over the union of the aggregated edges' dates.
///
/// # Errors
///
/// Returns [`AggregateError::Config`] if the topology is ambiguous for any edge, and
/// [`AggregateError::Reduction`] if polars fails to reduce an edge.
#[builder]
pub fn select_and_aggregate(
    edges: &[&str],
    topology: &Topology,
    series: &[DailySeries],
    indicator: Indicator,
    #[builder(default)] quiet: bool,
) -> Result<EdgeTable, AggregateError> {
    let mut plans = Vec::with_capacity(edges.len());
    for edge in edges {
        match EdgePlan::resolve(topology, edge, indicator)? {
            Some(plan) => plans.push(plan),
            None => debug!("{}: no topology rows contribute to edge {}", indicator, edge),
        }
    }

    let mut per_edge = Vec::with_capacity(plans.len());
    for plan in &plans {
        let members: Vec<&DailySeries> = plan
            .members
            .iter()
            .flat_map(|point| {
                series
                    .iter()
                    .filter(move |s| s.key().indicator == indicator && point.matches(s.key()))
            })
            .collect();

        if members.is_empty() {
            if !quiet {
                warn!("{}: edge {} not found in data", indicator, plan.edge);
            }
            continue;
        }

        debug!(
            "{}: {} of edge {} over {} streams",
            indicator,
            plan.strategy,
            plan.edge,
            members.len()
        );
        let values = reduce(plan, &members).map_err(|source| AggregateError::Reduction {
            edge: plan.edge.clone(),
            source,
        })?;
        per_edge.push((plan.edge.clone(), values));
    }

    let table = EdgeTable::from_edges(per_edge);
    info!(
        "Aggregated {} of {} edges for {}",
        table.edges().len(),
        edges.len(),
        indicator
    );
    Ok(table)
}
