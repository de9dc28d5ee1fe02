use crate::frames::convert::{
    DATE, DIRECTION_KEY, EDGE_NAME, FROM_NODE, INDICATOR, OPERATOR_KEY, POINT_KEY, TO_NODE,
};
use crate::types::indicator::Indicator;
use crate::types::window::Window;
use bon::builder;
use polars::prelude::{col, lit, DataType, Expr, LazyFrame};

pub trait TransparencyFrameFilterExt {
    /// Keeps rows whose `indicator` column holds the platform name of any of `indicators`.
    fn filter_indicators(self, indicators: &[Indicator]) -> LazyFrame;

    /// Keeps rows whose string column `column` equals any of `values`.
    /// An empty `values` keeps nothing.
    fn filter_column_in(self, column: &str, values: &[&str]) -> LazyFrame;

    /// Filters a frame with a `date` column to the days of `window` (inclusive).
    fn filter_window(self, window: &Window) -> LazyFrame;
}

fn any_equal(column: &str, values: impl IntoIterator<Item = Expr>) -> Expr {
    values
        .into_iter()
        .map(|v| col(column).eq(v))
        .reduce(|acc, e| acc.or(e))
        .unwrap_or_else(|| lit(false))
}

impl TransparencyFrameFilterExt for LazyFrame {
    fn filter_indicators(self, indicators: &[Indicator]) -> LazyFrame {
        self.filter(any_equal(
            INDICATOR,
            indicators.iter().map(|ind| lit(ind.label())),
        ))
    }

    fn filter_column_in(self, column: &str, values: &[&str]) -> LazyFrame {
        self.filter(any_equal(column, values.iter().map(|v| lit(*v))))
    }

    fn filter_window(self, window: &Window) -> LazyFrame {
        self.filter(
            col(DATE)
                .cast(DataType::Date)
                .gt_eq(lit(window.start()))
                .and(col(DATE).cast(DataType::Date).lt_eq(lit(window.end()))),
        )
    }
}

/// Filters a raw, reconstructed or topology frame by any combination of its key columns.
///
/// Every criterion left unset matches all rows. Criteria naming a column the
/// frame does not have make the query fail when it is collected.
///
/// # Examples
///
/// ```
/// use gastp::{filter_data, Indicator};
/// use polars::prelude::*;
///
/// let frame = df!(
///     "indicator" => ["Physical Flow", "GCV", "Physical Flow"],
///     "directionKey" => ["entry", "entry", "exit"],
///     "value" => [1.0, 2.0, 3.0],
/// )?;
///
/// let filtered = filter_data(frame.lazy())
///     .indicators(&[Indicator::PhysicalFlow])
///     .direction_keys(&["entry"])
///     .call()
///     .collect()?;
/// assert_eq!(filtered.height(), 1);
/// # Ok::<(), PolarsError>(())
/// ```
#[builder]
pub fn filter_data(
    #[builder(start_fn)] frame: LazyFrame,
    indicators: Option<&[Indicator]>,
    operator_keys: Option<&[&str]>,
    point_keys: Option<&[&str]>,
    direction_keys: Option<&[&str]>,
    edge_names: Option<&[&str]>,
    from_nodes: Option<&[&str]>,
    to_nodes: Option<&[&str]>,
) -> LazyFrame {
    let mut frame = frame;
    if let Some(indicators) = indicators {
        frame = frame.filter_indicators(indicators);
    }
    for (column, values) in [
        (OPERATOR_KEY, operator_keys),
        (POINT_KEY, point_keys),
        (DIRECTION_KEY, direction_keys),
        (EDGE_NAME, edge_names),
        (FROM_NODE, from_nodes),
        (TO_NODE, to_nodes),
    ] {
        if let Some(values) = values {
            frame = frame.filter_column_in(column, values);
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::convert::{date_column, VALUE};
    use crate::series::test_support::date;
    use crate::types::window::Window;
    use polars::prelude::*;

    fn raw() -> PolarsResult<DataFrame> {
        df!(
            INDICATOR => ["Physical Flow", "Physical Flow", "GCV", "Physical Flow"],
            OPERATOR_KEY => ["DE-TSO-0001", "DE-TSO-0002", "DE-TSO-0001", "DE-TSO-0001"],
            POINT_KEY => ["ITP-1", "ITP-2", "ITP-1", "ITP-1"],
            DIRECTION_KEY => ["entry", "entry", "entry", "exit"],
            VALUE => [1.0, 2.0, 3.0, 4.0],
        )
    }

    #[test]
    fn test_filter_indicators() -> PolarsResult<()> {
        let frame = raw()?
            .lazy()
            .filter_indicators(&[Indicator::Gcv, Indicator::FirmBooked])
            .collect()?;
        assert_eq!(frame.height(), 1);
        assert_eq!(frame.column(VALUE)?.f64()?.get(0), Some(3.0));
        Ok(())
    }

    #[test]
    fn test_filter_column_in_is_or_within_and_across_columns() -> PolarsResult<()> {
        let frame = filter_data(raw()?.lazy())
            .operator_keys(&["DE-TSO-0001", "DE-TSO-0002"])
            .direction_keys(&["entry"])
            .call()
            .collect()?;
        assert_eq!(frame.height(), 3);

        let none = raw()?.lazy().filter_column_in(POINT_KEY, &[]).collect()?;
        assert_eq!(none.height(), 0);
        Ok(())
    }

    #[test]
    fn test_unset_criteria_keep_everything() -> PolarsResult<()> {
        let frame = filter_data(raw()?.lazy()).call().collect()?;
        assert_eq!(frame.height(), 4);
        Ok(())
    }

    #[test]
    fn test_filter_topology_frame_by_nodes() -> PolarsResult<()> {
        let topology = df!(
            EDGE_NAME => ["DZ-IT", "DZ-ES", "NO-DE"],
            FROM_NODE => ["DZ", "DZ", "NO"],
            TO_NODE => ["IT", "ES", "DE"],
        )?;
        let frame = filter_data(topology.lazy())
            .from_nodes(&["DZ"])
            .to_nodes(&["ES", "DE"])
            .call()
            .collect()?;
        assert_eq!(frame.column(EDGE_NAME)?.str()?.get(0), Some("DZ-ES"));
        assert_eq!(frame.height(), 1);
        Ok(())
    }

    #[test]
    fn test_filter_window() -> PolarsResult<()> {
        let dates = [date("2021-01-04"), date("2021-01-05"), date("2021-01-15"), date("2021-01-16")];
        let frame = DataFrame::new(vec![
            date_column(DATE, &dates)?,
            Series::new(VALUE.into(), [1.0, 2.0, 3.0, 4.0]).into(),
        ])?;
        let window = Window::new("2021-01-05", "2021-01-15").unwrap();
        let filtered = frame.lazy().filter_window(&window).collect()?;
        assert_eq!(filtered.height(), 2);
        Ok(())
    }
}
