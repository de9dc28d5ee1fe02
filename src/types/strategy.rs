//! Aggregation strategies as they appear in topology tables, and the resolved
//! strategy applied to the member streams of an edge.

use crate::frames::convert::VALUE;
use polars::prelude::{col, Expr};
use std::fmt;

/// How the member streams of an edge are combined into one daily value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// The edge value is exactly that of a single stream.
    Take,
    Sum,
    Mean,
    Min,
    Max,
}

impl Strategy {
    /// The per-date reduction over the `value` column, or `None` for [`Strategy::Take`],
    /// which passes its single stream through unchanged.
    pub(crate) fn reduction(&self) -> Option<Expr> {
        let value = col(VALUE);
        match self {
            Strategy::Take => None,
            Strategy::Sum => Some(value.sum()),
            Strategy::Mean => Some(value.mean()),
            Strategy::Min => Some(value.min()),
            Strategy::Max => Some(value.max()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Take => "take",
            Strategy::Sum => "sum",
            Strategy::Mean => "mean",
            Strategy::Min => "min",
            Strategy::Max => "max",
        };
        write!(f, "{}", name)
    }
}

/// One strategy cell of a topology table, for one network point and one indicator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StrategyCell {
    /// `0`: the stream does not contribute to the edge for this indicator.
    #[default]
    Exclude,
    /// `1`
    Take,
    Sum,
    /// `mean` or `av`
    Mean,
    Min,
    Max,
    /// Empty cell. Never acceptable for a stream that is otherwise included.
    Missing,
    Unrecognized(String),
}

impl StrategyCell {
    /// Parses a raw cell as read from a spreadsheet or CSV export.
    ///
    /// Numeric cells may come through as `1.0` / `0.0`; `NaN`, `null` and blanks
    /// count as missing. Anything else unknown is kept verbatim so the error can
    /// name it once the edge is actually aggregated.
    ///
    /// # Examples
    ///
    /// ```
    /// use gastp::StrategyCell;
    ///
    /// assert_eq!(StrategyCell::parse("1.0"), StrategyCell::Take);
    /// assert_eq!(StrategyCell::parse(" av "), StrategyCell::Mean);
    /// assert_eq!(StrategyCell::parse(""), StrategyCell::Missing);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let cell = raw.trim().to_lowercase();
        match cell.as_str() {
            "" | "nan" | "null" | "none" => StrategyCell::Missing,
            "0" | "0.0" => StrategyCell::Exclude,
            "1" | "1.0" => StrategyCell::Take,
            "sum" => StrategyCell::Sum,
            "mean" | "av" => StrategyCell::Mean,
            "min" => StrategyCell::Min,
            "max" => StrategyCell::Max,
            _ => StrategyCell::Unrecognized(raw.trim().to_string()),
        }
    }

    pub fn is_excluded(&self) -> bool {
        matches!(self, StrategyCell::Exclude)
    }

    /// The strategy this cell asks for, if it names a known one.
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            StrategyCell::Take => Some(Strategy::Take),
            StrategyCell::Sum => Some(Strategy::Sum),
            StrategyCell::Mean => Some(Strategy::Mean),
            StrategyCell::Min => Some(Strategy::Min),
            StrategyCell::Max => Some(Strategy::Max),
            StrategyCell::Exclude | StrategyCell::Missing | StrategyCell::Unrecognized(_) => None,
        }
    }
}
