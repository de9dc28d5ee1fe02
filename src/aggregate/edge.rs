//! Resolves how the member streams of one edge are combined for one indicator.

use crate::aggregate::error::ConfigError;
use crate::types::indicator::Indicator;
use crate::types::record::NetworkPoint;
use crate::types::strategy::{Strategy, StrategyCell};
use crate::types::topology::{Topology, TopologyRow};

/// The resolved contribution of network points to an edge for one indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePlan {
    pub edge: String,
    pub indicator: Indicator,
    pub strategy: Strategy,
    pub members: Vec<NetworkPoint>,
}

impl EdgePlan {
    /// Resolves the plan for `edge` from the topology.
    ///
    /// Rows whose cell is `0` (or absent) are ignored. Of the remaining rows:
    /// an empty cell is an error; a row tagged `1` makes that row the only member
    /// and a second `1` is an error; otherwise every row must name the same
    /// strategy. Returns `Ok(None)` when no row contributes to the edge.
    pub fn resolve(
        topology: &Topology,
        edge: &str,
        indicator: Indicator,
    ) -> Result<Option<Self>, ConfigError> {
        let selected: Vec<&TopologyRow> = topology
            .rows_for_edge(edge)
            .filter(|row| !row.cell(indicator).is_excluded())
            .collect();

        if let Some(row) = selected
            .iter()
            .find(|row| *row.cell(indicator) == StrategyCell::Missing)
        {
            return Err(ConfigError::MissingStrategy {
                edge: edge.to_string(),
                indicator,
                point: row.point.to_string(),
            });
        }

        let takes: Vec<&&TopologyRow> = selected
            .iter()
            .filter(|row| *row.cell(indicator) == StrategyCell::Take)
            .collect();
        match takes.as_slice() {
            [] => {}
            [only] => {
                return Ok(Some(Self {
                    edge: edge.to_string(),
                    indicator,
                    strategy: Strategy::Take,
                    members: vec![only.point.clone()],
                }))
            }
            more => {
                return Err(ConfigError::MultipleTake {
                    edge: edge.to_string(),
                    indicator,
                    count: more.len(),
                })
            }
        }

        let mut cells: Vec<&StrategyCell> = Vec::new();
        for row in &selected {
            let cell = row.cell(indicator);
            if !cells.contains(&cell) {
                cells.push(cell);
            }
        }

        let cell = match cells.as_slice() {
            [] => return Ok(None),
            [cell] => *cell,
            mixed => {
                return Err(ConfigError::MixedStrategies {
                    edge: edge.to_string(),
                    indicator,
                    strategies: mixed
                        .iter()
                        .map(|c| cell_name(c))
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
        };

        let strategy = cell.strategy().ok_or_else(|| ConfigError::UnknownStrategy {
            edge: edge.to_string(),
            indicator,
            tag: cell_name(cell),
        })?;

        Ok(Some(Self {
            edge: edge.to_string(),
            indicator,
            strategy,
            members: selected.iter().map(|row| row.point.clone()).collect(),
        }))
    }
}

fn cell_name(cell: &StrategyCell) -> String {
    match cell {
        StrategyCell::Unrecognized(tag) => tag.clone(),
        other => other
            .strategy()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{:?}", other).to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::topology::tests::row;

    const FLOW: Indicator = Indicator::PhysicalFlow;

    fn topology(cells: &[&str]) -> Topology {
        Topology::new(
            cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    row(
                        "NO-DE",
                        "NO",
                        "DE",
                        ("DE-TSO-0001", &format!("ITP-{}", i), "entry"),
                        &[(FLOW, cell)],
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_single_take_wins_over_others() {
        let plan = EdgePlan::resolve(&topology(&["sum", "1", "0"]), "NO-DE", FLOW)
            .unwrap()
            .unwrap();
        assert_eq!(plan.strategy, Strategy::Take);
        assert_eq!(plan.members, vec![NetworkPoint::new("DE-TSO-0001", "ITP-1", "entry")]);
    }

    #[test]
    fn test_two_takes_is_error() {
        let err = EdgePlan::resolve(&topology(&["1", "1.0"]), "NO-DE", FLOW).unwrap_err();
        assert!(matches!(err, ConfigError::MultipleTake { count: 2, .. }));
    }

    #[test]
    fn test_missing_cell_is_error() {
        let err = EdgePlan::resolve(&topology(&["sum", ""]), "NO-DE", FLOW).unwrap_err();
        assert!(matches!(err, ConfigError::MissingStrategy { .. }));
    }

    #[test]
    fn test_mixed_strategies_is_error() {
        let err = EdgePlan::resolve(&topology(&["sum", "max"]), "NO-DE", FLOW).unwrap_err();
        match err {
            ConfigError::MixedStrategies { strategies, .. } => assert_eq!(strategies, "sum, max"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_av_and_mean_are_the_same_strategy() {
        let plan = EdgePlan::resolve(&topology(&["av", "mean"]), "NO-DE", FLOW)
            .unwrap()
            .unwrap();
        assert_eq!(plan.strategy, Strategy::Mean);
        assert_eq!(plan.members.len(), 2);
    }

    #[test]
    fn test_unknown_tag_is_error() {
        let err = EdgePlan::resolve(&topology(&["median"]), "NO-DE", FLOW).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStrategy { ref tag, .. } if tag == "median"));
    }

    #[test]
    fn test_all_excluded_is_ignored() {
        assert_eq!(EdgePlan::resolve(&topology(&["0", "0"]), "NO-DE", FLOW).unwrap(), None);
        assert_eq!(EdgePlan::resolve(&topology(&["sum"]), "XX-YY", FLOW).unwrap(), None);
        assert_eq!(
            EdgePlan::resolve(&topology(&["sum"]), "NO-DE", Indicator::Gcv).unwrap(),
            None
        );
    }
}
