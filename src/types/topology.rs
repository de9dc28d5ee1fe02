//! The target topology: a mapping from named edges onto the network points that
//! report data for them, with one aggregation-strategy cell per indicator.
//!
//! Also holds the node groupings used to pick out the main inflow corridors and
//! routes into the European Union.

use crate::types::indicator::Indicator;
use crate::types::record::NetworkPoint;
use crate::types::strategy::StrategyCell;
use std::collections::{HashMap, HashSet};

pub const EU_NODES_HGAS: [&str; 32] = [
    "AT", "BE", "BG", "CZ", "DE", "DK", "EE", "ES", "FR", "GR", "HR", "HU", "IE", "SK", "PT",
    "IT", "PL", "LU", "MT", "CY", "LV", "LT", "FI", "SI", "RO", "SE", "NL", "PLYAM", "TBP",
    "TAP", "IGB", "BBL",
];

pub const EU_NODES_LGAS: [&str; 4] = ["BEL", "DEL", "FRL", "NLL"];

pub const NON_EU_NODES: [&str; 23] = [
    "RU", "BY", "UA", "TR", "MA", "DZ", "TN", "LY", "UK", "NO", "BA", "MK", "MD", "RS", "CH",
    "AZ", "GE", "ME", "AL", "RUKAL", "IUK", "TANAP", "NI",
];

pub const NORTH_AFRICAN_NODES: [&str; 4] = ["MA", "DZ", "TN", "LY"];

pub const RUSSIAN_ORIGIN_NODES: [&str; 4] = ["RU", "BY", "UA", "TR"];

pub const BALKAN_NODES: [&str; 5] = ["BA", "ME", "RS", "AL", "MK"];

/// All EU nodes, high- and low-calorific.
pub fn eu_nodes() -> Vec<&'static str> {
    EU_NODES_HGAS.iter().chain(EU_NODES_LGAS.iter()).copied().collect()
}

/// One row of a topology table.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyRow {
    pub edge_name: String,
    pub edge_display_name: Option<String>,
    pub from_node: String,
    pub to_node: String,
    pub point: NetworkPoint,
    /// Strategy cells keyed by indicator. An indicator without a cell is excluded.
    pub strategies: HashMap<Indicator, StrategyCell>,
}

impl TopologyRow {
    pub fn cell(&self, indicator: Indicator) -> &StrategyCell {
        static EXCLUDE: StrategyCell = StrategyCell::Exclude;
        self.strategies.get(&indicator).unwrap_or(&EXCLUDE)
    }

    /// Whether the row contributes to any of the given indicators.
    pub fn is_used_for(&self, indicators: &[Indicator]) -> bool {
        indicators.iter().any(|ind| !self.cell(*ind).is_excluded())
    }
}

/// A loaded topology table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    rows: Vec<TopologyRow>,
}

impl Topology {
    /// Builds a topology, dropping rows that are not assigned to any edge.
    pub fn new(rows: Vec<TopologyRow>) -> Self {
        let rows = rows
            .into_iter()
            .filter(|row| !row.edge_name.trim().is_empty())
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[TopologyRow] {
        &self.rows
    }

    pub fn rows_for_edge<'a>(&'a self, edge: &'a str) -> impl Iterator<Item = &'a TopologyRow> {
        self.rows.iter().filter(move |row| row.edge_name == edge)
    }

    /// Distinct edge names in order of first appearance.
    pub fn edge_names(&self) -> Vec<String> {
        unique_edges(self.rows.iter())
    }

    /// Edges running from any of `from_node` to any of `to_node`. `None` on either
    /// side matches every node.
    pub fn filter_nodes(&self, from_node: Option<&[&str]>, to_node: Option<&[&str]>) -> Vec<String> {
        unique_edges(self.rows.iter().filter(|row| {
            from_node.map_or(true, |nodes| nodes.contains(&row.from_node.as_str()))
                && to_node.map_or(true, |nodes| nodes.contains(&row.to_node.as_str()))
        }))
    }

    /// The major pipeline inflow corridors into the EU (high-calorific grid), in a fixed order.
    pub fn corridors(&self) -> Vec<(&'static str, Vec<String>)> {
        let to = &EU_NODES_HGAS[..];
        vec![
            ("North Africa", self.filter_nodes(Some(&NORTH_AFRICAN_NODES), Some(to))),
            ("UK", self.filter_nodes(Some(&["UK", "IUK"]), Some(to))),
            ("North Sea", self.filter_nodes(Some(&["NO"]), Some(to))),
            ("East", self.filter_nodes(Some(&RUSSIAN_ORIGIN_NODES), Some(to))),
            ("Caspian", self.filter_nodes(Some(&["AZ", "TANAP"]), Some(to))),
        ]
    }

    /// The inflow routes: the corridors with North Africa and East split further.
    pub fn routes(&self) -> Vec<(&'static str, Vec<String>)> {
        let to = &EU_NODES_HGAS[..];
        vec![
            ("North Africa -> ES", self.filter_nodes(Some(&NORTH_AFRICAN_NODES), Some(&["ES"]))),
            ("North Africa -> IT", self.filter_nodes(Some(&NORTH_AFRICAN_NODES), Some(&["IT"]))),
            ("UK -> EU", self.filter_nodes(Some(&["UK", "IUK"]), Some(to))),
            ("North Sea", self.filter_nodes(Some(&["NO"]), Some(to))),
            ("East -> Nord Stream", self.filter_nodes(Some(&["RU"]), Some(&["DE"]))),
            (
                "East -> Baltic+Finland",
                self.filter_nodes(Some(&RUSSIAN_ORIGIN_NODES), Some(&["FI", "EE", "LV", "LT"])),
            ),
            ("East -> Yamal", self.filter_nodes(Some(&["BY"]), Some(&["PL", "PLYAM"]))),
            ("East -> Ukraine", self.filter_nodes(Some(&["UA"]), Some(to))),
            ("East -> Türkiye", self.filter_nodes(Some(&["TR"]), Some(to))),
            ("Caspian", self.filter_nodes(Some(&["AZ", "TANAP"]), Some(to))),
        ]
    }

    /// The display name of an edge. Unknown edges and edges without a display
    /// name pass through unchanged.
    pub fn display_name<'a>(&'a self, edge: &'a str) -> &'a str {
        self.rows_for_edge(edge)
            .find_map(|row| row.edge_display_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(edge)
    }

    pub fn display_names<'a>(&'a self, edges: &'a [&'a str]) -> Vec<&'a str> {
        edges.iter().map(|edge| self.display_name(edge)).collect()
    }
}

fn unique_edges<'a>(rows: impl Iterator<Item = &'a TopologyRow>) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.filter(|row| seen.insert(row.edge_name.as_str()))
        .map(|row| row.edge_name.clone())
        .collect()
}
