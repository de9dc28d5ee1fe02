use crate::types::indicator::Indicator;
use polars::error::PolarsError;
use thiserror::Error;

/// The topology table does not say unambiguously how to build an edge.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown indicator '{0}'")]
    UnknownIndicator(String),

    #[error("Topology has no strategy for edge {edge}, indicator {indicator} at {point}; decide how the data should be used")]
    MissingStrategy {
        edge: String,
        indicator: Indicator,
        point: String,
    },

    #[error("There is more than one stream tagged 1 ({count}) for edge {edge}, indicator {indicator}")]
    MultipleTake {
        edge: String,
        indicator: Indicator,
        count: usize,
    },

    #[error("There is more than one aggregation strategy used for edge {edge}, indicator {indicator}: {strategies}")]
    MixedStrategies {
        edge: String,
        indicator: Indicator,
        strategies: String,
    },

    #[error("Unknown aggregation strategy '{tag}' for edge {edge}, indicator {indicator}")]
    UnknownStrategy {
        edge: String,
        indicator: Indicator,
        tag: String,
    },
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed reducing streams of edge {edge}")]
    Reduction {
        edge: String,
        #[source]
        source: PolarsError,
    },
}
