use crate::aggregate::error::ConfigError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Required column '{0}' not found in DataFrame")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Missing value in required column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Cannot parse '{value}' in column '{column}' as a timestamp")]
    Timestamp { column: String, value: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
