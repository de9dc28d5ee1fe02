use crate::aggregate::error::{AggregateError, ConfigError};
use crate::frames::error::FrameError;
use crate::series::error::SeriesError;
use crate::source::error::SourceError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GasTpError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
