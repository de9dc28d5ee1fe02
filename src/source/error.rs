use crate::frames::error::FrameError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to create directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read directory '{0}'")]
    DirRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write file '{0}'")]
    FileWrite(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing parquet cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),
    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to scan parquet cache file '{0}'")]
    ParquetScan(PathBuf, #[source] PolarsError),

    #[error("Failed to delete cache '{0}'")]
    CacheDeletion(PathBuf, #[source] std::io::Error),

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Download of {0} was interrupted")]
    DownloadIo(String, #[source] std::io::Error),

    #[error("Parsing error reading CSV file '{path}'")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Unexpected content in '{path}'")]
    Content {
        path: PathBuf,
        #[source]
        source: FrameError,
    },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
