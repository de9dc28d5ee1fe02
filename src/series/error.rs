use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Could not resolve window bound to a calendar date")]
    DateParsing,

    #[error("Window ends ({end}) before it starts ({start})")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Background reconstruction task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
