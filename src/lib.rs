mod aggregate;
mod error;
mod frames;
mod gastp;
mod outliers;
mod series;
mod source;
mod types;
mod utils;

pub use error::GasTpError;
pub use gastp::*;

pub use types::indicator::Indicator;
pub use types::period::{AnyDate, Month, StartEndDate, Year};
pub use types::record::{NetworkPoint, RawRecord, StreamKey, StreamLabels};
pub use types::strategy::{Strategy, StrategyCell};
pub use types::topology::*;
pub use types::window::Window;

pub use series::grouper::group_by_stream;
pub use series::periodize::DailySeries;
pub use series::reconstruct::{
    periodize, reindex_and_periodize, reindex_and_periodize_concurrent, reindex_by_period_endtime,
};
pub use series::step_function::{latest_revisions, Step, StepFunction};

pub use aggregate::aggregator::{select_and_aggregate, EdgeTable};
pub use aggregate::edge::EdgePlan;
pub use outliers::{remove_outliers, remove_outliers_in_place};

pub use frames::convert::{
    display, records_from_frame, records_to_frame, series_to_frame, topology_from_frame,
    topology_to_frame,
};
pub use frames::filter::{filter_data, TransparencyFrameFilterExt};

pub use source::downloader::{DownloadSummary, Downloader};
pub use source::loader::RawDataLoader;
pub use source::request::{plan_requests, year_spans, DownloadRequest, YearSpan, API_BASE_URL};
pub use source::topology_file::load_topology;

pub use aggregate::error::{AggregateError, ConfigError};
pub use frames::error::FrameError;
pub use series::error::SeriesError;
pub use source::error::SourceError;
