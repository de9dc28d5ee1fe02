//! Splits a download into operational-data API requests: one per calendar year,
//! edge and group of network points.

use crate::types::indicator::Indicator;
use crate::types::record::NetworkPoint;
use crate::types::topology::Topology;
use crate::types::window::Window;
use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};

pub const API_BASE_URL: &str = "https://transparency.entsog.eu/api/v1/operationalData.csv";

/// The part of a window that falls into one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSpan {
    pub year: i32,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Splits `window` at year boundaries, latest year first.
pub fn year_spans(window: &Window) -> Vec<YearSpan> {
    (window.start().year()..=window.end().year())
        .rev()
        .filter_map(|year| {
            let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
            let last = NaiveDate::from_ymd_opt(year, 12, 31)?;
            Some(YearSpan {
                year,
                from: first.max(window.start()),
                to: last.min(window.end()),
            })
        })
        .collect()
}

/// One API call and the file its response is stored in.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub edge: String,
    /// 1-based index of the point group, if the edge needed more than one request.
    pub part: Option<usize>,
    pub span: YearSpan,
    pub points: Vec<NetworkPoint>,
    pub indicators: Vec<Indicator>,
}

impl DownloadRequest {
    pub fn url(&self, base_url: &str) -> String {
        let points = self
            .points
            .iter()
            .map(NetworkPoint::api_id)
            .collect::<Vec<_>>()
            .join(",");
        let indicators = self
            .indicators
            .iter()
            .map(|ind| ind.label().replace(' ', "%20"))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}?forceDownload=true&pointDirection={}&from={}&to={}&indicator={}\
             &periodType=day&timezone=CET&periodize=0&limit=-1&isTransportData=true&dataset=1",
            base_url, points, self.span.from, self.span.to, indicators
        )
    }

    /// `<dir>/<year>/<edge><part>.csv`
    pub fn file_path(&self, dir: &Path) -> PathBuf {
        let part = self.part.map(|p| p.to_string()).unwrap_or_default();
        dir.join(self.span.year.to_string())
            .join(format!("{}{}.csv", self.edge, part))
    }

    /// A short description for log messages.
    pub fn describe(&self) -> String {
        let part = self.part.map(|p| p.to_string()).unwrap_or_default();
        format!("{} {}{}", self.span.year, self.edge, part)
    }
}

/// Plans the requests needed to download `indicators` for `edges` over `window`.
///
/// Network points of an edge that contribute to none of the requested indicators
/// are left out. Edges with more than `max_points_per_request` points are split
/// over several requests; edges without any point are skipped.
///
/// # Arguments
///
/// * `topology` - Supplies the network points and strategy cells of each edge.
/// * `edges` - Names of the edges to plan, in order.
/// * `indicators` - Indicators requested in every call.
/// * `window` - Split into one [`YearSpan`] per calendar year, latest first.
/// * `max_points_per_request` - Upper bound on points per request; `0` is treated as `1`.
///
/// # Returns
///
/// The requests, grouped by year and then by edge.
pub fn plan_requests(
    topology: &Topology,
    edges: &[String],
    indicators: &[Indicator],
    window: &Window,
    max_points_per_request: usize,
) -> Vec<DownloadRequest> {
    let chunk = max_points_per_request.max(1);
    let mut requests = Vec::new();
    for span in year_spans(window) {
        for edge in edges {
            let points: Vec<NetworkPoint> = topology
                .rows_for_edge(edge)
                .filter(|row| row.is_used_for(indicators))
                .map(|row| row.point.clone())
                .collect();
            let groups: Vec<&[NetworkPoint]> = points.chunks(chunk).collect();
            let numbered = groups.len() > 1;
            for (i, group) in groups.into_iter().enumerate() {
                requests.push(DownloadRequest {
                    edge: edge.clone(),
                    part: numbered.then_some(i + 1),
                    span,
                    points: group.to_vec(),
                    indicators: indicators.to_vec(),
                });
            }
        }
    }
    requests
}
