//! The main entry point: a client that downloads, caches and loads transparency
//! platform data and hands it to the reconstruction pipeline.

use crate::error::GasTpError;
use crate::frames::convert::records_from_frame;
use crate::series::periodize::DailySeries;
use crate::series::reconstruct::reindex_and_periodize_concurrent;
use crate::source::downloader::{DownloadSummary, Downloader};
use crate::source::loader::RawDataLoader;
use crate::source::request::plan_requests;
use crate::source::topology_file::load_topology;
use crate::types::indicator::Indicator;
use crate::types::record::RawRecord;
use crate::types::topology::Topology;
use crate::types::window::Window;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use chrono::Local;
use polars::prelude::LazyFrame;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client for gas transparency platform data.
///
/// Downloads go to a directory per download date inside the cache folder unless
/// another directory is given; merged raw frames are cached there as parquet.
///
/// # Examples
///
/// ```no_run
/// use gastp::{select_and_aggregate, GasTp, GasTpError, Indicator, Window};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), GasTpError> {
/// let client = GasTp::new().await?;
/// let topology = client.load_topology(Path::new("topology.csv")).await?;
/// let window = Window::new("2021-01-01", "2021-12-31")?;
///
/// let summary = client
///     .download()
///     .topology(&topology)
///     .window(&window)
///     .indicators(&[Indicator::PhysicalFlow])
///     .call()
///     .await?;
/// println!("{} files written", summary.written);
///
/// let records = client.load_records(&client.default_download_dir()).call().await?;
/// let series = client.reconstruct(records, window).await?;
/// let edges = topology.edge_names();
/// let edges: Vec<&str> = edges.iter().map(String::as_str).collect();
/// let table = select_and_aggregate()
///     .edges(&edges)
///     .topology(&topology)
///     .series(&series)
///     .indicator(Indicator::PhysicalFlow)
///     .call()?;
/// println!("{}", table.to_frame()?);
/// # Ok(())
/// # }
/// ```
pub struct GasTp {
    cache_dir: PathBuf,
    loader: RawDataLoader,
}

#[bon]
impl GasTp {
    /// Creates a client that keeps its downloads and caches in `cache_folder`,
    /// which is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`GasTpError::CacheDirCreation`] if the directory cannot be created.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, GasTpError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| GasTpError::CacheDirCreation(cache_folder.clone(), e))?;
        Ok(Self {
            loader: RawDataLoader::new(&cache_folder),
            cache_dir: cache_folder,
        })
    }

    /// Creates a client using the default cache directory
    /// (e.g. `~/.cache/gastp_cache` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`GasTpError::CacheDirResolution`] if the system cache directory cannot
    /// be found and [`GasTpError::CacheDirCreation`] if it cannot be created.
    pub async fn new() -> Result<Self, GasTpError> {
        let cache_folder = get_cache_dir().map_err(GasTpError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `<cache>/raw_<today>`, where downloads go when no directory is given.
    pub fn default_download_dir(&self) -> PathBuf {
        self.cache_dir
            .join(format!("raw_{}", Local::now().date_naive().format("%Y-%m-%d")))
    }

    /// Downloads operational data for the edges of a topology.
    ///
    /// One file is written per calendar year, edge and group of at most
    /// `max_points_per_request` network points (default `1`). Unset options default
    /// to every edge of the topology, [`Indicator::DEFAULT_DOWNLOAD`], no proxy, no
    /// delay between requests and keeping files that already exist.
    ///
    /// Failed requests are logged and listed in the returned summary.
    ///
    /// # Arguments
    ///
    /// * `.topology(&Topology)`: **Required.** Supplies the network points of each edge.
    /// * `.window(&Window)`: **Required.** The dates to download; split into one request per calendar year.
    /// * `.dir(PathBuf)`: Optional. Target directory. Defaults to [`GasTp::default_download_dir`].
    /// * `.edges(&[&str])`: Optional. Edges to download. Defaults to every edge of the topology.
    /// * `.indicators(&[Indicator])`: Optional. Defaults to [`Indicator::DEFAULT_DOWNLOAD`].
    /// * `.proxy(&str)`: Optional. Proxy URL used for every request.
    /// * `.delay(Duration)`: Optional. Pause between requests. Defaults to none.
    /// * `.overwrite(bool)`: Optional. Replace files that already exist. Defaults to `false`.
    /// * `.max_points_per_request(usize)`: Optional. Defaults to `1`.
    /// * `.base_url(&str)`: Optional. Overrides [`crate::API_BASE_URL`].
    ///
    /// # Returns
    ///
    /// A [`DownloadSummary`] with the files written, skipped, without data and failed.
    ///
    /// # Errors
    ///
    /// Returns [`GasTpError::Source`] if the HTTP client cannot be built (e.g. an
    /// invalid proxy) or the download directory cannot be written.
    #[builder]
    pub async fn download(
        &self,
        topology: &Topology,
        window: &Window,
        dir: Option<PathBuf>,
        edges: Option<&[&str]>,
        indicators: Option<&[Indicator]>,
        proxy: Option<&str>,
        #[builder(default)] delay: Duration,
        #[builder(default)] overwrite: bool,
        #[builder(default = 1)] max_points_per_request: usize,
        base_url: Option<&str>,
    ) -> Result<DownloadSummary, GasTpError> {
        let dir = dir.unwrap_or_else(|| self.default_download_dir());
        let edges: Vec<String> = match edges {
            Some(edges) => edges.iter().map(|e| e.to_string()).collect(),
            None => topology.edge_names(),
        };
        let indicators = indicators.unwrap_or(&Indicator::DEFAULT_DOWNLOAD);

        let requests = plan_requests(topology, &edges, indicators, window, max_points_per_request);
        let mut downloader = Downloader::new(proxy)?;
        if let Some(base_url) = base_url {
            downloader = downloader.with_base_url(base_url);
        }
        Ok(downloader.run(&requests, &dir, delay, overwrite).await?)
    }

    /// Loads the downloaded files of `dir` (and of an optional `secondary` directory
    /// with older years) as one raw frame, with values in GWh/d.
    ///
    /// The merged frame is cached as parquet on first use.
    #[builder]
    pub async fn load_raw(
        &self,
        #[builder(start_fn)] dir: &Path,
        secondary: Option<&Path>,
        year: Option<i32>,
    ) -> Result<LazyFrame, GasTpError> {
        Ok(self.loader.get_frame(dir, secondary, year).await?)
    }

    /// Same as [`GasTp::load_raw`], as typed records.
    #[builder]
    pub async fn load_records(
        &self,
        #[builder(start_fn)] dir: &Path,
        secondary: Option<&Path>,
        year: Option<i32>,
    ) -> Result<Vec<RawRecord>, GasTpError> {
        let frame = self.loader.get_frame(dir, secondary, year).await?.collect()?;
        Ok(records_from_frame(&frame)?)
    }

    /// Drops the cached raw frame of `dir`, so the next load reads the files again.
    ///
    /// `secondary` and `year` must match those of the load whose cache is dropped.
    #[builder]
    pub async fn clear_cache(
        &self,
        #[builder(start_fn)] dir: &Path,
        secondary: Option<&Path>,
        year: Option<i32>,
    ) -> Result<(), GasTpError> {
        Ok(self.loader.clear_cache(dir, secondary, year).await?)
    }

    pub async fn load_topology(&self, path: &Path) -> Result<Topology, GasTpError> {
        Ok(load_topology(path).await?)
    }

    /// Reconstructs one daily series per stream over `window`, processing streams
    /// in parallel.
    pub async fn reconstruct(
        &self,
        records: Vec<RawRecord>,
        window: Window,
    ) -> Result<Vec<DailySeries>, GasTpError> {
        Ok(reindex_and_periodize_concurrent(records, window).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregator::select_and_aggregate;
    use crate::series::test_support::date;

    const TOPOLOGY: &str = "edge_name,from_node,to_node,operatorKey,pointKey,directionKey,flow\n\
                            NO-DE,NO,DE,DE-TSO-0001,ITP-1,entry,sum\n\
                            NO-DE,NO,DE,DE-TSO-0002,ITP-2,entry,sum\n";

    const HEADER: &str = "indicator,periodFrom,periodTo,operatorKey,operatorLabel,pointKey,\
                          pointLabel,directionKey,value,lastUpdateDateTime\n";

    fn file(point: &str, operator: &str, value: &str) -> String {
        format!(
            "{}Physical Flow,2021-01-01T06:00:00+01:00,2021-01-11T06:00:00+01:00,{},Op,{},Pt,entry,{},2021-01-11T10:00:00+01:00\n",
            HEADER, operator, point, value
        )
    }

    #[tokio::test]
    async fn test_load_reconstruct_aggregate() -> Result<(), GasTpError> {
        let root = tempfile::tempdir().map_err(|e| GasTpError::CacheDirCreation("tmp".into(), e))?;
        let client = GasTp::with_cache_folder(root.path().join("cache")).await?;
        assert!(client.cache_dir().is_dir());

        let dir = root.path().join("raw");
        std::fs::create_dir_all(dir.join("2021")).unwrap();
        std::fs::write(dir.join("2021").join("NO-DE1.csv"), file("ITP-1", "DE-TSO-0001", "2000000")).unwrap();
        std::fs::write(dir.join("2021").join("NO-DE2.csv"), file("ITP-2", "DE-TSO-0002", "3000000")).unwrap();
        let topology_path = root.path().join("topology.csv");
        std::fs::write(&topology_path, TOPOLOGY).unwrap();

        let topology = client.load_topology(&topology_path).await?;
        let records = client.load_records(&dir).year(2021).call().await?;
        assert_eq!(records.len(), 2);

        let window = Window::new("2021-01-03", "2021-01-12")?;
        let series = client.reconstruct(records, window).await?;
        assert_eq!(series.len(), 2);

        let table = select_and_aggregate()
            .edges(&["NO-DE"])
            .topology(&topology)
            .series(&series)
            .indicator(Indicator::PhysicalFlow)
            .call()?;
        assert_eq!(table.value(date("2021-01-03"), "NO-DE"), Some(5.0));
        assert_eq!(table.value(date("2021-01-10"), "NO-DE"), Some(5.0));
        assert_eq!(table.value(date("2021-01-11"), "NO-DE"), Some(0.0));

        client.clear_cache(&dir).year(2021).call().await?;
        Ok(())
    }
}
