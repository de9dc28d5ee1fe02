use crate::source::error::SourceError;
use crate::source::request::{DownloadRequest, API_BASE_URL};
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use reqwest::{Client, Proxy, StatusCode};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::{fs, task};
use tokio_util::io::StreamReader;

const NO_DATA_MESSAGE: &str = "No Data Available";

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

enum Response {
    Data(Vec<u8>),
    NoData,
}

/// What a download run did, request by request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub written: usize,
    /// Requests whose file already existed.
    pub skipped: usize,
    /// Requests answered with 404 or an explicit "no data" message.
    pub no_data: usize,
    /// Requests that failed, described as `<year> <edge><part>`.
    pub failed: Vec<String>,
}

impl DownloadSummary {
    pub fn has_errors(&self) -> bool {
        !self.failed.is_empty()
    }
}

pub struct Downloader {
    client: Client,
    base_url: String,
}

impl Downloader {
    pub fn new(proxy: Option<&str>) -> Result<Self, SourceError> {
        let mut builder = Client::builder();
        if let Some(proxy) = proxy {
            builder = builder.proxy(Proxy::all(proxy).map_err(SourceError::ClientBuild)?);
        }
        Ok(Self {
            client: builder.build().map_err(SourceError::ClientBuild)?,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Points the downloader at another server, e.g. a mirror of the platform API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Runs `requests` one after another, storing every response that carries data
    /// under `dir` and sleeping `delay` after each call.
    ///
    /// Existing files are kept unless `overwrite` is set. Failed requests are logged
    /// and reported in the summary without stopping the run.
    ///
    /// # Errors
    ///
    /// Only failures to write to `dir` abort the run.
    pub async fn run(
        &self,
        requests: &[DownloadRequest],
        dir: &Path,
        delay: Duration,
        overwrite: bool,
    ) -> Result<DownloadSummary, SourceError> {
        info!("Running {} requests into {}", requests.len(), dir.display());
        let mut summary = DownloadSummary::default();

        for request in requests {
            let path = request.file_path(dir);
            if !overwrite && fs::try_exists(&path).await.unwrap_or(false) {
                summary.skipped += 1;
                continue;
            }

            let url = request.url(&self.base_url);
            debug!("{}", url);
            match self.fetch(&url).await {
                Ok(Response::Data(bytes)) => {
                    Self::store(bytes, path).await?;
                    summary.written += 1;
                }
                Ok(Response::NoData) => {
                    debug!("No data for {}", request.describe());
                    summary.no_data += 1;
                }
                Err(e) => {
                    warn!("Request for {} failed: {}", request.describe(), e);
                    summary.failed.push(request.describe());
                }
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        info!(
            "Wrote {} files, {} already present, {} without data, {} failed",
            summary.written,
            summary.skipped,
            summary.no_data,
            summary.failed.len()
        );
        Ok(summary)
    }

    async fn fetch(&self, url: &str) -> Result<Response, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::NetworkRequest(url.to_string(), e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Response::NoData);
        }
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .await
            .map_err(|e| SourceError::DownloadIo(url.to_string(), e))?;

        if is_no_data(&body) {
            Ok(Response::NoData)
        } else {
            Ok(Response::Data(body))
        }
    }

    /// Writes through a temporary file in the target directory, so an interrupted
    /// run never leaves a truncated file behind.
    async fn store(bytes: Vec<u8>, path: PathBuf) -> Result<(), SourceError> {
        task::spawn_blocking(move || {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            std::fs::create_dir_all(&dir).map_err(|e| SourceError::DirCreation(dir.clone(), e))?;
            let mut file =
                NamedTempFile::new_in(&dir).map_err(|e| SourceError::FileWrite(path.clone(), e))?;
            file.write_all(&bytes)
                .map_err(|e| SourceError::FileWrite(path.clone(), e))?;
            file.persist(&path)
                .map_err(|e| SourceError::FileWrite(path.clone(), e.error))?;
            Ok::<(), SourceError>(())
        })
        .await??;
        Ok(())
    }
}

fn is_no_data(body: &[u8]) -> bool {
    serde_json::from_slice::<ApiMessage>(body).is_ok_and(|m| m.message == NO_DATA_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::request::plan_requests;
    use crate::types::indicator::Indicator;
    use crate::types::topology::tests::row;
    use crate::types::topology::Topology;
    use crate::types::window::Window;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    const CSV: &str = "indicator,periodFrom,periodTo,value\nPhysical Flow,2021-01-01,2021-01-02,1\n";

    fn reply(request: &str) -> (&'static str, &'static str) {
        if request.contains("itp-1entry") {
            ("200 OK", CSV)
        } else if request.contains("itp-2entry") {
            ("404 Not Found", "")
        } else if request.contains("itp-3entry") {
            ("200 OK", r#"{"message":"No Data Available"}"#)
        } else {
            ("500 Internal Server Error", "")
        }
    }

    /// Serves canned answers keyed by the point in the request line.
    async fn serve() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let (status, body) = reply(&String::from_utf8_lossy(&head));
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/api/v1/operationalData.csv", addr)
    }

    fn requests() -> Vec<DownloadRequest> {
        let flow = Indicator::PhysicalFlow;
        let topology = Topology::new(
            (1..=4)
                .map(|i| {
                    row(
                        "NO-DE",
                        "NO",
                        "DE",
                        ("DE-TSO-0001", &format!("ITP-{}", i), "entry"),
                        &[(flow, "sum")],
                    )
                })
                .collect(),
        );
        let window = Window::new("2021-01-01", "2021-01-31").unwrap();
        plan_requests(&topology, &["NO-DE".to_string()], &[flow], &window, 1)
    }

    #[test]
    fn test_no_data_message() {
        assert!(is_no_data(br#"{"message":"No Data Available"}"#));
        assert!(!is_no_data(br#"{"message":"Something else"}"#));
        assert!(!is_no_data(CSV.as_bytes()));
    }

    #[tokio::test]
    async fn test_run_sorts_responses() -> Result<(), SourceError> {
        let dir = tempfile::tempdir().map_err(|e| SourceError::DirCreation("tmp".into(), e))?;
        let downloader = Downloader::new(None)?.with_base_url(serve().await);

        let summary = downloader
            .run(&requests(), dir.path(), Duration::ZERO, false)
            .await?;
        assert_eq!(summary.written, 1);
        assert_eq!(summary.no_data, 2);
        assert_eq!(summary.failed, vec!["2021 NO-DE4".to_string()]);
        assert!(summary.has_errors());

        let written = dir.path().join("2021").join("NO-DE1.csv");
        assert_eq!(std::fs::read_to_string(&written).unwrap(), CSV);
        assert!(!dir.path().join("2021").join("NO-DE2.csv").exists());

        let again = downloader
            .run(&requests(), dir.path(), Duration::from_millis(1), false)
            .await?;
        assert_eq!(again.skipped, 1);
        assert_eq!(again.written, 0);

        let forced = downloader
            .run(&requests()[..1], dir.path(), Duration::ZERO, true)
            .await?;
        assert_eq!(forced.written, 1);
        Ok(())
    }
}
