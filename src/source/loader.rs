use crate::frames::convert::{records_from_frame, records_to_frame};
use crate::source::error::SourceError;
use crate::types::record::RawRecord;
use log::{info, warn};
use polars::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tokio::{fs, task};

/// Platform values are in kWh/d (GCV in kWh/Nm³); loaded values are in GWh/d.
const VALUE_SCALE: f64 = 1e6;

/// Loads downloaded CSV files and caches the merged raw data as parquet.
///
/// A download directory holds one subdirectory per year, each with one file per
/// edge (see [`crate::DownloadRequest::file_path`]). An optional secondary
/// directory with the same layout holds older years that are refreshed less often.
pub struct RawDataLoader {
    cache_dir: PathBuf,
}

impl RawDataLoader {
    pub fn new(cache_dir: &Path) -> RawDataLoader {
        RawDataLoader {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// CSV files of `year` (or of every year) under `dir`, sorted by path.
    pub async fn list_files(dir: &Path, year: Option<i32>) -> Result<Vec<PathBuf>, SourceError> {
        let year_dirs = match year {
            Some(year) => vec![dir.join(year.to_string())],
            None => Self::read_dir_sorted(dir)
                .await?
                .into_iter()
                .filter(|p| p.is_dir())
                .collect(),
        };

        let mut files = Vec::new();
        for year_dir in year_dirs {
            if !fs::try_exists(&year_dir).await.unwrap_or(false) {
                continue;
            }
            files.extend(
                Self::read_dir_sorted(&year_dir)
                    .await?
                    .into_iter()
                    .filter(|p| p.extension().is_some_and(|ext| ext == "csv")),
            );
        }
        Ok(files)
    }

    async fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| SourceError::DirRead(dir.to_path_buf(), e))?;
        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SourceError::DirRead(dir.to_path_buf(), e))?
        {
            paths.push(entry.path());
        }
        paths.sort();
        Ok(paths)
    }

    /// Reads every file of `dir` (and of `secondary`, if it exists) into records,
    /// with values converted to GWh/d.
    pub async fn load_records(
        dir: &Path,
        secondary: Option<&Path>,
        year: Option<i32>,
    ) -> Result<Vec<RawRecord>, SourceError> {
        let mut files = Vec::new();
        if let Some(secondary) = secondary {
            if fs::metadata(secondary).await.is_ok_and(|m| m.is_dir()) {
                info!("Loading data from {}", secondary.display());
                files.extend(Self::list_files(secondary, year).await?);
            } else {
                warn!("Secondary directory {} not found, skipping", secondary.display());
            }
        }
        info!("Loading data from {}", dir.display());
        files.extend(Self::list_files(dir, year).await?);

        let mut records = Vec::new();
        for file in files {
            records.extend(Self::read_csv(file).await?);
        }
        for record in records.iter_mut() {
            record.value = record.value.map(|v| v / VALUE_SCALE);
        }
        info!("Loaded {} raw records", records.len());
        Ok(records)
    }

    /// Like [`RawDataLoader::load_records`], as a frame backed by a parquet cache.
    ///
    /// The cache is keyed by both directories and the year, so loading the same
    /// directory with and without a secondary one gives two separate cache files.
    /// Once written, a cache file is used until removed with [`RawDataLoader::clear_cache`].
    pub async fn get_frame(
        &self,
        dir: &Path,
        secondary: Option<&Path>,
        year: Option<i32>,
    ) -> Result<LazyFrame, SourceError> {
        let parquet_path = self.cache_path(dir, secondary, year).await;

        if fs::metadata(&parquet_path).await.is_ok() {
            info!("Cache hit for {} at {:?}", dir.display(), parquet_path);
        } else {
            info!("Cache miss for {}. Loading CSV files.", dir.display());
            let records = Self::load_records(dir, secondary, year).await?;
            let df = records_to_frame(&records)?;

            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(|e| SourceError::DirCreation(self.cache_dir.clone(), e))?;
            Self::cache_dataframe(df, &parquet_path).await?;
            info!("Cached raw data of {} to {:?}", dir.display(), parquet_path);
        }

        LazyFrame::scan_parquet(&parquet_path, Default::default())
            .map_err(|e| SourceError::ParquetScan(parquet_path.clone(), e))
    }

    /// Removes the cached frame of `dir`, `secondary` and `year`, if there is one.
    pub async fn clear_cache(
        &self,
        dir: &Path,
        secondary: Option<&Path>,
        year: Option<i32>,
    ) -> Result<(), SourceError> {
        let parquet_path = self.cache_path(dir, secondary, year).await;
        match fs::remove_file(&parquet_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SourceError::CacheDeletion(parquet_path, e)),
        }
    }

    /// `<dir name>_<year|all>_<digest>.parquet`, where the digest covers the
    /// canonical paths of `dir` and `secondary`.
    pub(crate) async fn cache_path(
        &self,
        dir: &Path,
        secondary: Option<&Path>,
        year: Option<i32>,
    ) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        for path in std::iter::once(dir).chain(secondary) {
            fs::canonicalize(path)
                .await
                .unwrap_or_else(|_| path.to_path_buf())
                .hash(&mut hasher);
        }
        secondary.is_some().hash(&mut hasher);

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "raw".to_string());
        let year = year.map_or_else(|| "all".to_string(), |y| y.to_string());
        self.cache_dir
            .join(format!("{}_{}_{:016x}.parquet", name, year, hasher.finish()))
    }

    /// Reads one platform CSV export. Columns are read as text and typed on conversion.
    async fn read_csv(path: PathBuf) -> Result<Vec<RawRecord>, SourceError> {
        task::spawn_blocking(move || {
            let df = CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(0))
                .try_into_reader_with_file_path(Some(path.clone()))
                .map_err(|e| SourceError::CsvRead {
                    path: path.clone(),
                    source: e,
                })?
                .finish()
                .map_err(|e| SourceError::CsvRead {
                    path: path.clone(),
                    source: e,
                })?;
            records_from_frame(&df).map_err(|source| SourceError::Content { path, source })
        })
        .await?
    }

    async fn cache_dataframe(mut df: DataFrame, path: &Path) -> Result<(), SourceError> {
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let file = std::fs::File::create(&path_buf)
                .map_err(|e| SourceError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| SourceError::ParquetWritePolars(path_buf, e))?;
            Ok::<(), SourceError>(())
        })
        .await??;
        Ok(())
    }
}
