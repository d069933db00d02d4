use crate::camera::camera_feed::CameraRecord;
use crate::errors::AppError;
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use reqwest::{Client, StatusCode};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Skipped(PathBuf),
    Downloaded(PathBuf),
    Failed(String),
}

#[derive(Clone)]
pub struct ImageDownloader {
    http_client: Client,
    base_url: String,
    timeout: Duration,
}

impl ImageDownloader {
    pub fn new(http_client: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// `<destination_dir>/<id>.jpg`. Ids that are not a plain file name are refused.
    pub fn image_path(record: &CameraRecord, destination_dir: &Path) -> Result<PathBuf, String> {
        let stem = record.file_stem();
        let mut components = Path::new(stem).components();
        let plain_name = matches!((components.next(), components.next()), (Some(Component::Normal(_)), None));
        if !plain_name || stem.contains(['/', '\\']) {
            return Err(format!("camera id '{}' is not usable as a file name", stem));
        }
        Ok(destination_dir.join(format!("{}.jpg", stem)))
    }

    /// Downloads one snapshot unless `<destination_dir>/<id>.jpg` is already there.
    pub async fn download(&self, record: &CameraRecord, destination_dir: &Path) -> DownloadOutcome {
        let image_path = match Self::image_path(record, destination_dir) {
            Ok(path) => path,
            Err(reason) => {
                error!("❌ {}", reason);
                return DownloadOutcome::Failed(reason);
            }
        };
        if fs::try_exists(&image_path).await.unwrap_or(false) {
            info!("Image already exists, skipping: {}", image_path.display());
            return DownloadOutcome::Skipped(image_path);
        }

        match self.fetch_to(record, &image_path).await {
            Ok(bytes) => {
                info!("✅ Downloaded: {} ({} bytes)", image_path.display(), bytes);
                DownloadOutcome::Downloaded(image_path)
            }
            Err(e) => {
                error!("❌ {}", e);
                DownloadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Downloads every record, at most `concurrency` at a time. Output order follows input order.
    /// Records mapping to a file name already claimed earlier in the batch are reported as skipped.
    pub async fn download_all(
        &self,
        records: &[CameraRecord],
        destination_dir: &Path,
        concurrency: usize,
    ) -> Vec<DownloadOutcome> {
        let mut seen = HashSet::new();
        let mut indexed: Vec<(usize, DownloadOutcome)> = Vec::new();
        let mut pending: Vec<(usize, &CameraRecord)> = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            if seen.insert(record.file_stem()) {
                pending.push((idx, record));
                continue;
            }
            warn!("⚠️ Camera '{}' listed more than once, skipping duplicate", record.file_stem());
            let outcome = match Self::image_path(record, destination_dir) {
                Ok(path) => DownloadOutcome::Skipped(path),
                Err(reason) => DownloadOutcome::Failed(reason),
            };
            indexed.push((idx, outcome));
        }

        let downloaded: Vec<(usize, DownloadOutcome)> = stream::iter(pending)
            .map(|(idx, record)| async move { (idx, self.download(record, destination_dir).await) })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;
        indexed.extend(downloaded);
        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }

    async fn fetch_to(&self, record: &CameraRecord, image_path: &Path) -> Result<u64, AppError> {
        let url = format!("{}{}", self.base_url, record.image_url);
        let download_error = |details: String| AppError::Download {
            camera_id: record.file_stem().to_string(),
            details,
        };
        debug!("Requesting image for camera '{}' from {}", record.file_stem(), url);

        let response = self
            .http_client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| download_error(format!("request to {} failed: {}", url, e)))?;
        if response.status() != StatusCode::OK {
            return Err(download_error(format!("{} returned status {}", url, response.status())));
        }

        let part_path = part_path_for(image_path);
        match write_stream(response, &part_path).await {
            Ok(bytes) => {
                fs::rename(&part_path, image_path)
                    .await
                    .map_err(|e| download_error(format!("failed to finalize {}: {}", image_path.display(), e)))?;
                Ok(bytes)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&part_path).await {
                    debug!("Could not remove partial file {}: {}", part_path.display(), cleanup);
                }
                Err(download_error(e.to_string()))
            }
        }
    }
}

fn part_path_for(image_path: &Path) -> PathBuf {
    let mut name = image_path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    image_path.with_file_name(name)
}

async fn write_stream(response: reqwest::Response, part_path: &Path) -> Result<u64, AppError> {
    let mut file = File::create(part_path).await?;
    let mut body = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| AppError::Io(format!("body stream interrupted: {}", e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
