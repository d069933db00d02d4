use crate::camera::camera_feed::CameraFeedClient;
use crate::camera::image_downloader::{DownloadOutcome, ImageDownloader};
use crate::common::file_utils;
use crate::common::timestamp_utils::RunPartition;
use crate::config_loader::MasterConfig;
use crate::drive::folder_resolver::FolderResolver;
use crate::drive::remote_store::RemoteStore;
use crate::drive::uploader::{RetryPolicy, UploadOutcome, Uploader};
use crate::errors::AppError;
use log::{debug, error, info, warn};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tally of one batch run, logged at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub cameras: usize,
    pub downloaded: usize,
    pub download_skipped: usize,
    pub download_failed: usize,
    pub uploaded: usize,
    pub upload_skipped: usize,
    pub upload_failed: usize,
    pub log_uploaded: bool,
    /// Set when the feed could not be read; nothing else ran.
    pub feed_error: Option<String>,
}

impl BatchReport {
    fn record_download(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded(_) => self.downloaded += 1,
            DownloadOutcome::Skipped(_) => self.download_skipped += 1,
            DownloadOutcome::Failed(_) => self.download_failed += 1,
        }
    }

    fn record_upload(&mut self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Uploaded(_) => self.uploaded += 1,
            UploadOutcome::Skipped(_) => self.upload_skipped += 1,
            UploadOutcome::Failed(_) => self.upload_failed += 1,
        }
    }
}

/// Fetch, download, upload: one pass per invocation.
pub struct BatchRunner {
    config: MasterConfig,
    feed_client: CameraFeedClient,
    downloader: ImageDownloader,
    resolver: Arc<FolderResolver>,
    uploader: Uploader,
}

impl BatchRunner {
    pub fn new(config: MasterConfig, http_client: Client, store: Arc<dyn RemoteStore>) -> Self {
        let feed_client = CameraFeedClient::new(http_client.clone(), config.feed.clone());
        let downloader = ImageDownloader::new(
            http_client,
            &config.feed.base_url,
            Duration::from_secs(config.feed.image_timeout_secs),
        );
        let resolver = Arc::new(FolderResolver::new(Arc::clone(&store)));
        let uploader = Uploader::new(
            store,
            Arc::clone(&resolver),
            PathBuf::from(&config.app_settings.output_directory_base),
            RetryPolicy::from(&config.retry),
            config.drive.skip_existing_files,
        );
        Self {
            config,
            feed_client,
            downloader,
            resolver,
            uploader,
        }
    }

    pub fn output_root(&self) -> &Path {
        Path::new(&self.config.app_settings.output_directory_base)
    }

    /// Runs the batch for `partition`. Only an unusable local output directory is an error;
    /// feed, download and upload failures are logged and counted in the report.
    pub async fn run(&self, partition: &RunPartition, log_file: Option<&Path>) -> Result<BatchReport, AppError> {
        let start_time = Instant::now();
        let mut report = BatchReport::default();
        let run_dir = file_utils::ensure_output_directory(&partition.run_directory(self.output_root()))?;
        info!("🚀 Batch run {}/{} writing to {}", partition.date, partition.time, run_dir.display());

        let cameras = match self.feed_client.fetch_cameras().await {
            Ok(cameras) => cameras,
            Err(e) => {
                error!("❌ No camera data retrieved, exiting: {}", e);
                report.feed_error = Some(e.to_string());
                return Ok(report);
            }
        };
        report.cameras = cameras.len();
        if cameras.is_empty() {
            warn!("⚠️ Feed returned no cameras; nothing to do.");
            return Ok(report);
        }

        let outcomes = self
            .downloader
            .download_all(&cameras, &run_dir, self.config.feed.download_concurrency)
            .await;
        for outcome in &outcomes {
            report.record_download(outcome);
        }
        info!(
            "📥 Downloads: {} new, {} skipped, {} failed",
            report.downloaded, report.download_skipped, report.download_failed
        );

        let root_folder_id = &self.config.drive.root_folder_id;
        for (_, outcome) in self.uploader.upload_tree(&run_dir, root_folder_id).await {
            report.record_upload(&outcome);
        }
        info!(
            "☁️ Uploads: {} new, {} skipped, {} failed",
            report.uploaded, report.upload_skipped, report.upload_failed
        );
        debug!("Resolved {} remote folder(s) this run", self.resolver.cached_folders().await);

        if self.config.app_settings.upload_log_file {
            if let Some(log_path) = log_file.filter(|p| p.is_file()) {
                report.log_uploaded = matches!(
                    self.uploader.upload_log_file(log_path, root_folder_id).await,
                    UploadOutcome::Uploaded(_)
                );
            }
        }

        info!("🏁 Batch run finished in {:?}.", start_time.elapsed());
        Ok(report)
    }
}
