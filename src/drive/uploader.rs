use crate::app_config::RetryConfig;
use crate::common::file_utils;
use crate::drive::folder_resolver::FolderResolver;
use crate::drive::remote_store::RemoteStore;
use crate::errors::AppError;
use log::{debug, error, info, warn};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const LOG_FOLDER_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded(String),
    /// A file with the same name already sat in the target folder.
    Skipped(String),
    Failed(String),
}

/// Capped exponential backoff with an overall budget on time spent waiting.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_total_backoff: Duration,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            max_total_backoff: Duration::from_millis(config.max_total_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Wait after the failed attempt `attempt` (0-based): `initial * 2^attempt`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    pub async fn run<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut waited = Duration::ZERO;
        let mut attempt = 0u32;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            attempt += 1;
            if attempt >= self.max_attempts {
                return Err(AppError::Upload {
                    file: label.to_string(),
                    details: format!("retries exhausted after {} attempt(s): {}", attempt, err),
                });
            }
            let delay = self.delay_for(attempt - 1);
            if waited + delay > self.max_total_backoff {
                return Err(AppError::Upload {
                    file: label.to_string(),
                    details: format!(
                        "retry budget of {:?} exhausted after {} attempt(s): {}",
                        self.max_total_backoff, attempt, err
                    ),
                });
            }
            warn!(
                "⚠️ Attempt {}/{} for {} failed: {}. Retrying in {:?}",
                attempt, self.max_attempts, label, err, delay
            );
            tokio::time::sleep(delay).await;
            waited += delay;
        }
    }
}

pub struct Uploader {
    store: Arc<dyn RemoteStore>,
    resolver: Arc<FolderResolver>,
    local_root: PathBuf,
    retry: RetryPolicy,
    skip_existing: bool,
}

impl Uploader {
    /// `local_root` is the directory whose layout is mirrored under the remote parent folder.
    pub fn new(
        store: Arc<dyn RemoteStore>,
        resolver: Arc<FolderResolver>,
        local_root: impl Into<PathBuf>,
        retry: RetryPolicy,
        skip_existing: bool,
    ) -> Self {
        Self {
            store,
            resolver,
            local_root: local_root.into(),
            retry,
            skip_existing,
        }
    }

    /// Uploads one file into the remote folder that mirrors its local parent directory.
    pub async fn upload(&self, file_path: &Path, parent_folder_id: &str) -> UploadOutcome {
        match self.try_upload(file_path, parent_folder_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("❌ Upload of {} failed: {}", file_path.display(), e);
                UploadOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_upload(&self, file_path: &Path, parent_folder_id: &str) -> Result<UploadOutcome, AppError> {
        let segments = file_utils::relative_folder_segments(file_path, &self.local_root)?;
        let folder_id = self.resolver.resolve_path(parent_folder_id, &segments).await?;
        let name = file_utils::file_name_of(file_path);

        if self.skip_existing {
            if let Some(existing) = self.store.find_file(&folder_id, &name).await? {
                info!("Remote file already exists, skipping: {} ({})", name, existing);
                return Ok(UploadOutcome::Skipped(existing));
            }
        }

        let content = tokio::fs::read(file_path).await?;
        let content_type = file_utils::content_type_for(file_path);
        let label = file_path.display().to_string();
        let id = self
            .retry
            .run(&label, || self.store.create_file(&folder_id, &name, content_type, content.clone()))
            .await?;
        info!("☁️ Uploaded {} as {}", file_path.display(), id);
        Ok(UploadOutcome::Uploaded(id))
    }

    /// Uploads every `.jpg`/`.png` under `root_dir`. Failures are reported per file.
    pub async fn upload_tree(&self, root_dir: &Path, parent_folder_id: &str) -> Vec<(PathBuf, UploadOutcome)> {
        let start_time = Instant::now();
        let files = file_utils::collect_image_files(root_dir);
        info!("📤 Uploading {} image(s) from {}", files.len(), root_dir.display());

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let outcome = self.upload(&file, parent_folder_id).await;
            results.push((file, outcome));
        }
        debug!("Upload of {} finished in {:?}", root_dir.display(), start_time.elapsed());
        results
    }

    /// Puts the run log into `<parent>/logs/`, replacing the content of a same-named file.
    pub async fn upload_log_file(&self, log_path: &Path, parent_folder_id: &str) -> UploadOutcome {
        match self.try_upload_log(log_path, parent_folder_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("❌ Log upload of {} failed: {}", log_path.display(), e);
                UploadOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_upload_log(&self, log_path: &Path, parent_folder_id: &str) -> Result<UploadOutcome, AppError> {
        let folder_id = self.resolver.resolve_path(parent_folder_id, &[LOG_FOLDER_NAME]).await?;
        let name = file_utils::file_name_of(log_path);
        let content = tokio::fs::read(log_path).await?;
        let content_type = file_utils::content_type_for(log_path);
        let label = log_path.display().to_string();

        let id = match self.store.find_file(&folder_id, &name).await? {
            Some(existing) => {
                self.retry
                    .run(&label, || self.store.update_file(&existing, content_type, content.clone()))
                    .await?;
                existing
            }
            None => {
                self.retry
                    .run(&label, || self.store.create_file(&folder_id, &name, content_type, content.clone()))
                    .await?
            }
        };
        info!("📝 Uploaded log {} as {}", log_path.display(), id);
        Ok(UploadOutcome::Uploaded(id))
    }
}
