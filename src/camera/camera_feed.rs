use crate::app_config::FeedConfig;
use crate::errors::AppError;
use log::{debug, info, warn};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// One camera entry from the feed. Only the fields the batch needs are kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CameraRecord {
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default, rename = "imageUrl", deserialize_with = "null_as_empty")]
    pub image_url: String,
}

impl CameraRecord {
    /// Id used for the local file name; `unknown` when the feed left it blank.
    pub fn file_stem(&self) -> &str {
        if self.id.is_empty() { "unknown" } else { &self.id }
    }
}

// The feed has been seen to send ids both as strings and as numbers.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
struct FeedEnvelope {
    #[serde(default)]
    response: FeedBody,
}

#[derive(Debug, Default, Deserialize)]
struct FeedBody {
    // Entries are decoded one by one so a single malformed camera is dropped, not the feed.
    #[serde(default)]
    camera: Vec<serde_json::Value>,
}

#[derive(Clone)]
pub struct CameraFeedClient {
    http_client: Client,
    config: FeedConfig,
}

impl CameraFeedClient {
    pub fn new(http_client: Client, config: FeedConfig) -> Self {
        Self { http_client, config }
    }

    /// Fetches the feed once and returns at most `camera_limit` records.
    pub async fn fetch_cameras(&self) -> Result<Vec<CameraRecord>, AppError> {
        let url = self.config.cameras_url();
        let start_time = Instant::now();
        info!("🌐 Requesting camera feed from {}", url);

        let response = self
            .http_client
            .get(&url)
            .header(ACCEPT, "application/json")
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!("API request failed with status: {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::Fetch(format!("Failed to read API response body: {}", e)))?;
        let envelope: FeedEnvelope = serde_json::from_slice(&body)
            .map_err(|e| AppError::Fetch(format!("API response format error: {}", e)))?;

        let total = envelope.response.camera.len();
        if total == 0 {
            warn!("⚠️ No cameras found in API response");
        }
        let cameras: Vec<CameraRecord> = envelope
            .response
            .camera
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| match serde_json::from_value::<CameraRecord>(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("⚠️ Skipping malformed camera entry #{}: {}", idx + 1, e);
                    None
                }
            })
            .take(self.config.camera_limit)
            .collect();
        debug!(
            "Feed listed {} camera(s), keeping {} (limit {}) in {:?}",
            total,
            cameras.len(),
            self.config.camera_limit,
            start_time.elapsed()
        );
        Ok(cameras)
    }
}
