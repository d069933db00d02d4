use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApplicationConfig {
    pub output_directory_base: String,
    pub date_folder_format: String, // strftime format for the date partition
    pub time_folder_format: String, // strftime format for the time partition
    pub log_level: Option<String>, // CLI --debug takes precedence
    pub upload_log_file: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        ApplicationConfig {
            output_directory_base: "camera_images".to_string(),
            date_folder_format: "%Y-%m-%d".to_string(),
            time_folder_format: "%H-%M".to_string(),
            log_level: Some("info".to_string()),
            upload_log_file: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub cameras_path: String,
    pub camera_limit: usize,
    pub request_timeout_secs: u64,
    pub image_timeout_secs: u64,
    pub download_concurrency: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            base_url: "https://trafficnz.info".to_string(),
            cameras_path: "/service/traffic/rest/4/cameras/all".to_string(),
            camera_limit: 5,
            request_timeout_secs: 10,
            image_timeout_secs: 15,
            download_concurrency: 1,
        }
    }
}

impl FeedConfig {
    pub fn cameras_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.cameras_path)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DriveConfig {
    pub root_folder_id: String,
    pub credentials_env: String,
    pub credentials_path: Option<String>,
    pub api_base_url: String,
    pub upload_base_url: String,
    pub scope: String,
    pub request_timeout_secs: u64,
    pub skip_existing_files: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        DriveConfig {
            root_folder_id: String::new(),
            credentials_env: "GDRIVE_SERVICE_ACCOUNT".to_string(),
            credentials_path: None,
            api_base_url: "https://www.googleapis.com".to_string(),
            upload_base_url: "https://www.googleapis.com".to_string(),
            scope: "https://www.googleapis.com/auth/drive".to_string(),
            request_timeout_secs: 30,
            skip_existing_files: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub max_total_backoff_ms: u64, // budget across all waits of one upload
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 8000,
            max_total_backoff_ms: 20_000,
        }
    }
}
