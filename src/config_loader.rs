use serde::Deserialize;
use std::fs;
use crate::app_config::{ApplicationConfig, DriveConfig, FeedConfig, RetryConfig};
use crate::common::timestamp_utils;
use anyhow::{Result, Context, bail};
use log::{debug, info};
use std::time::Instant;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MasterConfig {
    #[serde(rename = "application")]
    pub app_settings: ApplicationConfig,
    pub feed: FeedConfig,
    pub drive: DriveConfig,
    pub retry: RetryConfig,
}

pub fn load_config(path: &str) -> Result<MasterConfig> {
    debug!("📄 Attempting to load config from: {}", path);
    let start_time = Instant::now();

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file '{}'. 📖", path))?;

    let config = parse_config(&config_str)
        .with_context(|| format!("Invalid configuration in '{}'", path))?;

    info!("✅ Successfully loaded and validated configuration from '{}' in {:?}", path, start_time.elapsed());
    Ok(config)
}

pub fn parse_config(config_str: &str) -> Result<MasterConfig> {
    let config: MasterConfig = serde_yaml::from_str(config_str)
        .context("Failed to parse YAML configuration. 💔")?;
    validate_master_config(&config).context("Master configuration validation failed 👎")?;
    Ok(config)
}

fn validate_master_config(config: &MasterConfig) -> Result<()> {
    debug!("🕵️ Validating master configuration...");
    if config.app_settings.output_directory_base.trim().is_empty() {
        bail!("❌ Application output_directory_base cannot be empty.");
    }
    if config.app_settings.date_folder_format.is_empty() || config.app_settings.time_folder_format.is_empty() {
        bail!("❌ Date and time folder formats cannot be empty.");
    }
    for (key, format) in [
        ("date_folder_format", &config.app_settings.date_folder_format),
        ("time_folder_format", &config.app_settings.time_folder_format),
    ] {
        timestamp_utils::validate_format(format).with_context(|| format!("❌ Invalid application.{}", key))?;
    }

    if reqwest::Url::parse(&config.feed.base_url).is_err() {
        bail!("❌ Invalid feed base_url '{}'.", config.feed.base_url);
    }
    if config.feed.camera_limit == 0 {
        bail!("❌ feed.camera_limit must be at least 1.");
    }
    if config.feed.download_concurrency == 0 {
        bail!("❌ feed.download_concurrency must be at least 1.");
    }

    if config.drive.root_folder_id.trim().is_empty() {
        bail!("❌ drive.root_folder_id cannot be empty.");
    }
    for (key, url) in [("api_base_url", &config.drive.api_base_url), ("upload_base_url", &config.drive.upload_base_url)] {
        if reqwest::Url::parse(url).is_err() {
            bail!("❌ Invalid drive.{} '{}'.", key, url);
        }
    }

    if config.retry.max_attempts == 0 {
        bail!("❌ retry.max_attempts must be at least 1.");
    }
    if config.retry.max_backoff_ms < config.retry.initial_backoff_ms {
        bail!(
            "❌ retry.max_backoff_ms ({}) is smaller than retry.initial_backoff_ms ({}).",
            config.retry.max_backoff_ms,
            config.retry.initial_backoff_ms
        );
    }
    debug!("👍 Master configuration validated.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = parse_config("drive:\n  root_folder_id: abc123\n").unwrap();
        assert_eq!(cfg.drive.root_folder_id, "abc123");
        assert_eq!(cfg.feed.camera_limit, 5);
        assert_eq!(cfg.feed.request_timeout_secs, 10);
        assert_eq!(cfg.feed.image_timeout_secs, 15);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.app_settings.output_directory_base, "camera_images");
        assert_eq!(
            cfg.feed.cameras_url(),
            "https://trafficnz.info/service/traffic/rest/4/cameras/all"
        );
    }

    #[test]
    fn missing_root_folder_is_rejected() {
        let err = parse_config("feed:\n  camera_limit: 3\n").unwrap_err();
        assert!(format!("{:#}", err).contains("root_folder_id"));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let yaml = "drive:\n  root_folder_id: abc\nretry:\n  max_attempts: 0\n";
        assert!(parse_config(yaml).is_err());
    }

    #[test]
    fn unrenderable_time_format_is_rejected() {
        let yaml = "application:\n  time_folder_format: \"%Q\"\ndrive:\n  root_folder_id: abc\n";
        let err = parse_config(yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("time_folder_format"));
    }

    #[test]
    fn bad_feed_url_is_rejected() {
        let yaml = "drive:\n  root_folder_id: abc\nfeed:\n  base_url: not a url\n";
        assert!(parse_config(yaml).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config("/nonexistent/trafficcam.yaml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/trafficcam.yaml"));
    }
}
