use trafficcam::cli;
use trafficcam::common::logging_setup;
use trafficcam::common::timestamp_utils::RunPartition;
use trafficcam::config_loader;
use trafficcam::core::batch_runner::BatchRunner;
use trafficcam::drive::google_drive_client::GoogleDriveClient;
use log::{info, error};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<()> {
    let main_start_time = Instant::now();
    let matches = cli::build_cli().get_matches();
    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or(cli::DEFAULT_CONFIG_PATH);

    let master_config = match config_loader::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            logging_setup::initialize_logging(None, &matches, None);
            error!("❌ Failed to load master configuration from '{}': {:#}. Exiting.", config_path, e);
            return Err(e.context(format!("Failed to load master configuration from '{}'", config_path)));
        }
    };

    let partition = RunPartition::now(
        &master_config.app_settings.date_folder_format,
        &master_config.app_settings.time_folder_format,
    );
    let log_file = partition.log_file_path(Path::new(&master_config.app_settings.output_directory_base));
    logging_setup::initialize_logging(Some(&master_config), &matches, Some(&log_file));
    info!("✅ Configuration loaded from: {}", config_path);

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("trafficcam/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    // Credentials are checked before any feed or download traffic.
    let drive_client = match GoogleDriveClient::connect(http_client.clone(), &master_config.drive).await {
        Ok(client) => client,
        Err(e) => {
            error!("❌ Google Drive authentication failed: {}", e);
            return Err(anyhow::Error::new(e).context("Google Drive authentication failed"));
        }
    };

    let runner = BatchRunner::new(master_config, http_client, Arc::new(drive_client));
    match runner.run(&partition, Some(&log_file)).await {
        Ok(report) => info!("📊 Run summary: {:?}", report),
        Err(e) => error!("❌ Batch run aborted: {}", e),
    }

    info!("🏁 trafficcam finished in {:?}.", main_start_time.elapsed());
    Ok(())
}
