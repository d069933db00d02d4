use chrono::{DateTime, Local};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use crate::errors::AppError;

// Get current local timestamp as a formatted string
pub fn current_local_timestamp_str(format_str: &str) -> String {
    let now: DateTime<Local> = Local::now();
    now.format(format_str).to_string()
}

/// Rejects strftime strings chrono cannot render, such as `%Q`.
pub fn validate_format(format_str: &str) -> Result<(), AppError> {
    let mut rendered = String::new();
    write!(rendered, "{}", Local::now().format(format_str))
        .map_err(|_| AppError::Config(format!("invalid timestamp format '{}'", format_str)))
}

/// Date/time folder pair that partitions one batch run, e.g. `2025-01-01` / `10-00`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPartition {
    pub date: String,
    pub time: String,
}

impl RunPartition {
    pub fn at(now: DateTime<Local>, date_format: &str, time_format: &str) -> Self {
        RunPartition {
            date: now.format(date_format).to_string(),
            time: now.format(time_format).to_string(),
        }
    }

    pub fn now(date_format: &str, time_format: &str) -> Self {
        Self::at(Local::now(), date_format, time_format)
    }

    /// `<output_root>/<date>/<time>`
    pub fn run_directory(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.date).join(&self.time)
    }

    /// `<output_root>/logs/fetch_log_<date>.log`
    pub fn log_file_path(&self, output_root: &Path) -> PathBuf {
        output_root.join("logs").join(format!("fetch_log_{}.log", self.date))
    }
}
