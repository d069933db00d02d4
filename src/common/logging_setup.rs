use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use crate::common::timestamp_utils;
use crate::config_loader::MasterConfig;

/// Copies every log line to stderr and, when available, the run's log file.
struct TeeWriter {
    file: Option<File>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            // A full disk should not take stderr logging down with it.
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

fn open_log_file(log_file: &Path) -> io::Result<File> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(log_file)
}

pub fn resolve_level(config: Option<&MasterConfig>, debug_flag: bool) -> LevelFilter {
    // Determine log level from CLI, then config, then default
    let log_level_str = if debug_flag {
        "debug".to_string()
    } else {
        config
            .and_then(|c| c.app_settings.log_level.clone())
            .unwrap_or_else(|| "info".to_string())
    };

    match log_level_str.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        s => {
            eprintln!("Unrecognized log level '{}', defaulting to info.", s);
            LevelFilter::Info
        }
    }
}

pub fn initialize_logging(config: Option<&MasterConfig>, cli_matches: &clap::ArgMatches, log_file: Option<&Path>) {
    let mut builder = Builder::new();
    builder.filter_level(resolve_level(config, cli_matches.get_flag("debug")));

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] - {}",
            timestamp_utils::current_local_timestamp_str("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.args()
        )
    });

    let file = match log_file.map(open_log_file) {
        Some(Ok(file)) => Some(file),
        Some(Err(e)) => {
            eprintln!("Failed to open log file: {}. Logging to stderr only.", e);
            None
        }
        None => None,
    };
    builder
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(TeeWriter { file })));

    builder.try_init().unwrap_or_else(|e| {
        eprintln!("Failed to initialize logger: {}. Logging might not work as expected.", e);
    });
}
