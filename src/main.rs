//! student-records - CSV-backed student records web service
//!
//! Entry point for the server binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use student_records::config::{AppConfig, CliArgs};
use student_records::error::ConfigError;
use student_records::server;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Validate and create config
    let config = AppConfig::from_args(&args).context("Invalid configuration")?;

    // Setup logging; the guard flushes the log file on exit
    let _guard = setup_logging(&config.log_path, config.verbose)?;
    info!("Logging setup complete.");

    if !config.config_found {
        warn!(path = %args.config.display(), "Config file not found, using defaults");
    }

    info!(
        csv_file = %config.csv_file.display(),
        thread_size = config.thread_size,
        addr = %config.listen_addr,
        "Starting student records server"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime
        .block_on(server::serve(&config))
        .context("Server failed")?;

    Ok(())
}

/// Console at info (debug with -v), log file at debug
fn setup_logging(log_path: &Path, verbose: bool) -> Result<WorkerGuard> {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("student_records=debug,tower_http=debug,warn")
        } else {
            EnvFilter::new("student_records=info,warn")
        }
    });
    let file_filter = EnvFilter::new("student_records=debug,tower_http=debug,warn");

    let dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = log_path
        .file_name()
        .ok_or_else(|| ConfigError::InvalidLogPath {
            path: log_path.to_path_buf(),
            reason: "Missing file name".to_string(),
        })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy().into_owned())
        .build(dir)
        .map_err(|e| ConfigError::InvalidLogPath {
            path: log_path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_thread_names(true)
                .with_filter(file_filter),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
