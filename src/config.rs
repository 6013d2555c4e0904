//! Configuration types for student-records
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - The JSON config file (file paths and worker chunk size)
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default CSV store path
pub const DEFAULT_CSV_FILE: &str = "student_data.csv";

/// Default log file path
pub const DEFAULT_LOG_PATH: &str = "app.log";

/// Default records per average worker thread
pub const DEFAULT_THREAD_SIZE: usize = 10;

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default listen port
pub const DEFAULT_PORT: u16 = 5000;

/// CSV-backed student records web service
#[derive(Parser, Debug, Clone)]
#[command(
    name = "student-records",
    version,
    about = "CSV-backed student records web service",
    long_about = "Serves insert/remove/update/read endpoints over a CSV file of student records,\n\
                  plus an /average endpoint that computes per-student averages on worker threads.",
    after_help = "EXAMPLES:\n    \
        student-records\n    \
        student-records --config /etc/student-records/config.json\n    \
        student-records --bind 0.0.0.0 --port 8080 -v"
)]
pub struct CliArgs {
    /// JSON config file
    #[arg(short, long, default_value = "config.json", value_name = "FILE")]
    pub config: PathBuf,

    /// Bind address (overrides the config file)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Verbose console output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Contents of the JSON config file
///
/// Every key is optional; unknown keys are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    /// Path to the CSV store
    pub csv_file: PathBuf,

    /// Path to the log file
    pub log_path: PathBuf,

    /// Records per average worker thread
    pub thread_size: usize,

    /// Listen address
    pub bind: String,

    /// Listen port
    pub port: u16,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            csv_file: PathBuf::from(DEFAULT_CSV_FILE),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            thread_size: DEFAULT_THREAD_SIZE,
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl FileConfig {
    /// Parse config from a JSON string
    pub fn from_json(json: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load config from a file
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError::ReadFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        Self::from_json(&json, path).map(Some)
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the CSV store
    pub csv_file: PathBuf,

    /// Path to the log file
    pub log_path: PathBuf,

    /// Records per average worker thread
    pub thread_size: usize,

    /// Socket address to listen on
    pub listen_addr: SocketAddr,

    /// Verbose console logging
    pub verbose: bool,

    /// Whether the config file was found
    pub config_found: bool,
}

impl AppConfig {
    /// Create and validate configuration from CLI arguments and the config file
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let file = FileConfig::load(&args.config)?;
        let config_found = file.is_some();

        let mut config = Self::from_file(file.unwrap_or_default(), args)?;
        config.config_found = config_found;
        Ok(config)
    }

    /// Validate file settings and apply CLI overrides
    pub fn from_file(file: FileConfig, args: &CliArgs) -> Result<Self, ConfigError> {
        // Validate chunk size
        if file.thread_size == 0 {
            return Err(ConfigError::InvalidThreadSize {
                size: file.thread_size,
            });
        }

        // Validate log path
        if file.log_path.file_name().is_none() {
            return Err(ConfigError::InvalidLogPath {
                path: file.log_path.clone(),
                reason: "Missing file name".to_string(),
            });
        }

        // Resolve listen address
        let bind = args.bind.clone().unwrap_or(file.bind);
        let port = args.port.unwrap_or(file.port);
        let addr = format!("{}:{}", bind, port);
        let listen_addr = addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidBindAddress {
                addr,
                reason: e.to_string(),
            })?;

        Ok(Self {
            csv_file: file.csv_file,
            log_path: file.log_path,
            thread_size: file.thread_size,
            listen_addr,
            verbose: args.verbose,
            config_found: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args() -> CliArgs {
        CliArgs::parse_from(["student-records"])
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{"csv_file": "data/students.csv", "log_path": "logs/app.log", "thread_size": 4}"#;
        let config = FileConfig::from_json(json, Path::new("config.json")).unwrap();
        assert_eq!(config.csv_file, PathBuf::from("data/students.csv"));
        assert_eq!(config.log_path, PathBuf::from("logs/app.log"));
        assert_eq!(config.thread_size, 4);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_parse_defaults() {
        let config = FileConfig::from_json("{}", Path::new("config.json")).unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let json = r#"{"thread_size": 3, "theme": "dark"}"#;
        let config = FileConfig::from_json(json, Path::new("config.json")).unwrap();
        assert_eq!(config.thread_size, 3);
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = FileConfig::from_json("{not json", Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempdir().unwrap();
        let loaded = FileConfig::load(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_zero_thread_size() {
        let file = FileConfig {
            thread_size: 0,
            ..FileConfig::default()
        };
        let err = AppConfig::from_file(file, &args()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreadSize { size: 0 }));
    }

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::parse_from(["student-records", "--bind", "0.0.0.0", "--port", "8080"]);
        let config = AppConfig::from_file(FileConfig::default(), &args).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_invalid_bind() {
        let args = CliArgs::parse_from(["student-records", "--bind", "not an address"]);
        let err = AppConfig::from_file(FileConfig::default(), &args).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddress { .. }));
    }

    #[test]
    fn test_from_args_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"csv_file": "s.csv", "thread_size": 2, "port": 6000}"#).unwrap();

        let args = CliArgs::parse_from(["student-records", "--config", path.to_str().unwrap()]);
        let config = AppConfig::from_args(&args).unwrap();
        assert!(config.config_found);
        assert_eq!(config.csv_file, PathBuf::from("s.csv"));
        assert_eq!(config.thread_size, 2);
        assert_eq!(config.listen_addr.port(), 6000);
    }
}
