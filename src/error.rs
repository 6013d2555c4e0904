//! Error types for student-records
//!
//! This module defines the error hierarchy for:
//! - Configuration file and CLI errors
//! - CSV store errors
//! - Mark parsing errors
//! - Average worker thread errors
//! - HTTP handler errors (mapped to JSON responses)
//!
//! Library code uses thiserror enums; the binary wraps them with anyhow.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for running the server
#[derive(Error, Debug)]
pub enum AppError {
    /// CSV store could not be prepared
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// I/O errors (listener bind, accept loop)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file '{path}': {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    /// Config file is not valid JSON for the expected shape
    #[error("Failed to parse config file '{path}': {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    /// Invalid records-per-thread setting
    #[error("Invalid thread_size {size}: must be at least 1")]
    InvalidThreadSize { size: usize },

    /// Bind address and port do not form a socket address
    #[error("Invalid bind address '{addr}': {reason}")]
    InvalidBindAddress { addr: String, reason: String },

    /// Log file path is unusable
    #[error("Invalid log path '{path}': {reason}")]
    InvalidLogPath { path: PathBuf, reason: String },
}

/// CSV store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or parsing the CSV file failed
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Writing the CSV file failed
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A record with this RollNo is already stored
    #[error("Record with the RollNo {0} already exists")]
    DuplicateRollNo(String),

    /// No record with this RollNo
    #[error("Record with RollNo {0} not found")]
    NotFound(String),
}

/// Errors from interpreting a stored record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// A mark could not be parsed as a number
    #[error("Invalid {subject} mark '{value}' for RollNo {roll_no}")]
    InvalidMark {
        roll_no: String,
        subject: &'static str,
        value: String,
    },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Thread could not be spawned
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Worker panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },
}

/// HTTP handler errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// Form or body is missing required fields
    #[error("Missing required fields")]
    MissingFields,

    /// Insert of an existing RollNo
    #[error("Record with the RollNo {0} already exists")]
    Duplicate(String),

    /// Lookup, update or removal of an unknown RollNo
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Store could not be read
    #[error("Failed to read records: {0}")]
    ReadFailed(#[source] StoreError),

    /// Store could not be rewritten after a mutation
    #[error("{message}: {source}")]
    WriteFailed {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    /// Average computation failed
    #[error("Average computation failed: {0}")]
    Worker(#[from] WorkerError),

    /// Blocking task was cancelled or panicked
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServerError {
    /// Convert a store error, using `write_failure` as the client-facing
    /// message when the rewrite of the file failed
    pub fn from_store(err: StoreError, write_failure: &'static str) -> Self {
        match err {
            StoreError::DuplicateRollNo(roll_no) => ServerError::Duplicate(roll_no),
            StoreError::NotFound(roll_no) => ServerError::RecordNotFound(roll_no),
            err @ StoreError::Read { .. } => ServerError::ReadFailed(err),
            err @ StoreError::Write { .. } => ServerError::WriteFailed {
                message: write_failure,
                source: err,
            },
        }
    }

    /// HTTP status and client-facing message
    fn status_and_message(&self) -> (axum::http::StatusCode, String) {
        use axum::http::StatusCode;

        match self {
            ServerError::MissingFields => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Duplicate(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::RecordNotFound(_) => {
                (StatusCode::NOT_FOUND, "Record not found".to_string())
            }
            ServerError::WriteFailed { message, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, (*message).to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process request".to_string(),
            ),
        }
    }
}

impl axum::response::IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for StoreError
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for ServerError
pub type ServerResult<T> = std::result::Result<T, ServerError>;
