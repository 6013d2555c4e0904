//! student-records - CSV-backed student records web service
//!
//! A small HTTP service that keeps student records (roll number, name and
//! three subject marks) in a single CSV file and computes per-student
//! averages on worker threads.
//!
//! # Features
//!
//! - **Flat-file storage**: every request reads the whole CSV file and every
//!   mutation rewrites it. RollNo is the unique key.
//!
//! - **Threaded averages**: records are split into fixed-size chunks, one
//!   worker thread per chunk, results collected through a channel.
//!
//! - **JSON config**: file paths and the chunk size come from `config.json`.
//!
//! # Example
//!
//! ```bash
//! # Start the server with ./config.json
//! student-records
//!
//! # Insert, read and average
//! curl -X POST -d 'RollNo=1&Name=Asha&English=80&Maths=90&Science=70' http://127.0.0.1:5000/insert
//! curl 'http://127.0.0.1:5000/read?RollNo=1'
//! curl http://127.0.0.1:5000/average
//! ```

pub mod average;
pub mod config;
pub mod error;
pub mod server;
pub mod store;

pub use config::{AppConfig, CliArgs, FileConfig};
pub use error::{AppError, Result};
pub use store::{CsvStore, StudentRecord, StudentUpdate};
