//! Flat-file storage for student records
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        HTTP handlers         │
//! └──────────────┬───────────────┘
//!                │ insert / remove / update / find
//!                ▼
//! ┌──────────────────────────────┐
//! │          CsvStore            │
//! │  - read whole file           │
//! │  - linear scan by RollNo     │
//! │  - rewrite whole file        │
//! └──────────────┬───────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │  student_data.csv            │
//! │  RollNo,Name,English,...     │
//! └──────────────────────────────┘
//! ```

pub mod csv_store;
pub mod record;

pub use csv_store::CsvStore;
pub use record::{Marks, StudentRecord, StudentUpdate, Subject, CSV_HEADER};
