//! Per-student averages computed on worker threads
//!
//! # Architecture
//!
//! ```text
//!                 ┌─────────────────────────┐
//!                 │   compute_averages      │
//!                 │  - fixed-size chunks    │
//!                 └───────────┬─────────────┘
//!                             │
//!       ┌─────────────────────┼─────────────────────┐
//!       │                     │                     │
//! ┌─────▼─────┐         ┌─────▼─────┐         ┌─────▼─────┐
//! │ average-0 │         │ average-1 │         │ average-N │
//! └─────┬─────┘         └─────┬─────┘         └─────┬─────┘
//!       └─────────────────────┼─────────────────────┘
//!                             ▼
//!                 ┌─────────────────────────┐
//!                 │  result channel         │
//!                 │  (crossbeam unbounded)  │
//!                 └─────────────────────────┘
//! ```

pub mod parallel;

pub use parallel::{average_marks, chunk_ranges, compute_averages, round2, StudentAverage};
