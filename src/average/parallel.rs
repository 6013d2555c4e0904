//! Thread-per-chunk average computation
//!
//! 1. Split the record list into fixed-size chunks
//! 2. Spawn one worker thread per chunk
//! 3. Workers push their chunk's averages onto a shared channel
//! 4. Join every worker, drain the channel, restore record order

use crate::error::WorkerError;
use crate::store::StudentRecord;
use crossbeam_channel::unbounded;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info};

/// Average mark of one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAverage {
    #[serde(rename = "RollNo")]
    pub roll_no: String,

    #[serde(rename = "Name")]
    pub name: String,

    /// Mean of the three marks, rounded to 2 decimal places
    #[serde(rename = "Average")]
    pub average: f64,
}

/// Contiguous chunks of at most `chunk_size` covering `0..len`
pub fn chunk_ranges(len: usize, chunk_size: usize) -> Vec<Range<usize>> {
    let chunk_size = chunk_size.max(1);

    (0..len)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(len))
        .collect()
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Average of one record's marks; unparsable marks give 0
pub fn average_marks(record: &StudentRecord) -> f64 {
    match record.marks() {
        Ok(marks) => round2(marks.mean()),
        Err(e) => {
            error!(error = %e, "Error in calculating average");
            0.0
        }
    }
}

fn average_chunk(records: &[StudentRecord]) -> Vec<StudentAverage> {
    records
        .iter()
        .map(|record| StudentAverage {
            roll_no: record.roll_no.clone(),
            name: record.name.clone(),
            average: average_marks(record),
        })
        .collect()
}

/// Compute every student's average on worker threads
///
/// Results are returned in the order of `records`.
pub fn compute_averages(
    records: Vec<StudentRecord>,
    chunk_size: usize,
) -> Result<Vec<StudentAverage>, WorkerError> {
    let start = Instant::now();
    let total = records.len();
    let ranges = chunk_ranges(total, chunk_size);

    if ranges.is_empty() {
        return Ok(Vec::new());
    }

    info!(records = total, workers = ranges.len(), "Computing averages");

    let records = Arc::new(records);
    let (tx, rx) = unbounded::<(usize, Vec<StudentAverage>)>();
    let mut handles = Vec::with_capacity(ranges.len());

    for (worker_id, range) in ranges.into_iter().enumerate() {
        let records = Arc::clone(&records);
        let tx = tx.clone();

        let handle = thread::Builder::new()
            .name(format!("average-{}", worker_id))
            .spawn(move || {
                let averages = average_chunk(&records[range]);
                // Receiver outlives every worker
                let _ = tx.send((worker_id, averages));
            })
            .map_err(|e| WorkerError::SpawnFailed {
                id: worker_id,
                reason: e.to_string(),
            });

        match handle {
            Ok(h) => handles.push(h),
            Err(e) => {
                join_all(handles)?;
                return Err(e);
            }
        }
    }
    drop(tx);

    join_all(handles)?;

    let mut chunks: Vec<_> = rx.try_iter().collect();
    chunks.sort_by_key(|(worker_id, _)| *worker_id);
    let averages: Vec<_> = chunks.into_iter().flat_map(|(_, chunk)| chunk).collect();

    debug!(
        records = averages.len(),
        ms = start.elapsed().as_millis(),
        "Averages complete"
    );

    Ok(averages)
}

fn join_all(handles: Vec<thread::JoinHandle<()>>) -> Result<(), WorkerError> {
    let mut first_err = None;

    for (id, handle) in handles.into_iter().enumerate() {
        if let Err(panic) = handle.join() {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            if first_err.is_none() {
                first_err = Some(WorkerError::Panicked { id, message });
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(roll_no: usize, english: &str, maths: &str, science: &str) -> StudentRecord {
        StudentRecord {
            roll_no: roll_no.to_string(),
            name: format!("Student {}", roll_no),
            english: english.into(),
            maths: maths.into(),
            science: science.into(),
        }
    }

    fn students(count: usize) -> Vec<StudentRecord> {
        (0..count)
            .map(|i| {
                let mark = (i % 100).to_string();
                student(i, &mark, "50", "75")
            })
            .collect()
    }

    #[test]
    fn test_chunk_ranges() {
        assert!(chunk_ranges(0, 10).is_empty());
        assert_eq!(chunk_ranges(5, 10), vec![0..5]);
        assert_eq!(chunk_ranges(10, 10), vec![0..10]);
        assert_eq!(chunk_ranges(25, 10), vec![0..10, 10..20, 20..25]);
        assert_eq!(chunk_ranges(3, 0), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_average_marks() {
        assert_eq!(average_marks(&student(1, "80", "90", "70")), 80.0);
        assert_eq!(average_marks(&student(1, "70", "80", "81")), 77.0);
        assert_eq!(average_marks(&student(1, "100", "90", "91")), 93.67);
        assert_eq!(average_marks(&student(1, "1", "1", "2")), 1.33);
    }

    #[test]
    fn test_average_invalid_mark_is_zero() {
        assert_eq!(average_marks(&student(1, "80", "", "70")), 0.0);
        assert_eq!(average_marks(&student(1, "abc", "90", "70")), 0.0);
    }

    #[test]
    fn test_compute_empty() {
        assert!(compute_averages(Vec::new(), 10).unwrap().is_empty());
    }

    #[test]
    fn test_compute_preserves_order() {
        for chunk_size in [1, 3, 7, 10, 64, 1000] {
            let records = students(53);
            let averages = compute_averages(records.clone(), chunk_size).unwrap();

            assert_eq!(averages.len(), records.len(), "chunk_size {}", chunk_size);
            for (avg, rec) in averages.iter().zip(&records) {
                assert_eq!(avg.roll_no, rec.roll_no);
                assert_eq!(avg.name, rec.name);
                assert_eq!(avg.average, average_marks(rec));
            }
        }
    }

    #[test]
    fn test_compute_matches_mean() {
        let records = vec![
            student(1, "60", "70", "80"),
            student(2, "90", "95", "100"),
            student(3, "x", "95", "100"),
        ];
        let averages = compute_averages(records, 2).unwrap();
        let values: Vec<f64> = averages.iter().map(|a| a.average).collect();
        assert_eq!(values, vec![70.0, 95.0, 0.0]);
    }

    #[test]
    fn test_join_reports_panic() {
        let handles: Vec<thread::JoinHandle<()>> = vec![
            thread::spawn(|| panic!("chunk exploded")),
            thread::spawn(|| {}),
        ];

        let err = join_all(handles).unwrap_err();
        match err {
            WorkerError::Panicked { id, message } => {
                assert_eq!(id, 0);
                assert_eq!(message, "chunk exploded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_join_reports_formatted_panic() {
        let bad_row = 7;
        let handles: Vec<thread::JoinHandle<()>> = vec![
            thread::spawn(|| {}),
            thread::spawn(move || panic!("bad row {}", bad_row)),
        ];

        let err = join_all(handles).unwrap_err();
        assert!(matches!(
            err,
            WorkerError::Panicked { id: 1, ref message } if message == "bad row 7"
        ));
    }

    #[test]
    fn test_join_all_ok() {
        let handles = (0..4).map(|_| thread::spawn(|| {})).collect();
        assert!(join_all(handles).is_ok());
    }

    #[test]
    fn test_json_shape() {
        let avg = StudentAverage {
            roll_no: "4".into(),
            name: "Mira".into(),
            average: 88.33,
        };
        let json = serde_json::to_value(&avg).unwrap();
        assert_eq!(json, serde_json::json!({"RollNo": "4", "Name": "Mira", "Average": 88.33}));
    }
}
