//! Whole-file CSV store
//!
//! Every operation reads the complete file and every mutation rewrites it
//! (header first, then all rows in their existing order). Lookups and the
//! RollNo uniqueness check are linear scans.
//!
//! Read-modify-write operations hold an internal lock for their whole
//! duration so two requests in the same process cannot interleave rewrites.

use crate::error::{StoreError, StoreResult};
use crate::store::record::{StudentRecord, StudentUpdate, CSV_HEADER};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// CSV file holding all student records
#[derive(Debug)]
pub struct CsvStore {
    /// Path to the CSV file
    path: PathBuf,

    /// Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl CsvStore {
    /// Create a store handle for `path` (the file is not touched)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with only the header row if it does not exist
    ///
    /// Returns true if the file was created.
    pub fn ensure_exists(&self) -> StoreResult<bool> {
        let _guard = self.guard();

        if self.path.is_file() {
            return Ok(false);
        }

        self.write_unlocked(&[])?;
        info!(path = %self.path.display(), "CSV file created");
        Ok(true)
    }

    /// Read every record
    ///
    /// A missing file reads as an empty store.
    pub fn read_all(&self) -> StoreResult<Vec<StudentRecord>> {
        let _guard = self.guard();
        self.read_unlocked()
    }

    /// Replace the whole file with `records`
    pub fn write_all(&self, records: &[StudentRecord]) -> StoreResult<()> {
        let _guard = self.guard();
        self.write_unlocked(records)
    }

    /// Append a record, rejecting a duplicate RollNo
    pub fn insert(&self, record: StudentRecord) -> StoreResult<()> {
        let _guard = self.guard();
        let mut records = self.read_unlocked()?;

        if records.iter().any(|r| r.roll_no == record.roll_no) {
            warn!(roll_no = %record.roll_no, "Record already exists");
            return Err(StoreError::DuplicateRollNo(record.roll_no));
        }

        records.push(record);
        self.write_unlocked(&records)?;

        if let Some(inserted) = records.last() {
            info!(record = ?inserted, "Record inserted");
        }
        Ok(())
    }

    /// Remove the record with `roll_no`
    pub fn remove(&self, roll_no: &str) -> StoreResult<StudentRecord> {
        let _guard = self.guard();
        let records = self.read_unlocked()?;

        let (removed, kept): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| r.roll_no == roll_no);

        let Some(first) = removed.into_iter().next() else {
            warn!(roll_no = %roll_no, "Record not found for removal");
            return Err(StoreError::NotFound(roll_no.to_string()));
        };

        self.write_unlocked(&kept)?;
        info!(roll_no = %roll_no, "Record removed");
        Ok(first)
    }

    /// Apply `update` to the record with its RollNo
    pub fn update(&self, update: &StudentUpdate) -> StoreResult<StudentRecord> {
        let _guard = self.guard();
        let mut records = self.read_unlocked()?;

        let mut updated = None;
        for record in records.iter_mut().filter(|r| r.roll_no == update.roll_no) {
            record.apply(update);
            if updated.is_none() {
                updated = Some(record.clone());
            }
        }

        let Some(updated) = updated else {
            warn!(roll_no = %update.roll_no, "Record not found for update");
            return Err(StoreError::NotFound(update.roll_no.clone()));
        };

        self.write_unlocked(&records)?;
        info!(record = ?updated, "Record updated");
        Ok(updated)
    }

    /// Look up the record with `roll_no`
    pub fn find(&self, roll_no: &str) -> StoreResult<StudentRecord> {
        let records = self.read_all()?;

        match records.into_iter().find(|r| r.roll_no == roll_no) {
            Some(record) => {
                info!(record = ?record, "Record read");
                Ok(record)
            }
            None => {
                warn!(roll_no = %roll_no, "Record not found for read");
                Err(StoreError::NotFound(roll_no.to_string()))
            }
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The lock guards no data, so a poisoned lock is still usable
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_unlocked(&self) -> StoreResult<Vec<StudentRecord>> {
        let mut reader = match csv::Reader::from_path(&self.path) {
            Ok(reader) => reader,
            Err(e) if is_not_found(&e) => {
                debug!(path = %self.path.display(), "CSV file missing, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.read_error(e)),
        };

        let records = reader
            .deserialize()
            .collect::<Result<Vec<StudentRecord>, _>>()
            .map_err(|e| self.read_error(e))?;

        debug!(path = %self.path.display(), count = records.len(), "CSV file read");
        Ok(records)
    }

    fn write_unlocked(&self, records: &[StudentRecord]) -> StoreResult<()> {
        let write = || -> Result<(), csv::Error> {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&self.path)?;

            writer.write_record(CSV_HEADER)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
            Ok(())
        };

        write().map_err(|source| {
            tracing::error!(path = %self.path.display(), error = %source, "Failed to write CSV file");
            StoreError::Write {
                path: self.path.clone(),
                source,
            }
        })?;

        debug!(path = %self.path.display(), count = records.len(), "CSV file written");
        Ok(())
    }

    fn read_error(&self, source: csv::Error) -> StoreError {
        tracing::error!(path = %self.path.display(), error = %source, "Failed to read CSV file");
        StoreError::Read {
            path: self.path.clone(),
            source,
        }
    }
}

fn is_not_found(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn student(roll_no: &str, name: &str) -> StudentRecord {
        StudentRecord {
            roll_no: roll_no.into(),
            name: name.into(),
            english: "70".into(),
            maths: "80".into(),
            science: "90".into(),
        }
    }

    #[test]
    fn test_ensure_exists_writes_header() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("students.csv"));

        assert!(store.ensure_exists().unwrap());
        assert!(!store.ensure_exists().unwrap());

        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents.trim_end(), "RollNo,Name,English,Maths,Science");
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("absent.csv"));
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_insert_and_find() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("students.csv"));

        store.insert(student("1", "Asha")).unwrap();
        store.insert(student("2", "Ravi")).unwrap();

        assert_eq!(store.find("2").unwrap().name, "Ravi");
        assert_eq!(store.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_insert_duplicate() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("students.csv"));

        store.insert(student("1", "Asha")).unwrap();
        let err = store.insert(student("1", "Other")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateRollNo(ref r) if r == "1"));

        let records = store.read_all().unwrap();
        assert_eq!(records, vec![student("1", "Asha")]);
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("students.csv"));
        store
            .write_all(&[student("1", "Asha"), student("2", "Ravi"), student("3", "Mira")])
            .unwrap();

        let removed = store.remove("2").unwrap();
        assert_eq!(removed.name, "Ravi");

        let roll_nos: Vec<_> = store
            .read_all()
            .unwrap()
            .into_iter()
            .map(|r| r.roll_no)
            .collect();
        assert_eq!(roll_nos, vec!["1", "3"]);
    }

    #[test]
    fn test_remove_missing() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("students.csv"));
        store.write_all(&[student("1", "Asha")]).unwrap();

        assert!(matches!(store.remove("9"), Err(StoreError::NotFound(_))));
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_update_partial() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("students.csv"));
        store.write_all(&[student("1", "Asha")]).unwrap();

        let updated = store
            .update(&StudentUpdate {
                roll_no: "1".into(),
                maths: Some("95".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.maths, "95");
        assert_eq!(updated.name, "Asha");
        assert_eq!(store.find("1").unwrap(), updated);
    }

    #[test]
    fn test_update_missing() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("students.csv"));
        store.write_all(&[student("1", "Asha")]).unwrap();

        let err = store
            .update(&StudentUpdate {
                roll_no: "7".into(),
                name: Some("Nobody".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.read_all().unwrap(), vec![student("1", "Asha")]);
    }

    #[test]
    fn test_find_missing() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("students.csv"));
        store.ensure_exists().unwrap();
        assert!(matches!(store.find("1"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_quoted_fields_survive() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("students.csv"));
        store.insert(student("1", "Rao, Priya \"PR\"")).unwrap();
        assert_eq!(store.find("1").unwrap().name, "Rao, Priya \"PR\"");
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("students.csv");
        std::fs::write(&path, "RollNo,Name,English,Maths,Science\n1,Asha\n").unwrap();

        let store = CsvStore::new(path);
        assert!(matches!(store.read_all(), Err(StoreError::Read { .. })));
    }

    #[test]
    fn test_write_into_missing_directory() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("no_such_dir").join("students.csv"));
        let err = store.insert(student("1", "Asha")).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }
}
