//! Job write-ahead log
//!
//! Append-only durable record of job lifecycle transitions, replayed at
//! startup to reconstruct which jobs were in flight when the process died.
//! Records are newline-delimited JSON; after a full successful replay the
//! log is compacted down to one pending record per still-pending job so it
//! cannot grow without bound.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum WalError {
    #[error("WAL I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt WAL record at line {line}: {source}")]
    Corrupt {
        line: usize,
        source: serde_json::Error,
    },
    #[error("failed to encode WAL record: {0}")]
    Encode(serde_json::Error),
}

/// Lifecycle state a record transitions a job into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Failed,
    Completed,
}

/// One job lifecycle transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub state: JobState,
    pub timestamp: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(job_id: impl Into<String>, state: JobState) -> Self {
        Self {
            job_id: job_id.into(),
            state,
            timestamp: Utc::now(),
        }
    }
}

/// Job sets reconstructed by a replay
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JobLedger {
    pub pending: BTreeMap<String, JobRecord>,
    pub failed: BTreeMap<String, JobRecord>,
    pub completed: BTreeMap<String, JobRecord>,
}

impl JobLedger {
    fn apply(&mut self, record: JobRecord) {
        let id = record.job_id.clone();
        match record.state {
            JobState::Pending => {
                self.pending.insert(id, record);
            }
            JobState::Failed => {
                self.pending.remove(&id);
                self.failed.insert(id, record);
            }
            JobState::Completed => {
                self.pending.remove(&id);
                self.completed.insert(id, record);
            }
        }
    }
}

pub struct Wal {
    path: PathBuf,
    file: File,
}

impl Wal {
    /// Open (creating if needed) the log at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, WalError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one lifecycle transition
    pub fn append(&mut self, record: &JobRecord) -> Result<(), WalError> {
        let mut line = serde_json::to_vec(record).map_err(WalError::Encode)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Replay every persisted record in append order and compact the log.
    ///
    /// A corrupt final line is a torn write from a crash and is dropped
    /// with a warning; corruption anywhere else is an error.
    pub fn restore(&mut self) -> Result<JobLedger, WalError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;

        let mut ledger = JobLedger::default();
        let last = lines.len();
        for (idx, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JobRecord>(line) {
                Ok(record) => ledger.apply(record),
                Err(_) if idx + 1 == last => {
                    warn!(line = idx + 1, "Dropping torn WAL record at tail");
                }
                Err(source) => {
                    return Err(WalError::Corrupt {
                        line: idx + 1,
                        source,
                    });
                }
            }
        }

        self.compact(&ledger)?;
        info!(
            pending = ledger.pending.len(),
            failed = ledger.failed.len(),
            completed = ledger.completed.len(),
            "WAL replay complete"
        );
        Ok(ledger)
    }

    /// Rewrite the log with only the still-pending jobs, atomically
    fn compact(&mut self, ledger: &JobLedger) -> Result<(), WalError> {
        let tmp_path = self.path.with_extension("tmp");
        let mut tmp = File::create(&tmp_path)?;
        for record in ledger.pending.values() {
            let mut line = serde_json::to_vec(record).map_err(WalError::Encode)?;
            line.push(b'\n');
            tmp.write_all(&line)?;
        }
        tmp.sync_all()?;
        std::fs::rename(&tmp_path, &self.path)?;

        self.file = OpenOptions::new().append(true).open(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wal_in(dir: &tempfile::TempDir) -> Wal {
        Wal::open(dir.path().join("jobs.wal")).unwrap()
    }

    #[test]
    fn test_append_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let mut wal = wal_in(&dir);

        wal.append(&JobRecord::new("job-1", JobState::Pending)).unwrap();
        wal.append(&JobRecord::new("job-2", JobState::Pending)).unwrap();
        wal.append(&JobRecord::new("job-1", JobState::Completed)).unwrap();

        let ledger = wal.restore().unwrap();
        assert_eq!(ledger.pending.len(), 1);
        assert!(ledger.pending.contains_key("job-2"));
        assert!(ledger.completed.contains_key("job-1"));
        assert!(ledger.failed.is_empty());
    }

    #[test]
    fn test_restore_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.wal");

        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append(&JobRecord::new("job-1", JobState::Pending)).unwrap();
            wal.append(&JobRecord::new("job-1", JobState::Failed)).unwrap();
            wal.append(&JobRecord::new("job-2", JobState::Pending)).unwrap();
        }

        let mut wal = Wal::open(&path).unwrap();
        let ledger = wal.restore().unwrap();
        assert!(ledger.failed.contains_key("job-1"));
        assert!(ledger.pending.contains_key("job-2"));
    }

    #[test]
    fn test_compaction_keeps_only_pending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.wal");

        let mut wal = Wal::open(&path).unwrap();
        wal.append(&JobRecord::new("job-1", JobState::Pending)).unwrap();
        wal.append(&JobRecord::new("job-1", JobState::Completed)).unwrap();
        wal.append(&JobRecord::new("job-2", JobState::Pending)).unwrap();
        wal.restore().unwrap();

        // A fresh replay sees only what compaction kept
        let ledger = Wal::open(&path).unwrap().restore().unwrap();
        assert_eq!(ledger.pending.len(), 1);
        assert!(ledger.completed.is_empty());
    }

    #[test]
    fn test_torn_tail_record_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.wal");

        let mut wal = Wal::open(&path).unwrap();
        wal.append(&JobRecord::new("job-1", JobState::Pending)).unwrap();
        drop(wal);

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, r#"{{"job_id": "job-2", "sta"#).unwrap();

        let ledger = Wal::open(&path).unwrap().restore().unwrap();
        assert_eq!(ledger.pending.len(), 1);
        assert!(ledger.pending.contains_key("job-1"));
    }

    #[test]
    fn test_interior_corruption_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.wal");

        let mut wal = Wal::open(&path).unwrap();
        wal.append(&JobRecord::new("job-1", JobState::Pending)).unwrap();
        drop(wal);

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();
        drop(file);

        let mut wal = Wal::open(&path).unwrap();
        wal.append(&JobRecord::new("job-2", JobState::Pending)).unwrap();

        match wal.restore() {
            Err(WalError::Corrupt { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected corrupt-record error, got {other:?}"),
        }
    }
}
