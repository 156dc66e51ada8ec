//! The per-file ingestion lifecycle object. One-to-many with
//! `request_logs` rows via `job_id`.

use chrono::{DateTime, Utc};
use loadbench_core::Error;
use serde::{Deserialize, Serialize};

use crate::job::JobStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionJob {
    pub id: i64,
    pub file_id: String,
    pub file_type: String,
    pub file_size_mb: Option<f64>,
    pub status: JobStatus,
    pub rows_ingested: i64,
    pub total_rows: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IngestionJob {
    pub fn new(id: i64, file_id: String, file_type: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            file_id,
            file_type,
            file_size_mb: None,
            status: JobStatus::Pending,
            rows_ingested: 0,
            total_rows: 0,
            started_at: None,
            finished_at: None,
            error_details: None,
            created_at,
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status != JobStatus::Pending {
            return Err(Error::IllegalTransition(format!(
                "cannot start ingestion job {} from status {:?}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::InProgress;
        self.started_at = Some(now);
        Ok(())
    }

    /// Records progress for one pivoted batch. `rows_ingested` must never
    /// exceed `total_rows`.
    pub fn record_progress(&mut self, rows_in_batch: i64, rows_seen_in_batch: i64) {
        self.rows_ingested += rows_in_batch;
        self.total_rows += rows_seen_in_batch;
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status != JobStatus::InProgress {
            return Err(Error::IllegalTransition(format!(
                "cannot complete ingestion job {} from status {:?}",
                self.id, self.status
            )));
        }
        if self.rows_ingested != self.total_rows {
            return Err(Error::IllegalTransition(format!(
                "ingestion job {} has rows_ingested={} != total_rows={}, cannot complete",
                self.id, self.rows_ingested, self.total_rows
            )));
        }
        self.status = JobStatus::Completed;
        self.finished_at = Some(now);
        Ok(())
    }

    pub fn fail(&mut self, now: DateTime<Utc>, error_details: impl Into<String>) -> Result<(), Error> {
        if self.status != JobStatus::InProgress {
            return Err(Error::IllegalTransition(format!(
                "cannot fail ingestion job {} from status {:?}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Failed;
        self.finished_at = Some(now);
        self.error_details = Some(error_details.into());
        Ok(())
    }

    /// Clears an ingestion job back to a fresh `pending` state for a
    /// retried `Job`. Callers must purge the file's staging rows first —
    /// this method only resets in-memory bookkeeping.
    pub fn reset_for_retry(&mut self) {
        self.status = JobStatus::Pending;
        self.rows_ingested = 0;
        self.total_rows = 0;
        self.started_at = None;
        self.finished_at = None;
        self.error_details = None;
    }

    pub fn progress_percentage(&self) -> Option<f64> {
        if self.total_rows == 0 {
            return None;
        }
        if self.rows_ingested >= self.total_rows {
            Some(100.0)
        } else {
            Some(self.rows_ingested as f64 / self.total_rows as f64 * 100.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2024-01-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn empty_file_completes_with_zero_rows() {
        let mut job = IngestionJob::new(1, "f1".to_string(), "json".to_string(), now());
        job.start(now()).unwrap();
        job.complete(now()).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.total_rows, 0);
        assert_eq!(job.rows_ingested, 0);
    }

    #[test]
    fn cannot_complete_with_unequal_rows_ingested_and_total() {
        let mut job = IngestionJob::new(1, "f1".to_string(), "json".to_string(), now());
        job.start(now()).unwrap();
        job.total_rows = 10;
        job.rows_ingested = 5;
        assert!(job.complete(now()).is_err());
    }

    #[test]
    fn progress_percentage_caps_at_100() {
        let mut job = IngestionJob::new(1, "f1".to_string(), "json".to_string(), now());
        job.total_rows = 10;
        job.rows_ingested = 12;
        assert_eq!(job.progress_percentage(), Some(100.0));
    }

    #[test]
    fn zero_total_rows_has_no_percentage() {
        let job = IngestionJob::new(1, "f1".to_string(), "json".to_string(), now());
        assert_eq!(job.progress_percentage(), None);
    }

    #[test]
    fn reset_for_retry_clears_progress_and_timestamps() {
        let mut job = IngestionJob::new(1, "f1".to_string(), "json".to_string(), now());
        job.start(now()).unwrap();
        job.record_progress(5, 5);
        job.fail(now(), "boom").unwrap();
        job.reset_for_retry();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.rows_ingested, 0);
        assert_eq!(job.total_rows, 0);
        assert!(job.started_at.is_none());
        assert!(job.finished_at.is_none());
        assert!(job.error_details.is_none());
    }
}
