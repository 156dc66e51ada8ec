//! Orchestration-layer job record and its state machine.
//!
//! ```text
//! pending ──start──▶ in_progress ──ok──▶ completed
//!                       │
//!                       └──err──▶ failed ──retry──▶ pending
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use loadbench_core::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Ingestion,
    Analysis,
    Qa,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobType::Ingestion => "ingestion",
            JobType::Analysis => "analysis",
            JobType::Qa => "qa",
        };
        f.write_str(s)
    }
}

impl FromStr for JobType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ingestion" => Ok(JobType::Ingestion),
            "analysis" => Ok(JobType::Analysis),
            "qa" => Ok(JobType::Qa),
            other => Err(Error::Unsupported(format!("unknown job_type {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(Error::Unsupported(format!("unknown job status {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub job_type: JobType,
    pub status: JobStatus,
    pub file_id: Option<String>,
    pub report_id: Option<String>,
    pub ingestion_job_id: Option<i64>,
    pub input_blob: Option<serde_json::Value>,
    pub result_blob: Option<serde_json::Value>,
    pub error_details: Option<String>,
    pub retry_count: i32,
    pub can_retry: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(job_type: JobType, id: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            job_type,
            status: JobStatus::Pending,
            file_id: None,
            report_id: None,
            ingestion_job_id: None,
            input_blob: None,
            result_blob: None,
            error_details: None,
            retry_count: 0,
            can_retry: true,
            created_at,
            started_at: None,
            finished_at: None,
        }
    }

    /// `pending -> in_progress`. Only the worker that claimed the task
    /// calls this, and only once per claim.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status != JobStatus::Pending {
            return Err(Error::IllegalTransition(format!(
                "cannot start job {} from status {:?}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::InProgress;
        self.started_at = Some(now);
        Ok(())
    }

    /// `in_progress -> completed`.
    pub fn complete(
        &mut self,
        now: DateTime<Utc>,
        result_blob: Option<serde_json::Value>,
    ) -> Result<(), Error> {
        if self.status != JobStatus::InProgress {
            return Err(Error::IllegalTransition(format!(
                "cannot complete job {} from status {:?}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Completed;
        self.finished_at = Some(now);
        self.result_blob = result_blob;
        Ok(())
    }

    /// `in_progress -> failed`. A job that has ever failed remains
    /// retryable by default, mirroring the source's `can_retry = True`
    /// on every recorded error.
    pub fn fail(&mut self, now: DateTime<Utc>, error_details: impl Into<String>) -> Result<(), Error> {
        if self.status != JobStatus::InProgress {
            return Err(Error::IllegalTransition(format!(
                "cannot fail job {} from status {:?}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Failed;
        self.finished_at = Some(now);
        self.error_details = Some(error_details.into());
        self.can_retry = true;
        Ok(())
    }

    /// `failed -> pending`. Requires `can_retry` unless `force_retry` is
    /// set. Clears the fields a fresh attempt needs to start clean.
    pub fn retry(&mut self, force_retry: bool) -> Result<(), Error> {
        if !force_retry && self.status != JobStatus::Failed {
            return Err(Error::IllegalTransition(format!(
                "only failed jobs can be retried without force_retry (job {})",
                self.id
            )));
        }
        if !force_retry && !self.can_retry {
            return Err(Error::IllegalTransition(format!(
                "job {} cannot be retried",
                self.id
            )));
        }
        self.status = JobStatus::Pending;
        self.retry_count += 1;
        self.error_details = None;
        self.started_at = None;
        self.finished_at = None;
        Ok(())
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => {
                Some((finished - started).num_milliseconds() as f64 / 1000.0)
            }
            _ => None,
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
    fn fresh_job_is_pending_with_no_timestamps() {
        let job = Job::new(JobType::Ingestion, 1, now());
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.started_at.is_none());
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn full_happy_path_lifecycle() {
        let mut job = Job::new(JobType::Ingestion, 1, now());
        job.start(now()).unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
        job.complete(now(), Some(serde_json::json!({"rows": 10}))).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.is_success());
    }

    #[test]
    fn cannot_start_twice() {
        let mut job = Job::new(JobType::Ingestion, 1, now());
        job.start(now()).unwrap();
        assert!(job.start(now()).is_err());
    }

    #[test]
    fn terminal_status_forbids_transitions_except_retry() {
        let mut job = Job::new(JobType::Ingestion, 1, now());
        job.start(now()).unwrap();
        job.complete(now(), None).unwrap();
        assert!(job.start(now()).is_err());
        assert!(job.complete(now(), None).is_err());
        assert!(job.fail(now(), "boom").is_err());
    }

    #[test]
    fn retry_requires_can_retry_or_force() {
        let mut job = Job::new(JobType::Ingestion, 1, now());
        job.can_retry = false;
        job.start(now()).unwrap();
        job.fail(now(), "oops").unwrap();
        // fail() sets can_retry back to true, matching the source's behavior
        assert!(job.can_retry);
        job.retry(false).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_count, 1);
        assert!(job.error_details.is_none());
        assert!(job.started_at.is_none());
    }

    #[test]
    fn force_retry_bypasses_can_retry_and_status_check() {
        let mut job = Job::new(JobType::Ingestion, 1, now());
        job.can_retry = false;
        assert!(job.retry(true).is_ok());
        assert_eq!(job.retry_count, 1);
    }

    #[test]
    fn retry_count_reflects_successful_retries_only() {
        let mut job = Job::new(JobType::Ingestion, 1, now());
        job.start(now()).unwrap();
        job.fail(now(), "e1").unwrap();
        job.retry(false).unwrap();
        job.start(now()).unwrap();
        job.fail(now(), "e2").unwrap();
        job.retry(false).unwrap();
        assert_eq!(job.retry_count, 2);
    }

    #[test]
    fn job_type_and_status_round_trip_through_display_and_from_str() {
        for jt in [JobType::Ingestion, JobType::Analysis, JobType::Qa] {
            assert_eq!(jt.to_string().parse::<JobType>().unwrap(), jt);
        }
        for st in [
            JobStatus::Pending,
            JobStatus::InProgress,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(st.to_string().parse::<JobStatus>().unwrap(), st);
        }
    }

    #[test]
    fn unknown_status_string_is_rejected() {
        assert!("bogus".parse::<JobStatus>().is_err());
    }
}
