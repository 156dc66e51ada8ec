//! Request/response shapes for the HTTP surface.

use loadbench_jobs::{Job, JobStatus};
use serde::{Deserialize, Serialize};

/// `success`/`duration_seconds` are computed at serialization time, not
/// stored columns — ground in `original_source/src/app/schemas/job_schema.py`.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: Job,
    pub success: bool,
    pub duration_seconds: Option<f64>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        let success = job.is_success();
        let duration_seconds = job.duration_seconds();
        Self { job, success, duration_seconds }
    }
}

/// Optional metadata carried alongside a multipart upload. Logged at
/// upload time, stored nowhere durable (`original_source/src/app/
/// schemas/requests.py`).
#[derive(Debug, Deserialize, Default)]
pub struct FileUploadMetadata {
    pub test_name: Option<String>,
    pub environment: Option<String>,
    pub test_duration_minutes: Option<f64>,
    pub expected_load: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub file_format: String,
    pub file_size_mb: f64,
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub file_path: String,
    pub file_size_mb: f64,
    pub validation: ValidationResult,
    pub job_id: i64,
}

#[derive(Debug, Serialize)]
pub struct IngestTriggerResponse {
    pub job_id: i64,
    pub status: JobStatus,
    pub enqueued: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeAsyncRequest {
    pub report_id: String,
    #[serde(default)]
    pub analysis_type: Option<String>,
    #[serde(default)]
    pub include_recommendations: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AskAsyncRequest {
    pub question: String,
    pub report_id: String,
    #[serde(default)]
    pub context_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RetryRequest {
    #[serde(default)]
    pub force_retry: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateReportQuery {
    pub file_id: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateReportResponse {
    pub report_id: String,
    pub report_path: String,
    pub file_id: String,
    pub processing_time_seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CeleryHealthResponse {
    pub status: &'static str,
    pub workers: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loadbench_jobs::JobType;

    #[test]
    fn pending_job_reports_not_successful_with_no_duration() {
        let job = Job::new(JobType::Ingestion, 1, Utc::now());
        let response = JobResponse::from(job);
        assert!(!response.success);
        assert!(response.duration_seconds.is_none());
    }

    #[test]
    fn completed_job_reports_success_and_duration() {
        let mut job = Job::new(JobType::Ingestion, 1, Utc::now());
        let started = Utc::now();
        job.start(started).unwrap();
        let finished = started + chrono::Duration::seconds(5);
        job.complete(finished, None).unwrap();
        let response = JobResponse::from(job);
        assert!(response.success);
        assert_eq!(response.duration_seconds, Some(5.0));
    }
}
