//! CRUD for the `jobs` and `ingestion_jobs` tables, using runtime
//! `sqlx::query`/`.bind(...)` rather than compile-time checked queries.

use chrono::{DateTime, Utc};
use loadbench_jobs::{IngestionJob, Job, JobStatus, JobType};
use sqlx::{FromRow, PgPool};

use crate::error::Error;

#[derive(FromRow)]
struct JobRow {
    id: i64,
    job_type: String,
    status: String,
    file_id: Option<String>,
    report_id: Option<String>,
    ingestion_job_id: Option<i64>,
    input_blob: Option<serde_json::Value>,
    result_blob: Option<serde_json::Value>,
    error_details: Option<String>,
    retry_count: i32,
    can_retry: bool,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl JobRow {
    fn into_job(self) -> Result<Job, Error> {
        Ok(Job {
            id: self.id,
            job_type: self.job_type.parse::<JobType>().map_err(Error::Core)?,
            status: self.status.parse::<JobStatus>().map_err(Error::Core)?,
            file_id: self.file_id,
            report_id: self.report_id,
            ingestion_job_id: self.ingestion_job_id,
            input_blob: self.input_blob,
            result_blob: self.result_blob,
            error_details: self.error_details,
            retry_count: self.retry_count,
            can_retry: self.can_retry,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        })
    }
}

pub async fn create_job(
    pool: &PgPool,
    job_type: JobType,
    file_id: Option<&str>,
    input_blob: Option<serde_json::Value>,
) -> Result<Job, Error> {
    let row: JobRow = sqlx::query_as(
        "INSERT INTO jobs (job_type, status, file_id, input_blob)
         VALUES ($1, 'pending', $2, $3)
         RETURNING id, job_type, status, file_id, report_id, ingestion_job_id,
                   input_blob, result_blob, error_details, retry_count, can_retry,
                   created_at, started_at, finished_at",
    )
    .bind(job_type.to_string())
    .bind(file_id)
    .bind(input_blob)
    .fetch_one(pool)
    .await?;
    row.into_job()
}

pub async fn get_job(pool: &PgPool, id: i64) -> Result<Job, Error> {
    let row: Option<JobRow> = sqlx::query_as(
        "SELECT id, job_type, status, file_id, report_id, ingestion_job_id,
                input_blob, result_blob, error_details, retry_count, can_retry,
                created_at, started_at, finished_at
         FROM jobs WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => row.into_job(),
        None => Err(Error::Core(loadbench_core::Error::JobNotFound(id.to_string()))),
    }
}

pub async fn list_jobs_by_file_id(pool: &PgPool, file_id: &str) -> Result<Vec<Job>, Error> {
    let rows: Vec<JobRow> = sqlx::query_as(
        "SELECT id, job_type, status, file_id, report_id, ingestion_job_id,
                input_blob, result_blob, error_details, retry_count, can_retry,
                created_at, started_at, finished_at
         FROM jobs WHERE file_id = $1
         ORDER BY created_at DESC",
    )
    .bind(file_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(JobRow::into_job).collect()
}

pub async fn list_jobs_by_report_id(pool: &PgPool, report_id: &str) -> Result<Vec<Job>, Error> {
    let rows: Vec<JobRow> = sqlx::query_as(
        "SELECT id, job_type, status, file_id, report_id, ingestion_job_id,
                input_blob, result_blob, error_details, retry_count, can_retry,
                created_at, started_at, finished_at
         FROM jobs WHERE report_id = $1
         ORDER BY created_at DESC",
    )
    .bind(report_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(JobRow::into_job).collect()
}

pub async fn list_stale_in_progress_jobs(pool: &PgPool, hard_timeout_secs: u64) -> Result<Vec<Job>, Error> {
    let rows: Vec<JobRow> = sqlx::query_as(
        "SELECT id, job_type, status, file_id, report_id, ingestion_job_id,
                input_blob, result_blob, error_details, retry_count, can_retry,
                created_at, started_at, finished_at
         FROM jobs
         WHERE status = 'in_progress'
           AND started_at < now() - ($1 || ' seconds')::interval",
    )
    .bind(hard_timeout_secs.to_string())
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(JobRow::into_job).collect()
}

pub async fn save_job(pool: &PgPool, job: &Job) -> Result<(), Error> {
    sqlx::query(
        "UPDATE jobs SET
            status = $2, file_id = $3, report_id = $4, ingestion_job_id = $5,
            input_blob = $6, result_blob = $7, error_details = $8,
            retry_count = $9, can_retry = $10, started_at = $11, finished_at = $12
         WHERE id = $1",
    )
    .bind(job.id)
    .bind(job.status.to_string())
    .bind(&job.file_id)
    .bind(&job.report_id)
    .bind(job.ingestion_job_id)
    .bind(&job.input_blob)
    .bind(&job.result_blob)
    .bind(&job.error_details)
    .bind(job.retry_count)
    .bind(job.can_retry)
    .bind(job.started_at)
    .bind(job.finished_at)
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(FromRow)]
struct IngestionJobRow {
    id: i64,
    file_id: String,
    file_type: String,
    file_size_mb: Option<f64>,
    status: String,
    rows_ingested: i64,
    total_rows: i64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    error_details: Option<String>,
    created_at: DateTime<Utc>,
}

impl IngestionJobRow {
    fn into_ingestion_job(self) -> Result<IngestionJob, Error> {
        Ok(IngestionJob {
            id: self.id,
            file_id: self.file_id,
            file_type: self.file_type,
            file_size_mb: self.file_size_mb,
            status: self.status.parse::<JobStatus>().map_err(Error::Core)?,
            rows_ingested: self.rows_ingested,
            total_rows: self.total_rows,
            started_at: self.started_at,
            finished_at: self.finished_at,
            error_details: self.error_details,
            created_at: self.created_at,
        })
    }
}

pub async fn create_ingestion_job(
    pool: &PgPool,
    file_id: &str,
    file_type: &str,
    file_size_mb: Option<f64>,
) -> Result<IngestionJob, Error> {
    let row: IngestionJobRow = sqlx::query_as(
        "INSERT INTO ingestion_jobs (file_id, file_type, file_size_mb, status)
         VALUES ($1, $2, $3, 'pending')
         RETURNING id, file_id, file_type, file_size_mb, status, rows_ingested,
                   total_rows, started_at, finished_at, error_details, created_at",
    )
    .bind(file_id)
    .bind(file_type)
    .bind(file_size_mb)
    .fetch_one(pool)
    .await?;
    row.into_ingestion_job()
}

pub async fn get_ingestion_job(pool: &PgPool, id: i64) -> Result<IngestionJob, Error> {
    let row: Option<IngestionJobRow> = sqlx::query_as(
        "SELECT id, file_id, file_type, file_size_mb, status, rows_ingested,
                total_rows, started_at, finished_at, error_details, created_at
         FROM ingestion_jobs WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => row.into_ingestion_job(),
        None => Err(Error::Core(loadbench_core::Error::JobNotFound(id.to_string()))),
    }
}

pub async fn get_latest_ingestion_job_by_file_id(
    pool: &PgPool,
    file_id: &str,
) -> Result<IngestionJob, Error> {
    let row: Option<IngestionJobRow> = sqlx::query_as(
        "SELECT id, file_id, file_type, file_size_mb, status, rows_ingested,
                total_rows, started_at, finished_at, error_details, created_at
         FROM ingestion_jobs WHERE file_id = $1
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(file_id)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => row.into_ingestion_job(),
        None => Err(Error::Core(loadbench_core::Error::InputNotFound(file_id.to_string()))),
    }
}

pub async fn save_ingestion_job(pool: &PgPool, job: &IngestionJob) -> Result<(), Error> {
    sqlx::query(
        "UPDATE ingestion_jobs SET
            status = $2, rows_ingested = $3, total_rows = $4,
            started_at = $5, finished_at = $6, error_details = $7
         WHERE id = $1",
    )
    .bind(job.id)
    .bind(job.status.to_string())
    .bind(job.rows_ingested)
    .bind(job.total_rows)
    .bind(job.started_at)
    .bind(job.finished_at)
    .bind(&job.error_details)
    .execute(pool)
    .await?;
    Ok(())
}
