//! `/upload/*` routes: receive a trace file, create its job records, and
//! trigger ingestion (Component H upload surface).

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use loadbench_jobs::{Job, JobType};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::{
    FileUploadMetadata, IngestTriggerResponse, JobResponse, UploadResponse, ValidationResult,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/upload/upload_file", post(upload_file))
        .route("/upload/ingest/:job_id", post(trigger_ingest))
        .route("/upload/jobs/:job_id", get(get_job))
        .route("/upload/file/:file_id/jobs", get(list_jobs_for_file))
        .with_state(state)
}

fn detect_file_type(file_name: &str) -> String {
    match file_name.rsplit('.').next().map(|ext| ext.to_lowercase()) {
        Some(ext) if ext == "json" => "json".to_string(),
        Some(ext) if ext == "csv" => "csv".to_string(),
        Some(ext) => ext,
        None => "unknown".to_string(),
    }
}

pub(crate) fn staged_file_path(uploads_dir: &str, file_id: &str, file_type: &str) -> String {
    format!("{uploads_dir}/{file_id}.{file_type}")
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name = String::from("trace");
    let mut metadata = FileUploadMetadata::default();

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(format!("malformed multipart body: {e}")))?;
        let Some(field) = field else { break };

        match field.name().map(|s| s.to_string()) {
            Some(name) if name == "file" => {
                if let Some(name) = field.file_name() {
                    file_name = name.to_string();
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("failed to read file field: {e}")))?;
                file_bytes = Some(bytes.to_vec());
            }
            Some(name) if name == "metadata" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("failed to read metadata field: {e}")))?;
                metadata = serde_json::from_str(&text)
                    .map_err(|e| ApiError::Validation(format!("invalid metadata JSON: {e}")))?;
            }
            _ => {}
        }
    }

    let bytes = file_bytes.ok_or_else(|| ApiError::Validation("missing `file` field".to_string()))?;
    let file_size_mb = bytes.len() as f64 / (1024.0 * 1024.0);

    if file_size_mb > state.config.max_file_size_mb {
        return Err(ApiError::Validation(format!(
            "file is {:.2} MB, exceeds the {:.2} MB limit",
            file_size_mb, state.config.max_file_size_mb
        ))
        .into());
    }

    info!(
        test_name = ?metadata.test_name,
        environment = ?metadata.environment,
        "accepted upload {}",
        file_name
    );

    let file_id = Uuid::new_v4().to_string();
    let file_type = detect_file_type(&file_name);
    let file_path = staged_file_path(&state.config.uploads_dir, &file_id, &file_type);

    tokio::fs::create_dir_all(&state.config.uploads_dir)
        .await
        .map_err(ApiError::Io)?;
    tokio::fs::write(&file_path, &bytes).await.map_err(ApiError::Io)?;

    let is_valid = matches!(file_type.as_str(), "json" | "csv");
    let error_message = if is_valid {
        None
    } else {
        Some(format!("unsupported file format: {file_type}"))
    };

    let ingestion_job =
        loadbench_store::repository::create_ingestion_job(&state.pool, &file_id, &file_type, Some(file_size_mb))
            .await
            .map_err(ApiError::Store)?;

    let mut job = loadbench_store::repository::create_job(&state.pool, JobType::Ingestion, Some(&file_id), None)
        .await
        .map_err(ApiError::Store)?;
    job.ingestion_job_id = Some(ingestion_job.id);
    loadbench_store::repository::save_job(&state.pool, &job)
        .await
        .map_err(ApiError::Store)?;

    Ok(Json(UploadResponse {
        file_id,
        file_path,
        file_size_mb,
        validation: ValidationResult {
            is_valid,
            file_format: file_type,
            file_size_mb,
            error_message,
        },
        job_id: job.id,
    }))
}

/// Enqueues the already-created ingestion job. A broker failure here
/// marks the job `failed` rather than leaving it stuck `pending`.
async fn trigger_ingest(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<IngestTriggerResponse>> {
    let mut job = loadbench_store::repository::get_job(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;

    if job.job_type != JobType::Ingestion {
        return Err(ApiError::Validation(format!("job {job_id} is not an ingestion job")).into());
    }
    let ingestion_job_id = job
        .ingestion_job_id
        .ok_or_else(|| ApiError::Validation(format!("job {job_id} has no ingestion job attached")))?;
    let file_id = job
        .file_id
        .clone()
        .ok_or_else(|| ApiError::Validation(format!("job {job_id} has no file_id")))?;

    let ingestion_job = loadbench_store::repository::get_ingestion_job(&state.pool, ingestion_job_id)
        .await
        .map_err(ApiError::Store)?;
    let file_path = staged_file_path(&state.config.uploads_dir, &file_id, &ingestion_job.file_type);

    match state
        .nats
        .publish_ingestion(job.id, ingestion_job_id, &file_path, &ingestion_job.file_type)
        .await
    {
        Ok(()) => Ok(Json(IngestTriggerResponse {
            job_id: job.id,
            status: job.status,
            enqueued: true,
        })),
        Err(e) => {
            warn!("failed to enqueue ingestion job {}: {}", job.id, e);
            job.start(Utc::now())
                .map_err(ApiError::Core)?;
            job.fail(Utc::now(), format!("broker failure: {e}"))
                .map_err(ApiError::Core)?;
            loadbench_store::repository::save_job(&state.pool, &job)
                .await
                .map_err(ApiError::Store)?;
            Ok(Json(IngestTriggerResponse {
                job_id: job.id,
                status: job.status,
                enqueued: false,
            }))
        }
    }
}

async fn get_job(State(state): State<Arc<AppState>>, Path(job_id): Path<i64>) -> ApiResult<Json<JobResponse>> {
    let job = loadbench_store::repository::get_job(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(job.into()))
}

async fn list_jobs_for_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> ApiResult<Json<Vec<JobResponse>>> {
    let jobs: Vec<Job> = loadbench_store::repository::list_jobs_by_file_id(&state.pool, &file_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_file_type_recognizes_json_and_csv() {
        assert_eq!(detect_file_type("run.json"), "json");
        assert_eq!(detect_file_type("RUN.CSV"), "csv");
        assert_eq!(detect_file_type("run.parquet"), "parquet");
        assert_eq!(detect_file_type("no_extension"), "no_extension");
    }

    #[test]
    fn staged_file_path_joins_uploads_dir_file_id_and_type() {
        let path = staged_file_path("/data/uploads", "abc123", "json");
        assert_eq!(path, "/data/uploads/abc123.json");
    }
}
