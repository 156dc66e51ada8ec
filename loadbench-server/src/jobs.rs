//! `POST /jobs/{job_id}/retry`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use loadbench_jobs::JobType;
use tracing::warn;

use crate::dto::{JobResponse, RetryRequest};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::upload::staged_file_path;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/jobs/:job_id/retry", post(retry))
        .with_state(state)
}

/// For an ingestion job, any staging rows left over from the failed
/// attempt are purged before the job is handed back to `pending` — a
/// retry must never resume on top of partially-staged rows.
async fn retry(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
    Json(req): Json<RetryRequest>,
) -> ApiResult<Json<JobResponse>> {
    let mut job = loadbench_store::repository::get_job(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;

    job.retry(req.force_retry).map_err(ApiError::Core)?;

    let mut enqueue_file_path = None;
    if let Some(ingestion_job_id) = job.ingestion_job_id {
        loadbench_store::staging::discard(&state.pool, ingestion_job_id)
            .await
            .map_err(ApiError::Store)?;

        let mut ingestion_job = loadbench_store::repository::get_ingestion_job(&state.pool, ingestion_job_id)
            .await
            .map_err(ApiError::Store)?;
        ingestion_job.reset_for_retry();
        loadbench_store::repository::save_ingestion_job(&state.pool, &ingestion_job)
            .await
            .map_err(ApiError::Store)?;

        if let Some(file_id) = &job.file_id {
            enqueue_file_path = Some((
                staged_file_path(&state.config.uploads_dir, file_id, &ingestion_job.file_type),
                ingestion_job.file_type.clone(),
            ));
        }
    }

    loadbench_store::repository::save_job(&state.pool, &job)
        .await
        .map_err(ApiError::Store)?;

    let enqueue_result = match job.job_type {
        JobType::Ingestion => {
            if let (Some(ingestion_job_id), Some((file_path, file_type))) = (job.ingestion_job_id, enqueue_file_path) {
                state
                    .nats
                    .publish_ingestion(job.id, ingestion_job_id, &file_path, &file_type)
                    .await
            } else {
                Ok(())
            }
        }
        JobType::Analysis => state.nats.publish_analysis(job.id).await,
        JobType::Qa => state.nats.publish_qa(job.id).await,
    };
    if let Err(e) = enqueue_result {
        warn!("failed to re-enqueue retried job {}: {}", job.id, e);
        job.start(Utc::now()).map_err(ApiError::Core)?;
        job.fail(Utc::now(), format!("broker failure: {e}")).map_err(ApiError::Core)?;
        loadbench_store::repository::save_job(&state.pool, &job)
            .await
            .map_err(ApiError::Store)?;
    }

    Ok(Json(job.into()))
}
