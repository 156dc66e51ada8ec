//! `/analyze/*` routes. `analyze-async`/`ask-async` create orchestration-only
//! `Job` rows — the worker fails them immediately with
//! `Error::Unsupported("... is out of scope")`, keeping the surface
//! complete without any LLM integration.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use loadbench_jobs::{Job, JobType};
use tracing::warn;

use crate::dto::{AnalyzeAsyncRequest, AskAsyncRequest, JobResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analyze/analyze-async", post(analyze_async))
        .route("/analyze/ask-async", post(ask_async))
        .route("/analyze/jobs/:job_id", get(get_job))
        .route("/analyze/report/:report_id/jobs", get(list_jobs_for_report))
        .with_state(state)
}

async fn create_and_enqueue_analysis_job(
    state: &AppState,
    job_type: JobType,
    report_id: &str,
    input_blob: serde_json::Value,
) -> ApiResult<Job> {
    let mut job = loadbench_store::repository::create_job(&state.pool, job_type, None, Some(input_blob))
        .await
        .map_err(ApiError::Store)?;
    job.report_id = Some(report_id.to_string());
    loadbench_store::repository::save_job(&state.pool, &job)
        .await
        .map_err(ApiError::Store)?;

    let enqueue = match job_type {
        JobType::Analysis => state.nats.publish_analysis(job.id).await,
        JobType::Qa => state.nats.publish_qa(job.id).await,
        JobType::Ingestion => unreachable!("analyze/ask only create Analysis/Qa jobs"),
    };
    if let Err(e) = enqueue {
        warn!("failed to enqueue {:?} job {}: {}", job_type, job.id, e);
        job.start(Utc::now()).map_err(ApiError::Core)?;
        job.fail(Utc::now(), format!("broker failure: {e}")).map_err(ApiError::Core)?;
        loadbench_store::repository::save_job(&state.pool, &job)
            .await
            .map_err(ApiError::Store)?;
    }

    Ok(job)
}

async fn analyze_async(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeAsyncRequest>,
) -> ApiResult<Json<JobResponse>> {
    let input_blob = serde_json::json!({
        "analysis_type": req.analysis_type,
        "include_recommendations": req.include_recommendations,
    });
    let job = create_and_enqueue_analysis_job(&state, JobType::Analysis, &req.report_id, input_blob).await?;
    Ok(Json(job.into()))
}

async fn ask_async(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskAsyncRequest>,
) -> ApiResult<Json<JobResponse>> {
    if req.question.len() < 5 {
        return Err(ApiError::Validation("question must be at least 5 characters".to_string()).into());
    }
    let input_blob = serde_json::json!({
        "question": req.question,
        "context_type": req.context_type,
    });
    let job = create_and_enqueue_analysis_job(&state, JobType::Qa, &req.report_id, input_blob).await?;
    Ok(Json(job.into()))
}

async fn get_job(State(state): State<Arc<AppState>>, Path(job_id): Path<i64>) -> ApiResult<Json<JobResponse>> {
    let job = loadbench_store::repository::get_job(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(job.into()))
}

async fn list_jobs_for_report(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
) -> ApiResult<Json<Vec<JobResponse>>> {
    let jobs = loadbench_store::repository::list_jobs_by_report_id(&state.pool, &report_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}
