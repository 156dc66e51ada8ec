//! `POST /report/generate-eda-report`. HTML templating is
//! out of scope; this handler computes the
//! global metrics for the file's most recent ingestion and returns a
//! report descriptor pointing at a not-yet-rendered path, grounded in
//! `original_source/src/app/api/routers/report.py` minus `ReportService`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use uuid::Uuid;

use crate::dto::{GenerateReportQuery, GenerateReportResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/report/generate-eda-report", post(generate_eda_report))
        .with_state(state)
}

async fn generate_eda_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GenerateReportQuery>,
) -> ApiResult<Json<GenerateReportResponse>> {
    let started = Instant::now();

    let ingestion_job =
        loadbench_store::repository::get_latest_ingestion_job_by_file_id(&state.pool, &query.file_id)
            .await
            .map_err(ApiError::Store)?;

    let raw = loadbench_store::metrics_queries::calculate_global_metrics(&state.pool, ingestion_job.id)
        .await
        .map_err(ApiError::Store)?;
    let _global_metrics = loadbench_store::formatter::format_global_metrics(raw);

    let report_id = Uuid::new_v4().to_string();
    let report_path = format!("{}/{}.html", state.config.reports_dir, report_id);

    Ok(Json(GenerateReportResponse {
        report_id,
        report_path,
        file_id: query.file_id,
        processing_time_seconds: started.elapsed().as_secs_f64(),
    }))
}
