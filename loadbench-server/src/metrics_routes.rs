//! `GET /metrics/{job_id}/...` read-path routes, thin
//! wrappers over `loadbench-store`'s query + formatter functions.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use loadbench_stats::{EndpointMetrics, GlobalMetrics};
use loadbench_store::metrics_queries::{
    EndpointErrorRate, ErrorRatePoint, LatencyPoint, RpsPoint, SlowestEndpoint, StatusCodeCount,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics/:job_id/global", get(global_metrics))
        .route("/metrics/:job_id/endpoints", get(endpoint_metrics))
        .route("/metrics/:job_id/timeseries/rps", get(timeseries_rps))
        .route("/metrics/:job_id/timeseries/latency", get(timeseries_latency))
        .route("/metrics/:job_id/timeseries/errors", get(timeseries_errors))
        .route("/metrics/:job_id/slowest", get(slowest))
        .route("/metrics/:job_id/errors-by-endpoint", get(errors_by_endpoint))
        .route("/metrics/:job_id/status-codes", get(status_codes))
        .with_state(state)
}

async fn global_metrics(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Option<GlobalMetrics>>> {
    let raw = loadbench_store::metrics_queries::calculate_global_metrics(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(loadbench_store::formatter::format_global_metrics(raw)))
}

async fn endpoint_metrics(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Vec<EndpointMetrics>>> {
    let raw = loadbench_store::metrics_queries::calculate_endpoint_metrics(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(loadbench_store::formatter::format_endpoint_metrics(raw)))
}

async fn timeseries_rps(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Vec<RpsPoint>>> {
    let points = loadbench_store::metrics_queries::rps_over_time(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(points))
}

async fn timeseries_latency(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Vec<LatencyPoint>>> {
    let points = loadbench_store::metrics_queries::response_time_percentiles(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(points))
}

async fn timeseries_errors(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Vec<ErrorRatePoint>>> {
    let points = loadbench_store::metrics_queries::error_rate_over_time(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(points))
}

async fn slowest(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Vec<SlowestEndpoint>>> {
    let rows = loadbench_store::metrics_queries::slowest_endpoints(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(rows))
}

async fn errors_by_endpoint(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Vec<EndpointErrorRate>>> {
    let rows = loadbench_store::metrics_queries::error_distribution_by_endpoint(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(rows))
}

async fn status_codes(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Vec<StatusCodeCount>>> {
    let rows = loadbench_store::metrics_queries::status_code_distribution(&state.pool, job_id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(rows))
}
