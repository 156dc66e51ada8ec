//! `/health/*` routes, grounded on `loadbench-worker::health`.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use sqlx::Row;

use crate::dto::{CeleryHealthResponse, HealthCheckResponse};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health/health_check", get(health_check))
        .route("/health/celery", get(celery_health))
        .with_state(state)
}

async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse { status: "ok" })
}

/// `workers` counts jobs currently `in_progress`, not registered worker
/// processes — there is no heartbeat table to query.
async fn celery_health(State(state): State<Arc<AppState>>) -> Json<CeleryHealthResponse> {
    let result = sqlx::query("SELECT COUNT(*) AS n FROM jobs WHERE status = 'in_progress'")
        .fetch_one(&state.pool)
        .await
        .map(|row| row.get::<i64, _>("n"));

    match result {
        Ok(workers) => Json(CeleryHealthResponse { status: "ok", workers }),
        Err(_) => Json(CeleryHealthResponse { status: "unknown", workers: 0 }),
    }
}
