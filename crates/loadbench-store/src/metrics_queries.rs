//! Read-path metrics queries. Each function mirrors one query from the
//! original EDA layer, pushed down to Postgres instead of recomputed
//! client-side.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::Error;

#[derive(Debug, FromRow)]
pub struct GlobalMetricsRow {
    pub total_requests: i64,
    pub success_count: i64,
    pub avg_response_time: Option<f64>,
    pub median_response_time: Option<f64>,
    pub p90_response_time: Option<f64>,
    pub p95_response_time: Option<f64>,
    pub p99_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
    pub min_response_time: Option<f64>,
    pub min_timestamp: Option<DateTime<Utc>>,
    pub max_timestamp: Option<DateTime<Utc>>,
    pub error_count: i64,
    pub status_2xx: i64,
    pub status_3xx: i64,
    pub status_4xx: i64,
    pub status_5xx: i64,
}

pub async fn calculate_global_metrics(pool: &PgPool, job_id: i64) -> Result<GlobalMetricsRow, Error> {
    let row = sqlx::query_as::<_, GlobalMetricsRow>(
        "SELECT
            COUNT(*) as total_requests,
            COALESCE(SUM(CASE WHEN success = true THEN 1 ELSE 0 END), 0) as success_count,
            AVG(response_time_ms) as avg_response_time,
            PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY response_time_ms) as median_response_time,
            PERCENTILE_CONT(0.90) WITHIN GROUP (ORDER BY response_time_ms) as p90_response_time,
            PERCENTILE_CONT(0.95) WITHIN GROUP (ORDER BY response_time_ms) as p95_response_time,
            PERCENTILE_CONT(0.99) WITHIN GROUP (ORDER BY response_time_ms) as p99_response_time,
            MAX(response_time_ms) as max_response_time,
            MIN(response_time_ms) as min_response_time,
            MIN(timestamp) as min_timestamp,
            MAX(timestamp) as max_timestamp,
            COALESCE(SUM(CASE WHEN status_code >= 400 THEN 1 ELSE 0 END), 0) as error_count,
            COALESCE(SUM(CASE WHEN status_code >= 200 AND status_code < 300 THEN 1 ELSE 0 END), 0) as status_2xx,
            COALESCE(SUM(CASE WHEN status_code >= 300 AND status_code < 400 THEN 1 ELSE 0 END), 0) as status_3xx,
            COALESCE(SUM(CASE WHEN status_code >= 400 AND status_code < 500 THEN 1 ELSE 0 END), 0) as status_4xx,
            COALESCE(SUM(CASE WHEN status_code >= 500 AND status_code < 600 THEN 1 ELSE 0 END), 0) as status_5xx
         FROM request_logs
         WHERE job_id = $1",
    )
    .bind(job_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

#[derive(Debug, FromRow)]
pub struct EndpointMetricsRow {
    pub url: String,
    pub total_requests: i64,
    pub success_count: i64,
    pub avg_response_time: Option<f64>,
    pub median_response_time: Option<f64>,
    pub p90_response_time: Option<f64>,
    pub p95_response_time: Option<f64>,
    pub p99_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
    pub min_response_time: Option<f64>,
    pub avg_blocked_ms: Option<f64>,
    pub avg_connecting_ms: Option<f64>,
    pub avg_receiving_ms: Option<f64>,
    pub avg_sending_ms: Option<f64>,
    pub avg_tls_handshake_ms: Option<f64>,
    pub avg_waiting_ms: Option<f64>,
    pub error_count: i64,
    pub status_2xx: i64,
    pub status_3xx: i64,
    pub status_4xx: i64,
    pub status_5xx: i64,
    pub first_request: Option<DateTime<Utc>>,
    pub last_request: Option<DateTime<Utc>>,
}

pub async fn calculate_endpoint_metrics(
    pool: &PgPool,
    job_id: i64,
) -> Result<Vec<EndpointMetricsRow>, Error> {
    let rows = sqlx::query_as::<_, EndpointMetricsRow>(
        "SELECT
            url,
            COUNT(*) as total_requests,
            COALESCE(SUM(CASE WHEN success = true THEN 1 ELSE 0 END), 0) as success_count,
            AVG(response_time_ms) as avg_response_time,
            PERCENTILE_CONT(0.50) WITHIN GROUP (ORDER BY response_time_ms) as median_response_time,
            PERCENTILE_CONT(0.90) WITHIN GROUP (ORDER BY response_time_ms) as p90_response_time,
            PERCENTILE_CONT(0.95) WITHIN GROUP (ORDER BY response_time_ms) as p95_response_time,
            PERCENTILE_CONT(0.99) WITHIN GROUP (ORDER BY response_time_ms) as p99_response_time,
            MAX(response_time_ms) as max_response_time,
            MIN(response_time_ms) as min_response_time,
            AVG(blocked_ms) as avg_blocked_ms,
            AVG(connecting_ms) as avg_connecting_ms,
            AVG(receiving_ms) as avg_receiving_ms,
            AVG(sending_ms) as avg_sending_ms,
            AVG(tls_handshake_ms) as avg_tls_handshake_ms,
            AVG(waiting_ms) as avg_waiting_ms,
            COALESCE(SUM(CASE WHEN status_code >= 400 THEN 1 ELSE 0 END), 0) as error_count,
            COALESCE(SUM(CASE WHEN status_code >= 200 AND status_code < 300 THEN 1 ELSE 0 END), 0) as status_2xx,
            COALESCE(SUM(CASE WHEN status_code >= 300 AND status_code < 400 THEN 1 ELSE 0 END), 0) as status_3xx,
            COALESCE(SUM(CASE WHEN status_code >= 400 AND status_code < 500 THEN 1 ELSE 0 END), 0) as status_4xx,
            COALESCE(SUM(CASE WHEN status_code >= 500 AND status_code < 600 THEN 1 ELSE 0 END), 0) as status_5xx,
            MIN(timestamp) as first_request,
            MAX(timestamp) as last_request
         FROM request_logs
         WHERE job_id = $1
         GROUP BY url
         ORDER BY total_requests DESC",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, FromRow, serde::Serialize)]
pub struct RpsPoint {
    pub ts: DateTime<Utc>,
    pub requests: i64,
}

pub async fn rps_over_time(pool: &PgPool, job_id: i64) -> Result<Vec<RpsPoint>, Error> {
    let rows = sqlx::query_as::<_, RpsPoint>(
        "SELECT DATE_TRUNC('second', timestamp) as ts, COUNT(*) as requests
         FROM request_logs
         WHERE job_id = $1
         GROUP BY ts
         ORDER BY ts",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, FromRow, serde::Serialize)]
pub struct LatencyPoint {
    pub ts: DateTime<Utc>,
    pub median: Option<f64>,
    pub p95: Option<f64>,
}

pub async fn response_time_percentiles(pool: &PgPool, job_id: i64) -> Result<Vec<LatencyPoint>, Error> {
    let rows = sqlx::query_as::<_, LatencyPoint>(
        "SELECT
            DATE_TRUNC('minute', timestamp) as ts,
            PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY response_time_ms) as median,
            PERCENTILE_CONT(0.95) WITHIN GROUP (ORDER BY response_time_ms) as p95
         FROM request_logs
         WHERE job_id = $1
         GROUP BY ts
         ORDER BY ts",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, FromRow, serde::Serialize)]
pub struct ErrorRatePoint {
    pub ts: DateTime<Utc>,
    pub error_rate: Option<f64>,
}

pub async fn error_rate_over_time(pool: &PgPool, job_id: i64) -> Result<Vec<ErrorRatePoint>, Error> {
    let rows = sqlx::query_as::<_, ErrorRatePoint>(
        "SELECT
            DATE_TRUNC('minute', timestamp) as ts,
            SUM(CASE WHEN status_code >= 400 THEN 1 ELSE 0 END)::float8 / COUNT(*) as error_rate
         FROM request_logs
         WHERE job_id = $1
         GROUP BY ts
         ORDER BY ts",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, FromRow, serde::Serialize)]
pub struct SlowestEndpoint {
    pub url: String,
    pub avg_latency: Option<f64>,
}

pub async fn slowest_endpoints(pool: &PgPool, job_id: i64) -> Result<Vec<SlowestEndpoint>, Error> {
    let rows = sqlx::query_as::<_, SlowestEndpoint>(
        "SELECT url, AVG(response_time_ms) as avg_latency
         FROM request_logs
         WHERE job_id = $1
         GROUP BY url
         ORDER BY avg_latency DESC
         LIMIT 10",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, FromRow, serde::Serialize)]
pub struct EndpointErrorRate {
    pub url: String,
    pub error_count: i64,
    pub total_requests: i64,
    pub error_rate: Option<f64>,
}

pub async fn error_distribution_by_endpoint(
    pool: &PgPool,
    job_id: i64,
) -> Result<Vec<EndpointErrorRate>, Error> {
    let rows = sqlx::query_as::<_, EndpointErrorRate>(
        "SELECT
            url,
            SUM(CASE WHEN status_code >= 400 THEN 1 ELSE 0 END) as error_count,
            COUNT(*) as total_requests,
            SUM(CASE WHEN status_code >= 400 THEN 1 ELSE 0 END)::float8 / COUNT(*) as error_rate
         FROM request_logs
         WHERE job_id = $1
         GROUP BY url
         ORDER BY error_rate DESC",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, FromRow, serde::Serialize)]
pub struct StatusCodeCount {
    pub status_code: i32,
    pub count: i64,
}

pub async fn status_code_distribution(pool: &PgPool, job_id: i64) -> Result<Vec<StatusCodeCount>, Error> {
    let rows = sqlx::query_as::<_, StatusCodeCount>(
        "SELECT status_code, COUNT(*) as count
         FROM request_logs
         WHERE job_id = $1
         GROUP BY status_code",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
