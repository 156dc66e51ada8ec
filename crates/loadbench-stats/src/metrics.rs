//! Result shapes shared by the in-memory aggregators (Component E) and the
//! SQL-backed read path (Component F) — either path must produce the same
//! shape so the two are exchangeable.

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GlobalMetrics {
    pub total_requests: u64,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub median_response_time: Option<f64>,
    pub avg_response_time: Option<f64>,
    pub p90_response_time: Option<f64>,
    pub p95_response_time: Option<f64>,
    pub p99_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
    pub min_response_time: Option<f64>,
    pub request_status_error: f64,
    pub rps: Option<f64>,
    pub status_2xx: f64,
    pub status_3xx: f64,
    pub status_4xx: f64,
    pub status_5xx: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EndpointMetrics {
    pub url: String,
    pub total_requests: u64,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub median_response_time: Option<f64>,
    pub avg_response_time: Option<f64>,
    pub p90_response_time: Option<f64>,
    pub p95_response_time: Option<f64>,
    pub p99_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
    pub min_response_time: Option<f64>,
    pub tail_latency_gap: Option<f64>,
    pub blocked_ms: Option<f64>,
    pub connecting_ms: Option<f64>,
    pub receiving_ms: Option<f64>,
    pub sending_ms: Option<f64>,
    pub tls_handshake_ms: Option<f64>,
    pub waiting_ms: Option<f64>,
    pub request_status_error: f64,
    pub rps: Option<f64>,
    pub status_2xx: f64,
    pub status_3xx: f64,
    pub status_4xx: f64,
    pub status_5xx: f64,
}
