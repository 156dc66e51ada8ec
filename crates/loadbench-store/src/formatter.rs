//! Converts the raw SQL aggregate rows into the same `GlobalMetrics` /
//! `EndpointMetrics` shapes the in-memory aggregators produce, so either
//! path is exchangeable from the caller's point of view.

use loadbench_stats::{EndpointMetrics, GlobalMetrics};

use crate::metrics_queries::{EndpointMetricsRow, GlobalMetricsRow};

/// `None` when the job has no rows at all, matching the in-memory
/// aggregator's `finalize() -> Option<GlobalMetrics>`.
pub fn format_global_metrics(raw: GlobalMetricsRow) -> Option<GlobalMetrics> {
    let total_requests = raw.total_requests;
    if total_requests <= 0 {
        return None;
    }
    let total = total_requests as f64;
    let duration_sec = match (raw.min_timestamp, raw.max_timestamp) {
        (Some(min), Some(max)) => (max - min).num_milliseconds() as f64 / 1000.0,
        _ => 0.0,
    };

    Some(GlobalMetrics {
        total_requests: total_requests as u64,
        success_rate: raw.success_count as f64 / total,
        failure_rate: 1.0 - (raw.success_count as f64 / total),
        median_response_time: raw.median_response_time,
        avg_response_time: raw.avg_response_time,
        p90_response_time: raw.p90_response_time,
        p95_response_time: raw.p95_response_time,
        p99_response_time: raw.p99_response_time,
        max_response_time: raw.max_response_time,
        min_response_time: raw.min_response_time,
        request_status_error: raw.error_count as f64 / total,
        rps: if duration_sec > 0.0 {
            Some(total / duration_sec)
        } else {
            None
        },
        status_2xx: raw.status_2xx as f64 / total,
        status_3xx: raw.status_3xx as f64 / total,
        status_4xx: raw.status_4xx as f64 / total,
        status_5xx: raw.status_5xx as f64 / total,
    })
}

pub fn format_endpoint_metrics(raw_rows: Vec<EndpointMetricsRow>) -> Vec<EndpointMetrics> {
    raw_rows
        .into_iter()
        .filter(|row| row.total_requests > 0)
        .map(|row| {
            let total = row.total_requests as f64;
            let duration_sec = match (row.first_request, row.last_request) {
                (Some(first), Some(last)) => (last - first).num_milliseconds() as f64 / 1000.0,
                _ => 0.0,
            };
            let tail_latency_gap = match (row.p90_response_time, row.median_response_time) {
                (Some(p90), Some(median)) => Some(p90 - median),
                _ => None,
            };

            EndpointMetrics {
                url: row.url,
                total_requests: row.total_requests as u64,
                success_rate: row.success_count as f64 / total,
                failure_rate: 1.0 - (row.success_count as f64 / total),
                median_response_time: row.median_response_time,
                avg_response_time: row.avg_response_time,
                p90_response_time: row.p90_response_time,
                p95_response_time: row.p95_response_time,
                p99_response_time: row.p99_response_time,
                max_response_time: row.max_response_time,
                min_response_time: row.min_response_time,
                tail_latency_gap,
                blocked_ms: row.avg_blocked_ms,
                connecting_ms: row.avg_connecting_ms,
                receiving_ms: row.avg_receiving_ms,
                sending_ms: row.avg_sending_ms,
                tls_handshake_ms: row.avg_tls_handshake_ms,
                waiting_ms: row.avg_waiting_ms,
                request_status_error: row.error_count as f64 / total,
                rps: if duration_sec > 0.0 {
                    Some(total / duration_sec)
                } else {
                    None
                },
                status_2xx: row.status_2xx as f64 / total,
                status_3xx: row.status_3xx as f64 / total,
                status_4xx: row.status_4xx as f64 / total,
                status_5xx: row.status_5xx as f64 / total,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_requests_formats_to_none() {
        let raw = GlobalMetricsRow {
            total_requests: 0,
            success_count: 0,
            avg_response_time: None,
            median_response_time: None,
            p90_response_time: None,
            p95_response_time: None,
            p99_response_time: None,
            max_response_time: None,
            min_response_time: None,
            min_timestamp: None,
            max_timestamp: None,
            error_count: 0,
            status_2xx: 0,
            status_3xx: 0,
            status_4xx: 0,
            status_5xx: 0,
        };
        assert!(format_global_metrics(raw).is_none());
    }

    #[test]
    fn nonzero_total_requests_computes_rates() {
        let raw = GlobalMetricsRow {
            total_requests: 4,
            success_count: 3,
            avg_response_time: Some(100.0),
            median_response_time: Some(95.0),
            p90_response_time: Some(150.0),
            p95_response_time: Some(160.0),
            p99_response_time: Some(170.0),
            max_response_time: Some(200.0),
            min_response_time: Some(50.0),
            min_timestamp: None,
            max_timestamp: None,
            error_count: 1,
            status_2xx: 3,
            status_3xx: 0,
            status_4xx: 1,
            status_5xx: 0,
        };
        let metrics = format_global_metrics(raw).unwrap();
        assert_eq!(metrics.total_requests, 4);
        assert!((metrics.success_rate - 0.75).abs() < 1e-9);
        assert!((metrics.failure_rate - 0.25).abs() < 1e-9);
        assert!(metrics.rps.is_none());
    }
}
