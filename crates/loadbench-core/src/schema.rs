//! Raw row and canonical record types, plus the metric rename table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw metrics a chunked reader keeps; anything else is dropped at the
/// reader boundary before it ever reaches the pivot stage.
pub const METRICS_OF_INTEREST: &[&str] = &[
    "http_req_duration",
    "http_req_blocked",
    "http_req_connecting",
    "http_req_tls_handshaking",
    "http_req_sending",
    "http_req_waiting",
    "http_req_receiving",
    "http_req_failed",
    "http_reqs",
];

pub fn is_metric_of_interest(metric: &str) -> bool {
    METRICS_OF_INTEREST.contains(&metric)
}

/// `raw metric name -> canonical column name`. `http_req_failed` (consumed
/// to derive `success`) and `http_reqs` (discarded) are deliberately absent
/// — they never become columns on the canonical record.
const RENAME_TABLE: &[(&str, &str)] = &[
    ("http_req_duration", "response_time_ms"),
    ("http_req_blocked", "blocked_ms"),
    ("http_req_connecting", "connecting_ms"),
    ("http_req_tls_handshaking", "tls_handshake_ms"),
    ("http_req_sending", "sending_ms"),
    ("http_req_waiting", "waiting_ms"),
    ("http_req_receiving", "receiving_ms"),
];

pub fn rename_metric(metric: &str) -> Option<&'static str> {
    RENAME_TABLE
        .iter()
        .find(|(raw, _)| *raw == metric)
        .map(|(_, canonical)| *canonical)
}

/// One metric measurement line from the load-generator output, before
/// pivoting. A single HTTP request produces several of these sharing the
/// same `(timestamp, name, method, url, status)` tuple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawRow {
    pub timestamp: DateTime<Utc>,
    pub metric_name: String,
    pub metric_value: f64,
    pub name: Option<String>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub status: Option<String>,
}

/// The pivoted, one-row-per-request form consumed by aggregators and
/// persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalRecord {
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub method: String,
    pub status_code: i32,
    /// Null when the chunk carried no `http_req_failed` row for this
    /// request — never coerced to `true`.
    pub success: Option<bool>,
    pub response_time_ms: f64,
    pub blocked_ms: Option<f64>,
    pub connecting_ms: Option<f64>,
    pub receiving_ms: Option<f64>,
    pub sending_ms: Option<f64>,
    pub tls_handshake_ms: Option<f64>,
    pub waiting_ms: Option<f64>,
}

impl CanonicalRecord {
    /// All seven latency columns in the fixed order the endpoint
    /// aggregator iterates them.
    pub fn latency_fields(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("response_time_ms", Some(self.response_time_ms)),
            ("blocked_ms", self.blocked_ms),
            ("connecting_ms", self.connecting_ms),
            ("receiving_ms", self.receiving_ms),
            ("sending_ms", self.sending_ms),
            ("tls_handshake_ms", self.tls_handshake_ms),
            ("waiting_ms", self.waiting_ms),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_table_covers_seven_latency_metrics() {
        assert_eq!(rename_metric("http_req_duration"), Some("response_time_ms"));
        assert_eq!(rename_metric("http_req_blocked"), Some("blocked_ms"));
        assert_eq!(rename_metric("http_req_connecting"), Some("connecting_ms"));
        assert_eq!(
            rename_metric("http_req_tls_handshaking"),
            Some("tls_handshake_ms")
        );
        assert_eq!(rename_metric("http_req_sending"), Some("sending_ms"));
        assert_eq!(rename_metric("http_req_waiting"), Some("waiting_ms"));
        assert_eq!(rename_metric("http_req_receiving"), Some("receiving_ms"));
    }

    #[test]
    fn consumed_and_discarded_metrics_have_no_rename() {
        assert_eq!(rename_metric("http_req_failed"), None);
        assert_eq!(rename_metric("http_reqs"), None);
        assert_eq!(rename_metric("unknown_metric"), None);
    }

    #[test]
    fn metrics_of_interest_includes_failed_and_reqs() {
        assert!(is_metric_of_interest("http_req_failed"));
        assert!(is_metric_of_interest("http_reqs"));
        assert!(!is_metric_of_interest("vus"));
    }
}
