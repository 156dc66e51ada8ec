//! Pivot / normalize stage: groups raw rows sharing
//! `(timestamp, name, method, url, status)` into one canonical record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use loadbench_core::schema::rename_metric;
use loadbench_core::{CanonicalRecord, EndpointAliasMap, RawRow};

/// Per-row validation failures (non-numeric status, missing required
/// fields) must be handled consistently within a job — either dropped or
/// counted, never a mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    Drop,
    Count,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotOutcome {
    pub records: Vec<CanonicalRecord>,
    pub validation_errors: usize,
}

#[derive(Hash, PartialEq, Eq, Clone)]
struct GroupKey {
    timestamp: DateTime<Utc>,
    name: Option<String>,
    method: Option<String>,
    url: Option<String>,
    status: Option<String>,
}

/// Group `rows` by the composite key, then pivot each group into a
/// canonical record. Empty input produces an empty, non-error outcome.
pub fn pivot_batch(
    rows: &[RawRow],
    alias_map: &EndpointAliasMap,
    policy: ValidationPolicy,
) -> PivotOutcome {
    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, HashMap<&'static str, f64>> = HashMap::new();

    for row in rows {
        let key = GroupKey {
            timestamp: row.timestamp,
            name: row.name.clone(),
            method: row.method.clone(),
            url: row.url.clone(),
            status: row.status.clone(),
        };

        let entry = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            HashMap::new()
        });

        if row.metric_name == "http_req_failed" {
            entry.entry("http_req_failed").or_insert(row.metric_value);
        } else if row.metric_name == "http_reqs" {
            // discarded entirely, never enters the canonical record
        } else if let Some(canonical) = rename_metric(&row.metric_name) {
            entry.entry(canonical).or_insert(row.metric_value);
        }
    }

    let mut records = Vec::with_capacity(order.len());
    let mut validation_errors = 0usize;

    for key in order {
        let values = &groups[&key];

        let status_code: i32 = match key.status.as_deref().map(str::parse::<i32>) {
            Some(Ok(code)) => code,
            _ => {
                if policy == ValidationPolicy::Count {
                    validation_errors += 1;
                }
                continue;
            }
        };

        let response_time_ms = match values.get("response_time_ms") {
            Some(v) => *v,
            None => {
                if policy == ValidationPolicy::Count {
                    validation_errors += 1;
                }
                continue;
            }
        };

        let success = values.get("http_req_failed").map(|v| *v == 0.0);
        let url = alias_map.resolve(key.url.as_deref().unwrap_or(""));
        let method = key.method.clone().unwrap_or_default();

        records.push(CanonicalRecord {
            timestamp: key.timestamp,
            url,
            method,
            status_code,
            success,
            response_time_ms,
            blocked_ms: values.get("blocked_ms").copied(),
            connecting_ms: values.get("connecting_ms").copied(),
            receiving_ms: values.get("receiving_ms").copied(),
            sending_ms: values.get("sending_ms").copied(),
            tls_handshake_ms: values.get("tls_handshake_ms").copied(),
            waiting_ms: values.get("waiting_ms").copied(),
        });
    }

    PivotOutcome {
        records,
        validation_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(metric: &str, value: f64, ts: DateTime<Utc>, url: &str, status: &str) -> RawRow {
        RawRow {
            timestamp: ts,
            metric_name: metric.to_string(),
            metric_value: value,
            name: Some("home".to_string()),
            method: Some("GET".to_string()),
            url: Some(url.to_string()),
            status: Some(status.to_string()),
        }
    }

    #[test]
    fn empty_batch_produces_empty_result() {
        let outcome = pivot_batch(&[], &EndpointAliasMap::with_defaults(), ValidationPolicy::Drop);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.validation_errors, 0);
    }

    #[test]
    fn two_requests_one_url_pivot_scenario() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rows = vec![
            row("http_req_duration", 120.0, ts, "home", "200"),
            row("http_req_failed", 0.0, ts, "home", "200"),
        ];
        let outcome = pivot_batch(&rows, &EndpointAliasMap::with_defaults(), ValidationPolicy::Drop);
        assert_eq!(outcome.records.len(), 1);
        let rec = &outcome.records[0];
        assert_eq!(rec.url, "https://test.k6.io/");
        assert_eq!(rec.response_time_ms, 120.0);
        assert_eq!(rec.success, Some(true));
    }

    #[test]
    fn error_record_scenario() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rows = vec![
            row("http_req_duration", 500.0, ts, "home", "500"),
            row("http_req_failed", 1.0, ts, "home", "500"),
        ];
        let outcome = pivot_batch(&rows, &EndpointAliasMap::with_defaults(), ValidationPolicy::Drop);
        let rec = &outcome.records[0];
        assert_eq!(rec.success, Some(false));
        assert_eq!(rec.status_code, 500);
    }

    #[test]
    fn unknown_endpoint_alias_passes_through() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rows = vec![row("http_req_duration", 50.0, ts, "checkout", "200")];
        let outcome = pivot_batch(&rows, &EndpointAliasMap::with_defaults(), ValidationPolicy::Drop);
        assert_eq!(outcome.records[0].url, "checkout");
    }

    #[test]
    fn absent_http_req_failed_leaves_success_null_not_true() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rows = vec![row("http_req_duration", 50.0, ts, "home", "200")];
        let outcome = pivot_batch(&rows, &EndpointAliasMap::with_defaults(), ValidationPolicy::Drop);
        assert_eq!(outcome.records[0].success, None);
    }

    #[test]
    fn http_reqs_and_http_req_failed_never_become_columns() {
        // compile-time guarantee: CanonicalRecord has no such fields.
        // runtime guarantee: the response is well-formed regardless.
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rows = vec![
            row("http_req_duration", 50.0, ts, "home", "200"),
            row("http_reqs", 1.0, ts, "home", "200"),
        ];
        let outcome = pivot_batch(&rows, &EndpointAliasMap::with_defaults(), ValidationPolicy::Drop);
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn chunk_boundary_duplicate_groups_pivot_into_one_record_regardless_of_split() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let first_half = vec![row("http_req_duration", 50.0, ts, "home", "200")];
        let second_half = vec![row("http_req_failed", 0.0, ts, "home", "200")];

        let out_a = pivot_batch(&first_half, &EndpointAliasMap::with_defaults(), ValidationPolicy::Drop);
        let out_b = pivot_batch(&second_half, &EndpointAliasMap::with_defaults(), ValidationPolicy::Drop);
        // Split across chunks: first half alone lacks response_time_ms... no,
        // it has it; second half alone lacks it and is dropped as incomplete.
        assert_eq!(out_a.records.len(), 1);
        assert_eq!(out_b.records.len(), 0);

        // Un-split: both rows arrive together and pivot into exactly one record.
        let combined: Vec<RawRow> = first_half.into_iter().chain(second_half).collect();
        let out_combined = pivot_batch(&combined, &EndpointAliasMap::with_defaults(), ValidationPolicy::Drop);
        assert_eq!(out_combined.records.len(), 1);
    }

    #[test]
    fn non_numeric_status_is_a_validation_failure() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rows = vec![row("http_req_duration", 50.0, ts, "home", "not-a-number")];
        let outcome = pivot_batch(&rows, &EndpointAliasMap::with_defaults(), ValidationPolicy::Count);
        assert_eq!(outcome.records.len(), 0);
        assert_eq!(outcome.validation_errors, 1);
    }
}
