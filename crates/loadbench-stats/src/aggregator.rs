//! Global and per-endpoint online aggregators. Both consume the
//! same canonical record stream independently and are safe to run in
//! parallel.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use loadbench_core::CanonicalRecord;

use crate::metrics::{EndpointMetrics, GlobalMetrics};
use crate::reservoir::{ReservoirSampler, DEFAULT_CAPACITY};
use crate::welford::Welford;

fn status_bucket(status_code: i32) -> Option<u8> {
    match status_code {
        200..=299 => Some(2),
        300..=399 => Some(3),
        400..=499 => Some(4),
        500..=599 => Some(5),
        _ => None,
    }
}

pub struct GlobalAggregator {
    total_requests: u64,
    success_count: u64,
    request_status_error: u64,
    min_timestamp: Option<DateTime<Utc>>,
    max_timestamp: Option<DateTime<Utc>>,
    status_counts: HashMap<i32, u64>,
    response_stats: Welford,
    response_sampler: ReservoirSampler,
}

impl GlobalAggregator {
    pub fn new(sampler_size: usize) -> Self {
        Self {
            total_requests: 0,
            success_count: 0,
            request_status_error: 0,
            min_timestamp: None,
            max_timestamp: None,
            status_counts: HashMap::new(),
            response_stats: Welford::new(),
            response_sampler: ReservoirSampler::new(sampler_size),
        }
    }

    pub fn with_seed(sampler_size: usize, seed: u64) -> Self {
        Self {
            total_requests: 0,
            success_count: 0,
            request_status_error: 0,
            min_timestamp: None,
            max_timestamp: None,
            status_counts: HashMap::new(),
            response_stats: Welford::new(),
            response_sampler: ReservoirSampler::with_seed(sampler_size, seed),
        }
    }

    pub fn update(&mut self, record: &CanonicalRecord) {
        self.total_requests += 1;
        if record.success == Some(true) {
            self.success_count += 1;
        }
        if record.status_code >= 400 {
            self.request_status_error += 1;
        }

        self.min_timestamp = Some(match self.min_timestamp {
            Some(t) if t <= record.timestamp => t,
            _ => record.timestamp,
        });
        self.max_timestamp = Some(match self.max_timestamp {
            Some(t) if t >= record.timestamp => t,
            _ => record.timestamp,
        });

        *self.status_counts.entry(record.status_code).or_insert(0) += 1;

        self.response_stats.update(record.response_time_ms);
        self.response_sampler.update(record.response_time_ms);
    }

    pub fn update_batch(&mut self, records: &[CanonicalRecord]) {
        for record in records {
            self.update(record);
        }
    }

    pub fn finalize(&self) -> Option<GlobalMetrics> {
        if self.total_requests == 0 {
            return None;
        }

        let total = self.total_requests as f64;
        let success_rate = self.success_count as f64 / total;
        let duration_sec = match (self.min_timestamp, self.max_timestamp) {
            (Some(min), Some(max)) => (max - min).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        };

        let bucket_share = |bucket: u8| -> f64 {
            self.status_counts
                .iter()
                .filter(|(code, _)| status_bucket(**code) == Some(bucket))
                .map(|(_, count)| *count as f64)
                .sum::<f64>()
                / total
        };

        Some(GlobalMetrics {
            total_requests: self.total_requests,
            success_rate,
            failure_rate: 1.0 - success_rate,
            median_response_time: self.response_sampler.percentile(50.0),
            avg_response_time: self.response_stats.avg(),
            p90_response_time: self.response_sampler.percentile(90.0),
            p95_response_time: self.response_sampler.percentile(95.0),
            p99_response_time: self.response_sampler.percentile(99.0),
            max_response_time: self.response_stats.max(),
            min_response_time: self.response_stats.min(),
            request_status_error: self.request_status_error as f64 / total,
            rps: (duration_sec > 0.0).then_some(total / duration_sec),
            status_2xx: bucket_share(2),
            status_3xx: bucket_share(3),
            status_4xx: bucket_share(4),
            status_5xx: bucket_share(5),
        })
    }

}

struct EndpointAccumulator {
    total_requests: u64,
    success_count: u64,
    request_status_error: u64,
    min_timestamp: Option<DateTime<Utc>>,
    max_timestamp: Option<DateTime<Utc>>,
    status_counts: HashMap<i32, u64>,
    latency: HashMap<&'static str, (Welford, ReservoirSampler)>,
}

impl EndpointAccumulator {
    fn new(sampler_size: usize, seed: Option<u64>) -> Self {
        let mut latency = HashMap::new();
        for name in [
            "response_time_ms",
            "blocked_ms",
            "connecting_ms",
            "receiving_ms",
            "sending_ms",
            "tls_handshake_ms",
            "waiting_ms",
        ] {
            let sampler = match seed {
                Some(s) => ReservoirSampler::with_seed(sampler_size, s),
                None => ReservoirSampler::new(sampler_size),
            };
            latency.insert(name, (Welford::new(), sampler));
        }
        Self {
            total_requests: 0,
            success_count: 0,
            request_status_error: 0,
            min_timestamp: None,
            max_timestamp: None,
            status_counts: HashMap::new(),
            latency,
        }
    }
}

pub struct EndpointAggregator {
    sampler_size: usize,
    seed: Option<u64>,
    data: HashMap<String, EndpointAccumulator>,
}

impl EndpointAggregator {
    pub fn new(sampler_size: usize) -> Self {
        Self {
            sampler_size,
            seed: None,
            data: HashMap::new(),
        }
    }

    pub fn with_seed(sampler_size: usize, seed: u64) -> Self {
        Self {
            sampler_size,
            seed: Some(seed),
            data: HashMap::new(),
        }
    }

    pub fn update(&mut self, record: &CanonicalRecord) {
        let sampler_size = self.sampler_size;
        let seed = self.seed;
        let acc = self
            .data
            .entry(record.url.clone())
            .or_insert_with(|| EndpointAccumulator::new(sampler_size, seed));

        acc.total_requests += 1;
        if record.success == Some(true) {
            acc.success_count += 1;
        }
        if record.status_code >= 400 {
            acc.request_status_error += 1;
        }
        acc.min_timestamp = Some(match acc.min_timestamp {
            Some(t) if t <= record.timestamp => t,
            _ => record.timestamp,
        });
        acc.max_timestamp = Some(match acc.max_timestamp {
            Some(t) if t >= record.timestamp => t,
            _ => record.timestamp,
        });
        *acc.status_counts.entry(record.status_code).or_insert(0) += 1;

        for (name, value) in record.latency_fields() {
            if let Some(v) = value {
                if let Some((welford, sampler)) = acc.latency.get_mut(name) {
                    welford.update(v);
                    sampler.update(v);
                }
            }
        }
    }

    pub fn update_batch(&mut self, records: &[CanonicalRecord]) {
        for record in records {
            self.update(record);
        }
    }

    pub fn finalize(&self) -> Vec<EndpointMetrics> {
        let mut results: Vec<EndpointMetrics> = self
            .data
            .iter()
            .filter(|(_, acc)| acc.total_requests > 0)
            .map(|(url, acc)| {
                let total = acc.total_requests as f64;
                let success_rate = acc.success_count as f64 / total;
                let duration_sec = match (acc.min_timestamp, acc.max_timestamp) {
                    (Some(min), Some(max)) => (max - min).num_milliseconds() as f64 / 1000.0,
                    _ => 0.0,
                };

                let bucket_share = |bucket: u8| -> f64 {
                    acc.status_counts
                        .iter()
                        .filter(|(code, _)| status_bucket(**code) == Some(bucket))
                        .map(|(_, count)| *count as f64)
                        .sum::<f64>()
                        / total
                };

                let (response_welford, response_sampler) =
                    acc.latency.get("response_time_ms").unwrap();
                let p50 = response_sampler.percentile(50.0);
                let p90 = response_sampler.percentile(90.0);

                let avg_of = |field: &str| -> Option<f64> {
                    acc.latency.get(field).and_then(|(w, _)| w.avg())
                };

                EndpointMetrics {
                    url: url.clone(),
                    total_requests: acc.total_requests,
                    success_rate,
                    failure_rate: 1.0 - success_rate,
                    median_response_time: p50,
                    avg_response_time: response_welford.avg(),
                    p90_response_time: p90,
                    p95_response_time: response_sampler.percentile(95.0),
                    p99_response_time: response_sampler.percentile(99.0),
                    max_response_time: response_welford.max(),
                    min_response_time: response_welford.min(),
                    tail_latency_gap: match (p90, p50) {
                        (Some(p90), Some(p50)) => Some(p90 - p50),
                        _ => None,
                    },
                    blocked_ms: avg_of("blocked_ms"),
                    connecting_ms: avg_of("connecting_ms"),
                    receiving_ms: avg_of("receiving_ms"),
                    sending_ms: avg_of("sending_ms"),
                    tls_handshake_ms: avg_of("tls_handshake_ms"),
                    waiting_ms: avg_of("waiting_ms"),
                    request_status_error: acc.request_status_error as f64 / total,
                    rps: (duration_sec > 0.0).then_some(total / duration_sec),
                    status_2xx: bucket_share(2),
                    status_3xx: bucket_share(3),
                    status_4xx: bucket_share(4),
                    status_5xx: bucket_share(5),
                }
            })
            .collect();

        results.sort_by(|a, b| a.url.cmp(&b.url));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(url: &str, status_code: i32, response_time_ms: f64, success: Option<bool>) -> CanonicalRecord {
        CanonicalRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            url: url.to_string(),
            method: "GET".to_string(),
            status_code,
            success,
            response_time_ms,
            blocked_ms: None,
            connecting_ms: None,
            receiving_ms: None,
            sending_ms: None,
            tls_handshake_ms: None,
            waiting_ms: None,
        }
    }

    #[test]
    fn zero_requests_finalize_is_none() {
        let agg = GlobalAggregator::new(100);
        assert!(agg.finalize().is_none());
    }

    #[test]
    fn two_requests_one_url_scenario() {
        let mut agg = GlobalAggregator::with_seed(100, 1);
        agg.update(&record("https://test.k6.io/", 200, 120.0, Some(true)));
        agg.update(&record("https://test.k6.io/", 200, 80.0, Some(true)));

        let metrics = agg.finalize().unwrap();
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.avg_response_time, Some(100.0));
        assert_eq!(metrics.success_rate, 1.0);
        assert_eq!(metrics.status_2xx, 1.0);
        assert_eq!(metrics.rps, None);
    }

    #[test]
    fn error_record_scenario() {
        let mut agg = GlobalAggregator::with_seed(100, 1);
        agg.update(&record("https://test.k6.io/", 500, 500.0, Some(false)));

        let metrics = agg.finalize().unwrap();
        assert_eq!(metrics.success_rate, 0.0);
        assert_eq!(metrics.request_status_error, 1.0);
        assert_eq!(metrics.status_5xx, 1.0);
    }

    #[test]
    fn unknown_endpoint_is_its_own_entry() {
        let mut agg = EndpointAggregator::with_seed(100, 1);
        agg.update(&record("checkout", 200, 50.0, Some(true)));
        let results = agg.finalize();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "checkout");
    }

    #[test]
    fn percentile_monotonicity_holds() {
        let mut agg = GlobalAggregator::with_seed(DEFAULT_CAPACITY, 11);
        for i in 0..1000 {
            agg.update(&record("/", 200, i as f64, Some(true)));
        }
        let m = agg.finalize().unwrap();
        assert!(m.min_response_time.unwrap() <= m.median_response_time.unwrap());
        assert!(m.median_response_time.unwrap() <= m.p90_response_time.unwrap());
        assert!(m.p90_response_time.unwrap() <= m.p95_response_time.unwrap());
        assert!(m.p95_response_time.unwrap() <= m.p99_response_time.unwrap());
        assert!(m.p99_response_time.unwrap() <= m.max_response_time.unwrap());
    }
}
