//! Prometheus metrics for worker observability.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::Arc;

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct JobKindLabel(pub String);

impl prometheus_client::encoding::EncodeLabelSet for JobKindLabel {
    fn encode(
        &self,
        mut encoder: prometheus_client::encoding::LabelSetEncoder,
    ) -> Result<(), std::fmt::Error> {
        use prometheus_client::encoding::EncodeLabel;
        ("kind", self.0.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct WorkerMetrics {
    pub ingest_queue_depth: Gauge,
    pub active_jobs: Gauge,
    pub jobs_completed: Family<JobKindLabel, Counter>,
    pub jobs_failed: Family<JobKindLabel, Counter>,
    pub rows_ingested: Counter,
    pub parse_failures: Family<JobKindLabel, Counter>,
    pub reaper_failed: Counter,
    pub registry: Arc<Registry>,
}

impl WorkerMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let ingest_queue_depth = Gauge::default();
        registry.register(
            "loadbench_ingest_queue_depth",
            "Number of pending ingestion jobs",
            ingest_queue_depth.clone(),
        );

        let active_jobs = Gauge::default();
        registry.register(
            "loadbench_worker_active_jobs",
            "Number of jobs currently being processed",
            active_jobs.clone(),
        );

        let jobs_completed = Family::<JobKindLabel, Counter>::default();
        registry.register(
            "loadbench_worker_jobs_completed_total",
            "Total jobs completed by kind",
            jobs_completed.clone(),
        );

        let jobs_failed = Family::<JobKindLabel, Counter>::default();
        registry.register(
            "loadbench_worker_jobs_failed_total",
            "Total jobs failed by kind",
            jobs_failed.clone(),
        );

        let rows_ingested = Counter::default();
        registry.register(
            "loadbench_worker_rows_ingested_total",
            "Total canonical rows persisted",
            rows_ingested.clone(),
        );

        let parse_failures = Family::<JobKindLabel, Counter>::default();
        registry.register(
            "loadbench_worker_parse_failures_total",
            "Malformed input lines skipped, by job kind",
            parse_failures.clone(),
        );

        let reaper_failed = Counter::default();
        registry.register(
            "loadbench_reaper_jobs_failed_total",
            "Jobs permanently failed by reaper",
            reaper_failed.clone(),
        );

        Self {
            ingest_queue_depth,
            active_jobs,
            jobs_completed,
            jobs_failed,
            rows_ingested,
            parse_failures,
            reaper_failed,
            registry: Arc::new(registry),
        }
    }

    pub fn encode(&self) -> String {
        let mut buf = String::new();
        encode(&mut buf, &self.registry).unwrap();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registers_all_metrics() {
        let metrics = WorkerMetrics::new();
        let output = metrics.encode();
        assert!(output.contains("loadbench_ingest_queue_depth"));
        assert!(output.contains("loadbench_worker_active_jobs"));
        assert!(output.contains("loadbench_worker_jobs_completed_total"));
        assert!(output.contains("loadbench_worker_rows_ingested_total"));
        assert!(output.contains("loadbench_reaper_jobs_failed_total"));
    }

    #[test]
    fn gauge_and_counter_values_reflected_in_encode() {
        let metrics = WorkerMetrics::new();
        metrics.ingest_queue_depth.set(3);
        metrics.rows_ingested.inc_by(42);
        let output = metrics.encode();
        assert!(output.contains("loadbench_ingest_queue_depth 3"));
        assert!(output.contains("loadbench_worker_rows_ingested_total_total 42"));
    }

    #[test]
    fn family_counter_with_kind_label() {
        let metrics = WorkerMetrics::new();
        metrics
            .jobs_completed
            .get_or_create(&JobKindLabel("ingestion".to_string()))
            .inc();
        let output = metrics.encode();
        assert!(output.contains("kind=\"ingestion\""));
    }
}
