//! Worker configuration from environment variables.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub nats_url: String,
    pub database_url: String,
    pub metrics_port: u16,
    pub chunk_size_rows: usize,
    pub reaper_interval_secs: u64,
    pub soft_timeout_secs: u64,
    pub hard_timeout_secs: u64,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            worker_id: std::env::var("WORKER_ID")
                .unwrap_or_else(|_| format!("loadbench-worker-{}", std::process::id())),
            nats_url: std::env::var("NATS_URL").context("NATS_URL required")?,
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL required")?,
            metrics_port: std::env::var("METRICS_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()
                .context("invalid METRICS_PORT")?,
            chunk_size_rows: std::env::var("CHUNK_SIZE_ROWS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("invalid CHUNK_SIZE_ROWS")?,
            reaper_interval_secs: std::env::var("REAPER_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("invalid REAPER_INTERVAL_SECS")?,
            soft_timeout_secs: std::env::var("SOFT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .context("invalid SOFT_TIMEOUT_SECS")?,
            hard_timeout_secs: std::env::var("HARD_TIMEOUT_SECS")
                .unwrap_or_else(|_| "2100".to_string())
                .parse()
                .context("invalid HARD_TIMEOUT_SECS")?,
        })
    }
}
