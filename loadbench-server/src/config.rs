//! Server configuration from environment variables, mirroring
//! `loadbench-worker::config::WorkerConfig`.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub nats_url: String,
    pub bind_addr: String,
    pub uploads_dir: String,
    pub reports_dir: String,
    pub max_file_size_mb: f64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL required")?,
            nats_url: std::env::var("NATS_URL").context("NATS_URL required")?,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            uploads_dir: std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            reports_dir: std::env::var("REPORTS_DIR").unwrap_or_else(|_| "./reports".to_string()),
            max_file_size_mb: std::env::var("MAX_FILE_SIZE_MB")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .context("invalid MAX_FILE_SIZE_MB")?,
        })
    }
}
