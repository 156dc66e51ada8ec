//! loadbench-worker binary — pulls ingestion jobs off NATS JetStream and
//! runs the chunked ingest/pivot/persist/aggregate pipeline.

mod config;
mod health;
mod job_loop;
mod metrics;
mod pipeline;
mod queue;
mod reaper;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::WorkerConfig;
use health::HealthState;
use metrics::WorkerMetrics;
use queue::QueueClient;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = WorkerConfig::from_env()?;
    info!("starting loadbench-worker {}", config.worker_id);

    let pool = Arc::new(loadbench_store::connect(&config.database_url, 5).await?);
    loadbench_store::migrate(&pool).await?;
    info!("connected to database and applied migrations");

    let queue = Arc::new(QueueClient::connect(&config.nats_url).await?);
    info!("connected to NATS at {}", config.nats_url);

    let worker_metrics = WorkerMetrics::new();

    let ready = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let health_state = Arc::new(HealthState {
        metrics: worker_metrics.clone(),
        ready: ready.clone(),
    });

    let metrics_port = config.metrics_port;
    let health_router = health::health_router(health_state);
    tokio::spawn(async move {
        let addr = format!("0.0.0.0:{}", metrics_port);
        info!("metrics server listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
        axum::serve(listener, health_router).await.unwrap();
    });

    reaper::spawn_reaper(
        pool.clone(),
        worker_metrics.clone(),
        config.reaper_interval_secs,
        config.hard_timeout_secs,
    );
    info!("reaper started (interval: {}s)", config.reaper_interval_secs);

    job_loop::run_job_loop(config, pool, queue, worker_metrics).await?;

    Ok(())
}
