//! Job loop — pulls messages from the ingest queue and dispatches them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use futures::StreamExt;
use loadbench_core::Error as CoreError;
use loadbench_jobs::Job;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::metrics::{JobKindLabel, WorkerMetrics};
use crate::pipeline;
use crate::queue::{JobMessage, QueueClient};

pub async fn run_job_loop(
    config: WorkerConfig,
    pool: Arc<PgPool>,
    queue: Arc<QueueClient>,
    metrics: WorkerMetrics,
) -> Result<()> {
    let consumer = queue.ingest_consumer().await?;
    info!("job loop started for worker {}", config.worker_id);

    let mut messages = consumer.messages().await?;

    loop {
        if let Ok(depth) = queue.ingest_queue_depth().await {
            metrics.ingest_queue_depth.set(depth as i64);
        }

        match messages.next().await {
            Some(Ok(msg)) => {
                let payload: Result<JobMessage, _> = serde_json::from_slice(&msg.payload);
                match payload {
                    Ok(job_msg) => {
                        metrics.active_jobs.inc();
                        let outcome = handle_job(&config, &pool, &metrics, job_msg).await;
                        metrics.active_jobs.dec();
                        match outcome {
                            Ok(()) => {
                                msg.ack().await.ok();
                            }
                            Err(e) => {
                                error!("job handling failed, leaving message for redelivery: {}", e);
                            }
                        }
                    }
                    Err(e) => {
                        warn!("invalid ingest message: {}", e);
                        msg.ack().await.ok();
                    }
                }
            }
            Some(Err(e)) => warn!("ingest consumer error: {}", e),
            None => break,
        }
    }

    Ok(())
}

async fn handle_job(
    config: &WorkerConfig,
    pool: &PgPool,
    metrics: &WorkerMetrics,
    job_msg: JobMessage,
) -> Result<()> {
    match job_msg {
        JobMessage::Ingestion {
            job_id,
            ingestion_job_id,
            file_path,
            file_type,
        } => handle_ingestion(config, pool, metrics, job_id, ingestion_job_id, &file_path, &file_type).await,
        JobMessage::Analysis { job_id } => fail_unsupported(pool, job_id, "analysis").await,
        JobMessage::Qa { job_id } => fail_unsupported(pool, job_id, "qa").await,
    }
}

/// Analysis/Q&A jobs keep the orchestration contract complete without
/// implementing any LLM functionality (explicit Non-goal).
async fn fail_unsupported(pool: &PgPool, job_id: i64, kind: &str) -> Result<()> {
    let mut job = loadbench_store::repository::get_job(pool, job_id).await?;
    job.start(Utc::now())?;
    job.fail(Utc::now(), format!("{kind} is out of scope"))?;
    loadbench_store::repository::save_job(pool, &job).await?;
    Ok(())
}

async fn handle_ingestion(
    config: &WorkerConfig,
    pool: &PgPool,
    metrics: &WorkerMetrics,
    job_id: i64,
    ingestion_job_id: i64,
    file_path: &str,
    file_type: &str,
) -> Result<()> {
    let mut job = loadbench_store::repository::get_job(pool, job_id).await?;
    let mut ingestion_job = loadbench_store::repository::get_ingestion_job(pool, ingestion_job_id).await?;

    job.start(Utc::now())?;
    ingestion_job.start(Utc::now())?;
    loadbench_store::repository::save_job(pool, &job).await?;
    loadbench_store::repository::save_ingestion_job(pool, &ingestion_job).await?;

    let hard_timeout = Duration::from_secs(config.hard_timeout_secs);
    let soft_timeout = Duration::from_secs(config.soft_timeout_secs);

    let watched = async {
        let pipeline_fut =
            pipeline::run_ingestion(pool, &mut ingestion_job, file_path, file_type, metrics, config.chunk_size_rows);
        tokio::pin!(pipeline_fut);
        match tokio::time::timeout(soft_timeout, &mut pipeline_fut).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => {
                warn!(
                    "ingestion job {} exceeded soft timeout of {}s, winding down gracefully before hard kill at {}s",
                    ingestion_job_id, config.soft_timeout_secs, config.hard_timeout_secs
                );
                pipeline_fut.await
            }
        }
    };
    let result = tokio::time::timeout(hard_timeout, watched).await;

    match result {
        Ok(Ok(outcome)) => {
            if let Err(e) = ingestion_job.complete(Utc::now()) {
                return fail_both(pool, metrics, &mut job, &mut ingestion_job, &e.to_string()).await;
            }
            loadbench_store::repository::save_ingestion_job(pool, &ingestion_job).await?;

            if let Err(e) = job.complete(
                Utc::now(),
                Some(serde_json::json!({
                    "rows_ingested": outcome.rows_ingested,
                    "validation_errors": outcome.validation_errors,
                })),
            ) {
                return fail_both(pool, metrics, &mut job, &mut ingestion_job, &e.to_string()).await;
            }
            loadbench_store::repository::save_job(pool, &job).await?;

            metrics
                .jobs_completed
                .get_or_create(&JobKindLabel("ingestion".to_string()))
                .inc();
            Ok(())
        }
        Ok(Err(e)) => fail_both(pool, metrics, &mut job, &mut ingestion_job, &e.to_string()).await,
        Err(_elapsed) => {
            fail_both(
                pool,
                metrics,
                &mut job,
                &mut ingestion_job,
                &CoreError::Timeout(format!("ingestion job {ingestion_job_id} exceeded hard timeout")).to_string(),
            )
            .await
        }
    }
}

async fn fail_both(
    pool: &PgPool,
    metrics: &WorkerMetrics,
    job: &mut Job,
    ingestion_job: &mut loadbench_jobs::IngestionJob,
    reason: &str,
) -> Result<()> {
    loadbench_store::promotion::rollback(pool, ingestion_job.id).await?;

    ingestion_job.fail(Utc::now(), reason)?;
    loadbench_store::repository::save_ingestion_job(pool, ingestion_job).await?;

    job.fail(Utc::now(), reason)?;
    loadbench_store::repository::save_job(pool, job).await?;

    metrics
        .jobs_failed
        .get_or_create(&JobKindLabel("ingestion".to_string()))
        .inc();
    Ok(())
}
