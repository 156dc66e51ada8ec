//! Reaper — reclaims jobs stuck `in_progress` past the hard timeout,
//! the Rust analogue of Celery's `task_reject_on_worker_lost`: if a
//! worker dies mid-pipeline, NATS redelivers the message but the DB row
//! is left `in_progress` until this sweep notices. Reaped jobs are always
//! failed, never resurrected — retries are user-initiated only.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, warn};

use crate::metrics::WorkerMetrics;

pub fn spawn_reaper(pool: Arc<PgPool>, metrics: WorkerMetrics, interval_secs: u64, hard_timeout_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            if let Err(e) = reap_stale_jobs(&pool, &metrics, hard_timeout_secs).await {
                warn!("reaper error: {}", e);
            }
        }
    });
}

async fn reap_stale_jobs(pool: &PgPool, metrics: &WorkerMetrics, hard_timeout_secs: u64) -> anyhow::Result<()> {
    let stale = loadbench_store::repository::list_stale_in_progress_jobs(pool, hard_timeout_secs).await?;

    for mut job in stale {
        let reason = format!("reaped: exceeded hard timeout of {hard_timeout_secs}s");

        if let Some(ingestion_job_id) = job.ingestion_job_id {
            if let Err(e) = loadbench_store::promotion::rollback(pool, ingestion_job_id).await {
                error!("reaper failed to roll back staging for ingestion job {}: {}", ingestion_job_id, e);
                continue;
            }
            match loadbench_store::repository::get_ingestion_job(pool, ingestion_job_id).await {
                Ok(mut ingestion_job) => {
                    if ingestion_job.fail(Utc::now(), reason.clone()).is_ok() {
                        if let Err(e) = loadbench_store::repository::save_ingestion_job(pool, &ingestion_job).await {
                            error!("reaper failed to save ingestion job {}: {}", ingestion_job_id, e);
                            continue;
                        }
                    }
                }
                Err(e) => {
                    error!("reaper failed to load ingestion job {}: {}", ingestion_job_id, e);
                    continue;
                }
            }
        }

        if job.fail(Utc::now(), reason).is_err() {
            continue;
        }
        if let Err(e) = loadbench_store::repository::save_job(pool, &job).await {
            error!("reaper failed to save job {}: {}", job.id, e);
            continue;
        }

        warn!("reaper failed stale job {}", job.id);
        metrics.reaper_failed.inc();
    }

    Ok(())
}
