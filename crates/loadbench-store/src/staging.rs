//! Staging writes: each ingested batch lands in
//! `request_logs_staging` tagged with the owning ingestion job, so a
//! failed or retried job never leaves partial rows in `request_logs`.

use loadbench_core::CanonicalRecord;
use sqlx::PgPool;

use crate::error::Error;

/// Insert one pivoted batch into the staging table. Safe to call
/// repeatedly for the same `job_id` across chunks.
pub async fn insert_batch(
    pool: &PgPool,
    job_id: i64,
    records: &[CanonicalRecord],
) -> Result<u64, Error> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for record in records {
        sqlx::query(
            "INSERT INTO request_logs_staging
             (job_id, timestamp, url, method, status_code, success, response_time_ms,
              blocked_ms, connecting_ms, receiving_ms, sending_ms, tls_handshake_ms, waiting_ms)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(job_id)
        .bind(record.timestamp)
        .bind(&record.url)
        .bind(&record.method)
        .bind(record.status_code)
        .bind(record.success)
        .bind(record.response_time_ms)
        .bind(record.blocked_ms)
        .bind(record.connecting_ms)
        .bind(record.receiving_ms)
        .bind(record.sending_ms)
        .bind(record.tls_handshake_ms)
        .bind(record.waiting_ms)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(records.len() as u64)
}

/// Remove every staged row for `job_id`, used both after a successful
/// promotion and to clean up after a failed/abandoned ingestion job.
pub async fn discard(pool: &PgPool, job_id: i64) -> Result<u64, Error> {
    let result = sqlx::query("DELETE FROM request_logs_staging WHERE job_id = $1")
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
