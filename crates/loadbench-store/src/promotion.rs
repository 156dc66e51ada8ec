//! Promotion: moves a job's staged rows into `request_logs` and
//! retires the staging rows, atomically. A failed promotion leaves
//! staging untouched so the job can be retried.

use sqlx::PgPool;

use crate::error::Error;

/// Copy every staged row for `job_id` into `request_logs`, then delete
/// the staging rows, inside one transaction. Returns the number of rows
/// promoted.
pub async fn promote(pool: &PgPool, job_id: i64) -> Result<u64, Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO request_logs
         (job_id, timestamp, url, method, status_code, success, response_time_ms,
          blocked_ms, connecting_ms, receiving_ms, sending_ms, tls_handshake_ms, waiting_ms)
         SELECT job_id, timestamp, url, method, status_code, success, response_time_ms,
                blocked_ms, connecting_ms, receiving_ms, sending_ms, tls_handshake_ms, waiting_ms
         FROM request_logs_staging
         WHERE job_id = $1",
    )
    .bind(job_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM request_logs_staging WHERE job_id = $1")
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected())
}

/// Roll back a failed ingestion: drop whatever made it into staging for
/// `job_id` without touching `request_logs`.
pub async fn rollback(pool: &PgPool, job_id: i64) -> Result<u64, Error> {
    crate::staging::discard(pool, job_id).await
}

#[cfg(test)]
mod tests {
    // Promotion and rollback require a live Postgres instance; exercised
    // by the integration suite, not here.
}
