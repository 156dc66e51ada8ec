//! The ingestion pipeline: chunked reader (B) -> pivot (C) -> staging
//! writes + aggregators (E, F), driven chunk by chunk so peak memory
//! stays bounded regardless of file size.

use loadbench_core::{Error, EndpointAliasMap};
use loadbench_ingest::{pivot_batch, CsvChunkReader, JsonChunkReader, ValidationPolicy};
use loadbench_jobs::IngestionJob;
use loadbench_stats::{EndpointAggregator, GlobalAggregator, DEFAULT_CAPACITY};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::metrics::{JobKindLabel, WorkerMetrics};

pub struct PipelineOutcome {
    pub rows_ingested: i64,
    pub rows_seen: i64,
    pub validation_errors: usize,
}

/// Runs the full ingestion pipeline for one file, updating `ingestion_job`
/// progress as each chunk lands and promoting staged rows at the end.
pub async fn run_ingestion(
    pool: &PgPool,
    ingestion_job: &mut IngestionJob,
    file_path: &str,
    file_type: &str,
    metrics: &WorkerMetrics,
    chunk_size: usize,
) -> Result<PipelineOutcome, Error> {
    let alias_map = EndpointAliasMap::with_defaults();
    let mut global_agg = GlobalAggregator::new(DEFAULT_CAPACITY);
    let mut endpoint_agg = EndpointAggregator::new(DEFAULT_CAPACITY);

    let mut rows_ingested: i64 = 0;
    let mut rows_seen: i64 = 0;
    let mut validation_errors: usize = 0;

    macro_rules! drive {
        ($reader:expr) => {{
            for batch in $reader {
                let batch = batch?;

                let outcome = pivot_batch(&batch, &alias_map, ValidationPolicy::Count);
                validation_errors += outcome.validation_errors;
                rows_seen += outcome.records.len() as i64;

                global_agg.update_batch(&outcome.records);
                endpoint_agg.update_batch(&outcome.records);

                let persisted = loadbench_store::staging::insert_batch(
                    pool,
                    ingestion_job.id,
                    &outcome.records,
                )
                .await
                .map_err(|e| Error::PersistenceFailure(e.to_string()))?;
                rows_ingested += persisted as i64;
                metrics.rows_ingested.inc_by(persisted);

                ingestion_job.record_progress(persisted as i64, outcome.records.len() as i64);
                loadbench_store::repository::save_ingestion_job(pool, ingestion_job)
                    .await
                    .map_err(|e| Error::PersistenceFailure(e.to_string()))?;

                debug!(
                    "ingestion job {} progress: {}/{} rows",
                    ingestion_job.id, ingestion_job.rows_ingested, ingestion_job.total_rows
                );
            }
        }};
    }

    match file_type {
        "json" => {
            let reader = JsonChunkReader::open(file_path, chunk_size)?;
            drive!(reader);
        }
        "csv" => {
            let reader = CsvChunkReader::open(file_path, chunk_size)?;
            drive!(reader);
        }
        other => {
            metrics
                .parse_failures
                .get_or_create(&JobKindLabel("ingestion".to_string()))
                .inc();
            return Err(Error::UnsupportedFormat(other.to_string()));
        }
    }

    loadbench_store::promotion::promote(pool, ingestion_job.id)
        .await
        .map_err(|e| Error::PersistenceFailure(e.to_string()))?;

    info!(
        "ingestion job {} promoted {} rows ({} validation errors)",
        ingestion_job.id, rows_ingested, validation_errors
    );

    // Aggregators are computed for completeness / future callback use;
    // the authoritative read path is the store's SQL queries.
    let _ = global_agg.finalize();
    let _ = endpoint_agg.finalize();

    Ok(PipelineOutcome {
        rows_ingested,
        rows_seen,
        validation_errors,
    })
}
