use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("migration failure: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Core(#[from] loadbench_core::Error),

    #[error("job {0} has no request_logs yet")]
    NoData(i64),
}
