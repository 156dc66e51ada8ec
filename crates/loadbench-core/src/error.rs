//! Typed errors shared across the ingestion/stats/store pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("input not found: {0}")]
    InputNotFound(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("parse failure: {0}")]
    ParseFailure(String),

    #[error("validation failure: {0}")]
    ValidationFailure(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("illegal transition: {0}")]
    IllegalTransition(String),

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("broker failure: {0}")]
    BrokerFailure(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}
