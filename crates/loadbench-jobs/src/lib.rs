//! loadbench-jobs — job and ingestion-job models, their state machines,
//! and retry rules.

pub mod ingestion_job;
pub mod job;

pub use ingestion_job::IngestionJob;
pub use job::{Job, JobStatus, JobType};
