//! loadbench-store — Postgres persistence: staging writes, promotion,
//! job/ingestion-job repositories, and the read-path metrics queries
//! (Component F).

pub mod error;
pub mod formatter;
pub mod metrics_queries;
pub mod pool;
pub mod promotion;
pub mod repository;
pub mod staging;

pub use error::Error;
pub use pool::{connect, migrate};
