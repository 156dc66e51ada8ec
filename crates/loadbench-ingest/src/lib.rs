//! loadbench-ingest — chunked line-delimited JSON / CSV readers and the
//! pivot/normalize stage that turns raw rows into canonical records.

pub mod csv_reader;
pub mod json_reader;
pub mod pivot;

pub use csv_reader::CsvChunkReader;
pub use json_reader::JsonChunkReader;
pub use pivot::{pivot_batch, PivotOutcome, ValidationPolicy};
