//! loadbench-core — canonical record schema, metric renames and endpoint
//! aliasing shared by every other crate in the workspace.

pub mod alias;
pub mod error;
pub mod schema;

pub use alias::EndpointAliasMap;
pub use error::Error;
pub use schema::{
    is_metric_of_interest, rename_metric, CanonicalRecord, RawRow, METRICS_OF_INTEREST,
};
