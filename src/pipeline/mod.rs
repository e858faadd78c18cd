//! Batch run orchestration
//!
//! Discovery feeds the store, the refresh scheduler decides what to fetch,
//! the extractor parses it and the exporters snapshot the result.

mod coordinator;

pub use coordinator::{run_pipeline, should_discover, Coordinator, DiscoveryMode, RunReport};
