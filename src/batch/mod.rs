//! # Partial-Failure Batch Protocol
//!
//! Per-item results for multi-id verbs, with a fixed error record for
//! failed items.

pub mod errors;
pub mod result;

pub use errors::ErrorCode;
pub use result::{run_batch, BatchItem, ErrorWithId, ItemError};
