//! aerosub - canonical wire codec for AeroDB subscription query filters
//!
//! - `query`: typed filter model (operators, predicates, expressions)
//! - `codec`: encoder and parser between the model and its JSON wire form
//! - `batch`: per-item results for multi-id verbs
//! - `subscription`: subscription records, store and handlers

pub mod batch;
pub mod cli;
pub mod codec;
pub mod config;
pub mod observability;
pub mod query;
pub mod subscription;
