//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ConfigError;

/// Why a CLI invocation failed
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// stdin or stdout failed
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty input")]
    EmptyInput,

    /// The codec refused the query
    #[error("{0} ({})", .0.code())]
    QueryRejected(#[from] CodecError),
}

impl CliError {
    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "AERO_CLI_CONFIG_ERROR",
            CliError::Io(_) | CliError::Json(_) | CliError::EmptyInput => "AERO_CLI_IO_ERROR",
            CliError::QueryRejected(_) => "AERO_CLI_QUERY_REJECTED",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
