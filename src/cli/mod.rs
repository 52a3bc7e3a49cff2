//! CLI module for aerosub
//!
//! Provides command-line interface for:
//! - canonicalize: Parse a raw query and print its canonical encoding
//! - validate: Parse a raw query and report errors

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, QueryArgs};
pub use commands::{canonicalize, run, run_command, validate};
pub use errors::{CliError, CliResult};
