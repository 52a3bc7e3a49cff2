//! CLI argument definitions using clap
//!
//! Commands:
//! - aerosub canonicalize [--config <path>] [--user <id>] [--master]
//! - aerosub validate [--config <path>] [--user <id>] [--master]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// aerosub - canonical wire codec for subscription queries
#[derive(Parser, Debug)]
#[command(name = "aerosub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a query from stdin and print its canonical encoding
    Canonicalize(QueryArgs),

    /// Parse a query from stdin and report whether it is valid
    Validate(QueryArgs),
}

/// Options shared by the query commands
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Path to codec configuration file; defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Id of the user submitting the query
    #[arg(long)]
    pub user: Option<String>,

    /// Submit the query with master privileges
    #[arg(long)]
    pub master: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
