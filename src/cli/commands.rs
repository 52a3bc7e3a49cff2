//! CLI command implementations
//!
//! Both commands read one raw query from stdin and write one JSON response
//! to stdout. A rejected query is reported on stdout and also returned as
//! an error so the process exits non-zero.

use serde_json::Value;

use crate::codec::{CodecResult, Encoder, ParseContext, QueryParser};
use crate::config::CodecConfig;
use crate::observability::{Event, Logger};

use super::args::{Command, QueryArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Canonicalize(args) => canonicalize(&args),
        Command::Validate(args) => validate(&args),
    }
}

/// Parse, encode and print the canonical wire form
pub fn canonicalize(args: &QueryArgs) -> CliResult<()> {
    let config = load_config(args)?;
    let request = read_request()?;
    respond(canonical_form(args, &config, &request))
}

/// Parse only; prints `null` data on success
pub fn validate(args: &QueryArgs) -> CliResult<()> {
    let config = load_config(args)?;
    let request = read_request()?;
    let result = QueryParser::new(parse_context(args), &config)
        .parse_query(&request)
        .map(|_| Value::Null);
    respond(result)
}

fn canonical_form(args: &QueryArgs, config: &CodecConfig, request: &Value) -> CodecResult<Value> {
    let query = QueryParser::new(parse_context(args), config).parse_query(request)?;
    Encoder::new(config.clone()).encode_query(&query)
}

fn respond(result: CodecResult<Value>) -> CliResult<()> {
    match result {
        Ok(data) => write_response(data),
        Err(err) => {
            write_error(err.code(), &err.to_string())?;
            Err(CliError::from(err))
        }
    }
}

fn load_config(args: &QueryArgs) -> CliResult<CodecConfig> {
    let Some(path) = &args.config else {
        return Ok(CodecConfig::default());
    };
    let config = CodecConfig::load(path)?;
    let path = path.display().to_string();
    Logger::emit(Event::ConfigLoaded, &[("path", path.as_str())]);
    Ok(config)
}

fn parse_context(args: &QueryArgs) -> ParseContext {
    ParseContext {
        user_id: args.user.clone(),
        master: args.master,
    }
}
