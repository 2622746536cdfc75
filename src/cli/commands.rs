//! CLI command implementations

use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::json;

use crate::engine::{Coordinator, EngineConfig};
use crate::observability::{log_event_with_fields, Event, Logger};

use super::args::{Cli, Command};
use super::errors::CliResult;
use super::io::{read_requests, write_error, write_response};
use super::session::Session;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}

/// Run a parsed command against the process's stdin and stdout
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Exec { config } => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            exec(config.as_deref(), stdin.lock(), &mut stdout.lock())
        }
        Command::CheckConfig { config } => check_config(&config, &mut io::stdout().lock()),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let config = EngineConfig::load(path)?;
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", path.display().to_string().as_str())],
    );
    Ok(config)
}

/// Serve requests until the input ends.
///
/// Request failures are answered and the loop continues; I/O failures stop
/// it.
pub fn exec<R: BufRead, W: Write>(
    config_path: Option<&Path>,
    input: R,
    output: &mut W,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    Logger::set_min_severity(config.log_severity()?);
    let mut session = Session::new(Coordinator::with_config(config)?);

    for request in read_requests(input) {
        match request.and_then(|request| session.handle(request)) {
            Ok(data) => write_response(output, data)?,
            Err(e) if e.is_fatal() => {
                write_error(output, e.code_str(), e.message())?;
                return Err(e);
            }
            Err(e) => write_error(output, e.code_str(), e.message())?,
        }
    }
    Ok(())
}

/// Validate a configuration file and print the effective settings
pub fn check_config<W: Write>(config_path: &Path, output: &mut W) -> CliResult<()> {
    let config = load_config(Some(config_path))?;
    write_response(output, json!(config))
}
