//! CLI module for mvstore
//!
//! Provides command-line interface for:
//! - exec: Drive an in-memory engine with JSON requests on stdin
//! - check-config: Validate a configuration file

mod args;
mod commands;
mod errors;
mod io;
mod session;

pub use args::{Cli, Command};
pub use commands::{check_config, exec, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_error, write_response};
pub use session::{Request, Session};
