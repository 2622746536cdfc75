//! CLI-specific error types
//!
//! Errors raised by the engine while serving a request are answered on
//! stdout and do not stop `exec`. Everything else here is fatal.

use std::fmt;
use std::io;

use crate::engine::EngineError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Malformed request line
    BadRequest,
    /// Request names a transaction this session never opened
    UnknownTransaction,
    /// The engine rejected the request; carries the engine's code
    Engine(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "MVS_CLI_CONFIG_ERROR",
            Self::IoError => "MVS_CLI_IO_ERROR",
            Self::BadRequest => "MVS_CLI_BAD_REQUEST",
            Self::UnknownTransaction => "MVS_CLI_UNKNOWN_TRANSACTION",
            Self::Engine(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BadRequest, msg)
    }

    pub fn unknown_transaction(name: &str) -> Self {
        Self::new(
            CliErrorCode::UnknownTransaction,
            format!("transaction '{}' is not open in this session", name),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether `exec` must stop after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self.code, CliErrorCode::ConfigError | CliErrorCode::IoError)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Config(msg) => Self::config_error(msg),
            other => Self::new(CliErrorCode::Engine(other.code()), other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
