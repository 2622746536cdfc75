//! Engine configuration
//!
//! Loaded from a JSON file; every field has a default so `{}` is a valid
//! configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::Severity;

use super::errors::{EngineError, EngineResult};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Largest key accepted by prepare (default 1 KiB)
    #[serde(default = "default_max_key_bytes")]
    pub max_key_bytes: usize,

    /// Largest value accepted by prepare (default 16 MiB)
    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,

    /// Most writes one transaction may stage in one table (default 100 000)
    #[serde(default = "default_max_writes_per_table")]
    pub max_writes_per_table: usize,

    /// Purge right after each close (default true). When false, purge work
    /// is queued and run by `Coordinator::run_pending_purges`.
    #[serde(default = "default_purge_on_close")]
    pub purge_on_close: bool,

    /// Minimum log severity: trace, info, warn, error or fatal (default info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_key_bytes() -> usize {
    1024
}
fn default_max_value_bytes() -> usize {
    16 * 1024 * 1024
}
fn default_max_writes_per_table() -> usize {
    100_000
}
fn default_purge_on_close() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_key_bytes: default_max_key_bytes(),
            max_value_bytes: default_max_value_bytes(),
            max_writes_per_table: default_max_writes_per_table(),
            purge_on_close: default_purge_on_close(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EngineError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json_str(content: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| EngineError::config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_key_bytes == 0 {
            return Err(EngineError::config("max_key_bytes must be > 0"));
        }
        if self.max_value_bytes == 0 {
            return Err(EngineError::config("max_value_bytes must be > 0"));
        }
        if self.max_writes_per_table == 0 {
            return Err(EngineError::config("max_writes_per_table must be > 0"));
        }
        self.log_severity()?;
        Ok(())
    }

    /// The configured minimum log severity
    pub fn log_severity(&self) -> EngineResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            EngineError::config(format!("invalid log_level: '{}'", self.log_level))
        })
    }
}
