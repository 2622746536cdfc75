//! CLI argument definitions using clap
//!
//! Commands:
//! - mvstore exec [--config <path>]
//! - mvstore check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mvstore - An in-memory multi-version key/value store
#[derive(Parser, Debug)]
#[command(name = "mvstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read JSON requests from stdin, one per line, and answer each on stdout
    Exec {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a configuration file and print the effective settings
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./mvstore.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
