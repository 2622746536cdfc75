//! mvstore CLI entry point
//!
//! Parses arguments, runs the command, prints fatal errors to stderr and
//! exits non-zero on failure.

use mvstore::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
