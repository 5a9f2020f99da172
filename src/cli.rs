//! CLI command definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gnb_core::LogLevel;

/// gNB operator - reconciliation core for a simulated 5G base station
#[derive(Parser, Debug)]
#[command(name = "gnb-operator")]
#[command(version)]
#[command(about = "Drive a simulated 5G gNB toward the state its inputs call for")]
#[command(
    long_about = "Reads orchestrator events as JSON lines on stdin, supervises the gNB simulator, and writes status, relation data and action results as JSON lines on stdout."
)]
pub struct Cli {
    /// Operator configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the reconciler and the stdin/stdout hook bridge
    Run {
        /// Use the in-memory supervisor instead of spawning the simulator
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Render the simulator configuration and print it
    Render {
        /// AMF host name or address
        #[arg(long)]
        host: String,

        /// AMF SCTP port
        #[arg(long)]
        port: u16,

        /// Override a site option
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        set: Vec<(String, String)>,
    },

    /// Check the site options and print every problem found
    Validate {
        /// Override a site option
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        set: Vec<(String, String)>,
    },
}

/// Parse a `key=value` pair. The value may be empty or contain `=`.
///
/// # Errors
///
/// Returns a message when there is no `=` or the key is empty.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        Some(_) => Err(format!("missing key in '{raw}'")),
        None => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
