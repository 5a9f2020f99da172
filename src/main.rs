//! # gnb-operator
//!
//! Entry point: load configuration, install tracing, dispatch the command.
//!
//! stdout belongs to the hook bridge protocol, so all logging goes to stderr.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use gnb_core::LogLevel;
use gnb_operator::cli::Cli;
use gnb_operator::commands;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), cli.log_level)?;

    init_tracing(config.log.level);
    debug!(?config, "Configuration loaded");

    commands::execute_command(cli.command, config).await
}

/// Initialize tracing with `RUST_LOG`, falling back to the configured level.
fn init_tracing(level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.as_directive())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
