//! CLI command handlers.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use gnb_core::{CoreEndpoint, LogLevel, OperatorConfig, SiteConfig, ValidationError};
use gnb_reconciler::{LoopConfig, Reconciler, ReconciliationLoop};
use gnb_render::{ConfigDocument, Renderer};
use gnb_workload::{InMemorySupervisor, ProcessSupervisor, Supervisor};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::bridge;
use crate::cli::Commands;

/// Load configuration: defaults, then file, then environment, then flags.
///
/// # Errors
///
/// Fails when the file cannot be read or parsed, an override is malformed, or
/// the result is inconsistent.
pub fn load_config(path: Option<&Path>, log_level: Option<LogLevel>) -> Result<OperatorConfig> {
    let mut config = OperatorConfig::load(path)
        .context("Failed to load operator configuration")?
        .apply_env(std::env::vars())
        .context("Invalid environment override")?;
    if let Some(level) = log_level {
        config.log.level = level;
    }
    config.validate().context("Invalid operator configuration")?;
    Ok(config)
}

/// Execute a CLI command.
///
/// # Errors
///
/// Returns startup and I/O failures; validation problems in `validate` are
/// reported through the exit code instead.
pub async fn execute_command(command: Commands, config: OperatorConfig) -> Result<ExitCode> {
    match command {
        Commands::Run { dry_run } => cmd_run(&config, dry_run).await.map(|()| ExitCode::SUCCESS),
        Commands::Render { host, port, set } => {
            let document = render_document(&config, CoreEndpoint::new(host, port), &set)?;
            print!("{}", document.content());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { set } => {
            let errors = validation_errors(&config, &set)?;
            if errors.is_empty() {
                println!("configuration valid");
                return Ok(ExitCode::SUCCESS);
            }
            for e in &errors {
                println!("{e}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Site options from the configuration file with `--set` overrides applied.
///
/// # Errors
///
/// Fails on an option name the site does not know.
pub fn site_options(config: &OperatorConfig, overrides: &[(String, String)]) -> Result<SiteConfig> {
    let mut options: BTreeMap<&str, &str> = config
        .site
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    options.extend(overrides.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    options
        .into_iter()
        .try_fold(SiteConfig::default(), |site, (key, value)| site.with_option(key, value))
        .context("Invalid site option")
}

/// Render the document the simulator would be started with.
///
/// # Errors
///
/// Fails on unknown options or the first validation error.
pub fn render_document(
    config: &OperatorConfig,
    endpoint: CoreEndpoint,
    overrides: &[(String, String)],
) -> Result<ConfigDocument> {
    let site = site_options(config, overrides)?;
    let document = Renderer::new(config.unit.bind_address.clone())
        .render(&site, &endpoint)
        .context("Cannot render configuration")?;
    info!(hash = %document.hash(), %endpoint, "Configuration rendered");
    Ok(document)
}

/// Every validation problem with the site options; empty when valid.
///
/// # Errors
///
/// Fails on unknown options.
pub fn validation_errors(
    config: &OperatorConfig,
    overrides: &[(String, String)],
) -> Result<Vec<ValidationError>> {
    let site = site_options(config, overrides)?;
    Ok(Renderer::new(config.unit.bind_address.clone())
        .validate_site(&site)
        .err()
        .unwrap_or_default())
}

async fn cmd_run(config: &OperatorConfig, dry_run: bool) -> Result<()> {
    if dry_run {
        info!("Dry run: the simulator will not be spawned");
        serve(InMemorySupervisor::new(), config).await
    } else {
        info!(binary = %config.workload.binary.display(), "Supervising simulator");
        serve(ProcessSupervisor::new(config.workload.clone()), config).await
    }
}

async fn serve<S>(supervisor: S, config: &OperatorConfig) -> Result<()>
where
    S: Supervisor + 'static,
{
    let (outbox, outputs) = mpsc::unbounded_channel();
    let reconciler = Reconciler::new(supervisor, config, outbox);
    let (runner, events) =
        ReconciliationLoop::new(reconciler, LoopConfig::from_settings(&config.reconciler));
    let stopper = runner.stopper();

    let loop_task = tokio::spawn(runner.run());
    let writer_task = tokio::spawn(bridge::write_outputs(outputs, tokio::io::stdout()));

    // On EOF the queue is closed and drained; on Ctrl+C the loop stops at once.
    let interrupted = tokio::select! {
        read = bridge::read_events(tokio::io::stdin(), &events) => {
            let queued = read.context("Failed to read events from stdin")?;
            info!(queued, "Input closed, shutting down");
            false
        }
        () = wait_for_shutdown() => true,
    };

    if interrupted {
        stopper.stop();
    }
    drop(events);
    let reconciler = loop_task.await.context("Reconciliation loop panicked")?;
    info!(phase = %reconciler.phase(), status = %reconciler.status(), "Reconciler stopped");
    // Dropping the reconciler closes the outbox and lets the writer finish.
    drop(reconciler);

    let written = writer_task
        .await
        .context("Output writer panicked")?
        .context("Failed to write outputs to stdout")?;
    info!(written, "gNB operator stopped gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn wait_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(err) => {
            error!("Failed to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn set(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn overrides_win_over_file_options() {
        let mut config = OperatorConfig::default();
        config.site.insert("tac".into(), "3".into());
        config.site.insert("band".into(), "77".into());

        let site = site_options(&config, &set(&[("tac", "5")])).unwrap();
        assert_eq!(site.tac, "5");
        assert_eq!(site.band, "77");
    }

    #[test]
    fn unknown_option_is_an_error() {
        let config = OperatorConfig::default();
        assert!(site_options(&config, &set(&[("colour", "blue")])).is_err());
    }

    #[test]
    fn validation_lists_every_problem() {
        let config = OperatorConfig::default();
        let errors = validation_errors(&config, &set(&[("mcc", "1"), ("sst", "0")])).unwrap();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["mcc", "sst"]);

        assert!(validation_errors(&config, &[]).unwrap().is_empty());
    }

    #[test]
    fn render_uses_the_endpoint() {
        let config = OperatorConfig::default();
        let document =
            render_document(&config, CoreEndpoint::new("amf.example", 38412), &[]).unwrap();
        assert!(document.content().contains("amf.example"));
        assert!(document.content().contains("38412"));
    }

    #[test]
    fn render_rejects_invalid_options() {
        let config = OperatorConfig::default();
        let result = render_document(&config, CoreEndpoint::new("amf", 38412), &set(&[("tac", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn cli_log_level_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("operator.toml");
        std::fs::write(&path, "[log]\nlevel = \"warn\"\n").unwrap();

        let config = load_config(Some(&path), Some(LogLevel::Trace)).unwrap();
        assert_eq!(config.log.level, LogLevel::Trace);

        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.log.level, LogLevel::Warn);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml")), None).is_err());
    }
}
