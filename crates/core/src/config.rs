//! Operator configuration.
//!
//! Loaded and merged from multiple sources in order:
//! 1. Default values
//! 2. `operator.toml`
//! 3. Environment variables (`GNB_OPERATOR_*`)
//! 4. CLI flags (applied by the binary)
//!
//! Later sources override earlier ones.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use std::fmt;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::result::Result;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "GNB_OPERATOR_";

// =============================================================================
// Log Level
// =============================================================================

/// Logging level for the operator.
///
/// Parses case-insensitively; default is `Info`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_directive().to_uppercase())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ERROR" => Ok(Self::Error),
            "WARN" => Ok(Self::Warn),
            "INFO" => Ok(Self::Info),
            "DEBUG" => Ok(Self::Debug),
            "TRACE" => Ok(Self::Trace),
            _ => Err(Error::invalid_config(
                "log.level",
                format!("invalid log level '{s}', expected ERROR, WARN, INFO, DEBUG, or TRACE"),
            )),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// How the simulator process is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct WorkloadSettings {
    /// Simulator binary, invoked as `<binary> -c <config file>`.
    pub binary: PathBuf,
    /// Directory the rendered configuration is written to.
    pub config_dir: PathBuf,
    /// File name of the rendered configuration.
    pub config_file: String,
    /// How long a freshly started process must stay up to count as started.
    pub startup_grace_ms: u64,
    /// Bound on an orderly stop, terminate signal and kill included.
    pub stop_timeout_ms: u64,
}

impl Default for WorkloadSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("/usr/bin/nr-gnb"),
            config_dir: PathBuf::from("/etc/ueransim"),
            config_file: "gnb.yaml".to_string(),
            startup_grace_ms: 1_000,
            stop_timeout_ms: 5_000,
        }
    }
}

impl WorkloadSettings {
    /// Full path of the rendered configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(&self.config_file)
    }

    #[must_use]
    pub const fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }

    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Retry, timeout and polling behaviour of the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ReconcilerSettings {
    /// Upper bound on a single supervisor call.
    pub apply_timeout_ms: u64,
    /// Automatic retries after a supervisor failure before giving up.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Interval of the periodic health check.
    pub health_interval_ms: u64,
    /// Capacity of the event queue.
    pub queue_capacity: usize,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            apply_timeout_ms: 15_000,
            max_retries: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 30_000,
            health_interval_ms: 10_000,
            queue_capacity: 64,
        }
    }
}

impl ReconcilerSettings {
    #[must_use]
    pub const fn apply_timeout(&self) -> Duration {
        Duration::from_millis(self.apply_timeout_ms)
    }

    #[must_use]
    pub const fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }
}

/// Identity of this unit within the orchestrator model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct UnitSettings {
    pub model: String,
    pub application: String,
    /// Address the unit is reachable on; default link/NGAP bind address.
    pub bind_address: String,
    /// Whether the workload environment is usable without a `workload-ready` event.
    pub workload_ready: bool,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            application: "gnb".to_string(),
            bind_address: "127.0.0.1".to_string(),
            workload_ready: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LogSettings {
    pub level: LogLevel,
}

// =============================================================================
// Configuration
// =============================================================================

/// Complete operator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct OperatorConfig {
    pub workload: WorkloadSettings,
    pub reconciler: ReconcilerSettings,
    pub unit: UnitSettings,
    pub log: LogSettings,
    /// Initial site options, as the orchestrator would deliver them on install.
    pub site: BTreeMap<String, String>,
}

impl OperatorConfig {
    /// Parse a TOML document. `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigParse` for malformed TOML or unknown keys.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config_parse(origin, e.to_string()))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// file that was asked for explicitly is an error.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigRead` or `Error::ConfigParse`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (get_config_path(), false),
        };

        if !explicit && !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::config_read(&path, e.to_string()))?;
        Self::from_toml_str(&content, &path)
    }

    /// Apply `GNB_OPERATOR_*` overrides from the given variables.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` when an override cannot be parsed.
    pub fn apply_env<I, K, V>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match name {
                "LOG_LEVEL" => self.log.level = value.parse()?,
                "BINARY" => self.workload.binary = PathBuf::from(value),
                "CONFIG_DIR" => self.workload.config_dir = PathBuf::from(value),
                "BIND_ADDRESS" => self.unit.bind_address = value.to_string(),
                "MAX_RETRIES" => {
                    self.reconciler.max_retries = value.parse().map_err(|_| {
                        Error::invalid_config("reconciler.max-retries", format!("'{value}' is not a number"))
                    })?;
                }
                _ => debug!(variable = %key.as_ref(), "Ignoring unknown override"),
            }
        }
        Ok(self)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.workload.binary.as_os_str().is_empty() {
            return Err(Error::invalid_config("workload.binary", "must not be empty"));
        }
        if self.workload.config_file.is_empty() {
            return Err(Error::invalid_config("workload.config-file", "must not be empty"));
        }
        let timeouts = [
            ("workload.stop-timeout-ms", self.workload.stop_timeout_ms),
            ("reconciler.apply-timeout-ms", self.reconciler.apply_timeout_ms),
            ("reconciler.backoff-base-ms", self.reconciler.backoff_base_ms),
            ("reconciler.health-interval-ms", self.reconciler.health_interval_ms),
        ];
        if let Some((key, _)) = timeouts.iter().find(|(_, ms)| *ms == 0) {
            return Err(Error::invalid_config(*key, "must be greater than zero"));
        }
        if self.reconciler.backoff_base_ms > self.reconciler.backoff_max_ms {
            return Err(Error::invalid_config(
                "reconciler.backoff-base-ms",
                "must not exceed backoff-max-ms",
            ));
        }
        // A restart stops the old process and waits out the startup grace
        // inside one bounded call.
        let restart_ms = self
            .workload
            .startup_grace_ms
            .saturating_add(self.workload.stop_timeout_ms);
        if self.reconciler.apply_timeout_ms <= restart_ms {
            return Err(Error::invalid_config(
                "reconciler.apply-timeout-ms",
                format!("must exceed startup-grace-ms + stop-timeout-ms ({restart_ms}ms)"),
            ));
        }
        if self.reconciler.queue_capacity == 0 {
            return Err(Error::invalid_config("reconciler.queue-capacity", "must be greater than zero"));
        }
        Ok(())
    }
}

// =============================================================================
// Path Resolution
// =============================================================================

/// Resolve the default configuration file path.
///
/// Uses `<XDG config dir>/gnb-operator/operator.toml`, falling back to
/// `./operator.toml` when no XDG directory can be determined.
pub fn get_config_path() -> PathBuf {
    get_xdg_config_path().unwrap_or_else(get_local_config_path)
}

fn get_xdg_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gnb-operator").map(|dirs| dirs.config_dir().join("operator.toml"))
}

fn get_local_config_path() -> PathBuf {
    PathBuf::from("./operator.toml")
}
