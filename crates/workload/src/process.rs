//! Supervisor backed by a real simulator process.
//!
//! The rendered document is written atomically next to where the simulator
//! expects it, then the simulator is spawned with `tokio::process` as
//! `<binary> -c <config>`. Its output is forwarded to tracing line by line,
//! since stdout belongs to the hook protocol.
//!
//! Stopping sends SIGTERM and escalates to SIGKILL after half of the stop
//! timeout.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use gnb_core::{ResultExt, WorkloadSettings};
use gnb_render::{ConfigDocument, ContentHash};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Result, SupervisorError};
use crate::state::{ApplyOutcome, ObservedState};
use crate::supervisor::Supervisor;

/// Runs the simulator binary as a child process.
pub struct ProcessSupervisor {
    settings: WorkloadSettings,
    child: Option<Child>,
    /// Hash of the document the live process was confirmed started with.
    applied: Option<ContentHash>,
    state: ObservedState,
}

impl ProcessSupervisor {
    pub const fn new(settings: WorkloadSettings) -> Self {
        Self {
            settings,
            child: None,
            applied: None,
            state: ObservedState::NotStarted,
        }
    }

    /// Process id of the live child, if any.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    fn spawn(&self) -> Result<Child> {
        let binary = self.settings.binary.display().to_string();
        let mut child = Command::new(&self.settings.binary)
            .arg("-c")
            .arg(self.settings.config_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SupervisorError::spawn_failed(&binary, e.to_string()))?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, "stderr"));
        }
        Ok(child)
    }

    /// Poll the child without blocking and update the observed state.
    fn refresh(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(None) => {}
            Ok(Some(status)) => {
                warn!(%status, "Simulator exited");
                self.child = None;
                self.applied = None;
                self.state = ObservedState::Failed(format!("process exited ({status})"));
            }
            Err(e) => {
                warn!(error = %e, "Could not poll simulator");
                self.state = ObservedState::Failed(format!("cannot poll process: {e}"));
            }
        }
    }
}

#[async_trait]
impl Supervisor for ProcessSupervisor {
    async fn apply(&mut self, config: &ConfigDocument) -> Result<ApplyOutcome> {
        let hash = config.hash();
        self.refresh();
        if self.applied == Some(hash) && self.state == ObservedState::Running {
            debug!(%hash, "Configuration already applied");
            return Ok(ApplyOutcome::Unchanged);
        }

        // Forgotten before any await, so an interrupted apply never reads as applied.
        self.applied = None;
        let restarting = self.child.is_some();
        if restarting {
            self.stop().await?;
        }

        let path = self.settings.config_path();
        write_atomically(&path, config.as_bytes()).await?;
        debug!(path = %path.display(), %hash, "Configuration written");

        self.child = Some(self.spawn()?);
        self.state = ObservedState::Starting;
        info!(pid = ?self.pid(), binary = %self.settings.binary.display(), "Simulator spawned");

        tokio::time::sleep(self.settings.startup_grace()).await;
        self.refresh();
        if let ObservedState::Failed(reason) = &self.state {
            return Err(SupervisorError::exited_during_startup(reason.clone()));
        }

        self.state = ObservedState::Running;
        self.applied = Some(hash);
        Ok(if restarting {
            ApplyOutcome::Restarted
        } else {
            ApplyOutcome::Started
        })
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            if self.state != ObservedState::NotStarted {
                self.state = ObservedState::Stopped;
            }
            return Ok(());
        };

        // The child is killed on drop, so an interrupted stop still ends stopped.
        self.applied = None;
        let previous = std::mem::replace(&mut self.state, ObservedState::Stopped);

        let limit = self.settings.stop_timeout();
        let deadline = Instant::now() + limit;
        let terminated = match child.id() {
            Some(pid) => terminate(pid).await,
            None => false,
        };
        if terminated {
            match tokio::time::timeout(limit / 2, child.wait()).await {
                Ok(Ok(status)) => {
                    info!(%status, "Simulator stopped");
                    return Ok(());
                }
                Ok(Err(e)) => debug!(error = %e, "Waiting after terminate signal failed"),
                Err(_) => warn!(
                    grace_ms = (limit / 2).as_millis(),
                    "Simulator ignored terminate signal, killing it"
                ),
            }
        }

        if let Err(e) = child.start_kill() {
            debug!(error = %e, "Kill signal not delivered");
        }
        let failure = match tokio::time::timeout_at(deadline, child.wait()).await {
            Ok(Ok(status)) => {
                info!(%status, "Simulator killed");
                return Ok(());
            }
            Ok(Err(e)) => SupervisorError::stop_failed(e.to_string()),
            Err(_) => SupervisorError::stop_failed(format!(
                "process did not exit within {}ms",
                limit.as_millis()
            )),
        };
        self.child = Some(child);
        self.state = previous;
        Err(failure)
    }

    fn status(&mut self) -> ObservedState {
        self.refresh();
        self.state.clone()
    }

    fn abandon(&mut self, reason: &str) {
        self.applied = None;
        let Some(mut child) = self.child.take() else {
            return;
        };
        warn!(pid = ?child.id(), reason, "Killing simulator left by an interrupted call");
        if let Err(e) = child.start_kill() {
            debug!(error = %e, "Kill signal not delivered");
        }
        self.state = ObservedState::Failed(reason.to_string());
    }
}

/// Ask the process to exit with SIGTERM. Returns whether the signal was sent.
async fn terminate(pid: u32) -> bool {
    match Command::new("kill")
        .arg("-TERM")
        .arg(pid.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) if status.success() => true,
        Ok(status) => {
            debug!(pid, %status, "Terminate signal not delivered");
            false
        }
        Err(e) => {
            debug!(pid, error = %e, "Cannot run kill");
            false
        }
    }
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let fail = |e: std::io::Error| SupervisorError::config_write(path, e.to_string());
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(fail)?;
    }
    let staging = path.with_extension("tmp");
    tokio::fs::write(&staging, bytes).await.map_err(fail)?;
    tokio::fs::rename(&staging, path).await.map_err(fail)
}

async fn forward_lines<R>(source: R, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(source).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .or_default_logged("Reading simulator output", None)
    {
        debug!(target: "nr_gnb", stream, "{line}");
    }
}
