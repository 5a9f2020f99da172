//! Supervisor that tracks applies and stops without spawning anything.
//!
//! Clones share state, so a caller can hand one clone to the reconciler and
//! keep another to inspect counters or inject failures.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use gnb_render::{ConfigDocument, ContentHash};
use tracing::{debug, info};

use crate::error::{Result, SupervisorError};
use crate::state::{ApplyOutcome, ObservedState};
use crate::supervisor::Supervisor;

#[derive(Debug)]
struct Inner {
    state: ObservedState,
    applied: Option<ContentHash>,
    starts: usize,
    restarts: usize,
    stops: usize,
    apply_calls: usize,
    failing_starts: usize,
    failure_reason: String,
    apply_delay: Option<Duration>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: ObservedState::NotStarted,
            applied: None,
            starts: 0,
            restarts: 0,
            stops: 0,
            apply_calls: 0,
            failing_starts: 0,
            failure_reason: "start refused".to_string(),
            apply_delay: None,
        }
    }
}

/// In-memory [`Supervisor`] for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySupervisor {
    inner: Arc<Mutex<Inner>>,
}

impl InMemorySupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `count` starts fail with `reason`.
    pub fn fail_next_starts(&self, count: usize, reason: impl Into<String>) {
        let mut inner = self.lock();
        inner.failing_starts = count;
        inner.failure_reason = reason.into();
    }

    /// Delay every apply, to exercise caller timeouts.
    pub fn delay_applies(&self, delay: Duration) {
        self.lock().apply_delay = Some(delay);
    }

    /// Simulate the process dying on its own.
    pub fn crash(&self, reason: impl Into<String>) {
        let mut inner = self.lock();
        inner.applied = None;
        inner.state = ObservedState::Failed(reason.into());
    }

    /// Processes started from nothing.
    #[must_use]
    pub fn start_count(&self) -> usize {
        self.lock().starts
    }

    /// Live processes replaced with a new configuration.
    #[must_use]
    pub fn restart_count(&self) -> usize {
        self.lock().restarts
    }

    /// Live processes stopped.
    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.lock().stops
    }

    /// Every `apply` call, including no-ops and failures.
    #[must_use]
    pub fn apply_calls(&self) -> usize {
        self.lock().apply_calls
    }

    /// Hash of the document the live process runs.
    #[must_use]
    pub fn applied(&self) -> Option<ContentHash> {
        self.lock().applied
    }

    #[must_use]
    pub fn observed(&self) -> ObservedState {
        self.lock().state.clone()
    }
}

#[async_trait]
impl Supervisor for InMemorySupervisor {
    async fn apply(&mut self, config: &ConfigDocument) -> Result<ApplyOutcome> {
        let hash = config.hash();
        let (restarting, delay) = {
            let mut inner = self.lock();
            inner.apply_calls = inner.apply_calls.saturating_add(1);
            if inner.state.is_running() && inner.applied == Some(hash) {
                debug!(%hash, "Configuration already applied");
                return Ok(ApplyOutcome::Unchanged);
            }
            (inner.state.is_running(), inner.apply_delay)
        };

        if let Some(delay) = delay {
            {
                let mut inner = self.lock();
                inner.applied = None;
                inner.state = ObservedState::Starting;
            }
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.lock();
        if inner.failing_starts > 0 {
            inner.failing_starts -= 1;
            inner.applied = None;
            let reason = inner.failure_reason.clone();
            inner.state = ObservedState::Failed(reason.clone());
            return Err(SupervisorError::injected(reason));
        }

        inner.applied = Some(hash);
        inner.state = ObservedState::Running;
        if restarting {
            inner.restarts = inner.restarts.saturating_add(1);
            info!(%hash, "Workload restarted");
            Ok(ApplyOutcome::Restarted)
        } else {
            inner.starts = inner.starts.saturating_add(1);
            info!(%hash, "Workload started");
            Ok(ApplyOutcome::Started)
        }
    }

    async fn stop(&mut self) -> Result<()> {
        let mut inner = self.lock();
        if inner.state.is_running() {
            inner.stops = inner.stops.saturating_add(1);
            info!("Workload stopped");
        }
        if inner.state != ObservedState::NotStarted {
            inner.state = ObservedState::Stopped;
        }
        inner.applied = None;
        Ok(())
    }

    fn status(&mut self) -> ObservedState {
        self.observed()
    }

    fn abandon(&mut self, reason: &str) {
        let mut inner = self.lock();
        inner.applied = None;
        if inner.state.is_running() {
            info!(reason, "Workload abandoned");
            inner.state = ObservedState::Failed(reason.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use gnb_core::{CoreEndpoint, SiteConfig};
    use gnb_render::Renderer;

    use super::*;

    fn document(port: u16) -> ConfigDocument {
        Renderer::new("127.0.0.1")
            .render(&SiteConfig::default(), &CoreEndpoint::new("amf", port))
            .unwrap()
    }

    #[tokio::test]
    async fn reapplying_the_same_document_is_a_no_op() {
        let mut supervisor = InMemorySupervisor::new();
        let doc = document(38412);

        assert_eq!(supervisor.apply(&doc).await.unwrap(), ApplyOutcome::Started);
        assert_eq!(supervisor.apply(&doc).await.unwrap(), ApplyOutcome::Unchanged);
        assert_eq!(supervisor.start_count(), 1);
        assert_eq!(supervisor.restart_count(), 0);
        assert_eq!(supervisor.apply_calls(), 2);
    }

    #[tokio::test]
    async fn new_document_restarts() {
        let mut supervisor = InMemorySupervisor::new();
        supervisor.apply(&document(38412)).await.unwrap();
        let outcome = supervisor.apply(&document(38413)).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Restarted);
        assert_eq!(supervisor.applied(), Some(document(38413).hash()));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let mut supervisor = InMemorySupervisor::new();
        supervisor.fail_next_starts(1, "bind failed");

        let err = supervisor.apply(&document(38412)).await.unwrap_err();
        assert_eq!(err, SupervisorError::injected("bind failed"));
        assert_eq!(supervisor.status(), ObservedState::Failed("bind failed".into()));

        assert_eq!(supervisor.apply(&document(38412)).await.unwrap(), ApplyOutcome::Started);
    }

    #[tokio::test]
    async fn stop_counts_only_live_processes() {
        let mut supervisor = InMemorySupervisor::new();
        supervisor.stop().await.unwrap();
        assert_eq!(supervisor.stop_count(), 0);
        assert_eq!(supervisor.status(), ObservedState::NotStarted);

        supervisor.apply(&document(38412)).await.unwrap();
        supervisor.stop().await.unwrap();
        supervisor.stop().await.unwrap();
        assert_eq!(supervisor.stop_count(), 1);
        assert_eq!(supervisor.status(), ObservedState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupted_apply_is_abandoned() {
        let mut supervisor = InMemorySupervisor::new();
        supervisor.delay_applies(Duration::from_secs(5));

        let cut_short =
            tokio::time::timeout(Duration::from_secs(1), supervisor.apply(&document(38412))).await;
        assert!(cut_short.is_err());
        assert_eq!(supervisor.status(), ObservedState::Starting);

        supervisor.abandon("timed out");
        assert_eq!(supervisor.status(), ObservedState::Failed("timed out".into()));
        assert_eq!(supervisor.applied(), None);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let observer = InMemorySupervisor::new();
        let mut supervisor = observer.clone();
        supervisor.apply(&document(38412)).await.unwrap();
        observer.crash("segfault");
        assert_eq!(supervisor.status(), ObservedState::Failed("segfault".into()));
    }
}
