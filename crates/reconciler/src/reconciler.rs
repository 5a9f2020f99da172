//! Reconciler implementation.
//!
//! One [`Reconciler`] owns all unit state and the supervisor. It handles one
//! [`Dispatch`] at a time: fold the event into state, converge the workload
//! toward the desired state, then report status, relation data and action
//! results through the outbox.

use std::future::Future;
use std::time::Duration;

use gnb_core::{GnbIdentity, OperatorConfig, ReconcilerSettings, SiteConfig, UnitSettings};
use gnb_events::{
    ActionKind, ActionResult, GNB_IDENTITY_RELATION, Intent, N2_RELATION, OperatorEvent,
    OperatorOutput, Outcome, UnitStatus,
};
use gnb_render::{ConfigDocument, Renderer};
use gnb_workload::{ObservedState, Supervisor, SupervisorError};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::backoff::{RetryDecision, RetryState};
use crate::intents::IntentTable;
use crate::relation::{ChangeSet, RelationStateTracker};
use crate::types::{DesiredState, Dispatch, EndpointGap, Phase, StopReason};

/// Where status, relation data and action results are reported.
pub type Outbox = mpsc::UnboundedSender<OperatorOutput>;

/// Everything known about the unit between events.
#[derive(Debug, Clone)]
pub struct UnitState {
    pub site: SiteConfig,
    pub relations: RelationStateTracker,
    /// Latched by `start-radio`, cleared by `stop-radio`.
    pub radio_requested: bool,
    pub workload_ready: bool,
    pub identity_joined: bool,
    /// A peer asked for the identity to be published again.
    pub identity_requested: bool,
    pub observed: ObservedState,
    pub phase: Phase,
    pub status: UnitStatus,
    /// Why the last pass left the workload stopped.
    pub stop_reason: Option<StopReason>,
}

/// Event-driven controller for the simulated gNB.
pub struct Reconciler<S> {
    supervisor: S,
    renderer: Renderer,
    settings: ReconcilerSettings,
    unit: UnitSettings,
    state: UnitState,
    intents: IntentTable,
    retry: RetryState,
    outbox: Outbox,
    reported: Option<UnitStatus>,
}

impl<S: Supervisor> Reconciler<S> {
    /// Create a reconciler seeded from the operator configuration.
    pub fn new(supervisor: S, config: &OperatorConfig, outbox: Outbox) -> Self {
        Self {
            supervisor,
            renderer: Renderer::new(config.unit.bind_address.clone()),
            settings: config.reconciler.clone(),
            unit: config.unit.clone(),
            state: UnitState {
                site: SiteConfig::from_options(&config.site),
                relations: RelationStateTracker::new(),
                radio_requested: false,
                workload_ready: config.unit.workload_ready,
                identity_joined: false,
                identity_requested: false,
                observed: ObservedState::NotStarted,
                phase: Phase::Stopped,
                status: UnitStatus::default(),
                stop_reason: None,
            },
            intents: IntentTable::new(),
            retry: RetryState::default(),
            outbox,
            reported: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &UnitState {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase
    }

    #[must_use]
    pub const fn status(&self) -> &UnitStatus {
        &self.state.status
    }

    #[must_use]
    pub const fn supervisor(&self) -> &S {
        &self.supervisor
    }

    /// When the next automatic retry is due, if one is scheduled.
    #[must_use]
    pub const fn next_retry_at(&self) -> Option<Instant> {
        self.retry.next_at()
    }

    /// Supervisor failures since the last success or external trigger.
    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.retry.failures()
    }

    /// Run one full pass without a triggering event.
    pub async fn reconcile(&mut self) {
        self.converge().await;
        self.finish_turn();
    }

    /// Process one dispatch to completion.
    pub async fn handle(&mut self, dispatch: Dispatch) {
        debug!(event = dispatch.name(), phase = %self.state.phase, "Handling dispatch");
        if dispatch.is_external() {
            self.retry.reset();
        }

        let converge = match dispatch {
            Dispatch::Event(event) => self.observe(event),
            Dispatch::Action { intent, reply } => {
                self.submit(intent, reply);
                true
            }
        };

        if converge {
            self.converge().await;
        }
        self.finish_turn();
    }

    /// Stop the workload and cancel every outstanding action.
    pub async fn shutdown(&mut self) {
        info!("Reconciler shutting down");
        for pending in self.intents.drain() {
            let results = pending.resolve(Outcome::Cancelled, "operator shutting down", &self.state.status);
            self.report_results(results);
        }

        if self.supervisor.status().is_running() {
            let limit = self.settings.apply_timeout();
            match with_timeout(limit, self.supervisor.stop()).await {
                Ok(()) => info!("Workload stopped for shutdown"),
                Err(e) => {
                    warn!(error = %e, "Workload did not stop cleanly");
                    self.abandon_on_timeout(&e);
                }
            }
        }
        self.state.observed = self.supervisor.status();
    }

    /// Fold an event into state. Returns whether a pass should follow.
    fn observe(&mut self, event: OperatorEvent) -> bool {
        match event {
            OperatorEvent::RelationJoined { relation } => match relation.as_str() {
                N2_RELATION => {
                    let change = self.state.relations.joined();
                    return self.endpoint_changed(change);
                }
                GNB_IDENTITY_RELATION => {
                    self.state.identity_joined = true;
                    self.state.identity_requested = true;
                }
                other => debug!(relation = other, "Ignoring unrelated relation"),
            },
            OperatorEvent::RelationChanged { relation, data } => match relation.as_str() {
                N2_RELATION => {
                    let change = self.state.relations.update(data);
                    return self.endpoint_changed(change);
                }
                GNB_IDENTITY_RELATION => self.state.identity_requested = true,
                other => debug!(relation = other, "Ignoring unrelated relation"),
            },
            OperatorEvent::RelationBroken { relation } => match relation.as_str() {
                N2_RELATION => {
                    let change = self.state.relations.broken();
                    return self.endpoint_changed(change);
                }
                GNB_IDENTITY_RELATION => {
                    self.state.identity_joined = false;
                    self.state.relations.forget_advertised();
                }
                other => debug!(relation = other, "Ignoring unrelated relation"),
            },
            OperatorEvent::ConfigChanged { options } => {
                self.state.site = SiteConfig::from_options(&options);
                info!(options = options.len(), "Site options changed");
            }
            OperatorEvent::WorkloadReady => {
                self.state.workload_ready = true;
                info!("Workload environment ready");
            }
            OperatorEvent::Action { action, id } => {
                let intent = id.map_or_else(|| Intent::new(action), |id| Intent::with_id(id, action));
                self.submit(intent, None);
            }
            OperatorEvent::IdentityRequested => self.state.identity_requested = true,
            OperatorEvent::HealthCheck => return self.health_check(),
            OperatorEvent::Timer => {
                let due = self.retry.next_at().is_some_and(|at| at <= Instant::now());
                if due {
                    self.retry.take_due();
                    info!(failures = self.retry.failures(), "Retrying after supervisor failure");
                }
                return due;
            }
        }
        true
    }

    /// Whether an AMF relation event calls for a pass.
    fn endpoint_changed(&self, change: ChangeSet) -> bool {
        if change.is_material() || self.state.phase != Phase::Running {
            return true;
        }
        debug!(?change, "AMF endpoint unchanged, running workload left alone");
        false
    }

    fn health_check(&mut self) -> bool {
        self.state.observed = self.supervisor.status();
        if self.retry.is_exhausted() || self.retry.next_at().is_some() {
            return false;
        }
        if self.state.phase != Phase::Running {
            return true;
        }
        if self.state.observed.is_down() {
            let reason = match &self.state.observed {
                ObservedState::Failed(reason) => reason.clone(),
                other => format!("process is {other}"),
            };
            self.fail(&reason);
        }
        false
    }

    fn submit(&mut self, intent: Intent, reply: Option<oneshot::Sender<ActionResult>>) {
        let kind = intent.kind;
        info!(id = %intent.id, action = %kind, "Action invoked");
        if let Some(superseded) = self.intents.submit(intent, reply) {
            let message = format!("superseded by {kind}");
            let results = superseded.resolve(Outcome::Cancelled, &message, &self.state.status);
            self.report_results(results);
        }
        self.state.radio_requested = kind == ActionKind::StartRadio;
    }

    fn desired_state(&self) -> DesiredState {
        if let Err(errors) = self.renderer.validate_site(&self.state.site) {
            return DesiredState::Stopped(StopReason::InvalidConfig(errors));
        }
        let Some(endpoint) = self.state.relations.current() else {
            let gap = if self.state.relations.is_joined() {
                EndpointGap::NoData
            } else {
                EndpointGap::NotJoined
            };
            return DesiredState::Stopped(StopReason::NoEndpoint(gap));
        };
        if !self.state.radio_requested {
            return DesiredState::Stopped(StopReason::NotRequested);
        }
        if !self.state.workload_ready {
            return DesiredState::Stopped(StopReason::WorkloadUnavailable);
        }
        match self.renderer.render(&self.state.site, endpoint) {
            Ok(document) => DesiredState::Running(document),
            Err(error) => DesiredState::Stopped(StopReason::InvalidConfig(vec![error])),
        }
    }

    async fn converge(&mut self) {
        self.transition(Phase::Converging);
        match self.desired_state() {
            DesiredState::Stopped(reason) => self.converge_stopped(reason).await,
            DesiredState::Running(document) => self.converge_running(&document).await,
        }
    }

    async fn converge_stopped(&mut self, reason: StopReason) {
        self.state.observed = self.supervisor.status();
        if self.state.observed.is_running() {
            let limit = self.settings.apply_timeout();
            if let Err(e) = with_timeout(limit, self.supervisor.stop()).await {
                self.abandon_on_timeout(&e);
                self.fail(&e.to_string());
                return;
            }
            info!(%reason, "Workload stopped");
            self.state.observed = self.supervisor.status();
        }

        self.retry.reset();
        self.state.status = match &reason {
            StopReason::InvalidConfig(_) => UnitStatus::blocked(reason.to_string()),
            StopReason::NoEndpoint(_) | StopReason::WorkloadUnavailable => {
                UnitStatus::waiting(reason.to_string())
            }
            StopReason::NotRequested => UnitStatus::active(reason.to_string()),
        };
        // Invalid input stays converging until the operator fixes it.
        let next = match reason {
            StopReason::InvalidConfig(_) => Phase::Converging,
            _ => Phase::Stopped,
        };
        self.transition(next);
        self.state.stop_reason = Some(reason);
    }

    async fn converge_running(&mut self, document: &ConfigDocument) {
        self.state.stop_reason = None;
        let limit = self.settings.apply_timeout();
        match with_timeout(limit, self.supervisor.apply(document)).await {
            Ok(outcome) => {
                info!(?outcome, hash = %document.hash(), "Configuration applied");
                self.retry.reset();
                self.state.observed = self.supervisor.status();
                self.state.status = UnitStatus::active("running");
                self.transition(Phase::Running);
            }
            Err(e) => {
                self.abandon_on_timeout(&e);
                self.fail(&e.to_string());
            }
        }
    }

    /// An expired call was dropped mid-flight; let the supervisor clean up after it.
    fn abandon_on_timeout(&mut self, error: &SupervisorError) {
        if matches!(error, SupervisorError::Timeout { .. }) {
            self.supervisor.abandon(&error.to_string());
        }
    }

    fn fail(&mut self, reason: &str) {
        warn!(error = reason, "Supervisor failure");
        self.state.observed = self.supervisor.status();
        self.transition(Phase::Degraded);

        let detail = match self.retry.record_failure(&self.settings, Instant::now()) {
            RetryDecision::RetryAt { attempt, max, at } => {
                let delay = at.saturating_duration_since(Instant::now());
                info!(attempt, max, delay_ms = delay.as_millis(), "Retry scheduled");
                format!("retry {attempt}/{max}")
            }
            RetryDecision::Exhausted => {
                warn!(
                    failures = self.retry.failures(),
                    "Retries exhausted, waiting for an external trigger"
                );
                "retries exhausted".to_string()
            }
        };
        self.state.status = UnitStatus::error(format!("supervisor failure: {reason} ({detail})"));
    }

    fn transition(&mut self, next: Phase) {
        let current = self.state.phase;
        if current == next {
            return;
        }
        if !current.can_transition_to(next) {
            warn!(from = %current, to = %next, "Unexpected phase transition");
        }
        debug!(from = %current, to = %next, "Phase transition");
        self.state.phase = next;
    }

    fn finish_turn(&mut self) {
        self.publish_identity();
        self.resolve_intents();
        self.report_status();
    }

    fn publish_identity(&mut self) {
        if !self.state.identity_joined {
            return;
        }
        let Ok(site) = self.renderer.validate_site(&self.state.site) else {
            return;
        };
        let identity = GnbIdentity::for_unit(&self.unit.model, &self.unit.application, site.tac);
        let changed = self.state.relations.advertise(identity.clone());
        if changed || self.state.identity_requested {
            info!(gnb_name = %identity.gnb_name, tac = identity.tac, "Publishing gNB identity");
            self.send(OperatorOutput::RelationData {
                relation: GNB_IDENTITY_RELATION.to_string(),
                data: identity.to_relation_data(),
            });
            self.state.identity_requested = false;
        }
    }

    fn resolve_intents(&mut self) {
        for kind in [ActionKind::StartRadio, ActionKind::StopRadio] {
            if !self.intents.is_pending(kind) {
                continue;
            }
            let verdict = match kind {
                ActionKind::StartRadio => self.start_verdict(),
                ActionKind::StopRadio => self.stop_verdict(),
            };
            let Some((outcome, message)) = verdict else {
                continue;
            };
            if let Some(pending) = self.intents.take(kind) {
                info!(action = %kind, ?outcome, callers = pending.callers(), "Action resolved");
                let results = pending.resolve(outcome, &message, &self.state.status);
                self.report_results(results);
            }
        }
    }

    fn start_verdict(&self) -> Option<(Outcome, String)> {
        match self.state.phase {
            Phase::Running => Some((Outcome::Success, "radio running".to_string())),
            Phase::Degraded if self.retry.is_exhausted() => Some((
                Outcome::Failure,
                format!("cannot start radio: {}", self.state.status.message),
            )),
            Phase::Degraded => None,
            Phase::Stopped | Phase::Converging => self
                .state
                .stop_reason
                .as_ref()
                .map(|reason| (Outcome::Failure, format!("cannot start radio: {reason}"))),
        }
    }

    fn stop_verdict(&self) -> Option<(Outcome, String)> {
        match self.state.phase {
            Phase::Degraded if self.retry.is_exhausted() => Some((
                Outcome::Failure,
                format!("cannot stop radio: {}", self.state.status.message),
            )),
            Phase::Degraded => None,
            _ if self.state.observed.is_down() => {
                Some((Outcome::Success, "radio stopped".to_string()))
            }
            _ => None,
        }
    }

    fn report_results(&self, results: Vec<ActionResult>) {
        for result in results {
            self.send(OperatorOutput::ActionResult(result));
        }
    }

    fn report_status(&mut self) {
        if self.reported.as_ref() == Some(&self.state.status) {
            return;
        }
        info!(status = %self.state.status, phase = %self.state.phase, "Unit status");
        self.send(OperatorOutput::Status(self.state.status.clone()));
        self.reported = Some(self.state.status.clone());
    }

    fn send(&self, output: OperatorOutput) {
        if self.outbox.send(output).is_err() {
            debug!("Outbox closed, dropping output");
        }
    }
}

/// Bound a supervisor call; expiry counts as a supervisor failure.
async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, SupervisorError>>,
) -> Result<T, SupervisorError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(SupervisorError::timeout(limit)))
}
