//! Core types for the reconciler.

use std::fmt;

use gnb_core::ValidationError;
use gnb_events::{ActionResult, Intent, OperatorEvent};
use gnb_render::{ConfigDocument, summarize};
use tokio::sync::oneshot;

/// Reconciler phase.
///
/// `Stopped -> Converging -> Running -> Degraded` with every event re-entering
/// `Converging`. There is no terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Stopped,
    Converging,
    Running,
    Degraded,
}

impl Phase {
    /// Check if transition to target phase is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        use Phase::{Converging, Degraded, Running, Stopped};
        matches!(
            (self, target),
            (_, Converging)
                | (Converging, Stopped | Running | Degraded)
                // Health check found the process dead
                | (Running, Degraded)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stopped => "stopped",
            Self::Converging => "converging",
            Self::Running => "running",
            Self::Degraded => "degraded",
        };
        f.write_str(s)
    }
}

/// Why no AMF endpoint is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointGap {
    /// The `fiveg-n2` relation does not exist.
    NotJoined,
    /// The relation exists but carries no usable host and port.
    NoData,
}

impl fmt::Display for EndpointGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJoined => f.write_str("no AMF endpoint (fiveg-n2 relation not joined)"),
            Self::NoData => f.write_str("no AMF endpoint (waiting for AMF host and port)"),
        }
    }
}

/// Why the workload should not be running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    InvalidConfig(Vec<ValidationError>),
    NoEndpoint(EndpointGap),
    WorkloadUnavailable,
    NotRequested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(errors) => {
                write!(f, "invalid configuration: {}", summarize(errors))
            }
            Self::NoEndpoint(gap) => write!(f, "{gap}"),
            Self::WorkloadUnavailable => f.write_str("workload not ready"),
            Self::NotRequested => f.write_str("radio stopped"),
        }
    }
}

/// Desired workload state, derived on every pass and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredState {
    Stopped(StopReason),
    Running(ConfigDocument),
}

/// Work item consumed by the reconciler, one per turn.
#[derive(Debug)]
pub enum Dispatch {
    Event(OperatorEvent),
    /// An action invocation; `reply` is present when a caller waits on it.
    Action {
        intent: Intent,
        reply: Option<oneshot::Sender<ActionResult>>,
    },
}

impl Dispatch {
    /// Whether this comes from outside the unit.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        match self {
            Self::Event(event) => event.is_external(),
            Self::Action { .. } => true,
        }
    }

    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Event(event) => event.name(),
            Self::Action { .. } => "action",
        }
    }
}

impl From<OperatorEvent> for Dispatch {
    fn from(event: OperatorEvent) -> Self {
        match event {
            OperatorEvent::Action { action, id } => Self::Action {
                intent: id.map_or_else(|| Intent::new(action), |id| Intent::with_id(id, action)),
                reply: None,
            },
            other => Self::Event(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use gnb_events::{ActionKind, IntentId};

    use super::*;

    #[test]
    fn test_phase_transitions() {
        assert!(Phase::Stopped.can_transition_to(Phase::Converging));
        assert!(Phase::Converging.can_transition_to(Phase::Running));
        assert!(Phase::Converging.can_transition_to(Phase::Degraded));
        assert!(Phase::Running.can_transition_to(Phase::Degraded));
        assert!(Phase::Degraded.can_transition_to(Phase::Converging));
        assert!(!Phase::Stopped.can_transition_to(Phase::Running));
        assert!(!Phase::Degraded.can_transition_to(Phase::Running));
    }

    #[test]
    fn test_stop_reason_messages() {
        let invalid = StopReason::InvalidConfig(vec![
            ValidationError::new("mcc", "must be exactly 3 digits"),
            ValidationError::new("tac", "out of range"),
        ]);
        assert_eq!(
            invalid.to_string(),
            "invalid configuration: mcc (must be exactly 3 digits), tac (out of range)"
        );
        assert_eq!(
            StopReason::NoEndpoint(EndpointGap::NotJoined).to_string(),
            "no AMF endpoint (fiveg-n2 relation not joined)"
        );
    }

    #[test]
    fn test_action_event_becomes_dispatch_action() {
        let id = IntentId::new();
        let dispatch = Dispatch::from(OperatorEvent::Action {
            action: ActionKind::StopRadio,
            id: Some(id),
        });
        match dispatch {
            Dispatch::Action { intent, reply } => {
                assert_eq!(intent.id, id);
                assert_eq!(intent.kind, ActionKind::StopRadio);
                assert!(reply.is_none());
            }
            Dispatch::Event(event) => assert_ne!(event.name(), "action"),
        }
    }

    #[test]
    fn test_timers_are_internal() {
        assert!(!Dispatch::from(OperatorEvent::Timer).is_external());
        assert!(Dispatch::from(OperatorEvent::WorkloadReady).is_external());
    }
}
