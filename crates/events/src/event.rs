//! Operator events and outbound records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ActionKind, ActionResult, IntentId, UnitStatus};

/// Events consumed by the reconciler.
///
/// The serialized form is one JSON object per line, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum OperatorEvent {
    /// A relation was established; its data may follow later.
    RelationJoined { relation: String },
    /// A peer published new relation data.
    RelationChanged {
        relation: String,
        #[serde(default)]
        data: BTreeMap<String, String>,
    },
    /// A relation was removed.
    RelationBroken { relation: String },
    /// The operator changed configuration options.
    ConfigChanged {
        #[serde(default)]
        options: BTreeMap<String, String>,
    },
    /// The workload's execution environment became usable.
    WorkloadReady,
    /// An action was invoked without an in-process caller waiting on it.
    Action {
        action: ActionKind,
        #[serde(default)]
        id: Option<IntentId>,
    },
    /// A peer asked for the gNB identity to be (re)published.
    IdentityRequested,
    /// Periodic liveness probe.
    HealthCheck,
    /// A scheduled retry came due.
    Timer,
}

impl OperatorEvent {
    /// Decode a single hook line.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEvent` for malformed JSON or an unknown tag.
    pub fn from_json_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim()).map_err(|e| Error::invalid_event(e.to_string()))
    }

    /// Whether the event comes from outside the unit.
    ///
    /// External events reset retry exhaustion; timers and health checks do not.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        !matches!(self, Self::HealthCheck | Self::Timer)
    }

    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RelationJoined { .. } => "relation-joined",
            Self::RelationChanged { .. } => "relation-changed",
            Self::RelationBroken { .. } => "relation-broken",
            Self::ConfigChanged { .. } => "config-changed",
            Self::WorkloadReady => "workload-ready",
            Self::Action { .. } => "action",
            Self::IdentityRequested => "identity-requested",
            Self::HealthCheck => "health-check",
            Self::Timer => "timer",
        }
    }
}

/// Records produced for the orchestrator.
///
/// The serialized form is one JSON object per line, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OperatorOutput {
    /// The unit status changed.
    Status(UnitStatus),
    /// Data to publish on a provided relation.
    RelationData {
        relation: String,
        data: BTreeMap<String, String>,
    },
    /// An action resolved.
    ActionResult(ActionResult),
}

impl OperatorOutput {
    /// Encode as a single JSON line without the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if encoding fails.
    pub fn to_json_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::types::{Intent, N2_RELATION};

    #[test]
    fn decodes_relation_changed() {
        let line = r#"{"event":"relation-changed","relation":"fiveg-n2","data":{"host":"amf","port":"38412"}}"#;
        let event = OperatorEvent::from_json_line(line).unwrap();
        let expected = OperatorEvent::RelationChanged {
            relation: N2_RELATION.to_string(),
            data: BTreeMap::from([
                ("host".to_string(), "amf".to_string()),
                ("port".to_string(), "38412".to_string()),
            ]),
        };
        assert_eq!(event, expected);
    }

    #[test]
    fn decodes_unit_variants_and_actions() {
        assert_eq!(
            OperatorEvent::from_json_line(r#"{"event":"workload-ready"}"#).unwrap(),
            OperatorEvent::WorkloadReady
        );
        assert_eq!(
            OperatorEvent::from_json_line(r#"{"event":"action","action":"stop-radio"}"#).unwrap(),
            OperatorEvent::Action {
                action: ActionKind::StopRadio,
                id: None
            }
        );
    }

    #[test]
    fn rejects_unknown_event() {
        let err = OperatorEvent::from_json_line(r#"{"event":"reboot"}"#);
        assert!(matches!(err, Err(Error::InvalidEvent { .. })));
    }

    #[test]
    fn timers_are_not_external() {
        assert!(!OperatorEvent::Timer.is_external());
        assert!(!OperatorEvent::HealthCheck.is_external());
        assert!(OperatorEvent::WorkloadReady.is_external());
    }

    #[test]
    fn encodes_status_and_action_result() {
        let status = OperatorOutput::Status(UnitStatus::active("running"));
        assert_eq!(
            status.to_json_line().unwrap(),
            r#"{"kind":"status","status":"active","message":"running"}"#
        );

        let intent = Intent::new(ActionKind::StartRadio);
        let result = OperatorOutput::ActionResult(ActionResult::success(
            &intent,
            "radio running",
            UnitStatus::active("running"),
        ));
        let line = result.to_json_line().unwrap();
        assert!(line.starts_with(r#"{"kind":"action-result""#));
        assert!(line.contains(r#""outcome":"success""#));
        assert!(line.contains(&intent.id.to_string()));
    }
}
