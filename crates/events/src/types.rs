//! Core types for the events crate.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Relation through which the AMF publishes its endpoint.
pub const N2_RELATION: &str = "fiveg-n2";
/// Relation on which this unit advertises its gNB identity.
pub const GNB_IDENTITY_RELATION: &str = "fiveg_gnb_identity";

/// Correlation id of an action invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentId(Ulid);

impl IntentId {
    /// Create a new random intent ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for IntentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operator actions exposed by the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    StartRadio,
    StopRadio,
}

impl ActionKind {
    /// The action that cancels this one.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::StartRadio => Self::StopRadio,
            Self::StopRadio => Self::StartRadio,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StartRadio => "start-radio",
            Self::StopRadio => "stop-radio",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queued record of an action invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub id: IntentId,
    pub kind: ActionKind,
    pub invoked_at: DateTime<Utc>,
}

impl Intent {
    /// Create an intent with a fresh correlation id.
    pub fn new(kind: ActionKind) -> Self {
        Self::with_id(IntentId::new(), kind)
    }

    /// Create an intent with a caller-supplied correlation id.
    pub fn with_id(id: IntentId, kind: ActionKind) -> Self {
        Self {
            id,
            kind,
            invoked_at: Utc::now(),
        }
    }
}

/// Orchestrator-visible status category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Active,
    Waiting,
    Blocked,
    Error,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Waiting => "waiting",
            Self::Blocked => "blocked",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Unit status with its human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStatus {
    pub status: StatusKind,
    pub message: String,
}

impl UnitStatus {
    pub fn active(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Active, message)
    }

    pub fn waiting(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Waiting, message)
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Blocked, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, message)
    }

    fn new(status: StatusKind, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl Default for UnitStatus {
    fn default() -> Self {
        Self::waiting("initialising")
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

/// How an action invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    /// Superseded by an opposing action before it resolved.
    Cancelled,
}

/// Result reported to the caller of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub id: IntentId,
    pub action: ActionKind,
    pub outcome: Outcome,
    pub message: String,
    /// Unit status observed when the action resolved.
    pub status: UnitStatus,
}

impl ActionResult {
    pub fn success(intent: &Intent, message: impl Into<String>, status: UnitStatus) -> Self {
        Self::new(intent, Outcome::Success, message, status)
    }

    pub fn failure(intent: &Intent, message: impl Into<String>, status: UnitStatus) -> Self {
        Self::new(intent, Outcome::Failure, message, status)
    }

    pub fn cancelled(intent: &Intent, message: impl Into<String>, status: UnitStatus) -> Self {
        Self::new(intent, Outcome::Cancelled, message, status)
    }

    fn new(
        intent: &Intent,
        outcome: Outcome,
        message: impl Into<String>,
        status: UnitStatus,
    ) -> Self {
        Self {
            id: intent.id,
            action: intent.kind,
            outcome,
            message: message.into(),
            status,
        }
    }

    /// Whether the action achieved what it asked for.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_id_is_unique() {
        assert_ne!(IntentId::new(), IntentId::new());
    }

    #[test]
    fn test_action_kind_opposite() {
        assert_eq!(ActionKind::StartRadio.opposite(), ActionKind::StopRadio);
        assert_eq!(ActionKind::StopRadio.opposite(), ActionKind::StartRadio);
    }

    #[test]
    fn test_unit_status_display() {
        assert_eq!(UnitStatus::active("running").to_string(), "active: running");
        assert_eq!(
            UnitStatus::waiting("no AMF endpoint").to_string(),
            "waiting: no AMF endpoint"
        );
    }

    #[test]
    fn test_action_result_carries_intent() {
        let intent = Intent::new(ActionKind::StopRadio);
        let result = ActionResult::cancelled(&intent, "superseded", UnitStatus::active("running"));
        assert_eq!(result.id, intent.id);
        assert_eq!(result.action, ActionKind::StopRadio);
        assert!(!result.is_success());
    }
}
