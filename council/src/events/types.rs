//! Progress event types
//!
//! One event per observable step of a debate: each turn starts and then
//! completes or fails, and the synthesis does the same once at the end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// Progress of a running debate session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A debate turn is about to invoke its model
    TurnStarted {
        round: u32,
        role_id: String,
        role_name: String,
        model_id: String,
        sequence_index: u32,
        timestamp: DateTime<Utc>,
    },

    /// A debate turn produced its message
    TurnCompleted {
        round: u32,
        role_id: String,
        role_name: String,
        model_id: String,
        sequence_index: u32,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A debate turn's invocation failed
    TurnFailed {
        round: u32,
        role_id: String,
        role_name: String,
        model_id: String,
        sequence_index: u32,
        elapsed_ms: u64,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// The synthesizer is about to be invoked
    SynthesisStarted {
        role_id: String,
        role_name: String,
        model_id: String,
        timestamp: DateTime<Utc>,
    },

    /// The synthesizer produced the final answer
    SynthesisCompleted {
        role_id: String,
        role_name: String,
        model_id: String,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The synthesizer's invocation failed
    SynthesisFailed {
        role_id: String,
        role_name: String,
        model_id: String,
        elapsed_ms: u64,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl ProgressEvent {
    pub fn turn_started(role: &Role, round: u32, sequence_index: u32) -> Self {
        ProgressEvent::TurnStarted {
            round,
            role_id: role.role_id.clone(),
            role_name: role.role_name.clone(),
            model_id: role.model_id.clone(),
            sequence_index,
            timestamp: Utc::now(),
        }
    }

    pub fn turn_completed(role: &Role, round: u32, sequence_index: u32, elapsed_ms: u64) -> Self {
        ProgressEvent::TurnCompleted {
            round,
            role_id: role.role_id.clone(),
            role_name: role.role_name.clone(),
            model_id: role.model_id.clone(),
            sequence_index,
            elapsed_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn turn_failed(
        role: &Role,
        round: u32,
        sequence_index: u32,
        elapsed_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        ProgressEvent::TurnFailed {
            round,
            role_id: role.role_id.clone(),
            role_name: role.role_name.clone(),
            model_id: role.model_id.clone(),
            sequence_index,
            elapsed_ms,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn synthesis_started(role: &Role) -> Self {
        ProgressEvent::SynthesisStarted {
            role_id: role.role_id.clone(),
            role_name: role.role_name.clone(),
            model_id: role.model_id.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn synthesis_completed(role: &Role, elapsed_ms: u64) -> Self {
        ProgressEvent::SynthesisCompleted {
            role_id: role.role_id.clone(),
            role_name: role.role_name.clone(),
            model_id: role.model_id.clone(),
            elapsed_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn synthesis_failed(role: &Role, elapsed_ms: u64, error: impl Into<String>) -> Self {
        ProgressEvent::SynthesisFailed {
            role_id: role.role_id.clone(),
            role_name: role.role_name.clone(),
            model_id: role.model_id.clone(),
            elapsed_ms,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ProgressEvent::TurnStarted { timestamp, .. }
            | ProgressEvent::TurnCompleted { timestamp, .. }
            | ProgressEvent::TurnFailed { timestamp, .. }
            | ProgressEvent::SynthesisStarted { timestamp, .. }
            | ProgressEvent::SynthesisCompleted { timestamp, .. }
            | ProgressEvent::SynthesisFailed { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            ProgressEvent::TurnStarted { .. } => "turn_started",
            ProgressEvent::TurnCompleted { .. } => "turn_completed",
            ProgressEvent::TurnFailed { .. } => "turn_failed",
            ProgressEvent::SynthesisStarted { .. } => "synthesis_started",
            ProgressEvent::SynthesisCompleted { .. } => "synthesis_completed",
            ProgressEvent::SynthesisFailed { .. } => "synthesis_failed",
        }
    }

    pub fn role_id(&self) -> &str {
        match self {
            ProgressEvent::TurnStarted { role_id, .. }
            | ProgressEvent::TurnCompleted { role_id, .. }
            | ProgressEvent::TurnFailed { role_id, .. }
            | ProgressEvent::SynthesisStarted { role_id, .. }
            | ProgressEvent::SynthesisCompleted { role_id, .. }
            | ProgressEvent::SynthesisFailed { role_id, .. } => role_id,
        }
    }

    /// Round of a debate-turn event; `None` for synthesis events.
    pub fn round(&self) -> Option<u32> {
        match self {
            ProgressEvent::TurnStarted { round, .. }
            | ProgressEvent::TurnCompleted { round, .. }
            | ProgressEvent::TurnFailed { round, .. } => Some(*round),
            _ => None,
        }
    }

    pub fn sequence_index(&self) -> Option<u32> {
        match self {
            ProgressEvent::TurnStarted { sequence_index, .. }
            | ProgressEvent::TurnCompleted { sequence_index, .. }
            | ProgressEvent::TurnFailed { sequence_index, .. } => Some(*sequence_index),
            _ => None,
        }
    }

    /// Whether this event ends a turn or the synthesis with a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProgressEvent::TurnFailed { .. } | ProgressEvent::SynthesisFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_tag() {
        let role = Role::debater("cfo", "CFO", "mistral:7b", "Count the money.");
        let event = ProgressEvent::turn_completed(&role, 2, 5, 120);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "turn_completed");
        assert_eq!(json["round"], 2);
        assert_eq!(json["sequence_index"], 5);
        assert_eq!(json["model_id"], "mistral:7b");

        let back: ProgressEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_synthesis_event_has_no_round() {
        let role = Role::synthesizer("juge", "Juge", "llama3.1:8b", "Decide.");
        let event = ProgressEvent::synthesis_failed(&role, 40, "timed out");
        assert_eq!(event.event_type(), "synthesis_failed");
        assert_eq!(event.round(), None);
        assert_eq!(event.sequence_index(), None);
        assert!(event.is_failure());

        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("round").is_none());
        assert_eq!(json["error"], "timed out");
    }
}
