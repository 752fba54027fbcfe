//! Legacy `stage1/stage2/stage3` response shape.
//!
//! Older clients expect the debate transcript under `stage1`, an always-empty
//! `stage2` ranking list, and the synthesis under `stage3`. This adapter is a
//! pure function of [`SessionPayload`]; nothing else in the crate uses these
//! names.

use serde::{Deserialize, Serialize};

use super::{SessionPayload, SynthesisRecord, TurnRecord};
use crate::debate::FailureStage;

/// `stage3.response` when no synthesis was produced.
pub const SYNTHESIS_PLACEHOLDER: &str = "Error: Unable to generate synthesis.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyTurn {
    pub round: u32,
    pub role_id: String,
    pub role_name: String,
    pub model: String,
    pub message: String,
    /// Seconds.
    pub elapsed_time: f64,
}

impl From<&TurnRecord> for LegacyTurn {
    fn from(t: &TurnRecord) -> Self {
        Self {
            round: t.round,
            role_id: t.role_id.clone(),
            role_name: t.role_name.clone(),
            model: t.model_id.clone(),
            message: t.message.clone(),
            elapsed_time: t.elapsed_ms as f64 / 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySynthesis {
    pub role_id: String,
    pub role_name: String,
    pub model: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub elapsed_time: Option<f64>,
}

impl From<&SynthesisRecord> for LegacySynthesis {
    fn from(s: &SynthesisRecord) -> Self {
        Self {
            role_id: s.role_id.clone(),
            role_name: s.role_name.clone(),
            model: s.model_id.clone(),
            response: s.response.clone(),
            elapsed_time: Some(s.elapsed_ms as f64 / 1000.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyMetadata {
    /// Highest round reached.
    pub total_rounds: u32,
    pub total_turns: u32,
    pub roles_participated: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyCouncilResponse {
    pub stage1: Vec<LegacyTurn>,
    /// Always empty; debates have no ranking stage.
    pub stage2: Vec<serde_json::Value>,
    pub stage3: LegacySynthesis,
    pub metadata: LegacyMetadata,
}

impl LegacyCouncilResponse {
    pub fn from_payload(payload: &SessionPayload) -> Self {
        let stage3 = match &payload.synthesis {
            Some(synthesis) => LegacySynthesis::from(synthesis),
            None => {
                // Only a failed synthesis tells us who the synthesizer was.
                let role_id = payload
                    .metadata
                    .failure
                    .as_ref()
                    .filter(|f| f.stage == FailureStage::Synthesis)
                    .and_then(|f| f.role_id.clone())
                    .unwrap_or_default();
                LegacySynthesis {
                    role_id,
                    role_name: String::new(),
                    model: String::new(),
                    response: SYNTHESIS_PLACEHOLDER.to_string(),
                    elapsed_time: None,
                }
            }
        };

        Self {
            stage1: payload.transcript.iter().map(LegacyTurn::from).collect(),
            stage2: Vec::new(),
            stage3,
            metadata: LegacyMetadata {
                total_rounds: payload.rounds_observed(),
                total_turns: payload.metadata.total_turns,
                roles_participated: payload.metadata.roles_participated.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::SessionStatus;
    use crate::session::{FailureRecord, SessionMetadata};

    fn payload(synthesis: Option<SynthesisRecord>, failure: Option<FailureRecord>) -> SessionPayload {
        SessionPayload {
            id: "s".to_string(),
            question: "q".to_string(),
            transcript: vec![TurnRecord {
                round: 1,
                role_id: "cfo".to_string(),
                role_name: "CFO".to_string(),
                model_id: "mistral:7b".to_string(),
                message: "Too costly.".to_string(),
                elapsed_ms: 1500,
            }],
            metadata: SessionMetadata {
                total_rounds: 3,
                total_turns: 1,
                roles_participated: vec!["cfo".to_string()],
                status: if synthesis.is_some() {
                    SessionStatus::Completed
                } else {
                    SessionStatus::Failed
                },
                failure,
            },
            synthesis,
        }
    }

    #[test]
    fn test_completed_session() {
        let legacy = LegacyCouncilResponse::from_payload(&payload(
            Some(SynthesisRecord {
                role_id: "juge".to_string(),
                role_name: "Juge".to_string(),
                model_id: "llama3.1:8b".to_string(),
                response: "Wait a quarter.".to_string(),
                elapsed_ms: 2000,
            }),
            None,
        ));

        assert_eq!(legacy.stage1.len(), 1);
        assert_eq!(legacy.stage1[0].model, "mistral:7b");
        assert!((legacy.stage1[0].elapsed_time - 1.5).abs() < f64::EPSILON);
        assert!(legacy.stage2.is_empty());
        assert_eq!(legacy.stage3.response, "Wait a quarter.");
        assert_eq!(legacy.metadata.total_rounds, 1);

        let json = serde_json::to_value(&legacy).unwrap();
        assert_eq!(json["stage2"], serde_json::json!([]));
        assert_eq!(json["stage3"]["model"], "llama3.1:8b");
    }

    #[test]
    fn test_missing_synthesis_uses_placeholder() {
        let legacy = LegacyCouncilResponse::from_payload(&payload(
            None,
            Some(FailureRecord {
                stage: FailureStage::Synthesis,
                round: None,
                role_id: Some("juge".to_string()),
                message: "timeout".to_string(),
            }),
        ));
        assert_eq!(legacy.stage3.response, SYNTHESIS_PLACEHOLDER);
        assert_eq!(legacy.stage3.role_id, "juge");
        assert!(legacy.stage3.elapsed_time.is_none());
    }
}
