//! Session assembler: the externally visible result of a debate.
//!
//! [`SessionPayload::assemble`] consumes a terminal [`DebateSession`] and
//! never fails. The legacy `stage1/stage2/stage3` shape lives in [`legacy`]
//! and is derived from the payload, not from the core types.

pub mod legacy;

use serde::{Deserialize, Serialize};

use crate::debate::{DebateSession, FailureStage, SessionFailure, SessionStatus, Synthesis, Turn};

pub use legacy::{LegacyCouncilResponse, LegacyMetadata, LegacySynthesis, LegacyTurn};

/// One transcript entry of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub round: u32,
    pub role_id: String,
    pub role_name: String,
    pub model_id: String,
    pub message: String,
    pub elapsed_ms: u64,
}

impl From<Turn> for TurnRecord {
    fn from(turn: Turn) -> Self {
        Self {
            round: turn.round,
            role_id: turn.role_id,
            role_name: turn.role_name,
            model_id: turn.model_id,
            message: turn.message,
            elapsed_ms: turn.elapsed_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRecord {
    pub role_id: String,
    pub role_name: String,
    pub model_id: String,
    pub response: String,
    pub elapsed_ms: u64,
}

impl From<Synthesis> for SynthesisRecord {
    fn from(s: Synthesis) -> Self {
        Self {
            role_id: s.role_id,
            role_name: s.role_name,
            model_id: s.model_id,
            response: s.response,
            elapsed_ms: s.elapsed_ms,
        }
    }
}

/// Why the session failed, as reported outward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub stage: FailureStage,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role_id: Option<String>,
    pub message: String,
}

impl From<SessionFailure> for FailureRecord {
    fn from(f: SessionFailure) -> Self {
        Self {
            stage: f.stage,
            round: f.round,
            role_id: f.role_id,
            message: f.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Configured number of rounds.
    pub total_rounds: u32,
    /// Turns actually recorded.
    pub total_turns: u32,
    /// Distinct role ids in first-appearance order.
    pub roles_participated: Vec<String>,
    pub status: SessionStatus,
    pub failure: Option<FailureRecord>,
}

/// Final result of one debate session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub id: String,
    pub question: String,
    pub transcript: Vec<TurnRecord>,
    pub synthesis: Option<SynthesisRecord>,
    pub metadata: SessionMetadata,
}

impl SessionPayload {
    /// Package a finished session.
    pub fn assemble(session: DebateSession) -> Self {
        let status = session.status();
        let total_rounds = session.total_rounds;

        let turns = session.transcript.into_turns();
        let mut roles_participated: Vec<String> = Vec::new();
        for turn in &turns {
            if !roles_participated.contains(&turn.role_id) {
                roles_participated.push(turn.role_id.clone());
            }
        }

        Self {
            id: session.id,
            question: session.question,
            metadata: SessionMetadata {
                total_rounds,
                total_turns: turns.len() as u32,
                roles_participated,
                status,
                failure: session.failure.map(FailureRecord::from),
            },
            transcript: turns.into_iter().map(TurnRecord::from).collect(),
            synthesis: session.synthesis.map(SynthesisRecord::from),
        }
    }

    pub fn is_success(&self) -> bool {
        self.metadata.status == SessionStatus::Completed
    }

    /// Highest round present in the transcript, 0 when empty.
    pub fn rounds_observed(&self) -> u32 {
        self.transcript.iter().map(|t| t.round).max().unwrap_or(0)
    }
}
