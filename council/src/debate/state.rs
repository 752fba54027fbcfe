//! Debate state machine: phases, transitions, and session tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::transcript::{Synthesis, Transcript};
use crate::roles::SharedRoleRegistry;

/// Phase of a debate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", content = "round", rename_all = "snake_case")]
pub enum DebatePhase {
    /// Session created but not started.
    Idle,
    /// Debate roles are taking their turns in this round.
    RoundInProgress(u32),
    /// Every debate role has spoken in this round.
    RoundComplete(u32),
    /// The transcript is complete.
    AllRoundsComplete,
    /// The synthesizer is producing the final response.
    Synthesizing,
    /// Synthesis produced (terminal).
    Completed,
    /// A turn, the synthesis, or cancellation ended the session (terminal).
    Failed,
}

impl DebatePhase {
    /// Whether this is a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `to` is a legal next phase from this one.
    pub fn allows(self, to: DebatePhase) -> bool {
        match (self, to) {
            (Self::Idle, Self::RoundInProgress(1)) => true,
            (Self::RoundInProgress(r), Self::RoundComplete(c)) => r == c,
            (Self::RoundInProgress(_), Self::Failed) => true,
            (Self::RoundComplete(r), Self::RoundInProgress(n)) => n == r + 1,
            (Self::RoundComplete(_), Self::AllRoundsComplete) => true,
            (Self::AllRoundsComplete, Self::Synthesizing) => true,
            (Self::Synthesizing, Self::Completed | Self::Failed) => true,
            _ => false,
        }
    }

    /// The round this phase belongs to, if any.
    pub fn round(self) -> Option<u32> {
        match self {
            Self::RoundInProgress(r) | Self::RoundComplete(r) => Some(r),
            _ => None,
        }
    }
}

impl std::fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::RoundInProgress(r) => write!(f, "round_in_progress({})", r),
            Self::RoundComplete(r) => write!(f, "round_complete({})", r),
            Self::AllRoundsComplete => write!(f, "all_rounds_complete"),
            Self::Synthesizing => write!(f, "synthesizing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Externally visible session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

impl From<DebatePhase> for SessionStatus {
    fn from(phase: DebatePhase) -> Self {
        match phase {
            DebatePhase::Completed => Self::Completed,
            DebatePhase::Failed => Self::Failed,
            _ => Self::Running,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Where a failed session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// A debate turn failed; the transcript is partial.
    Debate,
    /// Only the synthesis failed; the transcript is complete.
    Synthesis,
    /// Cancelled at a turn boundary.
    Cancelled,
    /// The orchestrator violated its own invariants.
    Internal,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debate => write!(f, "debate"),
            Self::Synthesis => write!(f, "synthesis"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Why a session ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFailure {
    pub stage: FailureStage,
    /// Round of the failing turn (absent for synthesis).
    pub round: Option<u32>,
    /// Role whose turn failed, when a turn was involved.
    pub role_id: Option<String>,
    pub message: String,
}

/// A phase transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateTransition {
    /// Previous phase.
    pub from: DebatePhase,
    /// New phase.
    pub to: DebatePhase,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
    /// Reason for the transition.
    pub reason: String,
}

/// Error for invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: DebatePhase,
    pub to: DebatePhase,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid transition {} → {}", self.from, self.to)
    }
}

impl std::error::Error for TransitionError {}

/// A debate session tracking state and history.
///
/// Owned by the orchestrator until it reaches a terminal phase.
#[derive(Debug, Clone)]
pub struct DebateSession {
    /// Unique session identifier.
    pub id: String,
    /// The user's question.
    pub question: String,
    /// Role snapshot taken at session start.
    pub roles: SharedRoleRegistry,
    pub transcript: Transcript,
    pub synthesis: Option<Synthesis>,
    pub total_rounds: u32,
    /// Planned number of debate turns (rounds × debate roles).
    pub total_turns: u32,
    /// Current phase.
    pub phase: DebatePhase,
    /// Transition history.
    pub transitions: Vec<DebateTransition>,
    pub failure: Option<SessionFailure>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DebateSession {
    /// Create a new debate session.
    pub fn new(id: &str, question: &str, roles: SharedRoleRegistry, total_rounds: u32) -> Self {
        // run() rejects round counts that overflow before a session exists
        let total_turns = roles.turns_for(total_rounds).unwrap_or(u32::MAX);
        Self {
            id: id.to_string(),
            question: question.to_string(),
            roles,
            transcript: Transcript::new(),
            synthesis: None,
            total_rounds,
            total_turns,
            phase: DebatePhase::Idle,
            transitions: Vec::new(),
            failure: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Transition to a new phase with a reason.
    pub fn transition(&mut self, to: DebatePhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.allows(to) {
            return Err(TransitionError {
                from: self.phase,
                to,
            });
        }

        self.transitions.push(DebateTransition {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;

        if to.is_terminal() {
            self.finished_at = Some(Utc::now());
        }

        Ok(())
    }

    /// Move to `Failed`, recording why.
    pub fn fail(&mut self, failure: SessionFailure) -> Result<(), TransitionError> {
        let reason = format!("{} failure: {}", failure.stage, failure.message);
        self.transition(DebatePhase::Failed, &reason)?;
        self.failure = Some(failure);
        Ok(())
    }

    /// Force `Failed` from a phase with no legal edge to it.
    ///
    /// Only reachable after a defect; the forced edge is still recorded.
    pub fn abort(&mut self, failure: SessionFailure) {
        if self.phase.is_terminal() {
            return;
        }
        self.transitions.push(DebateTransition {
            from: self.phase,
            to: DebatePhase::Failed,
            timestamp: Utc::now(),
            reason: format!("aborted: {}", failure.message),
        });
        self.phase = DebatePhase::Failed;
        self.finished_at = Some(Utc::now());
        self.failure = Some(failure);
    }

    pub fn status(&self) -> SessionStatus {
        self.phase.into()
    }

    /// Whether the debate has ended.
    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] {}/{} turns | {} rounds | synthesis={} | session={}",
            self.phase,
            self.transcript.len(),
            self.total_turns,
            self.total_rounds,
            if self.synthesis.is_some() { "yes" } else { "no" },
            self.id
        )
    }
}
