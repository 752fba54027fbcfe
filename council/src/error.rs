//! Error taxonomy for the debate council.
//!
//! Configuration problems stop a session before it starts. Invocation
//! failures end a running session but never discard the transcript built so
//! far. Context assembly and transition errors indicate a defect in the
//! orchestrator itself.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::debate::state::TransitionError;

/// Malformed or incomplete role data, or invalid session parameters.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("roles directory not found: {}", path.display())]
    RolesDirNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no YAML frontmatter found in {source_name}")]
    MissingFrontmatter { source_name: String },

    #[error("invalid frontmatter in {source_name}: {detail}")]
    InvalidFrontmatter { source_name: String, detail: String },

    #[error("role from {source_name} is missing required field `{field}`")]
    MissingField {
        source_name: String,
        field: &'static str,
    },

    #[error("duplicate role id `{role_id}`")]
    DuplicateRoleId { role_id: String },

    #[error("no debate roles found (role with participates_in_debate=true)")]
    NoDebateRoles,

    #[error("no synthesizer role found (role with is_synthesizer=true)")]
    NoSynthesizer,

    #[error("multiple synthesizer roles found: {role_ids:?}")]
    MultipleSynthesizers { role_ids: Vec<String> },

    #[error("synthesizer `{role_id}` must not participate in the debate")]
    SynthesizerParticipates { role_id: String },

    #[error("role not found: {role_id}")]
    UnknownRole { role_id: String },

    #[error("invalid model id {model:?}: must be one line without quotes or '#'")]
    InvalidModel { model: String },

    #[error("total rounds must be a positive integer")]
    InvalidRounds,

    #[error("{total_rounds} rounds of {debaters} debaters exceed the turn limit")]
    TooManyRounds { total_rounds: u32, debaters: usize },

    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("invalid config file {}: {detail}", path.display())]
    InvalidConfigFile { path: PathBuf, detail: String },
}

/// Why a single model call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationFailure {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl InvocationFailure {
    /// Whether another attempt at the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::MalformedResponse(_) => false,
        }
    }
}

/// A model call failed for a specific role and turn.
///
/// `round` is `None` for the synthesis call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invocation failed for role `{role_id}`{}: {cause}", round_suffix(.round))]
pub struct InvocationError {
    pub role_id: String,
    pub round: Option<u32>,
    #[source]
    pub cause: InvocationFailure,
}

fn round_suffix(round: &Option<u32>) -> String {
    match round {
        Some(r) => format!(" in round {}", r),
        None => " during synthesis".to_string(),
    }
}

/// The context builder was asked for something the transcript cannot honour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextAssemblyError {
    #[error("round {round} is outside 1..={total_rounds}")]
    RoundOutOfRange { round: u32, total_rounds: u32 },

    #[error("transcript contains a turn from round {found} while building round {round}")]
    Lookahead { round: u32, found: u32 },

    #[error("role `{role_id}` already has a turn in round {round}")]
    SlotAlreadyFilled { role_id: String, round: u32 },

    #[error("transcript is not ordered by round at position {position}")]
    OutOfOrder { position: usize },

    #[error("no turns recorded for prior round {missing} while building round {round}")]
    MissingPriorRound { round: u32, missing: u32 },

    #[error("expected sequence index {expected}, got {found}")]
    SequenceGap { expected: u32, found: u32 },
}

/// Umbrella error for a debate run.
#[derive(Debug, Error)]
pub enum DebateError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("context assembly defect: {0}")]
    ContextAssembly(#[from] ContextAssemblyError),

    #[error("state machine defect: {0}")]
    Transition(#[from] TransitionError),

    /// `round` is `None` when cancelled ahead of the synthesis.
    #[error("debate cancelled before sequence index {sequence_index}")]
    Cancelled {
        round: Option<u32>,
        sequence_index: u32,
    },
}
