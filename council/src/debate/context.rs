//! Context builder: what a role sees when it takes its turn.
//!
//! Pure and deterministic: identical inputs produce identical entries. The
//! builder refuses transcripts that would leak a future turn into the
//! context.

use serde::{Deserialize, Serialize};

use super::transcript::Transcript;
use crate::error::ContextAssemblyError;
use crate::roles::Role;

/// Who is speaking in a context entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Speaker {
    /// Standing instructions.
    System,
    /// The person who asked the question.
    User,
    /// A debate role's earlier turn.
    Participant {
        role_id: String,
        role_name: String,
        round: u32,
    },
}

/// One entry of the ordered context handed to a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl ContextEntry {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }
}

fn debate_system_prompt(role: &Role, round: u32, total_rounds: u32) -> String {
    format!(
        "{instructions}

DEBATE CONTEXT:
You are participating in Round {round} of {total_rounds} in a structured debate council.
Your goal is to:
- Build on previous arguments (yours and others')
- Respond to counter-arguments from other roles
- Introduce new points and perspectives relevant to your role
- Avoid repetition - reference previous points briefly rather than restating them verbatim
- Keep your response focused and concise (2-3 paragraphs)

Remember: Each role brings a different perspective. Engage with their arguments constructively.",
        instructions = role.debate_instructions,
    )
}

fn validate(
    role: &Role,
    transcript: &Transcript,
    round: u32,
    total_rounds: u32,
) -> Result<(), ContextAssemblyError> {
    if round == 0 || round > total_rounds {
        return Err(ContextAssemblyError::RoundOutOfRange {
            round,
            total_rounds,
        });
    }

    let mut previous_round = 0;
    for (position, turn) in transcript.turns().iter().enumerate() {
        if turn.round < previous_round {
            return Err(ContextAssemblyError::OutOfOrder { position });
        }
        previous_round = turn.round;

        if turn.round > round {
            return Err(ContextAssemblyError::Lookahead {
                round,
                found: turn.round,
            });
        }
        if turn.round == round && turn.role_id == role.role_id {
            return Err(ContextAssemblyError::SlotAlreadyFilled {
                role_id: role.role_id.clone(),
                round,
            });
        }
    }

    for prior in 1..round {
        if transcript.round(prior).next().is_none() {
            return Err(ContextAssemblyError::MissingPriorRound {
                round,
                missing: prior,
            });
        }
    }

    Ok(())
}

/// Build the ordered context for `role`'s turn in `round`.
///
/// Entries: the role's system instructions with round metadata, the question
/// verbatim, then every turn already in the transcript.
pub fn build_context(
    user_query: &str,
    role: &Role,
    transcript: &Transcript,
    round: u32,
    total_rounds: u32,
) -> Result<Vec<ContextEntry>, ContextAssemblyError> {
    validate(role, transcript, round, total_rounds)?;

    let mut entries = Vec::with_capacity(transcript.len() + 2);
    entries.push(ContextEntry::system(debate_system_prompt(
        role,
        round,
        total_rounds,
    )));
    entries.push(ContextEntry::user(format!("Question to debate: {}", user_query)));
    entries.extend(transcript.turns().iter().map(|turn| ContextEntry {
        speaker: Speaker::Participant {
            role_id: turn.role_id.clone(),
            role_name: turn.role_name.clone(),
            round: turn.round,
        },
        text: turn.message.clone(),
    }));

    Ok(entries)
}
