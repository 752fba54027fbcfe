//! Turns, the append-only transcript, and the final synthesis.

use serde::{Deserialize, Serialize};

use crate::error::ContextAssemblyError;

/// One role's contribution within one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Round number (1-indexed).
    pub round: u32,
    pub role_id: String,
    pub role_name: String,
    pub model_id: String,
    pub message: String,
    /// Global 0-based position across the session.
    pub sequence_index: u32,
    /// Invocation wall-clock time in milliseconds.
    pub elapsed_ms: u64,
}

/// The single reconciling response produced after all rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    pub role_id: String,
    pub role_name: String,
    pub model_id: String,
    pub response: String,
    pub elapsed_ms: u64,
}

/// Ordered, append-only sequence of turns.
///
/// Serialized as a plain array. Deserializing replays every turn through
/// [`Transcript::append`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Turn>", into = "Vec<Turn>")]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn.
    ///
    /// The turn must occupy the next sequence position and must not belong
    /// to an earlier round than the last recorded turn.
    pub fn append(&mut self, turn: Turn) -> Result<(), ContextAssemblyError> {
        let expected = self.next_sequence_index();
        if turn.sequence_index != expected {
            return Err(ContextAssemblyError::SequenceGap {
                expected,
                found: turn.sequence_index,
            });
        }
        if let Some(last) = self.turns.last() {
            if turn.round < last.round {
                return Err(ContextAssemblyError::OutOfOrder {
                    position: self.turns.len(),
                });
            }
        }
        self.turns.push(turn);
        Ok(())
    }

    /// Sequence index the next appended turn must carry.
    pub fn next_sequence_index(&self) -> u32 {
        self.turns.len() as u32
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Highest round present, 0 when empty.
    pub fn max_round(&self) -> u32 {
        self.turns.last().map(|t| t.round).unwrap_or(0)
    }

    /// Turns of one round, in speaking order.
    pub fn round(&self, round: u32) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(move |t| t.round == round)
    }

    /// Turns grouped by round, ascending; rounds without turns are skipped.
    pub fn by_round(&self) -> Vec<(u32, Vec<&Turn>)> {
        let mut groups: Vec<(u32, Vec<&Turn>)> = Vec::new();
        for turn in &self.turns {
            match groups.last_mut() {
                Some((round, turns)) if *round == turn.round => turns.push(turn),
                _ => groups.push((turn.round, vec![turn])),
            }
        }
        groups
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}

impl TryFrom<Vec<Turn>> for Transcript {
    type Error = ContextAssemblyError;

    fn try_from(turns: Vec<Turn>) -> Result<Self, Self::Error> {
        let mut transcript = Self::new();
        for turn in turns {
            transcript.append(turn)?;
        }
        Ok(transcript)
    }
}

impl From<Transcript> for Vec<Turn> {
    fn from(transcript: Transcript) -> Self {
        transcript.turns
    }
}
