//! Debate orchestrator: drives rounds × roles, then the synthesis.
//!
//! Ties together the role snapshot, context builder, turn executor and
//! synthesis stage to run one session end-to-end. Turns run strictly one
//! after another; the only suspension points are model calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::context::build_context;
use super::executor::{TurnExecutor, TurnSlot};
use super::state::{DebatePhase, DebateSession, FailureStage, SessionFailure};
use super::synthesis::SynthesisStage;
use crate::error::{ConfigurationError, DebateError};
use crate::events::ProgressSink;
use crate::provider::ModelInvoker;
use crate::roles::SharedRoleRegistry;

/// Configuration for the debate orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateConfig {
    /// Number of rounds every debate role speaks in.
    pub total_rounds: u32,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self { total_rounds: 3 }
    }
}

/// Runs debate sessions against a fixed role snapshot.
///
/// Usage:
/// 1. Create with `new()` or `with_config()`
/// 2. Optionally attach a cancellation token
/// 3. Call `run()` with the user's question
/// 4. Inspect the returned terminal [`DebateSession`]
pub struct DebateOrchestrator {
    roles: SharedRoleRegistry,
    executor: TurnExecutor,
    synthesis: SynthesisStage,
    config: DebateConfig,
    cancel: CancellationToken,
}

impl DebateOrchestrator {
    /// Create an orchestrator with default configuration.
    pub fn new(
        roles: SharedRoleRegistry,
        invoker: Arc<dyn ModelInvoker>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self::with_config(roles, invoker, sink, DebateConfig::default())
    }

    /// Create an orchestrator with custom configuration.
    pub fn with_config(
        roles: SharedRoleRegistry,
        invoker: Arc<dyn ModelInvoker>,
        sink: Arc<dyn ProgressSink>,
        config: DebateConfig,
    ) -> Self {
        Self {
            roles,
            executor: TurnExecutor::new(invoker.clone(), sink.clone()),
            synthesis: SynthesisStage::new(invoker, sink),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Observe `token` at every turn boundary.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels sessions run by this orchestrator.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    pub fn roles(&self) -> &SharedRoleRegistry {
        &self.roles
    }

    /// Check that a session for `question` can start.
    ///
    /// `run` performs the same check; callers use this to refuse a question
    /// before doing any work of their own.
    pub fn validate(&self, question: &str) -> Result<(), ConfigurationError> {
        if question.trim().is_empty() {
            return Err(ConfigurationError::EmptyQuestion);
        }
        let total_rounds = self.config.total_rounds;
        if total_rounds == 0 {
            return Err(ConfigurationError::InvalidRounds);
        }
        if self.roles.turns_for(total_rounds).is_none() {
            return Err(ConfigurationError::TooManyRounds {
                total_rounds,
                debaters: self.roles.debate_roles().len(),
            });
        }
        Ok(())
    }

    /// Run a full debate for `question`.
    ///
    /// Returns `Err` only when the session cannot start. Once started, the
    /// session is always returned in a terminal phase; a failure is recorded
    /// on it with whatever transcript had accumulated.
    pub async fn run(&self, question: &str) -> Result<DebateSession, ConfigurationError> {
        self.validate(question)?;

        let id = Uuid::new_v4().to_string();
        let mut session = DebateSession::new(
            &id,
            question,
            Arc::clone(&self.roles),
            self.config.total_rounds,
        );
        info!(
            session_id = %session.id,
            rounds = session.total_rounds,
            debate_roles = self.roles.debate_roles().len(),
            synthesizer = %self.roles.synthesizer().role_id,
            "Debate started"
        );

        if let Err(err) = self.drive(&mut session).await {
            self.record_failure(&mut session, err);
        }

        info!(session_id = %session.id, "Debate finished: {}", session.status_line());
        Ok(session)
    }

    async fn drive(&self, session: &mut DebateSession) -> Result<(), DebateError> {
        let total_rounds = session.total_rounds;

        for round in 1..=total_rounds {
            session.transition(
                DebatePhase::RoundInProgress(round),
                &format!("round {} of {} started", round, total_rounds),
            )?;

            for role in self.roles.debate_roles() {
                let sequence_index = session.transcript.next_sequence_index();
                if self.cancel.is_cancelled() {
                    return Err(DebateError::Cancelled {
                        round: Some(round),
                        sequence_index,
                    });
                }

                let context = build_context(
                    &session.question,
                    role,
                    &session.transcript,
                    round,
                    total_rounds,
                )?;
                let slot = TurnSlot {
                    round,
                    sequence_index,
                };
                let turn = self.executor.execute_turn(slot, role, &context).await?;
                session.transcript.append(turn)?;
            }

            session.transition(
                DebatePhase::RoundComplete(round),
                &format!("all {} roles spoke", self.roles.debate_roles().len()),
            )?;
        }

        session.transition(DebatePhase::AllRoundsComplete, "transcript complete")?;
        session.transition(DebatePhase::Synthesizing, "handing transcript to synthesizer")?;

        if self.cancel.is_cancelled() {
            return Err(DebateError::Cancelled {
                round: None,
                sequence_index: session.transcript.next_sequence_index(),
            });
        }

        let synthesis = self
            .synthesis
            .synthesize(&session.question, &session.transcript, self.roles.synthesizer())
            .await?;
        session.synthesis = Some(synthesis);
        session.transition(DebatePhase::Completed, "synthesis produced")?;
        Ok(())
    }

    fn record_failure(&self, session: &mut DebateSession, err: DebateError) {
        let failure = match err {
            DebateError::Invocation(e) => {
                let stage = if e.round.is_some() {
                    FailureStage::Debate
                } else {
                    FailureStage::Synthesis
                };
                warn!(session_id = %session.id, %stage, "Debate failed: {}", e);
                SessionFailure {
                    stage,
                    round: e.round,
                    role_id: Some(e.role_id.clone()),
                    message: e.to_string(),
                }
            }
            DebateError::Cancelled {
                round,
                sequence_index,
            } => {
                info!(session_id = %session.id, sequence_index, "Debate cancelled");
                SessionFailure {
                    stage: FailureStage::Cancelled,
                    round,
                    role_id: None,
                    message: format!("cancelled before sequence index {}", sequence_index),
                }
            }
            other => {
                error!(
                    session_id = %session.id,
                    phase = %session.phase,
                    "Orchestrator defect: {}",
                    other
                );
                SessionFailure {
                    stage: FailureStage::Internal,
                    round: session.phase.round(),
                    role_id: None,
                    message: other.to_string(),
                }
            }
        };

        if let Err(e) = session.fail(failure.clone()) {
            error!(session_id = %session.id, "Cannot fail session normally: {}", e);
            session.abort(failure);
        }
    }
}
