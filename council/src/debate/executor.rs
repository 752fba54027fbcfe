//! Turn executor: one model call for one role's turn.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::context::ContextEntry;
use super::transcript::Turn;
use crate::error::InvocationError;
use crate::events::{ProgressEvent, ProgressSink};
use crate::provider::ModelInvoker;
use crate::roles::Role;

/// Position a turn will occupy in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSlot {
    /// Round number (1-indexed).
    pub round: u32,
    /// Global 0-based position in the transcript.
    pub sequence_index: u32,
}

/// Invokes a role's model once and wraps the reply in a [`Turn`].
///
/// Single attempt: a failed call is reported, never retried here.
pub struct TurnExecutor {
    invoker: Arc<dyn ModelInvoker>,
    sink: Arc<dyn ProgressSink>,
}

impl TurnExecutor {
    pub fn new(invoker: Arc<dyn ModelInvoker>, sink: Arc<dyn ProgressSink>) -> Self {
        Self { invoker, sink }
    }

    /// Execute `role`'s turn in `slot` with a prepared context.
    pub async fn execute_turn(
        &self,
        slot: TurnSlot,
        role: &Role,
        context: &[ContextEntry],
    ) -> Result<Turn, InvocationError> {
        self.sink
            .emit(ProgressEvent::turn_started(role, slot.round, slot.sequence_index));
        info!(
            round = slot.round,
            role_id = %role.role_id,
            model = %role.model_id,
            sequence_index = slot.sequence_index,
            "Turn started"
        );

        let start = Instant::now();
        let result = self.invoker.invoke(&role.model_id, context).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(message) => {
                info!(
                    round = slot.round,
                    role_id = %role.role_id,
                    elapsed_ms,
                    chars = message.len(),
                    "Turn completed"
                );
                self.sink.emit(ProgressEvent::turn_completed(
                    role,
                    slot.round,
                    slot.sequence_index,
                    elapsed_ms,
                ));
                Ok(Turn {
                    round: slot.round,
                    role_id: role.role_id.clone(),
                    role_name: role.role_name.clone(),
                    model_id: role.model_id.clone(),
                    message,
                    sequence_index: slot.sequence_index,
                    elapsed_ms,
                })
            }
            Err(cause) => {
                warn!(
                    round = slot.round,
                    role_id = %role.role_id,
                    model = %role.model_id,
                    elapsed_ms,
                    "Turn failed: {}",
                    cause
                );
                self.sink.emit(ProgressEvent::turn_failed(
                    role,
                    slot.round,
                    slot.sequence_index,
                    elapsed_ms,
                    cause.to_string(),
                ));
                Err(InvocationError {
                    role_id: role.role_id.clone(),
                    round: Some(slot.round),
                    cause,
                })
            }
        }
    }
}
