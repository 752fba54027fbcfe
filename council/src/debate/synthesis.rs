//! Synthesis stage: the synthesizer reads the whole transcript once.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::context::ContextEntry;
use super::transcript::{Synthesis, Transcript};
use crate::error::InvocationError;
use crate::events::{ProgressEvent, ProgressSink};
use crate::provider::ModelInvoker;
use crate::roles::Role;

const RECONCILE_DIRECTIVE: &str = "SYNTHESIS CONTEXT:
You have observed the complete debate above between the council roles.
Reconcile their perspectives into a single answer:
- Identify where the roles reached consensus
- Surface the points on which they still diverge, and weigh them
- Finish with a clear, actionable recommendation for the user";

/// Render the transcript the way the synthesizer reads it.
///
/// Turns are grouped under `=== Round r ===` headers in round-then-role
/// order, each labelled `**role_name** (role_id):`.
pub fn format_transcript(user_query: &str, transcript: &Transcript) -> String {
    let mut out = format!("Original Question: {}\n\n", user_query);
    out.push_str("COMPLETE DEBATE TRANSCRIPT:\n\n");
    for (round, turns) in transcript.by_round() {
        let _ = write!(out, "=== Round {} ===\n\n", round);
        for turn in turns {
            let _ = write!(
                out,
                "**{}** ({}):\n{}\n\n",
                turn.role_name, turn.role_id, turn.message
            );
        }
    }
    out.push_str(
        "\n---\n\nYour task: Synthesize this debate into a clear, actionable answer to the user's question.",
    );
    out
}

/// Build the synthesizer's context: instructions plus the full transcript.
pub fn build_synthesis_context(
    user_query: &str,
    transcript: &Transcript,
    synthesizer: &Role,
) -> Vec<ContextEntry> {
    let system = format!(
        "{}\n\n{}",
        synthesizer.synthesis_instructions, RECONCILE_DIRECTIVE
    );
    vec![
        ContextEntry::system(system),
        ContextEntry::user(format_transcript(user_query, transcript)),
    ]
}

/// Invokes the synthesizer exactly once over a complete transcript.
pub struct SynthesisStage {
    invoker: Arc<dyn ModelInvoker>,
    sink: Arc<dyn ProgressSink>,
}

impl SynthesisStage {
    pub fn new(invoker: Arc<dyn ModelInvoker>, sink: Arc<dyn ProgressSink>) -> Self {
        Self { invoker, sink }
    }

    pub async fn synthesize(
        &self,
        user_query: &str,
        transcript: &Transcript,
        synthesizer: &Role,
    ) -> Result<Synthesis, InvocationError> {
        let context = build_synthesis_context(user_query, transcript, synthesizer);

        self.sink.emit(ProgressEvent::synthesis_started(synthesizer));
        info!(
            role_id = %synthesizer.role_id,
            model = %synthesizer.model_id,
            turns = transcript.len(),
            "Synthesis started"
        );

        let start = Instant::now();
        let result = self.invoker.invoke(&synthesizer.model_id, &context).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                info!(role_id = %synthesizer.role_id, elapsed_ms, "Synthesis completed");
                self.sink
                    .emit(ProgressEvent::synthesis_completed(synthesizer, elapsed_ms));
                Ok(Synthesis {
                    role_id: synthesizer.role_id.clone(),
                    role_name: synthesizer.role_name.clone(),
                    model_id: synthesizer.model_id.clone(),
                    response,
                    elapsed_ms,
                })
            }
            Err(cause) => {
                warn!(
                    role_id = %synthesizer.role_id,
                    model = %synthesizer.model_id,
                    elapsed_ms,
                    "Synthesis failed: {}",
                    cause
                );
                self.sink.emit(ProgressEvent::synthesis_failed(
                    synthesizer,
                    elapsed_ms,
                    cause.to_string(),
                ));
                Err(InvocationError {
                    role_id: synthesizer.role_id.clone(),
                    round: None,
                    cause,
                })
            }
        }
    }
}
