//! Human-readable progress on stderr.

use council::ProgressEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::debug;

pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::TurnStarted {
            round,
            role_name,
            model_id,
            ..
        } => format!("[round {}] {} ({}) is thinking...", round, role_name, model_id),
        ProgressEvent::TurnCompleted {
            round,
            role_name,
            elapsed_ms,
            ..
        } => format!(
            "[round {}] {} done in {:.1}s",
            round,
            role_name,
            *elapsed_ms as f64 / 1000.0
        ),
        ProgressEvent::TurnFailed {
            round,
            role_name,
            error,
            ..
        } => format!("[round {}] {} FAILED: {}", round, role_name, error),
        ProgressEvent::SynthesisStarted {
            role_name, model_id, ..
        } => format!("[synthesis] {} ({}) is synthesizing...", role_name, model_id),
        ProgressEvent::SynthesisCompleted {
            role_name,
            elapsed_ms,
            ..
        } => format!(
            "[synthesis] {} done in {:.1}s",
            role_name,
            *elapsed_ms as f64 / 1000.0
        ),
        ProgressEvent::SynthesisFailed {
            role_name, error, ..
        } => format!("[synthesis] {} FAILED: {}", role_name, error),
    }
}

/// Print events until every sender is dropped.
pub fn spawn_printer(mut rx: broadcast::Receiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => eprintln!("{}", format_event(&event)),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Progress printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}
