//! Conversation titles from the first question.

use std::time::Duration;

use tracing::{debug, warn};

use crate::conversation::DEFAULT_TITLE;
use crate::debate::ContextEntry;
use crate::provider::ModelInvoker;

const MAX_TITLE_CHARS: usize = 50;
const TITLE_TIMEOUT: Duration = Duration::from_secs(30);

fn title_prompt(question: &str) -> String {
    format!(
        "Generate a very short title (3-5 words maximum) that summarizes the following question.
The title should be concise and descriptive. Do not use quotes or punctuation in the title.

Question: {}

Title:",
        question
    )
}

/// Trim, strip surrounding quotes, and cap the length at 50 characters.
pub fn clean_title(raw: &str) -> String {
    let title = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    if title.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        let head: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
        return format!("{}...", head);
    }
    title.to_string()
}

/// Ask `model` for a short title; falls back to [`DEFAULT_TITLE`] on failure.
pub async fn generate_title(invoker: &dyn ModelInvoker, model: &str, question: &str) -> String {
    let context = [ContextEntry::user(title_prompt(question))];
    match tokio::time::timeout(TITLE_TIMEOUT, invoker.invoke(model, &context)).await {
        Ok(Ok(raw)) => {
            let title = clean_title(&raw);
            debug!(model, %title, "Title generated");
            title
        }
        Ok(Err(e)) => {
            warn!(model, "Title generation failed: {}", e);
            DEFAULT_TITLE.to_string()
        }
        Err(_) => {
            warn!(model, timeout_secs = TITLE_TIMEOUT.as_secs(), "Title generation timed out");
            DEFAULT_TITLE.to_string()
        }
    }
}
