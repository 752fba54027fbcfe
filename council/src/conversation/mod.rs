//! Conversations: question/answer history persisted across CLI runs.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::LegacyCouncilResponse;

pub use store::{ConversationStore, StoreError, StoreResult};

/// Title given to a conversation until one is generated.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ConversationMessage {
    User { content: String },
    Assistant { response: LegacyCouncilResponse },
}

impl ConversationMessage {
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }
}

/// A stored conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub messages: Vec<ConversationMessage>,
}

impl Conversation {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            created_at: Utc::now(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
        }
    }

    /// Fresh random conversation id.
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Whether no message has been added yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn metadata(&self) -> ConversationMetadata {
        ConversationMetadata {
            id: self.id.clone(),
            created_at: self.created_at,
            title: self.title.clone(),
            message_count: self.messages.len(),
        }
    }
}

/// List-view summary of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMetadata {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub message_count: usize,
}
