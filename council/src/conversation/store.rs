//! JSON file store: one pretty-printed file per conversation.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::{Conversation, ConversationMessage, ConversationMetadata};
use crate::session::LegacyCouncilResponse;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conversation not found: {0}")]
    NotFound(String),

    #[error("invalid conversation id `{0}`")]
    InvalidId(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error on {}: {source}", path.display())]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Conversations stored as `<data_dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    data_dir: PathBuf,
}

impl ConversationStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, id: &str) -> StoreResult<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.data_dir.join(format!("{}.json", id)))
    }

    fn ensure_dir(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })
    }

    fn save(&self, conversation: &Conversation) -> StoreResult<()> {
        self.ensure_dir()?;
        let path = self.path_for(&conversation.id)?;
        let json = serde_json::to_string_pretty(conversation).map_err(|source| StoreError::Serde {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(id = %conversation.id, path = %path.display(), "Conversation saved");
        Ok(())
    }

    /// Create and persist an empty conversation.
    pub fn create(&self, id: &str) -> StoreResult<Conversation> {
        let conversation = Conversation::new(id);
        self.save(&conversation)?;
        Ok(conversation)
    }

    /// Load a conversation; `Ok(None)` when it does not exist.
    pub fn get(&self, id: &str) -> StoreResult<Option<Conversation>> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let conversation =
            serde_json::from_str(&json).map_err(|source| StoreError::Serde { path, source })?;
        Ok(Some(conversation))
    }

    fn load(&self, id: &str) -> StoreResult<Conversation> {
        self.get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Metadata for every stored conversation, newest first.
    ///
    /// Unreadable files are skipped with a warning.
    pub fn list(&self) -> StoreResult<Vec<ConversationMetadata>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let mut listed = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .ok()
                .and_then(|json| serde_json::from_str::<Conversation>(&json).ok());
            match parsed {
                Some(conversation) => listed.push(conversation.metadata()),
                None => warn!(path = %path.display(), "Skipping unreadable conversation file"),
            }
        }

        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(listed)
    }

    pub fn add_user_message(&self, id: &str, content: &str) -> StoreResult<Conversation> {
        let mut conversation = self.load(id)?;
        conversation.messages.push(ConversationMessage::User {
            content: content.to_string(),
        });
        self.save(&conversation)?;
        Ok(conversation)
    }

    pub fn add_assistant_message(
        &self,
        id: &str,
        response: LegacyCouncilResponse,
    ) -> StoreResult<Conversation> {
        let mut conversation = self.load(id)?;
        conversation
            .messages
            .push(ConversationMessage::Assistant { response });
        self.save(&conversation)?;
        Ok(conversation)
    }

    pub fn update_title(&self, id: &str, title: &str) -> StoreResult<Conversation> {
        let mut conversation = self.load(id)?;
        conversation.title = title.to_string();
        self.save(&conversation)?;
        Ok(conversation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::DEFAULT_TITLE;
    use crate::session::{LegacyMetadata, LegacySynthesis};
    use chrono::Duration;
    use tempfile::TempDir;

    fn store() -> (TempDir, ConversationStore) {
        let tmp = TempDir::new().unwrap();
        let store = ConversationStore::new(tmp.path().join("conversations"));
        (tmp, store)
    }

    #[test]
    fn test_create_and_get() {
        let (_tmp, store) = store();
        let created = store.create("c-1").unwrap();
        assert_eq!(created.title, DEFAULT_TITLE);

        let loaded = store.get("c-1").unwrap().unwrap();
        assert_eq!(loaded, created);
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_messages_and_title() {
        let (_tmp, store) = store();
        store.create("c-2").unwrap();
        store.add_user_message("c-2", "Should we expand?").unwrap();
        store
            .add_assistant_message(
                "c-2",
                LegacyCouncilResponse {
                    stage1: Vec::new(),
                    stage2: Vec::new(),
                    stage3: LegacySynthesis {
                        role_id: "juge".into(),
                        role_name: "Juge".into(),
                        model: "llama3.1:8b".into(),
                        response: "Yes, slowly.".into(),
                        elapsed_time: Some(1.0),
                    },
                    metadata: LegacyMetadata {
                        total_rounds: 0,
                        total_turns: 0,
                        roles_participated: Vec::new(),
                    },
                },
            )
            .unwrap();
        let updated = store.update_title("c-2", "Expansion Plans").unwrap();

        assert_eq!(updated.title, "Expansion Plans");
        assert_eq!(updated.messages.len(), 2);
        assert!(updated.messages[0].is_user());

        let raw = fs::read_to_string(store.data_dir().join("c-2.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["messages"][1]["response"]["stage3"]["response"], "Yes, slowly.");
    }

    #[test]
    fn test_missing_conversation() {
        let (_tmp, store) = store();
        let err = store.add_user_message("nope", "hi").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let (_tmp, store) = store();
        assert!(matches!(
            store.create("../escape").unwrap_err(),
            StoreError::InvalidId(_)
        ));
    }

    #[test]
    fn test_list_newest_first() {
        let (_tmp, store) = store();
        assert!(store.list().unwrap().is_empty());

        let mut old = Conversation::new("older");
        old.created_at -= Duration::hours(1);
        store.save(&old).unwrap();
        store.create("newer").unwrap();
        store.add_user_message("newer", "q").unwrap();
        fs::write(store.data_dir().join("junk.json"), "{not json").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "newer");
        assert_eq!(listed[0].message_count, 1);
        assert_eq!(listed[1].id, "older");
    }
}
