//! Role files on disk and conversation persistence.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use council::roles::update_role_model;
use council::{
    ContextEntry, ConversationMessage, ConversationStore, DebateConfig, DebateOrchestrator,
    InvocationFailure, LegacyCouncilResponse, ModelInvoker, NullSink, RoleRegistry,
    SessionPayload,
};
use tempfile::TempDir;

fn sample_roles_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../roles")
}

struct EchoInvoker;

#[async_trait]
impl ModelInvoker for EchoInvoker {
    async fn invoke(
        &self,
        model_id: &str,
        context: &[ContextEntry],
    ) -> Result<String, InvocationFailure> {
        Ok(format!("{} heard {} entries", model_id, context.len()))
    }
}

#[test]
fn test_sample_roles_load_in_declared_order() {
    let registry = RoleRegistry::load_dir(&sample_roles_dir()).unwrap();

    let ids: Vec<&str> = registry
        .debate_roles()
        .iter()
        .map(|r| r.role_id.as_str())
        .collect();
    assert_eq!(ids, ["devils_advocate", "optimist", "regulator", "cfo"]);
    assert_eq!(registry.synthesizer().role_id, "juge");
    assert_eq!(registry.synthesizer().model_id, "llama3.1:8b");
    assert!(registry
        .debate_roles()
        .iter()
        .all(|r| !r.debate_instructions.is_empty()));
    assert_eq!(registry.turns_for(3), Some(12));
}

#[test]
fn test_set_model_is_picked_up_on_next_load() {
    let dir = TempDir::new().unwrap();
    for entry in std::fs::read_dir(sample_roles_dir()).unwrap() {
        let path = entry.unwrap().path();
        std::fs::copy(&path, dir.path().join(path.file_name().unwrap())).unwrap();
    }

    let before = RoleRegistry::load_dir(dir.path()).unwrap().shared();
    let path = update_role_model(dir.path(), "cfo", "qwen2.5:7b").unwrap();
    assert_eq!(path.file_name().unwrap(), "cfo.md");

    let after = RoleRegistry::load_dir(dir.path()).unwrap();
    assert_eq!(after.get("cfo").unwrap().model_id, "qwen2.5:7b");
    // an already loaded snapshot is unaffected
    assert_eq!(before.get("cfo").unwrap().model_id, "gemma2:9b");
    // instructions survive the rewrite
    assert_eq!(
        after.get("cfo").unwrap().debate_instructions,
        before.get("cfo").unwrap().debate_instructions
    );
}

#[tokio::test]
async fn test_debate_result_persists_in_conversation() {
    let data = TempDir::new().unwrap();
    let store = ConversationStore::new(data.path());
    let conversation = store.create("conv-1").unwrap();
    store
        .add_user_message(&conversation.id, "Should we hire?")
        .unwrap();

    let roles = RoleRegistry::load_dir(&sample_roles_dir()).unwrap().shared();
    let orchestrator = DebateOrchestrator::with_config(
        roles,
        Arc::new(EchoInvoker),
        Arc::new(NullSink),
        DebateConfig { total_rounds: 1 },
    );
    let session = orchestrator.run("Should we hire?").await.unwrap();
    let payload = SessionPayload::assemble(session);
    assert!(payload.is_success());

    let legacy = LegacyCouncilResponse::from_payload(&payload);
    store
        .add_assistant_message(&conversation.id, legacy.clone())
        .unwrap();
    store.update_title(&conversation.id, "Hiring plan").unwrap();

    let reloaded = store.get("conv-1").unwrap().unwrap();
    assert_eq!(reloaded.title, "Hiring plan");
    assert_eq!(reloaded.messages.len(), 2);
    assert!(reloaded.messages[0].is_user());
    match &reloaded.messages[1] {
        ConversationMessage::Assistant { response } => {
            assert_eq!(response.stage1[0].message, legacy.stage1[0].message);
            assert_eq!(response.stage1.len(), 4);
            assert_eq!(response.stage3.role_id, "juge");
            assert_eq!(response.metadata.total_rounds, 1);
        }
        other => panic!("expected assistant message, got {:?}", other),
    }

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].message_count, 2);
}
