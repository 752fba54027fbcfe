use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use council::{
    generate_title, roles::update_role_model, Conversation, ConversationStore, CouncilConfig,
    DebateOrchestrator, EventBus, LegacyCouncilResponse, ModelInvoker, OpenAiCompatClient,
    RetryingInvoker, RoleRegistry, SessionPayload,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{AskArgs, Cli, ConversationCommands, RoleCommands};
use crate::progress;

/// Apply global CLI overrides on top of env + file configuration.
pub fn resolve_config(cli: &Cli) -> Result<CouncilConfig> {
    let mut config =
        CouncilConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(dir) = &cli.roles_dir {
        config.roles_dir = dir.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn build_invoker(config: &CouncilConfig) -> Result<Arc<dyn ModelInvoker>> {
    let client = OpenAiCompatClient::new(config.provider_config())
        .context("Failed to build HTTP client")?;
    let policy = config.retry_policy();
    let invoker: Arc<dyn ModelInvoker> = if policy.max_retries > 0 {
        Arc::new(RetryingInvoker::new(client, policy))
    } else {
        Arc::new(client)
    };
    Ok(invoker)
}

pub async fn ask(mut config: CouncilConfig, args: AskArgs) -> Result<ExitCode> {
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    let question = args.question_text();

    let roles = RoleRegistry::load_dir(&config.roles_dir)
        .with_context(|| format!("Failed to load roles from {}", config.roles_dir.display()))?
        .shared();
    let invoker = build_invoker(&config)?;
    let bus = EventBus::new().shared();
    let cancel = CancellationToken::new();
    let orchestrator = DebateOrchestrator::with_config(
        roles,
        Arc::clone(&invoker),
        bus.clone(),
        config.debate_config(),
    )
    .with_cancellation(cancel.clone());

    // nothing is stored for a debate that cannot start
    orchestrator
        .validate(&question)
        .context("Debate could not start")?;

    let store = ConversationStore::new(&config.data_dir);
    let conversation = match &args.conversation {
        Some(id) => store
            .get(id)?
            .with_context(|| format!("Conversation not found: {}", id))?,
        None => store.create(&Conversation::new_id())?,
    };
    let is_first_message = conversation.is_empty();
    store.add_user_message(&conversation.id, &question)?;

    let printer = (!args.quiet).then(|| progress::spawn_printer(bus.subscribe()));
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling after the current turn...");
            cancel.cancel();
        }
    });

    let title = async {
        if is_first_message {
            Some(generate_title(invoker.as_ref(), &config.title_model, &question).await)
        } else {
            None
        }
    };
    let (session, title) = tokio::join!(orchestrator.run(&question), title);
    let session = session.context("Debate could not start")?;

    ctrl_c.abort();
    drop(orchestrator);
    drop(bus);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    if let Some(title) = title {
        store.update_title(&conversation.id, &title)?;
    }

    let payload = SessionPayload::assemble(session);
    let legacy = LegacyCouncilResponse::from_payload(&payload);
    store.add_assistant_message(&conversation.id, legacy.clone())?;
    info!(
        conversation = %conversation.id,
        status = %payload.metadata.status,
        turns = payload.metadata.total_turns,
        "Debate stored"
    );

    let json = if args.legacy {
        serde_json::to_string_pretty(&legacy)?
    } else {
        serde_json::to_string_pretty(&payload)?
    };
    println!("{}", json);

    if let Some(failure) = &payload.metadata.failure {
        warn!(stage = %failure.stage, "Debate did not complete: {}", failure.message);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn roles(config: &CouncilConfig, command: RoleCommands) -> Result<ExitCode> {
    match command {
        RoleCommands::List => {
            let registry = RoleRegistry::load_dir(&config.roles_dir).with_context(|| {
                format!("Failed to load roles from {}", config.roles_dir.display())
            })?;
            println!("{:<5} {:<20} {:<22} {:<16} STAGE", "ORDER", "ROLE_ID", "NAME", "MODEL");
            for role in registry.debate_roles() {
                println!(
                    "{:<5} {:<20} {:<22} {:<16} debate",
                    role.order, role.role_id, role.role_name, role.model_id
                );
            }
            let juge = registry.synthesizer();
            println!(
                "{:<5} {:<20} {:<22} {:<16} synthesis",
                "-", juge.role_id, juge.role_name, juge.model_id
            );
        }
        RoleCommands::SetModel { role_id, model } => {
            let path = update_role_model(&config.roles_dir, &role_id, &model)?;
            println!("{} now uses {} ({})", role_id, model, path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn conversations(config: &CouncilConfig, command: ConversationCommands) -> Result<ExitCode> {
    let store = ConversationStore::new(&config.data_dir);
    match command {
        ConversationCommands::List => {
            for meta in store.list()? {
                println!(
                    "{}  {}  {:>3} msgs  {}",
                    meta.id,
                    meta.created_at.format("%Y-%m-%d %H:%M"),
                    meta.message_count,
                    meta.title
                );
            }
        }
        ConversationCommands::Show { id } => {
            let conversation = store
                .get(&id)?
                .with_context(|| format!("Conversation not found: {}", id))?;
            println!("{}", serde_json::to_string_pretty(&conversation)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> CouncilConfig {
        let mut config = CouncilConfig::from_lookup(|_: &str| None);
        config.roles_dir = dir.path().join("roles");
        config.data_dir = dir.path().join("data");
        config
    }

    #[test]
    fn test_set_model_rewrites_role_file() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        std::fs::create_dir_all(&config.roles_dir).unwrap();
        std::fs::write(
            config.roles_dir.join("cfo.md"),
            "---\nrole_id: cfo\nrole_name: CFO\nmodel: gemma2:9b\n---\n# Debate Instructions\nCount.\n",
        )
        .unwrap();

        roles(
            &config,
            RoleCommands::SetModel {
                role_id: "cfo".to_string(),
                model: "qwen2.5:7b".to_string(),
            },
        )
        .unwrap();

        let content = std::fs::read_to_string(config.roles_dir.join("cfo.md")).unwrap();
        assert!(content.contains("model: qwen2.5:7b"));
    }

    #[test]
    fn test_set_model_unknown_role_errors() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        std::fs::create_dir_all(&config.roles_dir).unwrap();
        let result = roles(
            &config,
            RoleCommands::SetModel {
                role_id: "nobody".to_string(),
                model: "m".to_string(),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_show_missing_conversation_errors() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let err = conversations(
            &config,
            ConversationCommands::Show {
                id: "missing".to_string(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Conversation not found"));
    }

    fn write_roles(config: &CouncilConfig) {
        std::fs::create_dir_all(&config.roles_dir).unwrap();
        std::fs::write(
            config.roles_dir.join("cfo.md"),
            "---\nrole_id: cfo\nrole_name: CFO\nmodel: gemma2:9b\n---\n# Debate Instructions\nCount.\n",
        )
        .unwrap();
        std::fs::write(
            config.roles_dir.join("juge.md"),
            "---\nrole_id: juge\nrole_name: Juge\nmodel: llama3.1:8b\nparticipates_in_debate: false\nis_synthesizer: true\n---\n# Synthesis Instructions\nDecide.\n",
        )
        .unwrap();
    }

    fn ask_args(question: &str, rounds: Option<u32>) -> AskArgs {
        AskArgs {
            question: vec![question.to_string()],
            rounds,
            conversation: None,
            legacy: false,
            quiet: true,
        }
    }

    #[tokio::test]
    async fn test_ask_zero_rounds_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        write_roles(&config);

        let err = ask(config.clone(), ask_args("Hire?", Some(0)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Debate could not start"));
        let store = ConversationStore::new(&config.data_dir);
        assert!(store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ask_blank_question_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        write_roles(&config);

        assert!(ask(config.clone(), ask_args("   ", None)).await.is_err());
        assert!(!config.data_dir.exists());
    }

    #[test]
    fn test_list_empty_data_dir() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        assert!(conversations(&config, ConversationCommands::List).is_ok());
    }
}
