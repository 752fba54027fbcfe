//! `council`: run debates from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Debate a question with the roles in ./roles
//! council ask "Should we move the team to a four-day week?"
//!
//! # Two rounds, legacy stage1/stage2/stage3 output
//! council ask --rounds 2 --legacy "Is now a good time to raise prices?"
//!
//! # Roles and conversations
//! council roles list
//! council roles set-model cfo qwen2.5:7b
//! council conversations list
//!
//! # Custom configuration
//! OLLAMA_API_URL=http://gpu-box:11434/v1/chat/completions RUST_LOG=debug council ask "..."
//! ```

mod cli;
mod commands;
mod progress;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // stdout carries the JSON payload; everything else goes to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::resolve_config(&cli)?;
    debug!(
        api_url = %config.api_url,
        roles_dir = %config.roles_dir.display(),
        rounds = config.rounds,
        "Configuration resolved"
    );

    match cli.command {
        Commands::Ask(args) => commands::ask(config, args).await,
        Commands::Roles { command } => commands::roles(&config, command),
        Commands::Conversations { command } => commands::conversations(&config, command),
    }
}
