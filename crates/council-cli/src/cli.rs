use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "council", author, version, about = "Multi-round debate council over local LLMs", long_about = None)]
pub struct Cli {
    /// TOML config file applied over environment defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of role definitions (overrides COUNCIL_ROLES_DIR)
    #[arg(long, global = true)]
    pub roles_dir: Option<PathBuf>,

    /// Conversation storage directory (overrides COUNCIL_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a debate on a question and print the result as JSON
    Ask(AskArgs),

    /// Inspect or edit role definitions
    Roles {
        #[command(subcommand)]
        command: RoleCommands,
    },

    /// Browse stored conversations
    Conversations {
        #[command(subcommand)]
        command: ConversationCommands,
    },
}

#[derive(clap::Args, Debug)]
pub struct AskArgs {
    /// The question to debate
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Number of debate rounds (overrides COUNCIL_ROUNDS)
    #[arg(long)]
    pub rounds: Option<u32>,

    /// Continue an existing conversation instead of starting a new one
    #[arg(long)]
    pub conversation: Option<String>,

    /// Print the stage1/stage2/stage3 response shape
    #[arg(long, default_value_t = false)]
    pub legacy: bool,

    /// Suppress progress lines on stderr
    #[arg(long, short, default_value_t = false)]
    pub quiet: bool,
}

impl AskArgs {
    pub fn question_text(&self) -> String {
        self.question.join(" ")
    }
}

#[derive(Subcommand, Debug)]
pub enum RoleCommands {
    /// List roles in debate order, then the synthesizer
    List,
    /// Reassign the model a role runs on
    SetModel { role_id: String, model: String },
}

#[derive(Subcommand, Debug)]
pub enum ConversationCommands {
    /// List conversations, newest first
    List,
    /// Print one conversation as JSON
    Show { id: String },
}
