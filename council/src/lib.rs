//! Debate Council Library
//!
//! Runs a structured, multi-round debate among independently configured AI
//! roles and reconciles it into one recommendation.
//!
//! # Features
//!
//! ## Debate engine
//! - [`roles`]: role definitions loaded from markdown + YAML frontmatter
//! - [`debate`]: context builder, turn executor, orchestrator, synthesis
//! - [`session`]: final payload and the legacy `stage1/stage2/stage3` shape
//!
//! ## Boundary
//! - [`provider`]: OpenAI-compatible chat client and retry decorator
//! - [`events`]: progress events and the broadcast event bus
//! - [`conversation`]: JSON file conversation store
//! - [`title`]: conversation title generation
//! - [`config`]: environment and TOML configuration
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use council::{
//!     CouncilConfig, DebateOrchestrator, EventBus, OpenAiCompatClient, RoleRegistry, SessionPayload,
//! };
//!
//! let config = CouncilConfig::default();
//! let roles = RoleRegistry::load_dir(&config.roles_dir)?.shared();
//! let invoker = Arc::new(OpenAiCompatClient::new(config.provider_config())?);
//! let bus = EventBus::new().shared();
//!
//! let orchestrator = DebateOrchestrator::with_config(roles, invoker, bus, config.debate_config());
//! let session = orchestrator.run("Should we raise prices?").await?;
//! let payload = SessionPayload::assemble(session);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod conversation;
pub mod debate;
pub mod error;
pub mod events;
pub mod provider;
pub mod roles;
pub mod session;
pub mod title;

pub use config::CouncilConfig;

pub use conversation::{
    Conversation, ConversationMessage, ConversationMetadata, ConversationStore, StoreError,
};

pub use debate::{
    build_context, build_synthesis_context, ContextEntry, DebateConfig, DebateOrchestrator,
    DebatePhase, DebateSession, FailureStage, SessionFailure, SessionStatus, Speaker, Synthesis,
    SynthesisStage, Transcript, Turn, TurnExecutor, TurnSlot,
};

pub use error::{
    ConfigurationError, ContextAssemblyError, DebateError, InvocationError, InvocationFailure,
};

pub use events::{EventBus, NullSink, ProgressEvent, ProgressSink, RecordingSink, SharedEventBus};

pub use provider::{
    ModelInvoker, OpenAiCompatClient, ProviderConfig, RetryPolicy, RetryingInvoker,
};

pub use roles::{Role, RoleRegistry, SharedRoleRegistry};

pub use session::{
    LegacyCouncilResponse, SessionMetadata, SessionPayload, SynthesisRecord, TurnRecord,
};

pub use title::generate_title;
