//! Debate Orchestration: multi-round council debate with final synthesis
//!
//! Every debate role speaks once per round, in registry order, seeing the
//! question and every earlier turn. After the last round the synthesizer
//! reads the complete transcript and produces one reconciled answer.
//!
//! # Debate Flow
//!
//! ```text
//! Idle → RoundInProgress(1) → RoundComplete(1) → RoundInProgress(2) → …
//!              │                                        │
//!              └─ turn fails / cancelled → Failed ◀─────┘
//!
//! … → RoundComplete(R) → AllRoundsComplete → Synthesizing → Completed
//!                                                 │
//!                                                 └─ fails / cancelled → Failed
//! ```

pub mod context;
pub mod executor;
pub mod orchestrator;
pub mod state;
pub mod synthesis;
pub mod transcript;

pub use context::{build_context, ContextEntry, Speaker};
pub use executor::{TurnExecutor, TurnSlot};
pub use orchestrator::{DebateConfig, DebateOrchestrator};
pub use state::{
    DebatePhase, DebateSession, DebateTransition, FailureStage, SessionFailure, SessionStatus,
    TransitionError,
};
pub use synthesis::{build_synthesis_context, format_transcript, SynthesisStage};
pub use transcript::{Synthesis, Transcript, Turn};
