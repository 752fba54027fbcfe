//! Progress events for debate sessions
//!
//! The orchestrator reports each turn and the synthesis through a
//! [`ProgressSink`]. Presentation layers subscribe to an [`EventBus`].
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Orchestrator │────▶│  Event Bus   │────▶│  Subscribers │
//! │   (emit)     │     │  (broadcast) │     │   (recv)     │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! For a successful session with R rounds and K debate roles the stream holds
//! `2·R·K + 2` events: a started/completed pair per turn, in transcript order,
//! then the synthesis pair.

pub mod bus;
pub mod types;

pub use bus::{EventBus, NullSink, ProgressSink, RecordingSink, SharedEventBus};
pub use types::ProgressEvent;
