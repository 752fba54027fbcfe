//! Council roles: static identity of every debate participant.
//!
//! Roles are defined externally (markdown files with YAML frontmatter by
//! default) and validated into a [`RoleRegistry`] snapshot at session start.
//! A running session never re-reads the source.

pub mod loader;
pub mod registry;

use serde::{Deserialize, Serialize};

pub use loader::{load_role_file, load_roles_dir, parse_role, update_role_model};
pub use registry::{RoleRegistry, SharedRoleRegistry};

/// A named participant bound to one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique, stable key.
    pub role_id: String,
    /// Display name used to tag the role's turns.
    pub role_name: String,
    /// Opaque model identifier resolved by the invocation service.
    pub model_id: String,
    /// Instructions for debate turns.
    pub debate_instructions: String,
    /// Instructions for the final synthesis (empty for debaters).
    pub synthesis_instructions: String,
    pub participates_in_debate: bool,
    pub is_synthesizer: bool,
    /// Explicit ordering key; debate turn order sorts on `(order, role_id)`.
    pub order: u32,
}

impl Role {
    /// A debate participant.
    pub fn debater(role_id: &str, role_name: &str, model_id: &str, instructions: &str) -> Self {
        Self {
            role_id: role_id.to_string(),
            role_name: role_name.to_string(),
            model_id: model_id.to_string(),
            debate_instructions: instructions.to_string(),
            synthesis_instructions: String::new(),
            participates_in_debate: true,
            is_synthesizer: false,
            order: 0,
        }
    }

    /// The synthesizing role.
    pub fn synthesizer(role_id: &str, role_name: &str, model_id: &str, instructions: &str) -> Self {
        Self {
            role_id: role_id.to_string(),
            role_name: role_name.to_string(),
            model_id: model_id.to_string(),
            debate_instructions: String::new(),
            synthesis_instructions: instructions.to_string(),
            participates_in_debate: false,
            is_synthesizer: true,
            order: 0,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) → {}", self.role_name, self.role_id, self.model_id)
    }
}
