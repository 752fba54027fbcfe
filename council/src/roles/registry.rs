//! Role registry: the validated, immutable role snapshot of a session.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::loader::load_roles_dir;
use super::Role;
use crate::error::ConfigurationError;

/// Shared reference to a RoleRegistry
pub type SharedRoleRegistry = Arc<RoleRegistry>;

/// Ordered debate roles plus the single synthesizer.
///
/// Sessions hold the registry behind an `Arc`; edits to the role source
/// after loading never reach a running debate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRegistry {
    debate_roles: Vec<Role>,
    synthesizer: Role,
}

impl RoleRegistry {
    /// Validate a set of roles.
    ///
    /// Debate roles are ordered by `(order, role_id)`. Roles that neither
    /// debate nor synthesize are ignored.
    pub fn from_roles(roles: Vec<Role>) -> Result<Self, ConfigurationError> {
        let mut seen = HashSet::new();
        for role in &roles {
            let source_name = if role.role_id.trim().is_empty() {
                "<unnamed role>".to_string()
            } else {
                role.role_id.clone()
            };
            for (field, value) in [
                ("role_id", &role.role_id),
                ("role_name", &role.role_name),
                ("model", &role.model_id),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigurationError::MissingField { source_name, field });
                }
            }
            if !seen.insert(role.role_id.as_str()) {
                return Err(ConfigurationError::DuplicateRoleId {
                    role_id: role.role_id.clone(),
                });
            }
        }

        let mut synthesizers: Vec<&Role> = roles.iter().filter(|r| r.is_synthesizer).collect();
        let synthesizer = match synthesizers.len() {
            0 => return Err(ConfigurationError::NoSynthesizer),
            1 => synthesizers.remove(0).clone(),
            _ => {
                return Err(ConfigurationError::MultipleSynthesizers {
                    role_ids: synthesizers.iter().map(|r| r.role_id.clone()).collect(),
                })
            }
        };
        if synthesizer.participates_in_debate {
            return Err(ConfigurationError::SynthesizerParticipates {
                role_id: synthesizer.role_id,
            });
        }
        if synthesizer.synthesis_instructions.trim().is_empty() {
            return Err(ConfigurationError::MissingField {
                source_name: synthesizer.role_id,
                field: "synthesis_instructions",
            });
        }

        let mut debate_roles: Vec<Role> = roles
            .into_iter()
            .filter(|r| r.participates_in_debate && !r.is_synthesizer)
            .collect();
        if debate_roles.is_empty() {
            return Err(ConfigurationError::NoDebateRoles);
        }
        if let Some(role) = debate_roles
            .iter()
            .find(|r| r.debate_instructions.trim().is_empty())
        {
            return Err(ConfigurationError::MissingField {
                source_name: role.role_id.clone(),
                field: "debate_instructions",
            });
        }
        debate_roles.sort_by(|a, b| (a.order, &a.role_id).cmp(&(b.order, &b.role_id)));

        Ok(Self {
            debate_roles,
            synthesizer,
        })
    }

    /// Load and validate every role file in `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, ConfigurationError> {
        let registry = Self::from_roles(load_roles_dir(dir)?)?;
        info!(
            debaters = registry.debate_roles.len(),
            synthesizer = %registry.synthesizer.role_id,
            dir = %dir.display(),
            "Role registry loaded"
        );
        Ok(registry)
    }

    /// Create a shared reference to this registry
    pub fn shared(self) -> SharedRoleRegistry {
        Arc::new(self)
    }

    /// Debate roles in turn order.
    pub fn debate_roles(&self) -> &[Role] {
        &self.debate_roles
    }

    pub fn synthesizer(&self) -> &Role {
        &self.synthesizer
    }

    /// Look up any registered role by id.
    pub fn get(&self, role_id: &str) -> Option<&Role> {
        self.debate_roles
            .iter()
            .chain(std::iter::once(&self.synthesizer))
            .find(|r| r.role_id == role_id)
    }

    /// Number of debate turns a session with `rounds` rounds produces.
    ///
    /// `None` when the count does not fit the `u32` sequence index.
    pub fn turns_for(&self, rounds: u32) -> Option<u32> {
        u32::try_from(self.debate_roles.len())
            .ok()
            .and_then(|debaters| rounds.checked_mul(debaters))
    }
}
