//! Process-wide configuration, loaded once at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use warden_acl::{default_grants, GrantConfig};
use warden_core::{GeneratorConfig, PolicyContext, Role, UsernameRules};

use crate::error::{Result, WardenError};

/// Configuration for a [`Warden`](crate::Warden) instance.
///
/// Every field has a default, so a partial JSON document only overrides what
/// it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Minimum strength for accepted secrets.
    pub policy: PolicyContext,
    /// Bounds for generated secrets.
    pub generator: GeneratorConfig,
    /// Authorization grants. Defaults to the built-in route tables.
    pub grants: Vec<GrantConfig>,
    /// Role given to the first identity ever stored.
    pub bootstrap_role: Role,
    /// Roles given to every other new identity.
    pub default_roles: Vec<Role>,
    /// Usernames that may not be registered.
    pub illegal_usernames: Vec<String>,
    /// Candidate budget for unique username allocation.
    pub max_username_attempts: u32,
    /// How often a registration is retried after losing a username race.
    pub max_registration_retries: u32,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            policy: PolicyContext::default(),
            generator: GeneratorConfig::default(),
            grants: default_grants(),
            bootstrap_role: Role::admin(),
            default_roles: vec![Role::user()],
            illegal_usernames: UsernameRules::default().illegal_usernames,
            max_username_attempts: 1000,
            max_registration_retries: 5,
        }
    }
}

impl WardenConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WardenError::Config(e.to_string()))
    }

    /// Read and parse a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| WardenError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Username format rules derived from this configuration.
    pub fn username_rules(&self) -> UsernameRules {
        UsernameRules {
            illegal_usernames: self.illegal_usernames.clone(),
        }
    }
}
