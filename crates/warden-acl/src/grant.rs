//! Grants: which roles may perform which actions on which resources.
//!
//! Grants are declared in configuration as role groups, each with a list of
//! allowed resources, and compiled into one [`Grant`] per resource.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use warden_core::Role;

use crate::error::Result;
use crate::pattern::ResourcePattern;

/// Permission wildcard in configuration.
pub const ANY_ACTION: &str = "*";

/// Either a single value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flatten into a vector.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// Actions permitted by a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permissions {
    /// Every action, written `*`.
    Any,
    /// A set of lowercase action verbs.
    Actions(BTreeSet<String>),
}

impl Permissions {
    /// Build from configured action names; `*` anywhere means [`Permissions::Any`].
    pub fn from_actions<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for action in actions {
            let action = action.as_ref().trim().to_ascii_lowercase();
            if action == ANY_ACTION {
                return Permissions::Any;
            }
            set.insert(action);
        }
        Permissions::Actions(set)
    }

    /// Whether `action` (already lowercase) is permitted.
    pub fn allows(&self, action: &str) -> bool {
        match self {
            Permissions::Any => true,
            Permissions::Actions(actions) => actions.contains(action),
        }
    }
}

/// A single resource entry inside a [`GrantConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowConfig {
    /// One pattern or a list of patterns.
    pub resources: OneOrMany<String>,
    /// `"*"`, one action, or a list of actions.
    pub permissions: OneOrMany<String>,
}

/// Configuration for a group of roles sharing the same allowances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantConfig {
    /// Roles this group applies to.
    pub roles: Vec<Role>,
    /// Allowed resources and actions.
    pub allows: Vec<AllowConfig>,
}

impl GrantConfig {
    /// Parse a JSON array of grant groups.
    pub fn list_from_json(json: &str) -> Result<Vec<GrantConfig>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Expand into one `(roles, pattern source, permissions)` entry per resource.
    pub(crate) fn expand(&self) -> Vec<(BTreeSet<Role>, String, Permissions)> {
        let roles: BTreeSet<Role> = self.roles.iter().cloned().collect();
        let mut entries = Vec::new();

        for allow in &self.allows {
            let permissions = Permissions::from_actions(allow.permissions.clone().into_vec());
            for resource in allow.resources.clone().into_vec() {
                entries.push((roles.clone(), resource, permissions.clone()));
            }
        }

        entries
    }
}

/// A compiled grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// Roles the grant applies to.
    pub roles: BTreeSet<Role>,
    /// The resource pattern.
    pub pattern: ResourcePattern,
    /// Permitted actions.
    pub permissions: Permissions,
}

impl Grant {
    /// Compile a grant.
    pub fn new(
        roles: impl IntoIterator<Item = Role>,
        pattern: &str,
        permissions: Permissions,
    ) -> Result<Self> {
        Ok(Self {
            roles: roles.into_iter().collect(),
            pattern: ResourcePattern::parse(pattern)?,
            permissions,
        })
    }

    /// Whether any of `roles` is covered by this grant.
    pub fn applies_to(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }

    /// Whether this grant allows `action` on `path`.
    pub fn permits(&self, path: &str, action: &str) -> bool {
        self.permissions.allows(action) && self.pattern.matches(path)
    }
}
