//! The authorization engine.
//!
//! The engine is an immutable list of compiled grants, built once at startup
//! and shared by reference (typically behind an `Arc`) across every request.
//! A check walks the grants in configuration order and allows on the first
//! match.

use tracing::{debug, error, warn};
use warden_core::Role;

use crate::builtin;
use crate::error::{AclError, Result};
use crate::grant::{Grant, GrantConfig};

/// Message for every denial, whether or not the resource exists.
pub const FORBIDDEN_MESSAGE: &str = "User is not authorized";

/// Message for an engine fault.
pub const UNAVAILABLE_MESSAGE: &str = "Unexpected authorization error";

/// Outcome of an authorization check at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allow,
    /// An ordinary denial.
    Forbidden,
    /// The engine could not evaluate the request; treat as denied.
    Unavailable(String),
}

impl Decision {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// HTTP status code the boundary should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Decision::Allow => 200,
            Decision::Forbidden => 403,
            Decision::Unavailable(_) => 500,
        }
    }

    /// Caller-facing message. Never reveals why access was denied.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::Forbidden => Some(FORBIDDEN_MESSAGE),
            Decision::Unavailable(_) => Some(UNAVAILABLE_MESSAGE),
        }
    }
}

/// A grant as loaded: compiled, or kept with the reason it failed to compile.
#[derive(Debug, Clone)]
enum Entry {
    Ready(Grant),
    Faulted { roles: Vec<Role>, reason: String },
}

impl Entry {
    fn applies_to(&self, roles: &[Role]) -> bool {
        match self {
            Entry::Ready(grant) => grant.applies_to(roles),
            Entry::Faulted { roles: granted, .. } => roles.iter().any(|r| granted.contains(r)),
        }
    }
}

/// Answers "may these roles perform this action on this resource".
#[derive(Debug, Clone, Default)]
pub struct AuthorizationEngine {
    entries: Vec<Entry>,
}

impl AuthorizationEngine {
    /// Build from configuration, keeping malformed grants as faulted entries.
    ///
    /// A check that reaches a faulted entry fails with
    /// [`AclError::Unavailable`] instead of silently skipping it.
    pub fn new(config: &[GrantConfig]) -> Self {
        let mut entries = Vec::new();

        for group in config {
            for (roles, resource, permissions) in group.expand() {
                match Grant::new(roles.iter().cloned(), &resource, permissions) {
                    Ok(grant) => entries.push(Entry::Ready(grant)),
                    Err(e) => {
                        warn!(resource = %resource, error = %e, "keeping malformed grant as faulted");
                        entries.push(Entry::Faulted {
                            roles: roles.into_iter().collect(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        debug!(grants = entries.len(), "authorization engine built");
        Self { entries }
    }

    /// Build from configuration, rejecting any malformed grant.
    pub fn try_new(config: &[GrantConfig]) -> Result<Self> {
        let mut grants = Vec::new();
        for group in config {
            for (roles, resource, permissions) in group.expand() {
                grants.push(Grant::new(roles, &resource, permissions)?);
            }
        }
        Ok(Self::from_grants(grants))
    }

    /// Build from already compiled grants.
    pub fn from_grants(grants: Vec<Grant>) -> Self {
        Self {
            entries: grants.into_iter().map(Entry::Ready).collect(),
        }
    }

    /// Engine loaded with the built-in route tables.
    pub fn builtin() -> Self {
        Self::new(&builtin::default_grants())
    }

    /// Compiled grants, in evaluation order.
    pub fn grants(&self) -> impl Iterator<Item = &Grant> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Ready(grant) => Some(grant),
            Entry::Faulted { .. } => None,
        })
    }

    /// Number of faulted grants.
    pub fn faulted(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, Entry::Faulted { .. }))
            .count()
    }

    /// Check whether any of `roles` may perform `action` on `resource`.
    ///
    /// An empty role set is evaluated as the guest role. Returns `Ok(false)`
    /// for an ordinary denial.
    pub fn is_allowed(&self, roles: &[Role], resource: &str, action: &str) -> Result<bool> {
        let guest = [Role::guest()];
        let roles = if roles.is_empty() { &guest[..] } else { roles };
        let action = action.to_ascii_lowercase();

        for entry in self.entries.iter().filter(|e| e.applies_to(roles)) {
            match entry {
                Entry::Ready(grant) => {
                    if grant.permits(resource, &action) {
                        return Ok(true);
                    }
                }
                Entry::Faulted { reason, .. } => {
                    return Err(AclError::Unavailable(reason.clone()));
                }
            }
        }

        Ok(false)
    }

    /// Boundary check for a request.
    ///
    /// `roles` is `None` for unauthenticated callers, who are evaluated as
    /// guests. `method` may be in any case.
    pub fn authorize(&self, roles: Option<&[Role]>, resource: &str, method: &str) -> Decision {
        let guest = [Role::guest()];
        let roles = roles.unwrap_or(&guest[..]);

        match self.is_allowed(roles, resource, method) {
            Ok(true) => Decision::Allow,
            Ok(false) => {
                debug!(resource, method, "authorization denied");
                Decision::Forbidden
            }
            Err(e) => {
                error!(resource, method, error = %e, "authorization fault");
                Decision::Unavailable(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::{AllowConfig, OneOrMany};

    fn roles(names: &[&str]) -> Vec<Role> {
        names.iter().map(|n| Role::new(*n)).collect()
    }

    #[test]
    fn test_guest_may_read_invitation_token() {
        let engine = AuthorizationEngine::builtin();
        assert!(engine
            .is_allowed(&roles(&["guest"]), "/api/invitations/token/:token", "get")
            .unwrap());
        assert!(engine
            .is_allowed(&roles(&["guest"]), "/api/invitations/token/abc", "GET")
            .unwrap());
    }

    #[test]
    fn test_guest_may_not_create_invitation() {
        let engine = AuthorizationEngine::builtin();
        assert!(!engine
            .is_allowed(&roles(&["guest"]), "/api/invitations", "post")
            .unwrap());
        assert!(!engine
            .is_allowed(&roles(&["guest"]), "/api/invitations/token/abc", "delete")
            .unwrap());
    }

    #[test]
    fn test_admin_may_create_invitation() {
        let engine = AuthorizationEngine::builtin();
        assert!(engine
            .is_allowed(&roles(&["admin"]), "/api/invitations", "post")
            .unwrap());
    }

    #[test]
    fn test_any_role_in_set_suffices() {
        let engine = AuthorizationEngine::builtin();
        assert!(engine
            .is_allowed(&roles(&["banned", "oper"]), "/api/invitations/count", "get")
            .unwrap());
        assert!(!engine
            .is_allowed(&roles(&["banned"]), "/api/invitations/count", "get")
            .unwrap());
    }

    #[test]
    fn test_empty_roles_are_guest() {
        let engine = AuthorizationEngine::builtin();
        assert!(engine
            .is_allowed(&[], "/api/invitations/token/abc", "get")
            .unwrap());
    }

    #[test]
    fn test_peer_routes() {
        let engine = AuthorizationEngine::builtin();
        assert!(engine
            .is_allowed(&roles(&["user"]), "/api/42/seeding", "get")
            .unwrap());
        assert!(!engine
            .is_allowed(&roles(&["user"]), "/api/42/seeding", "post")
            .unwrap());
        assert!(!engine
            .is_allowed(&roles(&["guest"]), "/api/my/downloading", "get")
            .unwrap());
    }

    #[test]
    fn test_authorize_decisions() {
        let engine = AuthorizationEngine::builtin();
        let user = roles(&["user"]);

        let allowed = engine.authorize(Some(user.as_slice()), "/api/invitations", "POST");
        assert!(allowed.is_allowed());
        assert_eq!(allowed.message(), None);

        let denied = engine.authorize(None, "/api/invitations", "POST");
        assert_eq!(denied, Decision::Forbidden);
        assert_eq!(denied.status_code(), 403);
        assert_eq!(denied.message(), Some(FORBIDDEN_MESSAGE));

        // Unknown resources get the same answer as known ones.
        assert_eq!(engine.authorize(None, "/api/does-not-exist", "get"), denied);
    }

    fn faulty_config() -> Vec<GrantConfig> {
        vec![
            GrantConfig {
                roles: roles(&["user"]),
                allows: vec![AllowConfig {
                    resources: OneOrMany::One("api/missing-slash".into()),
                    permissions: OneOrMany::One("*".into()),
                }],
            },
            GrantConfig {
                roles: roles(&["guest"]),
                allows: vec![AllowConfig {
                    resources: OneOrMany::One("/api/public".into()),
                    permissions: OneOrMany::One("get".into()),
                }],
            },
        ]
    }

    #[test]
    fn test_faulted_grant_surfaces_unavailable() {
        let engine = AuthorizationEngine::new(&faulty_config());
        assert_eq!(engine.faulted(), 1);

        let err = engine
            .is_allowed(&roles(&["user"]), "/api/public", "get")
            .unwrap_err();
        assert!(matches!(err, AclError::Unavailable(_)));

        let decision = engine.authorize(Some(roles(&["user"]).as_slice()), "/api/public", "get");
        assert!(!decision.is_allowed());
        assert_eq!(decision.status_code(), 500);
        assert_eq!(decision.message(), Some(UNAVAILABLE_MESSAGE));
    }

    #[test]
    fn test_faulted_grant_does_not_affect_other_roles() {
        let engine = AuthorizationEngine::new(&faulty_config());
        assert!(engine
            .is_allowed(&roles(&["guest"]), "/api/public", "get")
            .unwrap());
    }

    #[test]
    fn test_try_new_rejects_malformed_config() {
        assert!(matches!(
            AuthorizationEngine::try_new(&faulty_config()),
            Err(AclError::InvalidPattern { .. })
        ));
        let engine = AuthorizationEngine::try_new(&builtin::default_grants()).unwrap();
        assert_eq!(engine.grants().count(), 9);
    }
}
