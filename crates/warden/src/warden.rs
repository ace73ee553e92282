//! The Warden: identity lifecycle and authorization behind one handle.

use std::sync::Arc;

use tracing::error;
use warden_acl::{AuthorizationEngine, Decision};
use warden_core::Role;
use warden_store::IdentityStore;

use crate::config::WardenConfig;
use crate::error::Result;
use crate::identity::IdentityService;

/// The main Warden struct.
///
/// Provides a unified API for:
/// - Registering identities and managing their credentials
/// - Checking passwords
/// - Authorizing requests by role
pub struct Warden<S: IdentityStore> {
    config: WardenConfig,
    engine: Arc<AuthorizationEngine>,
    identities: IdentityService<S>,
}

impl<S: IdentityStore> Warden<S> {
    /// Create a Warden instance.
    ///
    /// Malformed grants are kept as faulted entries; requests that reach one
    /// are answered with [`Decision::Unavailable`].
    pub fn new(store: S, config: WardenConfig) -> Self {
        let engine = Arc::new(AuthorizationEngine::new(&config.grants));
        Self::assemble(store, config, engine)
    }

    /// Create a Warden instance, rejecting malformed grants.
    pub fn try_new(store: S, config: WardenConfig) -> Result<Self> {
        let engine = Arc::new(AuthorizationEngine::try_new(&config.grants)?);
        Ok(Self::assemble(store, config, engine))
    }

    fn assemble(store: S, config: WardenConfig, engine: Arc<AuthorizationEngine>) -> Self {
        let identities = IdentityService::new(store, &config);
        Self {
            config,
            engine,
            identities,
        }
    }

    /// The configuration this instance was built from.
    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    /// The shared authorization engine.
    pub fn engine(&self) -> &Arc<AuthorizationEngine> {
        &self.engine
    }

    /// The identity service.
    pub fn identities(&self) -> &IdentityService<S> {
        &self.identities
    }

    /// Authorize a request for callers holding `roles`, or anonymous callers.
    pub fn authorize(&self, roles: Option<&[Role]>, path: &str, method: &str) -> Decision {
        self.engine.authorize(roles, path, method)
    }

    /// Authorize a request on behalf of a signed-in username.
    ///
    /// `None` and unknown usernames are treated as guests. A store failure is
    /// an engine fault, not a denial.
    pub async fn authorize_user(
        &self,
        username: Option<&str>,
        path: &str,
        method: &str,
    ) -> Decision {
        let Some(username) = username else {
            return self.authorize(None, path, method);
        };

        match self.identities.find(username).await {
            Ok(Some(record)) => self.authorize(Some(record.roles.as_slice()), path, method),
            Ok(None) => self.authorize(None, path, method),
            Err(e) => {
                error!(username, error = %e, "failed to load roles for authorization");
                Decision::Unavailable(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::NewIdentity;
    use warden_acl::{AllowConfig, GrantConfig, OneOrMany};
    use warden_store::MemoryStore;

    fn broken_config() -> WardenConfig {
        WardenConfig {
            grants: vec![GrantConfig {
                roles: vec![Role::user()],
                allows: vec![AllowConfig {
                    resources: OneOrMany::One("/api//broken".into()),
                    permissions: OneOrMany::One("*".into()),
                }],
            }],
            ..WardenConfig::default()
        }
    }

    #[test]
    fn test_anonymous_authorization() {
        let warden = Warden::new(MemoryStore::new(), WardenConfig::default());
        assert!(warden
            .authorize(None, "/api/invitations/token/abc", "GET")
            .is_allowed());
        assert_eq!(
            warden.authorize(None, "/api/invitations", "POST"),
            Decision::Forbidden
        );
    }

    #[test]
    fn test_try_new_rejects_broken_grants() {
        assert!(Warden::try_new(MemoryStore::new(), broken_config()).is_err());
        let warden = Warden::new(MemoryStore::new(), broken_config());
        assert_eq!(warden.engine().faulted(), 1);
    }

    #[tokio::test]
    async fn test_authorize_user_uses_stored_roles() {
        let warden = Warden::new(MemoryStore::new(), WardenConfig::default());
        warden
            .identities()
            .register(NewIdentity::local("root", "root@example.com", "Str0ng_P@ssw0rd"))
            .await
            .unwrap();

        assert!(warden
            .authorize_user(Some("root"), "/api/invitations", "post")
            .await
            .is_allowed());
        assert_eq!(
            warden
                .authorize_user(Some("ghost"), "/api/invitations", "post")
                .await,
            Decision::Forbidden
        );
        assert!(warden
            .authorize_user(None, "/api/invitations/token/t", "get")
            .await
            .is_allowed());
    }
}
