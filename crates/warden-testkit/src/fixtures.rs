//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use rand::rngs::StdRng;
use rand::SeedableRng;
use warden::{IdentityRecord, IdentityService, NewIdentity, Result, Warden, WardenConfig};
use warden_core::Role;
use warden_store::MemoryStore;

/// A password that satisfies the default policy.
pub const STRONG_PASSWORD: &str = "Str0ng_P@ssw0rd";

/// A test fixture with an in-memory identity service.
pub struct TestFixture {
    pub config: WardenConfig,
    pub service: IdentityService<MemoryStore>,
}

impl TestFixture {
    /// Create a fixture with the default configuration.
    pub fn new() -> Self {
        Self::with_config(WardenConfig::default())
    }

    /// Create a fixture with a custom configuration.
    pub fn with_config(config: WardenConfig) -> Self {
        let service = IdentityService::new(MemoryStore::new(), &config);
        Self { config, service }
    }

    /// Register a local identity with [`STRONG_PASSWORD`].
    pub async fn register(&self, username: &str) -> Result<IdentityRecord> {
        self.service
            .register(NewIdentity::local(
                username,
                format!("{username}@example.com"),
                STRONG_PASSWORD,
            ))
            .await
    }

    /// Register several identities in order.
    pub async fn register_all(&self, usernames: &[&str]) -> Result<Vec<IdentityRecord>> {
        let mut records = Vec::with_capacity(usernames.len());
        for username in usernames {
            records.push(self.register(username).await?);
        }
        Ok(records)
    }

    /// A Warden over a fresh memory store with this fixture's configuration.
    pub fn warden(&self) -> Warden<MemoryStore> {
        Warden::new(MemoryStore::new(), self.config.clone())
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a role list from names.
pub fn roles(names: &[&str]) -> Vec<Role> {
    names.iter().map(|name| Role::new(*name)).collect()
}

/// Deterministic RNG for generator tests.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
