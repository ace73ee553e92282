//! # Warden
//!
//! Credential lifecycle and role-based authorization.
//!
//! ## Overview
//!
//! Warden provides the pieces an application needs to accept, store and check
//! passwords, and to decide what an actor may do:
//!
//! - **Credentials**: salted PBKDF2 hashes, never stored or logged in plaintext
//! - **Password policy**: length, character classes, repeats and a strength score
//! - **Generated secrets**: high-entropy passwords that satisfy the policy
//! - **Identity lifecycle**: an explicit write pipeline with atomic bootstrap
//! - **Authorization**: grants matching roles, resource patterns and actions
//!
//! ## Key Concepts
//!
//! - **Write pipeline**: `validate -> policy-check -> hash -> recompute -> commit`
//! - **Bootstrap role**: the role given to the very first identity stored
//! - **Guest**: the role evaluated for callers without an identity
//!
//! ## Usage
//!
//! ```rust,no_run
//! use warden::{NewIdentity, Warden, WardenConfig};
//! use warden::store::SqliteStore;
//!
//! async fn example() {
//!     // Open storage
//!     let store = SqliteStore::open("warden.db").unwrap();
//!
//!     // Create the warden
//!     let warden = Warden::new(store, WardenConfig::default());
//!
//!     // Register an identity
//!     let record = warden
//!         .identities()
//!         .register(NewIdentity::local("alice", "alice@example.com", "Str0ng_P@ssw0rd"))
//!         .await
//!         .unwrap();
//!
//!     // Check a password
//!     assert!(warden
//!         .identities()
//!         .authenticate("alice", "Str0ng_P@ssw0rd")
//!         .await
//!         .unwrap());
//!
//!     // Authorize a request
//!     let decision = warden.authorize(Some(record.roles.as_slice()), "/api/invitations", "POST");
//!     assert!(decision.is_allowed());
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `warden::core` - Credential primitives (SecretHasher, PasswordPolicy, etc.)
//! - `warden::store` - Storage abstraction, SQLite and in-memory stores
//! - `warden::acl` - Grants and the authorization engine

pub mod config;
pub mod error;
pub mod identity;
pub mod warden;

// Re-export component crates
pub use warden_acl as acl;
pub use warden_core as core;
pub use warden_store as store;

// Re-export main types for convenience
pub use config::WardenConfig;
pub use error::{Result, WardenError};
pub use identity::{IdentityService, NewIdentity, WriteStage, PASSWORD_REQUIRED_MESSAGE};
pub use crate::warden::Warden;

// Re-export commonly used component types
pub use warden_acl::{AuthorizationEngine, Decision};
pub use warden_core::{
    Credential, PasswordPolicy, PolicyContext, PolicyResult, Role, SecretGenerator, SecretHasher,
    TransferStats,
};
pub use warden_store::{IdentityRecord, IdentityStore, MemoryStore, SqliteStore};
