//! # Warden Store
//!
//! Storage abstraction for Warden identities. Provides a trait-based
//! interface with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The lifecycle pipeline talks to persistence only through the
//! [`IdentityStore`] trait. The primary implementation is [`SqliteStore`],
//! with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`IdentityStore`] - The async trait for all storage operations
//! - [`IdentityRecord`] - The persisted shape of an identity
//! - [`InsertResult`] - Result of inserting an identity
//!
//! ## Usage
//!
//! ```rust,no_run
//! use warden_store::{IdentityRecord, IdentityStore, SqliteStore};
//! use warden_core::Role;
//!
//! async fn example() {
//!     let store = SqliteStore::open("warden.db").unwrap();
//!     let record = IdentityRecord::new("alice", "alice@example.com", 0);
//!     let result = store
//!         .insert_identity(&record, Some(&Role::admin()))
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic bootstrap**: the "first identity becomes admin" rule is decided
//!   inside the insert, never by a separate count
//! - **Uniqueness**: duplicate usernames return `UsernameTaken`, not an error
//! - **Paired credentials**: salt and stored secret are written together
//! - **Targeted updates**: bookkeeping writes never touch the credential

pub mod error;
pub mod memory;
pub mod migration;
pub mod record;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use record::{IdentityRecord, LOCAL_PROVIDER, STATUS_NORMAL};
pub use sqlite::SqliteStore;
pub use traits::{FieldUpdate, IdentityStore, IdentityStoreExt, InsertResult};
