//! IdentityStore trait: the abstract interface for identity persistence.
//!
//! This trait allows the lifecycle pipeline to be storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use warden_core::{candidate_username, Credential, Role};

use crate::error::Result;
use crate::record::IdentityRecord;

/// Result of inserting an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// The identity was inserted.
    Inserted {
        /// True if the store was empty and the bootstrap role was applied.
        bootstrapped: bool,
    },
    /// Another identity already holds this username. Nothing was written.
    UsernameTaken,
}

/// A targeted change to one part of a stored identity.
///
/// Each variant names the only fields it writes. A transfer or sign-in
/// change never carries a credential, so it cannot write back a pair that a
/// concurrent password change has already replaced.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Replace the credential pair.
    Credential(Credential),
    /// Replace the transfer counters.
    SetTransfer { uploaded: u64, downloaded: u64 },
    /// Add to the transfer counters.
    AddTransfer { uploaded: u64, downloaded: u64 },
    /// Record a sign-in at `at` (Unix ms), from `ip` if known.
    SignIn { ip: Option<String>, at: i64 },
}

impl FieldUpdate {
    /// Apply the change to `record`. Transfer changes recompute the ratio.
    pub fn apply(&self, record: &mut IdentityRecord) {
        match self {
            FieldUpdate::Credential(credential) => {
                record.credential = Some(credential.clone());
            }
            FieldUpdate::SetTransfer {
                uploaded,
                downloaded,
            } => record.transfer.set_counters(*uploaded, *downloaded),
            FieldUpdate::AddTransfer {
                uploaded,
                downloaded,
            } => record.transfer.add(*uploaded, *downloaded),
            FieldUpdate::SignIn { ip, at } => {
                record.last_signed_at = Some(*at);
                if let Some(ip) = ip {
                    record.signed_ips.insert(ip.clone());
                }
            }
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldUpdate::Credential(_) => "credential",
            FieldUpdate::SetTransfer { .. } => "set-transfer",
            FieldUpdate::AddTransfer { .. } => "add-transfer",
            FieldUpdate::SignIn { .. } => "sign-in",
        }
    }
}

/// The IdentityStore trait: async interface for identity persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic commit**: a new record, including its credential pair, is
///   written in a single call. Later writes are targeted [`FieldUpdate`]s
///   that read, change and write one part of the record under one lock or
///   transaction.
/// - **Bootstrap claim**: `insert_identity` decides whether the store is
///   empty and applies the bootstrap role under the same lock or transaction
///   as the insert, so two concurrent first writers cannot both be promoted.
/// - **Uniqueness**: the store is the final arbiter of username uniqueness and
///   reports collisions as [`InsertResult::UsernameTaken`].
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Number of stored identities.
    async fn count(&self) -> Result<u64>;

    /// Look up an identity by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<IdentityRecord>>;

    /// Check whether a username is taken.
    async fn username_exists(&self, username: &str) -> Result<bool>;

    /// Insert a new identity.
    ///
    /// If `bootstrap_role` is given and the store holds no identities at
    /// commit time, the record's roles are replaced by that single role.
    async fn insert_identity(
        &self,
        record: &IdentityRecord,
        bootstrap_role: Option<&Role>,
    ) -> Result<InsertResult>;

    /// Apply `update` to an existing identity and stamp `updated_at`.
    ///
    /// Fields outside the update are left as stored. Returns the committed
    /// record, or `None` if no identity has that username.
    async fn update_identity(
        &self,
        username: &str,
        update: &FieldUpdate,
        updated_at: i64,
    ) -> Result<Option<IdentityRecord>>;

    /// All usernames in ascending order.
    async fn list_usernames(&self) -> Result<Vec<String>>;
}

/// Extension trait for common store patterns.
pub trait IdentityStoreExt: IdentityStore {
    /// Try `base`, `base1`, `base2`, ... until a username is free.
    ///
    /// `base` is lowercased. Returns `None` after `max_attempts` candidates.
    /// The lookup is not atomic with any later insert.
    fn first_free_username(
        &self,
        base: &str,
        max_attempts: u32,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
}

impl<S: IdentityStore + ?Sized> IdentityStoreExt for S {
    async fn first_free_username(&self, base: &str, max_attempts: u32) -> Result<Option<String>> {
        let mut suffix: Option<u32> = None;

        for _ in 0..max_attempts {
            let candidate = candidate_username(base, suffix);
            if !self.username_exists(&candidate).await? {
                return Ok(Some(candidate));
            }
            suffix = Some(suffix.map_or(1, |n| n + 1));
        }

        Ok(None)
    }
}
