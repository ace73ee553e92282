//! In-memory implementation of the IdentityStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use warden_core::Role;

use crate::error::{Result, StoreError};
use crate::record::IdentityRecord;
use crate::traits::{FieldUpdate, IdentityStore, InsertResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; the
/// bootstrap check and the insert happen under one write guard.
pub struct MemoryStore {
    identities: RwLock<BTreeMap<String, IdentityRecord>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            identities: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, IdentityRecord>>> {
        self.identities
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, IdentityRecord>>> {
        self.identities
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.len() as u64)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<IdentityRecord>> {
        Ok(self.read()?.get(username).cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(username))
    }

    async fn insert_identity(
        &self,
        record: &IdentityRecord,
        bootstrap_role: Option<&Role>,
    ) -> Result<InsertResult> {
        let mut identities = self.write()?;

        if identities.contains_key(&record.username) {
            return Ok(InsertResult::UsernameTaken);
        }

        let mut record = record.clone();
        let bootstrapped = match bootstrap_role {
            Some(role) if identities.is_empty() => {
                record.roles = vec![role.clone()];
                true
            }
            _ => false,
        };

        identities.insert(record.username.clone(), record);
        Ok(InsertResult::Inserted { bootstrapped })
    }

    async fn update_identity(
        &self,
        username: &str,
        update: &FieldUpdate,
        updated_at: i64,
    ) -> Result<Option<IdentityRecord>> {
        let mut identities = self.write()?;

        Ok(identities.get_mut(username).map(|existing| {
            update.apply(existing);
            existing.updated_at = updated_at;
            existing.clone()
        }))
    }

    async fn list_usernames(&self) -> Result<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }
}
