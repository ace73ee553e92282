//! SQLite implementation of the IdentityStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use warden_core::{Credential, Role, TransferStats};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::record::IdentityRecord;
use crate::traits::{FieldUpdate, IdentityStore, InsertResult};

const SELECT_COLUMNS: &str = "username, email, display_name, provider, roles, salt, stored_secret,
     uploaded, downloaded, status, created_at, updated_at, last_signed_at, signed_ips";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking thread pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Blocking(e.to_string()))?
    }
}

/// Column values as read from a row, before decoding.
struct RawIdentity {
    username: String,
    email: String,
    display_name: String,
    provider: String,
    roles: String,
    salt: Option<String>,
    stored_secret: Option<String>,
    uploaded: i64,
    downloaded: i64,
    status: String,
    created_at: i64,
    updated_at: i64,
    last_signed_at: Option<i64>,
    signed_ips: String,
}

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawIdentity> {
    Ok(RawIdentity {
        username: row.get("username")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        provider: row.get("provider")?,
        roles: row.get("roles")?,
        salt: row.get("salt")?,
        stored_secret: row.get("stored_secret")?,
        uploaded: row.get("uploaded")?,
        downloaded: row.get("downloaded")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        last_signed_at: row.get("last_signed_at")?,
        signed_ips: row.get("signed_ips")?,
    })
}

impl TryFrom<RawIdentity> for IdentityRecord {
    type Error = StoreError;

    fn try_from(raw: RawIdentity) -> Result<Self> {
        let roles: Vec<Role> = serde_json::from_str(&raw.roles)?;
        let signed_ips: BTreeSet<String> = serde_json::from_str(&raw.signed_ips)?;

        let credential = match (raw.salt, raw.stored_secret) {
            (Some(salt), Some(secret)) => Some(Credential::from_base64(&salt, &secret)?),
            (None, None) => None,
            _ => {
                return Err(StoreError::InvalidData(format!(
                    "identity {} has an unpaired credential",
                    raw.username
                )))
            }
        };

        let counter = |value: i64, column: &str| {
            u64::try_from(value)
                .map_err(|_| StoreError::InvalidData(format!("negative {}: {}", column, value)))
        };

        Ok(IdentityRecord {
            transfer: TransferStats::new(
                counter(raw.uploaded, "uploaded")?,
                counter(raw.downloaded, "downloaded")?,
            ),
            username: raw.username,
            email: raw.email,
            display_name: raw.display_name,
            provider: raw.provider,
            roles,
            credential,
            status: raw.status,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            last_signed_at: raw.last_signed_at,
            signed_ips,
        })
    }
}

/// Owned column values for a write.
struct RowValues {
    roles: String,
    salt: Option<String>,
    stored_secret: Option<String>,
    uploaded: i64,
    downloaded: i64,
    signed_ips: String,
}

impl RowValues {
    fn encode(record: &IdentityRecord) -> Result<Self> {
        let counter = |value: u64, column: &str| {
            i64::try_from(value)
                .map_err(|_| StoreError::InvalidData(format!("{} out of range: {}", column, value)))
        };

        Ok(Self {
            roles: serde_json::to_string(&record.roles)?,
            salt: record.credential.as_ref().map(|c| c.salt().to_base64()),
            stored_secret: record
                .credential
                .as_ref()
                .map(|c| c.stored_secret().to_base64()),
            uploaded: counter(record.transfer.uploaded(), "uploaded")?,
            downloaded: counter(record.transfer.downloaded(), "downloaded")?,
            signed_ips: serde_json::to_string(&record.signed_ips)?,
        })
    }
}

fn is_constraint_violation(err: &StoreError) -> bool {
    matches!(
        err,
        StoreError::Database(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation
    )
}

fn insert_row(conn: &Connection, record: &IdentityRecord) -> Result<()> {
    let values = RowValues::encode(record)?;

    conn.execute(
        "INSERT INTO identities (
            username, email, display_name, provider, roles, salt, stored_secret,
            uploaded, downloaded, ratio, status, created_at, updated_at,
            last_signed_at, signed_ips
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            record.username,
            record.email,
            record.display_name,
            record.provider,
            values.roles,
            values.salt,
            values.stored_secret,
            values.uploaded,
            values.downloaded,
            record.transfer.ratio(),
            record.status,
            record.created_at,
            record.updated_at,
            record.last_signed_at,
            values.signed_ips,
        ],
    )?;

    Ok(())
}

/// Write back only the columns `update` owns.
fn write_fields(conn: &Connection, record: &IdentityRecord, update: &FieldUpdate) -> Result<()> {
    let values = RowValues::encode(record)?;

    match update {
        FieldUpdate::Credential(_) => conn.execute(
            "UPDATE identities SET salt = ?2, stored_secret = ?3, updated_at = ?4
             WHERE username = ?1",
            params![
                record.username,
                values.salt,
                values.stored_secret,
                record.updated_at,
            ],
        )?,
        FieldUpdate::SetTransfer { .. } | FieldUpdate::AddTransfer { .. } => conn.execute(
            "UPDATE identities SET uploaded = ?2, downloaded = ?3, ratio = ?4, updated_at = ?5
             WHERE username = ?1",
            params![
                record.username,
                values.uploaded,
                values.downloaded,
                record.transfer.ratio(),
                record.updated_at,
            ],
        )?,
        FieldUpdate::SignIn { .. } => conn.execute(
            "UPDATE identities SET last_signed_at = ?2, signed_ips = ?3, updated_at = ?4
             WHERE username = ?1",
            params![
                record.username,
                record.last_signed_at,
                values.signed_ips,
                record.updated_at,
            ],
        )?,
    };

    Ok(())
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn count(&self) -> Result<u64> {
        self.run(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM identities", [], |row| {
                row.get(0)
            })?;
            Ok(count as u64)
        })
        .await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<IdentityRecord>> {
        let username = username.to_string();

        self.run(move |conn| {
            let raw = conn
                .query_row(
                    &format!("SELECT {} FROM identities WHERE username = ?1", SELECT_COLUMNS),
                    params![username],
                    read_raw,
                )
                .optional()?;

            raw.map(IdentityRecord::try_from).transpose()
        })
        .await
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let username = username.to_string();

        self.run(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM identities WHERE username = ?1)",
                params![username],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn insert_identity(
        &self,
        record: &IdentityRecord,
        bootstrap_role: Option<&Role>,
    ) -> Result<InsertResult> {
        let mut record = record.clone();
        let bootstrap_role = bootstrap_role.cloned();

        self.run(move |conn| {
            // IMMEDIATE takes the write lock up front, so the emptiness check
            // and the insert cannot interleave with another writer.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM identities WHERE username = ?1)",
                params![record.username],
                |row| row.get(0),
            )?;
            if taken {
                return Ok(InsertResult::UsernameTaken);
            }

            let mut bootstrapped = false;
            if let Some(role) = bootstrap_role {
                let count: i64 =
                    tx.query_row("SELECT COUNT(*) FROM identities", [], |row| row.get(0))?;
                if count == 0 {
                    record.roles = vec![role];
                    bootstrapped = true;
                }
            }

            match insert_row(&tx, &record) {
                Err(e) if is_constraint_violation(&e) => return Ok(InsertResult::UsernameTaken),
                other => other?,
            }

            tx.commit()?;
            Ok(InsertResult::Inserted { bootstrapped })
        })
        .await
    }

    async fn update_identity(
        &self,
        username: &str,
        update: &FieldUpdate,
        updated_at: i64,
    ) -> Result<Option<IdentityRecord>> {
        let username = username.to_string();
        let update = update.clone();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let Some(raw) = tx
                .query_row(
                    &format!("SELECT {} FROM identities WHERE username = ?1", SELECT_COLUMNS),
                    params![username],
                    read_raw,
                )
                .optional()?
            else {
                return Ok(None);
            };

            let mut record = IdentityRecord::try_from(raw)?;
            update.apply(&mut record);
            record.updated_at = updated_at;
            write_fields(&tx, &record, &update)?;

            tx.commit()?;
            Ok(Some(record))
        })
        .await
    }

    async fn list_usernames(&self) -> Result<Vec<String>> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT username FROM identities ORDER BY username")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
        .await
    }
}
