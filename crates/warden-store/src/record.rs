//! The persisted shape of an identity.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use warden_core::{Credential, Role, TransferStats};

/// Provider name for identities that authenticate with a local password.
pub const LOCAL_PROVIDER: &str = "local";

/// Default account status.
pub const STATUS_NORMAL: &str = "normal";

/// A stored identity.
///
/// `credential` and `transfer` are owned by the lifecycle pipeline: the
/// credential is replaced as a whole, and the transfer ratio is derived from
/// its counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Lowercase unique username.
    pub username: String,
    /// Contact email (lowercased).
    pub email: String,
    /// Name shown to other users.
    pub display_name: String,
    /// Authentication provider (`local` for password identities).
    pub provider: String,
    /// Assigned roles; the first entry is the primary role.
    pub roles: Vec<Role>,
    /// Salted password hash, present for local identities with a password.
    pub credential: Option<Credential>,
    /// Transfer counters and derived ratio.
    pub transfer: TransferStats,
    /// Account status.
    pub status: String,
    /// Creation time (Unix ms).
    pub created_at: i64,
    /// Last write time (Unix ms).
    pub updated_at: i64,
    /// Last successful sign-in (Unix ms).
    pub last_signed_at: Option<i64>,
    /// Addresses this identity has signed in from.
    pub signed_ips: BTreeSet<String>,
}

impl IdentityRecord {
    /// Create a record with default roles, no credential and zeroed counters.
    pub fn new(username: impl Into<String>, email: impl Into<String>, now: i64) -> Self {
        let username = username.into();
        Self {
            display_name: username.clone(),
            username,
            email: email.into().trim().to_lowercase(),
            provider: LOCAL_PROVIDER.to_string(),
            roles: vec![Role::user()],
            credential: None,
            transfer: TransferStats::default(),
            status: STATUS_NORMAL.to_string(),
            created_at: now,
            updated_at: now,
            last_signed_at: None,
            signed_ips: BTreeSet::new(),
        }
    }

    /// Whether this identity authenticates with a local password.
    pub fn is_local(&self) -> bool {
        self.provider == LOCAL_PROVIDER
    }

    /// Whether the identity holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }
}
