//! Error types for Warden.

use thiserror::Error;
use warden_acl::AclError;
use warden_core::CoreError;
use warden_store::StoreError;

/// Errors that can occur during Warden operations.
#[derive(Debug, Error)]
pub enum WardenError {
    /// The secret failed the password policy. Carries every violation, in order.
    #[error("password policy violated: {}", .0.join(" "))]
    PolicyViolation(Vec<String>),

    /// The username does not satisfy the format rules.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// Another identity already holds this username.
    #[error("username already taken: {0}")]
    UsernameTaken(String),

    /// No free username was found within the attempt budget.
    #[error("no free username for {base:?} after {attempts} attempts")]
    UsernameExhausted { base: String, attempts: u32 },

    /// No identity with this username exists.
    #[error("identity not found: {0}")]
    IdentityNotFound(String),

    /// Credential primitive error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Authorization error.
    #[error("authorization error: {0}")]
    Acl(#[from] AclError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// A blocking task was cancelled or panicked.
    #[error("blocking task failed: {0}")]
    Blocking(String),
}

impl WardenError {
    /// Whether this is a genuine fault rather than an expected outcome.
    ///
    /// Policy violations, bad usernames, collisions and missing identities
    /// are answers to the caller. Everything else is a fault, including
    /// running out of username candidates.
    pub fn is_fault(&self) -> bool {
        !matches!(
            self,
            WardenError::PolicyViolation(_)
                | WardenError::InvalidUsername(_)
                | WardenError::UsernameTaken(_)
                | WardenError::IdentityNotFound(_)
        )
    }
}

impl From<tokio::task::JoinError> for WardenError {
    fn from(e: tokio::task::JoinError) -> Self {
        WardenError::Blocking(e.to_string())
    }
}

/// Result type for Warden operations.
pub type Result<T> = std::result::Result<T, WardenError>;
