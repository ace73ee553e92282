//! Error types for the authorization module.

use thiserror::Error;

/// Errors that can occur while building or evaluating grants.
///
/// An ordinary denial is not an error; see [`crate::Decision`].
#[derive(Debug, Error)]
pub enum AclError {
    /// A resource pattern in the grant configuration is malformed.
    #[error("invalid resource pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The grant configuration could not be parsed.
    #[error("invalid grant configuration: {0}")]
    InvalidConfig(String),

    /// The engine could not evaluate the request.
    #[error("authorization unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for AclError {
    fn from(e: serde_json::Error) -> Self {
        AclError::InvalidConfig(e.to_string())
    }
}

/// Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AclError>;
