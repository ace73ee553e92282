//! Error types for Warden Core.

use thiserror::Error;

/// Core errors raised by the credential primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Hashing was attempted without a usable salt.
    #[error("invalid salt: a non-empty salt is required to hash a secret")]
    InvalidSalt,

    /// The generator could not produce a secret that satisfies the policy.
    #[error("cannot generate a secret satisfying the policy after {attempts} attempts")]
    GenerationUnsatisfiable { attempts: u32 },

    /// Stored credential material could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Stored credential material has the wrong shape.
    #[error("malformed credential: {0}")]
    MalformedCredential(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
