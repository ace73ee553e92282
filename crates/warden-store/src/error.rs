//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// A blocking task failed to complete.
    #[error("blocking task failed: {0}")]
    Blocking(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<warden_core::CoreError> for StoreError {
    fn from(e: warden_core::CoreError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_land_in_store_variants() {
        let json = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        assert!(matches!(StoreError::from(json), StoreError::Serialization(_)));

        let core = warden_core::CoreError::InvalidSalt;
        assert!(matches!(StoreError::from(core), StoreError::InvalidData(_)));

        let db = rusqlite::Error::QueryReturnedNoRows;
        assert!(matches!(StoreError::from(db), StoreError::Database(_)));
    }
}
