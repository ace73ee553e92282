//! Value types shared across the Warden crates.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::hasher::SecretHasher;

/// A role identifier such as `admin`, `user` or `guest`.
///
/// Roles are compared case-sensitively; configuration is expected to use
/// lowercase names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Role assigned to callers with no identity.
    pub const GUEST: &'static str = "guest";
    /// Elevated role granted to the first identity in an empty store.
    pub const ADMIN: &'static str = "admin";
    /// Operator role.
    pub const OPER: &'static str = "oper";
    /// Default role for new identities.
    pub const USER: &'static str = "user";

    /// Create a role from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The guest role.
    pub fn guest() -> Self {
        Self::new(Self::GUEST)
    }

    /// The admin role.
    pub fn admin() -> Self {
        Self::new(Self::ADMIN)
    }

    /// The plain user role.
    pub fn user() -> Self {
        Self::new(Self::USER)
    }

    /// The role name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Random salt paired with a stored secret.
///
/// Serialized as standard padded base64.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Salt(Vec<u8>);

impl Salt {
    /// Wrap raw salt bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the salt carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as base64 for storage.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Decode from the base64 storage form.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        STANDARD
            .decode(encoded)
            .map(Self)
            .map_err(|e| CoreError::Encoding(format!("salt: {}", e)))
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({} bytes)", self.0.len())
    }
}

impl TryFrom<String> for Salt {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_base64(&value)
    }
}

impl From<Salt> for String {
    fn from(salt: Salt) -> Self {
        salt.to_base64()
    }
}

/// Derived output of [`SecretHasher::hash`].
///
/// Opaque to callers: the only supported operation besides storage is
/// comparison through [`SecretHasher::verify`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoredSecret(Vec<u8>);

impl StoredSecret {
    pub(crate) fn from_derived(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the raw derived bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encode as base64 for storage.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Decode from the base64 storage form.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        STANDARD
            .decode(encoded)
            .map(Self)
            .map_err(|e| CoreError::Encoding(format!("stored secret: {}", e)))
    }
}

impl fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoredSecret(<redacted>)")
    }
}

impl TryFrom<String> for StoredSecret {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_base64(&value)
    }
}

impl From<StoredSecret> for String {
    fn from(secret: StoredSecret) -> Self {
        secret.to_base64()
    }
}

/// The salt and derived secret kept in place of a plaintext password.
///
/// The pair is only ever constructed and replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    salt: Salt,
    stored_secret: StoredSecret,
}

impl Credential {
    /// Derive a fresh credential for `plaintext` with a newly generated salt.
    ///
    /// This runs the full key derivation and is deliberately slow.
    pub fn create(plaintext: &str) -> Result<Self> {
        let salt = SecretHasher::generate_salt();
        let stored_secret = SecretHasher::hash(plaintext, &salt)?;
        Ok(Self {
            salt,
            stored_secret,
        })
    }

    /// Rebuild a credential from its stored parts.
    pub fn from_parts(salt: Salt, stored_secret: StoredSecret) -> Result<Self> {
        if salt.is_empty() {
            return Err(CoreError::InvalidSalt);
        }
        if stored_secret.as_bytes().is_empty() {
            return Err(CoreError::MalformedCredential(
                "stored secret is empty".into(),
            ));
        }
        Ok(Self {
            salt,
            stored_secret,
        })
    }

    /// Rebuild a credential from the base64 storage columns.
    pub fn from_base64(salt: &str, stored_secret: &str) -> Result<Self> {
        Self::from_parts(Salt::from_base64(salt)?, StoredSecret::from_base64(stored_secret)?)
    }

    /// The salt.
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// The derived secret.
    pub fn stored_secret(&self) -> &StoredSecret {
        &self.stored_secret
    }

    /// Check a plaintext against this credential in constant time.
    pub fn verify(&self, plaintext: &str) -> bool {
        SecretHasher::verify(plaintext, &self.salt, &self.stored_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_base64_roundtrip() {
        let salt = Salt::from_bytes(vec![1u8, 2, 3, 4, 250, 251]);
        let encoded = salt.to_base64();
        assert_eq!(Salt::from_base64(&encoded).unwrap(), salt);
    }

    #[test]
    fn test_salt_rejects_bad_base64() {
        assert!(matches!(
            Salt::from_base64("not base64!!"),
            Err(CoreError::Encoding(_))
        ));
    }

    #[test]
    fn test_credential_from_parts_requires_salt() {
        let secret = StoredSecret::from_derived(vec![7u8; 64]);
        assert!(matches!(
            Credential::from_parts(Salt::from_bytes(Vec::new()), secret),
            Err(CoreError::InvalidSalt)
        ));
    }

    #[test]
    fn test_credential_serializes_as_base64_strings() {
        let credential = Credential::from_parts(
            Salt::from_bytes(vec![0u8; 16]),
            StoredSecret::from_derived(vec![0xff; 64]),
        )
        .unwrap();

        let json = serde_json::to_value(&credential).unwrap();
        assert_eq!(json["salt"], "AAAAAAAAAAAAAAAAAAAAAA==");
        assert!(json["stored_secret"].as_str().unwrap().starts_with("////"));

        let back: Credential = serde_json::from_value(json).unwrap();
        assert_eq!(back, credential);
    }

    #[test]
    fn test_stored_secret_debug_is_redacted() {
        let secret = StoredSecret::from_derived(vec![0xab; 64]);
        assert_eq!(format!("{:?}", secret), "StoredSecret(<redacted>)");
    }

    #[test]
    fn test_role_serializes_transparently() {
        let roles = vec![Role::admin(), Role::new("oper")];
        let json = serde_json::to_string(&roles).unwrap();
        assert_eq!(json, r#"["admin","oper"]"#);
    }
}
