//! Secret hashing: salted PBKDF2-HMAC-SHA1 with constant-time verification.
//!
//! The parameters are fixed so that credentials written by earlier
//! deployments keep verifying: 16-byte salts, 10 000 iterations and a
//! 64-byte derived key, stored as base64.

use rand::rngs::OsRng;
use rand::RngCore;
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::error::{CoreError, Result};
use crate::types::{Salt, StoredSecret};

/// Salt size in bytes.
pub const SALT_LEN: usize = 16;

/// PBKDF2 iteration count.
pub const ITERATIONS: u32 = 10_000;

/// Derived key length in bytes.
pub const KEY_LEN: usize = 64;

/// Deterministic, salted one-way transform from plaintext to stored secret.
///
/// All functions are pure apart from [`SecretHasher::generate_salt`], which
/// reads the operating system's CSPRNG. Hashing is CPU-bound; async
/// callers should run it on a blocking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretHasher;

impl SecretHasher {
    /// Generate a fresh random salt.
    pub fn generate_salt() -> Salt {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut bytes);
        Salt::from_bytes(bytes.to_vec())
    }

    /// Hash `plaintext` with `salt`.
    ///
    /// Fails with [`CoreError::InvalidSalt`] if the salt is empty; there is
    /// no plaintext fallback.
    pub fn hash(plaintext: &str, salt: &Salt) -> Result<StoredSecret> {
        if salt.is_empty() {
            return Err(CoreError::InvalidSalt);
        }

        let mut out = vec![0u8; KEY_LEN];
        Self::derive_key(plaintext.as_bytes(), salt.as_bytes(), ITERATIONS, &mut out);
        Ok(StoredSecret::from_derived(out))
    }

    /// Check `plaintext` against a stored secret.
    ///
    /// The comparison does not short-circuit on the first differing byte.
    pub fn verify(plaintext: &str, salt: &Salt, stored: &StoredSecret) -> bool {
        match Self::hash(plaintext, salt) {
            Ok(candidate) => candidate.as_bytes().ct_eq(stored.as_bytes()).into(),
            Err(_) => false,
        }
    }

    /// Raw PBKDF2-HMAC-SHA1 with caller-chosen parameters.
    ///
    /// `out.len()` selects the derived key length.
    pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) {
        pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, iterations, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rfc6070(password: &[u8], salt: &[u8], iterations: u32, len: usize) -> String {
        let mut out = vec![0u8; len];
        SecretHasher::derive_key(password, salt, iterations, &mut out);
        hex::encode(out)
    }

    #[test]
    fn test_derive_key_rfc6070_vectors() {
        assert_eq!(
            rfc6070(b"password", b"salt", 1, 20),
            "0c60c80f961f0e71f3a9b524af6012062fe037a6"
        );
        assert_eq!(
            rfc6070(b"password", b"salt", 2, 20),
            "ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957"
        );
        assert_eq!(
            rfc6070(b"password", b"salt", 4096, 20),
            "4b007901b765489abead49d926f721d065a429c1"
        );
    }

    #[test]
    fn test_generate_salt_size_and_uniqueness() {
        let a = SecretHasher::generate_salt();
        let b = SecretHasher::generate_salt();
        assert_eq!(a.as_bytes().len(), SALT_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_output_length() {
        let salt = SecretHasher::generate_salt();
        let stored = SecretHasher::hash("correct horse battery staple", &salt).unwrap();
        assert_eq!(stored.as_bytes().len(), KEY_LEN);
        // 64 bytes -> 88 base64 chars with padding
        assert_eq!(stored.to_base64().len(), 88);
    }

    #[test]
    fn test_hash_empty_salt_is_invalid() {
        let empty = Salt::from_bytes(Vec::new());
        assert!(matches!(
            SecretHasher::hash("secret", &empty),
            Err(CoreError::InvalidSalt)
        ));
        assert!(!SecretHasher::verify("secret", &empty, &StoredSecret::from_derived(vec![0; 64])));
    }

    #[test]
    fn test_salt_changes_output() {
        let a = SecretHasher::hash("same secret", &Salt::from_bytes(vec![1u8; 16])).unwrap();
        let b = SecretHasher::hash("same secret", &Salt::from_bytes(vec![2u8; 16])).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_truncated_secret() {
        let salt = SecretHasher::generate_salt();
        let stored = SecretHasher::hash("secret", &salt).unwrap();
        let truncated = StoredSecret::from_derived(stored.as_bytes()[..32].to_vec());
        assert!(!SecretHasher::verify("secret", &salt, &truncated));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn hash_is_deterministic(plaintext in ".{0,40}", salt in prop::collection::vec(any::<u8>(), 1..=32)) {
            let salt = Salt::from_bytes(salt);
            let a = SecretHasher::hash(&plaintext, &salt).unwrap();
            let b = SecretHasher::hash(&plaintext, &salt).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn verify_accepts_only_the_original(plaintext in "[a-zA-Z0-9]{1,32}", other in "[a-zA-Z0-9]{1,32}") {
            let salt = SecretHasher::generate_salt();
            let stored = SecretHasher::hash(&plaintext, &salt).unwrap();
            prop_assert!(SecretHasher::verify(&plaintext, &salt, &stored));
            if other != plaintext {
                prop_assert!(!SecretHasher::verify(&other, &salt, &stored));
            }
        }
    }
}
