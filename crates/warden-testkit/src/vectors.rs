//! Golden test vectors for the key derivation.
//!
//! PBKDF2-HMAC-SHA1 vectors from RFC 6070. Any implementation that derives
//! credentials compatible with Warden's must reproduce them.

use warden_core::SecretHasher;

/// A golden PBKDF2 vector.
#[derive(Debug, Clone)]
pub struct Pbkdf2Vector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Password bytes.
    pub password: &'static [u8],
    /// Salt bytes.
    pub salt: &'static [u8],
    /// Iteration count.
    pub iterations: u32,
    /// Expected derived key (hex). Its length sets the output length.
    pub expected: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<Pbkdf2Vector> {
    vec![
        Pbkdf2Vector {
            name: "single iteration",
            password: b"password",
            salt: b"salt",
            iterations: 1,
            expected: "0c60c80f961f0e71f3a9b524af6012062fe037a6",
        },
        Pbkdf2Vector {
            name: "two iterations",
            password: b"password",
            salt: b"salt",
            iterations: 2,
            expected: "ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957",
        },
        Pbkdf2Vector {
            name: "4096 iterations",
            password: b"password",
            salt: b"salt",
            iterations: 4096,
            expected: "4b007901b765489abead49d926f721d065a429c1",
        },
        Pbkdf2Vector {
            name: "long password and salt, 25 byte key",
            password: b"passwordPASSWORDpassword",
            salt: b"saltSALTsaltSALTsaltSALTsaltSALTsalt",
            iterations: 4096,
            expected: "3d2eec4fe41c849b80c8d83662c0e44a8b291a964cf2f07038",
        },
        Pbkdf2Vector {
            name: "embedded NUL bytes, 16 byte key",
            password: b"pass\0word",
            salt: b"sa\0lt",
            iterations: 4096,
            expected: "56fa6aa75548099dcc37d7f03425e0c3",
        },
    ]
}

/// Derive the key for a vector and return it as hex.
pub fn derive_hex(vector: &Pbkdf2Vector) -> String {
    let mut out = vec![0u8; vector.expected.len() / 2];
    SecretHasher::derive_key(vector.password, vector.salt, vector.iterations, &mut out);
    hex::encode(out)
}

/// Check a vector against the key derivation.
pub fn verify_vector(vector: &Pbkdf2Vector) -> bool {
    derive_hex(vector) == vector.expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for vector in all_vectors() {
            assert_eq!(derive_hex(&vector), vector.expected, "{}", vector.name);
        }
    }

    #[test]
    fn test_tampered_vector_fails() {
        let mut vector = all_vectors().remove(0);
        vector.iterations = 3;
        assert!(!verify_vector(&vector));
    }
}
