//! # Warden Core
//!
//! Pure primitives for Warden: credentials, password policy, secret
//! generation, and derived identity metrics.
//!
//! This crate contains no I/O, no storage, no networking. Everything here is
//! computation over plain values, so callers decide where (and on which thread)
//! the expensive parts run.
//!
//! ## Key Types
//!
//! - [`SecretHasher`] - Salted PBKDF2 transform from plaintext to [`StoredSecret`]
//! - [`Credential`] - The `(salt, stored_secret)` pair kept in place of a password
//! - [`PasswordPolicy`] - Strength rules evaluated into a [`PolicyResult`]
//! - [`SecretGenerator`] - Mints secrets that always satisfy a [`PasswordPolicy`]
//! - [`TransferStats`] - Upload/download counters with a derived ratio
//! - [`Role`] - Role identifier used by identities and grants
//!
//! ## Usage
//!
//! ```rust
//! use warden_core::{Credential, PasswordPolicy, SecretGenerator};
//!
//! let policy = PasswordPolicy::default();
//! let secret = SecretGenerator::default().generate(&policy).unwrap();
//! assert!(policy.evaluate(&secret).passed);
//!
//! let credential = Credential::create(&secret).unwrap();
//! assert!(credential.verify(&secret));
//! ```

pub mod error;
pub mod generator;
pub mod hasher;
pub mod metric;
pub mod policy;
pub mod types;
pub mod username;

pub use error::{CoreError, Result};
pub use generator::{strip_repeated_runs, GeneratorConfig, SecretGenerator, ALPHABET};
pub use hasher::{SecretHasher, ITERATIONS, KEY_LEN, SALT_LEN};
pub use metric::{compute_ratio, TransferStats, NO_DOWNLOADS_RATIO};
pub use policy::{has_repeated_run, PasswordPolicy, PolicyContext, PolicyResult};
pub use types::{Credential, Role, Salt, StoredSecret};
pub use username::{candidate_username, validate_username, UsernameRules};
