//! # Warden Testkit
//!
//! Testing utilities for Warden.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: RFC 6070 PBKDF2-HMAC-SHA1 cases for the key derivation
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! ```rust
//! use warden_testkit::vectors::{all_vectors, verify_vector};
//!
//! for vector in all_vectors() {
//!     assert!(verify_vector(&vector), "{}", vector.name);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use warden_core::PasswordPolicy;
//! use warden_testkit::generators::strong_password;
//!
//! proptest! {
//!     #[test]
//!     fn strong_passwords_pass(secret in strong_password()) {
//!         prop_assert!(PasswordPolicy::default().evaluate(&secret).passed);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use warden_testkit::fixtures::TestFixture;
//!
//! async fn example() {
//!     let fixture = TestFixture::new();
//!     let root = fixture.register("root").await.unwrap();
//!     assert!(root.has_role("admin"));
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{roles, seeded_rng, TestFixture, STRONG_PASSWORD};
