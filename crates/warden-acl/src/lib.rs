//! # Warden ACL
//!
//! Role-based authorization over URL-like resource patterns.
//!
//! ## Overview
//!
//! Access is declared as grants: a set of roles, a resource pattern such as
//! `/api/invitations/:invitationId`, and the actions those roles may perform
//! there (or `*` for all). Grants are loaded once at startup into an
//! [`AuthorizationEngine`], which is immutable and can be shared freely
//! between threads.
//!
//! ## Key Concepts
//!
//! - **Grant**: roles + resource pattern + permitted actions
//! - **Guest**: the role used for callers without an identity
//! - **Decision**: allow, forbidden (ordinary denial), or unavailable (fault)
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_acl::{AuthorizationEngine, Decision};
//! use warden_core::Role;
//!
//! let engine = Arc::new(AuthorizationEngine::builtin());
//!
//! let admin = [Role::admin()];
//! assert!(engine.is_allowed(&admin, "/api/invitations", "post").unwrap());
//! assert_eq!(engine.authorize(None, "/api/invitations", "POST"), Decision::Forbidden);
//! ```

pub mod builtin;
pub mod engine;
pub mod error;
pub mod grant;
pub mod pattern;

pub use builtin::{default_grants, invitation_grants, peer_grants};
pub use engine::{AuthorizationEngine, Decision, FORBIDDEN_MESSAGE, UNAVAILABLE_MESSAGE};
pub use error::{AclError, Result};
pub use grant::{AllowConfig, Grant, GrantConfig, OneOrMany, Permissions, ANY_ACTION};
pub use pattern::{ResourcePattern, Segment};
