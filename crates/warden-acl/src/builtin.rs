//! Built-in grant tables for the stock API routes.

use warden_core::Role;

use crate::grant::{AllowConfig, GrantConfig, OneOrMany};

fn members() -> Vec<Role> {
    vec![Role::admin(), Role::new(Role::OPER), Role::user()]
}

fn allow(resource: &str, permissions: &[&str]) -> AllowConfig {
    AllowConfig {
        resources: OneOrMany::One(resource.to_string()),
        permissions: OneOrMany::Many(permissions.iter().map(|p| p.to_string()).collect()),
    }
}

/// Invitation routes: members may do anything, guests may only look up a token.
pub fn invitation_grants() -> Vec<GrantConfig> {
    vec![
        GrantConfig {
            roles: members(),
            allows: vec![
                allow("/api/invitations", &["*"]),
                allow("/api/invitations/:invitationId", &["*"]),
                allow("/api/invitations/token/:token", &["*"]),
                allow("/api/invitations/count", &["*"]),
            ],
        },
        GrantConfig {
            roles: vec![Role::guest()],
            allows: vec![allow("/api/invitations/token/:token", &["get"])],
        },
    ]
}

/// Peer listing routes: readable by members only.
///
/// Mirrors the route handlers, which wire only `get` for these paths.
pub fn peer_grants() -> Vec<GrantConfig> {
    vec![GrantConfig {
        roles: members(),
        allows: vec![
            allow("/api/my/seeding", &["get"]),
            allow("/api/my/downloading", &["get"]),
            allow("/api/:userId/seeding", &["get"]),
            allow("/api/:userId/downloading", &["get"]),
        ],
    }]
}

/// All built-in grant tables.
pub fn default_grants() -> Vec<GrantConfig> {
    let mut grants = invitation_grants();
    grants.extend(peer_grants());
    grants
}
