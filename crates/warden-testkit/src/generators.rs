//! Proptest generators for property-based testing.

use proptest::prelude::*;

use warden_core::{has_repeated_run, validate_username, Role, Salt, UsernameRules, SALT_LEN};

/// Generate an arbitrary secret, including unicode and empty strings.
pub fn any_secret() -> impl Strategy<Value = String> {
    ".{0,48}"
}

/// Generate a secret that passes the default password policy.
///
/// Ten to sixteen characters covering all four character classes, with no
/// character repeated three times in a row.
pub fn strong_password() -> impl Strategy<Value = String> {
    "[a-z]{3,5}[A-Z]{3,5}[0-9]{2,3}[!@#%&*_-]{2,3}"
        .prop_filter("no repeated runs", |s| !has_repeated_run(s))
}

/// Generate a secret that fails the default password policy on length.
pub fn short_password() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{0,9}"
}

/// Generate a random salt of the standard size.
pub fn salt() -> impl Strategy<Value = Salt> {
    any::<[u8; SALT_LEN]>().prop_map(|bytes| Salt::from_bytes(bytes.to_vec()))
}

/// Generate a username accepted by the default format rules.
pub fn username() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{2,15}".prop_filter("reserved username", |name| {
        validate_username(name, &UsernameRules::default()).is_ok()
    })
}

/// Generate a pair of transfer counters.
pub fn transfer_counters() -> impl Strategy<Value = (u64, u64)> {
    prop_oneof![
        Just((0u64, 0u64)),
        (1u64..=u64::MAX).prop_map(|up| (up, 0u64)),
        (0u64..=1 << 50, 0u64..=1 << 50),
        (any::<u64>(), any::<u64>()),
    ]
}

/// Generate one of the built-in roles.
pub fn role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::guest()),
        Just(Role::user()),
        Just(Role::admin()),
        Just(Role::new(Role::OPER)),
        "[a-z]{3,8}".prop_map(Role::new),
    ]
}

/// Generate a role set, possibly empty.
pub fn role_set() -> impl Strategy<Value = Vec<Role>> {
    prop::collection::vec(role(), 0..4)
}

/// Generate a request path made of a few short segments.
pub fn resource_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9:]{1,10}", 0..5)
        .prop_map(|segments| format!("/{}", segments.join("/")))
}

/// Generate an HTTP method in mixed case.
pub fn method() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("get".to_string()),
        Just("GET".to_string()),
        Just("post".to_string()),
        Just("Put".to_string()),
        Just("DELETE".to_string()),
    ]
}
