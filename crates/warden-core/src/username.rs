//! Username normalization and format rules.

use serde::{Deserialize, Serialize};

/// Shortest accepted username.
pub const MIN_USERNAME_LEN: usize = 3;
/// Longest accepted username.
pub const MAX_USERNAME_LEN: usize = 34;

/// Message returned for any format violation.
pub const USERNAME_FORMAT_MESSAGE: &str = "Please enter a valid username: 3+ characters long, \
non restricted word, characters \"_-.\", no consecutive dots, does not begin or end with dots, \
letters a-z and numbers 0-9.";

/// Format rules for locally registered usernames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsernameRules {
    /// Reserved names that may not be registered.
    pub illegal_usernames: Vec<String>,
}

impl Default for UsernameRules {
    fn default() -> Self {
        Self {
            illegal_usernames: [
                "meanjs",
                "administrator",
                "password",
                "admin",
                "user",
                "unknown",
                "anonymous",
                "null",
                "undefined",
                "api",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Normalize a base name and append an optional numeric suffix.
///
/// `candidate_username("Alice", Some(2))` is `"alice2"`.
pub fn candidate_username(base: &str, suffix: Option<u32>) -> String {
    let mut name = base.trim().to_lowercase();
    if let Some(n) = suffix {
        name.push_str(&n.to_string());
    }
    name
}

/// Check a normalized username against the format rules.
///
/// Accepts 3-34 characters of `[A-Za-z0-9_.-]` with no two consecutive
/// separators, not starting or ending with `.`, and not reserved.
pub fn validate_username(username: &str, rules: &UsernameRules) -> Result<(), String> {
    if is_well_formed(username) && !rules.illegal_usernames.iter().any(|u| u == username) {
        Ok(())
    } else {
        Err(USERNAME_FORMAT_MESSAGE.to_string())
    }
}

fn is_well_formed(username: &str) -> bool {
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return false;
    }
    if username.starts_with('.') || username.ends_with('.') {
        return false;
    }

    let is_separator = |c: char| matches!(c, '.' | '_' | '-');
    let mut previous_separator = false;
    for c in username.chars() {
        if !(c.is_ascii_alphanumeric() || is_separator(c)) {
            return false;
        }
        let separator = is_separator(c);
        if separator && previous_separator {
            return false;
        }
        previous_separator = separator;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(name: &str) -> bool {
        validate_username(name, &UsernameRules::default()).is_ok()
    }

    #[test]
    fn test_candidate_username() {
        assert_eq!(candidate_username("Alice", None), "alice");
        assert_eq!(candidate_username("  Bob ", Some(0)), "bob0");
        assert_eq!(candidate_username("carol", Some(12)), "carol12");
    }

    #[test]
    fn test_accepts_well_formed_names() {
        assert!(valid("alice"));
        assert!(valid("a.b_c-d"));
        assert!(valid("abc"));
        assert!(valid(&"x".repeat(34)));
    }

    #[test]
    fn test_rejects_malformed_names() {
        assert!(!valid("ab"));
        assert!(!valid(&"x".repeat(35)));
        assert!(!valid(".alice"));
        assert!(!valid("alice."));
        assert!(!valid("al..ice"));
        assert!(!valid("al_-ice"));
        assert!(!valid("al ice"));
        assert!(!valid("alïce"));
    }

    #[test]
    fn test_rejects_reserved_names() {
        assert!(!valid("admin"));
        assert!(!valid("api"));
        let rules = UsernameRules {
            illegal_usernames: vec![],
        };
        assert!(validate_username("admin", &rules).is_ok());
    }

    #[test]
    fn test_leading_separator_other_than_dot_is_allowed() {
        assert!(valid("_alice"));
        assert!(valid("alice-"));
    }
}
