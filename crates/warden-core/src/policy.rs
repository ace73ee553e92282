//! Password strength policy.
//!
//! A policy is a set of required tests (length bounds, repeated characters,
//! banned words), optional character-class tests, and a composite strength
//! score. Evaluation is pure and reports every failed rule at once.

use serde::{Deserialize, Serialize};

/// Points credited per character, up to [`LENGTH_CREDIT_CAP`] characters.
const POINTS_PER_CHAR: u32 = 3;
const LENGTH_CREDIT_CAP: usize = 20;
/// Points credited per distinct character class present.
const POINTS_PER_CLASS: u32 = 10;
/// Deducted when a secret uses a single character class.
const SINGLE_CLASS_PENALTY: u32 = 15;
const MAX_SCORE: u32 = 100;

/// Configuration bundle defining the minimum strength of a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyContext {
    /// Minimum length in characters.
    pub min_length: usize,
    /// Maximum length in characters.
    pub max_length: usize,
    /// Whether long secrets may skip the optional character-class tests.
    pub allow_passphrases: bool,
    /// Length from which a secret counts as a passphrase.
    pub min_phrase_length: usize,
    /// How many of the four character-class tests must pass.
    pub min_optional_tests: usize,
    /// Minimum composite strength score (0-100).
    pub min_score: u32,
    /// Words that may not appear anywhere in the secret, case-insensitively.
    pub banned_words: Vec<String>,
}

impl Default for PolicyContext {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_length: 128,
            allow_passphrases: true,
            min_phrase_length: 20,
            min_optional_tests: 4,
            min_score: 50,
            banned_words: Vec::new(),
        }
    }
}

/// Outcome of evaluating a secret against a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyResult {
    /// True iff no rule was violated.
    pub passed: bool,
    /// One human-readable message per violated rule, in evaluation order.
    pub violations: Vec<String>,
    /// Composite strength score.
    pub score: u32,
    /// Whether the optional tests were waived because the secret is a passphrase.
    pub is_passphrase: bool,
}

/// Character classes tracked by the optional tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CharClasses {
    lowercase: bool,
    uppercase: bool,
    digit: bool,
    symbol: bool,
}

impl CharClasses {
    fn scan(secret: &str) -> Self {
        let mut classes = Self::default();
        for c in secret.chars() {
            match c {
                'a'..='z' => classes.lowercase = true,
                'A'..='Z' => classes.uppercase = true,
                '0'..='9' => classes.digit = true,
                _ => classes.symbol = true,
            }
        }
        classes
    }

    fn count(&self) -> u32 {
        [self.lowercase, self.uppercase, self.digit, self.symbol]
            .iter()
            .filter(|present| **present)
            .count() as u32
    }
}

/// Evaluates plaintext secrets against a [`PolicyContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordPolicy {
    context: PolicyContext,
}

impl PasswordPolicy {
    /// Create a policy from its configuration.
    pub fn new(context: PolicyContext) -> Self {
        Self { context }
    }

    /// The policy configuration.
    pub fn context(&self) -> &PolicyContext {
        &self.context
    }

    /// Composite strength score for a secret, independent of pass/fail.
    pub fn score(secret: &str) -> u32 {
        let length = secret.chars().count().min(LENGTH_CREDIT_CAP) as u32;
        let classes = CharClasses::scan(secret).count();

        let mut score = length * POINTS_PER_CHAR + classes * POINTS_PER_CLASS;
        if classes == 1 {
            score = score.saturating_sub(SINGLE_CLASS_PENALTY);
        }
        score.min(MAX_SCORE)
    }

    /// Evaluate a secret.
    pub fn evaluate(&self, secret: &str) -> PolicyResult {
        let ctx = &self.context;
        let length = secret.chars().count();
        let mut violations = Vec::new();

        // Required tests
        if length < ctx.min_length {
            violations.push(format!(
                "The password must be at least {} characters long.",
                ctx.min_length
            ));
        }
        if length > ctx.max_length {
            violations.push(format!(
                "The password must be fewer than {} characters.",
                ctx.max_length
            ));
        }
        if has_repeated_run(secret) {
            violations.push(
                "The password may not contain sequences of three or more repeated characters."
                    .to_string(),
            );
        }

        let lowered = secret.to_lowercase();
        for word in &ctx.banned_words {
            let word = word.trim().to_lowercase();
            if !word.is_empty() && lowered.contains(&word) {
                violations.push(format!("The password may not contain the word \"{}\".", word));
            }
        }

        // Optional tests, waived for passphrases
        let is_passphrase = ctx.allow_passphrases && length >= ctx.min_phrase_length;
        if !is_passphrase {
            let classes = CharClasses::scan(secret);
            let optional = [
                (classes.lowercase, "The password must contain at least one lowercase letter."),
                (classes.uppercase, "The password must contain at least one uppercase letter."),
                (classes.digit, "The password must contain at least one number."),
                (classes.symbol, "The password must contain at least one special character."),
            ];

            let passed = optional.iter().filter(|(ok, _)| *ok).count();
            if passed < ctx.min_optional_tests {
                violations.extend(
                    optional
                        .iter()
                        .filter(|(ok, _)| !*ok)
                        .map(|(_, message)| message.to_string()),
                );
            }
        }

        let score = Self::score(secret);
        if score < ctx.min_score {
            violations.push(format!(
                "The password is not strong enough (score {} of required {}).",
                score, ctx.min_score
            ));
        }

        PolicyResult {
            passed: violations.is_empty(),
            violations,
            score,
            is_passphrase,
        }
    }
}

/// Whether `secret` contains a character followed by two or more repeats of itself.
pub fn has_repeated_run(secret: &str) -> bool {
    let mut previous = None;
    let mut run = 0usize;
    for c in secret.chars() {
        if Some(c) == previous {
            run += 1;
            if run >= 3 {
                return true;
            }
        } else {
            previous = Some(c);
            run = 1;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password_passes() {
        let result = PasswordPolicy::default().evaluate("Str0ng_P@ss");
        assert!(result.passed, "{:?}", result.violations);
        assert!(!result.is_passphrase);
    }

    #[test]
    fn test_short_password_reports_every_rule() {
        let result = PasswordPolicy::default().evaluate("abc");
        assert!(!result.passed);
        assert_eq!(
            result.violations,
            vec![
                "The password must be at least 10 characters long.".to_string(),
                "The password must contain at least one uppercase letter.".to_string(),
                "The password must contain at least one number.".to_string(),
                "The password must contain at least one special character.".to_string(),
                "The password is not strong enough (score 4 of required 50).".to_string(),
            ]
        );
    }

    #[test]
    fn test_too_long_password() {
        let policy = PasswordPolicy::new(PolicyContext {
            max_length: 24,
            ..PolicyContext::default()
        });
        let result = policy.evaluate(&"aB3$".repeat(7));
        assert!(!result.passed);
        assert_eq!(
            result.violations,
            vec!["The password must be fewer than 24 characters.".to_string()]
        );
    }

    #[test]
    fn test_repeated_characters_fail() {
        let result = PasswordPolicy::default().evaluate("Aaa1!xyzzzQ");
        assert!(!result.passed);
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("three or more repeated")));
    }

    #[test]
    fn test_passphrase_skips_optional_tests() {
        let result = PasswordPolicy::default().evaluate("correct horse battery staple");
        assert!(result.is_passphrase);
        assert!(result.passed, "{:?}", result.violations);
    }

    #[test]
    fn test_passphrases_can_be_disabled() {
        let policy = PasswordPolicy::new(PolicyContext {
            allow_passphrases: false,
            ..PolicyContext::default()
        });
        let result = policy.evaluate("correct horse battery staple");
        assert!(!result.passed);
        assert_eq!(result.violations.len(), 2);
    }

    #[test]
    fn test_min_optional_tests_threshold() {
        let policy = PasswordPolicy::new(PolicyContext {
            min_optional_tests: 3,
            ..PolicyContext::default()
        });
        // lowercase + uppercase + digit, no symbol
        assert!(policy.evaluate("Abcdefgh12").passed);
        // only lowercase + digit
        let result = policy.evaluate("abcdefgh12");
        assert_eq!(
            result.violations,
            vec![
                "The password must contain at least one uppercase letter.".to_string(),
                "The password must contain at least one special character.".to_string(),
            ]
        );
    }

    #[test]
    fn test_banned_words_are_case_insensitive() {
        let policy = PasswordPolicy::new(PolicyContext {
            banned_words: vec!["Torrent".into(), " ".into()],
            ..PolicyContext::default()
        });
        let result = policy.evaluate("MyT0rrent!TORRENT#");
        assert!(!result.passed);
        assert_eq!(
            result.violations,
            vec!["The password may not contain the word \"torrent\".".to_string()]
        );
    }

    #[test]
    fn test_score_table() {
        assert_eq!(PasswordPolicy::score(""), 0);
        // 4 chars, one class: 12 + 10 - 15 -> 7
        assert_eq!(PasswordPolicy::score("abcd"), 7);
        // 10 chars, four classes: 30 + 40
        assert_eq!(PasswordPolicy::score("Str0ng_P@s"), 70);
        // capped length credit and total
        assert_eq!(PasswordPolicy::score(&"aB3$".repeat(20)), 100);
    }

    #[test]
    fn test_score_threshold_is_enforced() {
        let policy = PasswordPolicy::new(PolicyContext {
            min_score: 90,
            ..PolicyContext::default()
        });
        let result = policy.evaluate("Str0ng_P@ss");
        assert_eq!(
            result.violations,
            vec!["The password is not strong enough (score 73 of required 90).".to_string()]
        );
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let policy = PasswordPolicy::default();
        assert_eq!(policy.evaluate("hello world"), policy.evaluate("hello world"));
    }

    #[test]
    fn test_has_repeated_run() {
        assert!(!has_repeated_run(""));
        assert!(!has_repeated_run("aabbaa"));
        assert!(has_repeated_run("xaaay"));
        assert!(has_repeated_run("1111"));
        assert!(!has_repeated_run("aAa"));
    }

    #[test]
    fn test_context_deserializes_with_defaults() {
        let ctx: PolicyContext = serde_json::from_str(r#"{"min_length": 12}"#).unwrap();
        assert_eq!(ctx.min_length, 12);
        assert_eq!(ctx.max_length, 128);
        assert_eq!(ctx.min_optional_tests, 4);
    }
}
