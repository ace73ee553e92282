//! Secret generation.
//!
//! Generated secrets are drawn from an alphabet without visually confusable
//! characters, using a cryptographically secure RNG and uniform (rejection
//! sampled) indexing. A candidate is only returned once it satisfies the
//! supplied [`PasswordPolicy`].

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::policy::{has_repeated_run, PasswordPolicy};

/// Letters and digits, minus `i l o I L O 0 1`.
pub const ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyzABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length bounds and retry budget for generated secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Smallest target length drawn per attempt.
    pub min_length: usize,
    /// Largest target length drawn per attempt.
    pub max_length: usize,
    /// Minimum length a candidate must keep after repeated runs are stripped.
    pub floor: usize,
    /// Attempts before giving up with [`CoreError::GenerationUnsatisfiable`].
    pub max_attempts: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_length: 20,
            max_length: 40,
            floor: 20,
            max_attempts: 64,
        }
    }
}

/// Mints high-entropy secrets that satisfy a password policy.
#[derive(Debug, Clone, Default)]
pub struct SecretGenerator {
    config: GeneratorConfig,
}

impl SecretGenerator {
    /// Create a generator with the given bounds.
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// The generator configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a secret using the operating system's CSPRNG.
    pub fn generate(&self, policy: &PasswordPolicy) -> Result<String> {
        self.generate_with_rng(&mut OsRng, policy)
    }

    /// Generate a secret with a caller-supplied cryptographic RNG.
    pub fn generate_with_rng<R>(&self, rng: &mut R, policy: &PasswordPolicy) -> Result<String>
    where
        R: RngCore + CryptoRng,
    {
        if !self.is_satisfiable(policy) {
            return Err(CoreError::GenerationUnsatisfiable { attempts: 0 });
        }

        let cfg = &self.config;
        for _ in 0..cfg.max_attempts {
            let length = rng.gen_range(cfg.min_length..=cfg.max_length);
            let raw: String = (0..length)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
                .collect();

            let candidate = strip_repeated_runs(&raw);
            if candidate.len() >= cfg.floor
                && !has_repeated_run(&candidate)
                && policy.evaluate(&candidate).passed
            {
                return Ok(candidate);
            }
        }

        Err(CoreError::GenerationUnsatisfiable {
            attempts: cfg.max_attempts,
        })
    }

    /// Reject configurations no candidate from [`ALPHABET`] could ever satisfy.
    fn is_satisfiable(&self, policy: &PasswordPolicy) -> bool {
        let cfg = &self.config;
        let ctx = policy.context();

        if cfg.min_length > cfg.max_length || cfg.floor > cfg.max_length {
            return false;
        }
        if cfg.max_length < ctx.min_length || cfg.floor > ctx.max_length {
            return false;
        }

        // The alphabet covers three of the four character classes.
        let always_passphrase = ctx.allow_passphrases && cfg.floor >= ctx.min_phrase_length;
        always_passphrase || ctx.min_optional_tests <= 3
    }
}

/// Remove every run of three or more identical characters.
///
/// Removal can join characters that form a new run; callers re-check with
/// [`has_repeated_run`].
pub fn strip_repeated_runs(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());

    let mut start = 0;
    while start < chars.len() {
        let mut end = start + 1;
        while end < chars.len() && chars[end] == chars[start] {
            end += 1;
        }
        if end - start < 3 {
            out.extend(&chars[start..end]);
        }
        start = end;
    }

    out
}
