//! The identity write pipeline.
//!
//! Every write goes through the same ordered stages:
//!
//! ```text
//! validate -> policy-check -> hash -> recompute -> commit
//! ```
//!
//! A stage that fails stops the pipeline before anything is committed, so a
//! rejected secret never touches the stored record. A registration hands the
//! whole record to the store in one call. Later writes commit a targeted
//! [`FieldUpdate`]: a password change writes only the credential pair, and
//! bookkeeping writes never carry one, so they cannot undo a password change
//! that committed after they loaded the record.

use std::sync::Arc;

use tracing::{debug, info, warn};
use warden_core::{
    candidate_username, validate_username, Credential, PasswordPolicy, PolicyResult, Role,
    SecretGenerator, TransferStats, UsernameRules,
};
use warden_store::{
    FieldUpdate, IdentityRecord, IdentityStore, IdentityStoreExt, InsertResult, LOCAL_PROVIDER,
};

use crate::config::WardenConfig;
use crate::error::{Result, WardenError};

/// Violation reported when a local identity is registered without a password.
pub const PASSWORD_REQUIRED_MESSAGE: &str = "A password is required for local accounts.";

/// One stage of the write pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    /// Check the record's shape and username.
    Validate,
    /// Evaluate a new secret against the password policy.
    PolicyCheck,
    /// Derive a fresh credential for a new secret.
    Hash,
    /// Recompute derived metrics.
    Recompute,
    /// Hand the record to the store.
    Commit,
}

impl WriteStage {
    /// All stages in execution order.
    pub const ORDER: [WriteStage; 5] = [
        WriteStage::Validate,
        WriteStage::PolicyCheck,
        WriteStage::Hash,
        WriteStage::Recompute,
        WriteStage::Commit,
    ];

    /// Stage name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            WriteStage::Validate => "validate",
            WriteStage::PolicyCheck => "policy-check",
            WriteStage::Hash => "hash",
            WriteStage::Recompute => "recompute",
            WriteStage::Commit => "commit",
        }
    }
}

/// Input for registering a new identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    /// Requested username; trimmed and lowercased before use.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Name shown to other users. Defaults to the username.
    pub display_name: Option<String>,
    /// Authentication provider.
    pub provider: String,
    /// Plaintext password, required for the local provider.
    pub password: Option<String>,
}

impl NewIdentity {
    /// A local identity with a password.
    pub fn local(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            display_name: None,
            provider: LOCAL_PROVIDER.to_string(),
            password: Some(password.into()),
        }
    }

    /// An identity authenticated by an external provider, without a password.
    pub fn external(
        username: impl Into<String>,
        email: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            display_name: None,
            provider: provider.into(),
            password: None,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

#[derive(Debug, Clone)]
enum CommitMode {
    Insert,
    /// Replace the credential staged by the hash stage.
    Credential,
    /// Apply a bookkeeping change to the stored record.
    Bookkeeping(FieldUpdate),
}

/// A record on its way through the pipeline.
struct PendingWrite {
    record: IdentityRecord,
    secret: Option<String>,
    mode: CommitMode,
}

/// Runs identity writes through the pipeline against an [`IdentityStore`].
pub struct IdentityService<S: IdentityStore> {
    store: Arc<S>,
    policy: PasswordPolicy,
    generator: SecretGenerator,
    username_rules: UsernameRules,
    bootstrap_role: Role,
    default_roles: Vec<Role>,
    max_username_attempts: u32,
    max_registration_retries: u32,
}

impl<S: IdentityStore> IdentityService<S> {
    /// Create a service owning `store`.
    pub fn new(store: S, config: &WardenConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create a service over a shared store.
    pub fn with_shared_store(store: Arc<S>, config: &WardenConfig) -> Self {
        Self {
            store,
            policy: PasswordPolicy::new(config.policy.clone()),
            generator: SecretGenerator::new(config.generator.clone()),
            username_rules: config.username_rules(),
            bootstrap_role: config.bootstrap_role.clone(),
            default_roles: config.default_roles.clone(),
            max_username_attempts: config.max_username_attempts,
            max_registration_retries: config.max_registration_retries,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The password policy in force.
    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new identity.
    ///
    /// The first identity stored is given the bootstrap role instead of the
    /// default roles.
    pub async fn register(&self, new: NewIdentity) -> Result<IdentityRecord> {
        let username = candidate_username(&new.username, None);
        self.register_as(username, new).await
    }

    /// Find a free username derived from `base`.
    ///
    /// Tries `base`, `base1`, `base2`, ... The answer is only a hint: another
    /// writer may claim it before this caller does.
    pub async fn find_unique_username(&self, base: &str) -> Result<String> {
        self.store
            .first_free_username(base, self.max_username_attempts)
            .await?
            .ok_or_else(|| WardenError::UsernameExhausted {
                base: base.to_string(),
                attempts: self.max_username_attempts,
            })
    }

    /// Register under the first free username derived from `new.username`.
    ///
    /// If another writer claims the allocated name first, allocation and
    /// insert are retried a bounded number of times.
    pub async fn register_with_unique_username(&self, new: NewIdentity) -> Result<IdentityRecord> {
        let mut attempt = 0;
        loop {
            let username = self.find_unique_username(&new.username).await?;
            match self.register_as(username, new.clone()).await {
                Err(WardenError::UsernameTaken(taken)) if attempt < self.max_registration_retries => {
                    attempt += 1;
                    warn!(username = %taken, attempt, "username claimed concurrently, retrying");
                }
                other => return other,
            }
        }
    }

    async fn register_as(&self, username: String, new: NewIdentity) -> Result<IdentityRecord> {
        let mut record = IdentityRecord::new(username, new.email, now_millis());
        record.provider = new.provider;
        record.roles = self.default_roles.clone();
        if let Some(display_name) = new.display_name {
            record.display_name = display_name;
        }

        self.run(PendingWrite {
            record,
            secret: new.password,
            mode: CommitMode::Insert,
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Credentials
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluate a candidate secret without storing anything.
    pub fn evaluate_password(&self, secret: &str) -> PolicyResult {
        self.policy.evaluate(secret)
    }

    /// Replace an identity's password.
    pub async fn change_password(&self, username: &str, new_password: &str) -> Result<IdentityRecord> {
        let record = self.load(username).await?;
        self.run(PendingWrite {
            record,
            secret: Some(new_password.to_string()),
            mode: CommitMode::Credential,
        })
        .await
    }

    /// Replace an identity's password with a generated one and return it.
    pub async fn reset_password(&self, username: &str) -> Result<String> {
        let record = self.load(username).await?;
        let secret = self.generate_password()?;

        self.run(PendingWrite {
            record,
            secret: Some(secret.clone()),
            mode: CommitMode::Credential,
        })
        .await?;

        info!(username, "password reset");
        Ok(secret)
    }

    /// Mint a secret that satisfies the password policy.
    pub fn generate_password(&self) -> Result<String> {
        Ok(self.generator.generate(&self.policy)?)
    }

    /// Check a plaintext against the stored credential.
    ///
    /// Unknown usernames and identities without a credential never
    /// authenticate.
    pub async fn authenticate(&self, username: &str, plaintext: &str) -> Result<bool> {
        let username = candidate_username(username, None);
        let Some(credential) = self
            .store
            .find_by_username(&username)
            .await?
            .and_then(|record| record.credential)
        else {
            debug!(username = %username, "no credential to authenticate against");
            return Ok(false);
        };

        let plaintext = plaintext.to_string();
        let verified = tokio::task::spawn_blocking(move || credential.verify(&plaintext)).await?;

        debug!(username = %username, verified, "authentication attempt");
        Ok(verified)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bookkeeping
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the transfer counters.
    pub async fn update_transfer(
        &self,
        username: &str,
        uploaded: u64,
        downloaded: u64,
    ) -> Result<TransferStats> {
        let update = FieldUpdate::SetTransfer {
            uploaded,
            downloaded,
        };
        Ok(self.update(username, update).await?.transfer)
    }

    /// Add to the transfer counters.
    ///
    /// The addition happens in the store, so concurrent additions all count.
    pub async fn add_transfer(
        &self,
        username: &str,
        uploaded: u64,
        downloaded: u64,
    ) -> Result<TransferStats> {
        let update = FieldUpdate::AddTransfer {
            uploaded,
            downloaded,
        };
        Ok(self.update(username, update).await?.transfer)
    }

    /// Record a successful sign-in from `ip` at `at` (Unix ms).
    pub async fn record_sign_in(&self, username: &str, ip: &str, at: i64) -> Result<IdentityRecord> {
        let ip = (!ip.is_empty()).then(|| ip.to_string());
        self.update(username, FieldUpdate::SignIn { ip, at }).await
    }

    /// Look up an identity.
    pub async fn find(&self, username: &str) -> Result<Option<IdentityRecord>> {
        let username = candidate_username(username, None);
        Ok(self.store.find_by_username(&username).await?)
    }

    async fn load(&self, username: &str) -> Result<IdentityRecord> {
        self.find(username)
            .await?
            .ok_or_else(|| WardenError::IdentityNotFound(username.to_string()))
    }

    async fn update(&self, username: &str, update: FieldUpdate) -> Result<IdentityRecord> {
        let record = self.load(username).await?;
        self.run(PendingWrite {
            record,
            secret: None,
            mode: CommitMode::Bookkeeping(update),
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline
    // ─────────────────────────────────────────────────────────────────────────

    async fn run(&self, write: PendingWrite) -> Result<IdentityRecord> {
        let PendingWrite {
            mut record,
            mut secret,
            mode,
        } = write;

        for stage in WriteStage::ORDER {
            debug!(stage = stage.name(), username = %record.username, "write stage");
            match stage {
                WriteStage::Validate => self.validate(&record, secret.is_some(), &mode)?,
                WriteStage::PolicyCheck => {
                    if let Some(secret) = &secret {
                        self.check_policy(&record.username, secret)?;
                    }
                }
                WriteStage::Hash => {
                    if let Some(secret) = secret.take() {
                        let credential =
                            tokio::task::spawn_blocking(move || Credential::create(&secret))
                                .await??;
                        record.credential = Some(credential);
                    }
                }
                WriteStage::Recompute => {
                    record.transfer.recompute();
                    record.updated_at = now_millis();
                }
                WriteStage::Commit => self.commit(&mut record, &mode).await?,
            }
        }

        Ok(record)
    }

    fn validate(&self, record: &IdentityRecord, has_secret: bool, mode: &CommitMode) -> Result<()> {
        if record.username.is_empty() {
            return Err(WardenError::InvalidUsername("username is empty".into()));
        }
        let needs_secret = match mode {
            CommitMode::Insert => {
                if record.is_local() {
                    validate_username(&record.username, &self.username_rules)
                        .map_err(WardenError::InvalidUsername)?;
                }
                record.is_local()
            }
            CommitMode::Credential => true,
            CommitMode::Bookkeeping(_) => false,
        };
        if needs_secret && !has_secret {
            return Err(password_required());
        }
        Ok(())
    }

    fn check_policy(&self, username: &str, secret: &str) -> Result<()> {
        let result = self.policy.evaluate(secret);
        if result.passed {
            return Ok(());
        }
        debug!(
            username,
            violations = result.violations.len(),
            score = result.score,
            "secret rejected by policy"
        );
        Err(WardenError::PolicyViolation(result.violations))
    }

    async fn commit(&self, record: &mut IdentityRecord, mode: &CommitMode) -> Result<()> {
        match mode {
            CommitMode::Insert => {
                match self
                    .store
                    .insert_identity(record, Some(&self.bootstrap_role))
                    .await?
                {
                    InsertResult::Inserted { bootstrapped } => {
                        if bootstrapped {
                            record.roles = vec![self.bootstrap_role.clone()];
                            info!(
                                username = %record.username,
                                role = %self.bootstrap_role,
                                "first identity promoted to bootstrap role"
                            );
                        }
                        info!(username = %record.username, provider = %record.provider, "identity registered");
                        Ok(())
                    }
                    InsertResult::UsernameTaken => {
                        Err(WardenError::UsernameTaken(record.username.clone()))
                    }
                }
            }
            CommitMode::Credential => {
                let credential = record.credential.clone().ok_or_else(password_required)?;
                self.commit_update(record, FieldUpdate::Credential(credential))
                    .await
            }
            CommitMode::Bookkeeping(update) => self.commit_update(record, update.clone()).await,
        }
    }

    /// Commit a targeted update and adopt the record as the store now holds it.
    async fn commit_update(&self, record: &mut IdentityRecord, update: FieldUpdate) -> Result<()> {
        debug!(username = %record.username, update = update.kind(), "targeted update");
        match self
            .store
            .update_identity(&record.username, &update, record.updated_at)
            .await?
        {
            Some(committed) => {
                *record = committed;
                Ok(())
            }
            None => Err(WardenError::IdentityNotFound(record.username.clone())),
        }
    }
}

fn password_required() -> WardenError {
    WardenError::PolicyViolation(vec![PASSWORD_REQUIRED_MESSAGE.to_string()])
}

/// Current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_store::MemoryStore;

    const STRONG: &str = "Str0ng_P@ssw0rd";

    fn service() -> IdentityService<MemoryStore> {
        IdentityService::new(MemoryStore::new(), &WardenConfig::default())
    }

    #[test]
    fn test_stage_order() {
        let names: Vec<_> = WriteStage::ORDER.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            ["validate", "policy-check", "hash", "recompute", "commit"]
        );
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let service = service();
        let record = service
            .register(NewIdentity::local("Alice", "Alice@Example.com", STRONG))
            .await
            .unwrap();

        assert_eq!(record.username, "alice");
        assert_eq!(record.email, "alice@example.com");
        let credential = record.credential.as_ref().unwrap();
        assert_eq!(credential.salt().as_bytes().len(), warden_core::SALT_LEN);
        assert!(credential.verify(STRONG));

        let stored = service.find("alice").await.unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn test_first_identity_is_bootstrapped() {
        let service = service();
        let first = service
            .register(NewIdentity::local("first", "a@example.com", STRONG))
            .await
            .unwrap();
        let second = service
            .register(NewIdentity::local("second", "b@example.com", STRONG))
            .await
            .unwrap();

        assert_eq!(first.roles, vec![Role::admin()]);
        assert_eq!(second.roles, vec![Role::user()]);
    }

    #[tokio::test]
    async fn test_weak_password_is_rejected_without_writing() {
        let service = service();
        let err = service
            .register(NewIdentity::local("alice", "a@example.com", "abc"))
            .await
            .unwrap_err();

        match err {
            WardenError::PolicyViolation(violations) => assert!(!violations.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_local_registration_requires_password() {
        let service = service();
        let mut new = NewIdentity::local("alice", "a@example.com", "");
        new.password = None;

        let err = service.register(new).await.unwrap_err();
        assert!(matches!(err, WardenError::PolicyViolation(v) if v == [PASSWORD_REQUIRED_MESSAGE]));
    }

    #[tokio::test]
    async fn test_external_identity_needs_no_password() {
        let service = service();
        let record = service
            .register(NewIdentity::external("Bob_Github", "bob@example.com", "github"))
            .await
            .unwrap();
        assert_eq!(record.username, "bob_github");
        assert!(record.credential.is_none());
        assert!(!service.authenticate("bob_github", "anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_username_is_rejected() {
        let service = service();
        for name in ["ab", "admin", ".alice", "al..ice"] {
            let err = service
                .register(NewIdentity::local(name, "a@example.com", STRONG))
                .await
                .unwrap_err();
            assert!(matches!(err, WardenError::InvalidUsername(_)), "{name}");
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_taken() {
        let service = service();
        service
            .register(NewIdentity::local("alice", "a@example.com", STRONG))
            .await
            .unwrap();
        let err = service
            .register(NewIdentity::local("ALICE", "b@example.com", STRONG))
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::UsernameTaken(name) if name == "alice"));
    }

    #[tokio::test]
    async fn test_change_password_replaces_credential() {
        let service = service();
        let before = service
            .register(NewIdentity::local("alice", "a@example.com", STRONG))
            .await
            .unwrap();

        let after = service
            .change_password("alice", "An0ther-G00d-One")
            .await
            .unwrap();

        let old = before.credential.unwrap();
        let new = after.credential.unwrap();
        assert_ne!(old.salt(), new.salt());
        assert!(service.authenticate("alice", "An0ther-G00d-One").await.unwrap());
        assert!(!service.authenticate("alice", STRONG).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_change_keeps_old_credential() {
        let service = service();
        let before = service
            .register(NewIdentity::local("alice", "a@example.com", STRONG))
            .await
            .unwrap();

        let err = service.change_password("alice", "aaa").await.unwrap_err();
        assert!(matches!(err, WardenError::PolicyViolation(_)));

        let stored = service.find("alice").await.unwrap().unwrap();
        assert_eq!(stored.credential, before.credential);
    }

    #[tokio::test]
    async fn test_unknown_identity() {
        let service = service();
        assert!(!service.authenticate("nobody", STRONG).await.unwrap());
        assert!(matches!(
            service.change_password("nobody", STRONG).await,
            Err(WardenError::IdentityNotFound(_))
        ));
        assert!(matches!(
            service.update_transfer("nobody", 1, 1).await,
            Err(WardenError::IdentityNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_transfer_recomputes_ratio() {
        let service = service();
        service
            .register(NewIdentity::local("alice", "a@example.com", STRONG))
            .await
            .unwrap();

        let stats = service.update_transfer("alice", 150, 100).await.unwrap();
        assert_eq!(stats.ratio(), 1.5);

        let stats = service.add_transfer("alice", 0, 50).await.unwrap();
        assert_eq!(stats.downloaded(), 150);
        assert_eq!(stats.ratio(), 1.0);

        let stats = service.update_transfer("alice", 5, 0).await.unwrap();
        assert_eq!(stats.ratio(), -1.0);

        let stored = service.find("alice").await.unwrap().unwrap();
        assert_eq!(stored.transfer, stats);
    }

    #[tokio::test]
    async fn test_record_sign_in() {
        let service = service();
        service
            .register(NewIdentity::local("alice", "a@example.com", STRONG))
            .await
            .unwrap();

        service.record_sign_in("alice", "10.0.0.1", 1_000).await.unwrap();
        let record = service.record_sign_in("alice", "10.0.0.2", 2_000).await.unwrap();
        service.record_sign_in("alice", "10.0.0.1", 3_000).await.unwrap();

        assert_eq!(record.last_signed_at, Some(2_000));
        let stored = service.find("alice").await.unwrap().unwrap();
        assert_eq!(stored.last_signed_at, Some(3_000));
        assert_eq!(stored.signed_ips.len(), 2);
    }

    #[tokio::test]
    async fn test_reset_password_returns_working_secret() {
        let service = service();
        service
            .register(NewIdentity::local("alice", "a@example.com", STRONG))
            .await
            .unwrap();

        let secret = service.reset_password("alice").await.unwrap();
        assert!(service.evaluate_password(&secret).passed);
        assert!(service.authenticate("alice", &secret).await.unwrap());
        assert!(!service.authenticate("alice", STRONG).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_unique_username() {
        let service = service();
        service
            .register(NewIdentity::local("alice", "a@example.com", STRONG))
            .await
            .unwrap();
        service
            .register(NewIdentity::local("alice1", "b@example.com", STRONG))
            .await
            .unwrap();

        assert_eq!(service.find_unique_username("Alice").await.unwrap(), "alice2");
        assert_eq!(service.find_unique_username("bob").await.unwrap(), "bob");
    }

    #[tokio::test]
    async fn test_find_unique_username_exhausted() {
        let config = WardenConfig {
            max_username_attempts: 2,
            ..WardenConfig::default()
        };
        let service = IdentityService::new(MemoryStore::new(), &config);
        for name in ["alice", "alice1"] {
            service
                .register(NewIdentity::local(name, "a@example.com", STRONG))
                .await
                .unwrap();
        }

        let err = service.find_unique_username("alice").await.unwrap_err();
        assert!(matches!(
            err,
            WardenError::UsernameExhausted { ref base, attempts: 2 } if base == "alice"
        ));
        assert!(err.is_fault());
    }

    #[tokio::test]
    async fn test_register_with_unique_username() {
        let service = service();
        let first = service
            .register_with_unique_username(NewIdentity::local("carol", "a@example.com", STRONG))
            .await
            .unwrap();
        let second = service
            .register_with_unique_username(NewIdentity::local("carol", "b@example.com", STRONG))
            .await
            .unwrap();

        assert_eq!(first.username, "carol");
        assert_eq!(second.username, "carol1");
    }
}
