//! Key policy engine - the main public API for Keywarden.
//!
//! The `KeyPolicyEngine` binds one [`KeyPolicy`] to a clock and exposes:
//! - Key generation with optional call-time overrides
//! - Key validation with a single human-readable verdict

use crate::clock::{Clock, SystemClock};
use crate::config::PolicyConfig;
use crate::keys::generator::{generate_key, GenerateOptions};
use crate::keys::validator::{validate_key, Rejection, ValidationResult};
use crate::policy::rules::KeyPolicy;
use crate::KeywardenError;
use std::sync::Arc;

/// Interface applications register in their composition root.
///
/// Object safe, so it can be shared as `Arc<dyn ApiKeyService>`.
pub trait ApiKeyService: Send + Sync {
    /// Generate a key, applying `options` over the policy.
    fn generate(&self, options: &GenerateOptions) -> Result<String, KeywardenError>;

    /// Validate a key against the policy.
    fn validate(&self, candidate: &str) -> ValidationResult;
}

/// Generates and validates keys for one policy.
///
/// Create one instance at startup and share it; every call is independent.
pub struct KeyPolicyEngine {
    policy: KeyPolicy,
    clock: Arc<dyn Clock>,
}

impl KeyPolicyEngine {
    /// Create an engine from configuration.
    ///
    /// Uses the system clock for expiration checks.
    ///
    /// # Errors
    /// * `ConfigError` - the allowed-characters pattern does not compile
    pub fn new(config: PolicyConfig) -> Result<Self, KeywardenError> {
        Ok(Self::from_policy(KeyPolicy::from_config(&config)?))
    }

    /// Create an engine from configuration loaded with [`PolicyConfig::load`].
    pub fn from_default_sources() -> Result<Self, KeywardenError> {
        Self::new(PolicyConfig::load()?)
    }

    /// Create an engine for an already compiled policy.
    pub fn from_policy(policy: KeyPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    /// Create an engine with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock(
        config: PolicyConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, KeywardenError> {
        Ok(Self::with_clock(KeyPolicy::from_config(&config)?, clock))
    }

    fn with_clock(policy: KeyPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    /// Generate a key.
    ///
    /// # Errors
    /// * `InvalidArgument` - effective length does not exceed the prefix length
    /// * `InvalidArgument` - effective alphabet is empty
    pub fn generate(&self, options: &GenerateOptions) -> Result<String, KeywardenError> {
        generate_key(&self.policy, options)
    }

    /// Generate a key using only the policy settings.
    pub fn generate_default(&self) -> Result<String, KeywardenError> {
        self.generate(&GenerateOptions::default())
    }

    /// Validate a key.
    pub fn validate(&self, candidate: &str) -> ValidationResult {
        validate_key(&self.policy, candidate, self.clock.as_ref())
    }

    /// Validate a key that may be absent (e.g. a missing header).
    ///
    /// `None` is reported like an empty key.
    pub fn validate_optional(&self, candidate: Option<&str>) -> ValidationResult {
        match candidate {
            Some(candidate) => self.validate(candidate),
            None => ValidationResult::rejected(Rejection::Empty),
        }
    }

    /// The policy this engine enforces.
    pub fn policy(&self) -> &KeyPolicy {
        &self.policy
    }
}

impl ApiKeyService for KeyPolicyEngine {
    fn generate(&self, options: &GenerateOptions) -> Result<String, KeywardenError> {
        KeyPolicyEngine::generate(self, options)
    }

    fn validate(&self, candidate: &str) -> ValidationResult {
        KeyPolicyEngine::validate(self, candidate)
    }
}
