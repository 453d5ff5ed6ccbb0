//! Key validation against a policy.
//!
//! Checks run in a fixed order and stop at the first failure, so a key
//! breaking several rules always reports the same one:
//!
//! 1. empty key
//! 2. missing prefix (only when the prefix is required and non-empty)
//! 3. length mismatch (only when a length is configured)
//! 4. characters outside the allowed pattern
//! 5. policy expired (only when an expiration is configured)

use crate::clock::Clock;
use crate::keys::fingerprint::fingerprint;
use crate::policy::rules::KeyPolicy;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// Message carried by a passing [`ValidationResult`].
pub const VALID_MESSAGE: &str = "API key is valid";

/// Why a key was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// No key was provided.
    #[error("API key is empty")]
    Empty,

    /// The key does not start with the required prefix.
    #[error("API key must start with '{prefix}'")]
    MissingPrefix {
        /// The required prefix.
        prefix: String,
    },

    /// The key has the wrong number of characters.
    #[error("API key must be {expected} characters long")]
    LengthMismatch {
        /// Configured length.
        expected: usize,
        /// Length of the candidate.
        actual: usize,
    },

    /// The key contains characters the policy does not allow.
    #[error("API key contains invalid characters")]
    InvalidCharacters,

    /// The policy expiration has passed.
    #[error("API key has expired")]
    Expired {
        /// When the policy expired.
        at: DateTime<Utc>,
    },
}

/// Outcome of validating one key. Carries exactly one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection: Option<Rejection>,
}

impl ValidationResult {
    /// A passing verdict.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: VALID_MESSAGE.to_string(),
            rejection: None,
        }
    }

    /// A failing verdict explained by `rejection`.
    pub fn rejected(rejection: Rejection) -> Self {
        Self {
            is_valid: false,
            message: rejection.to_string(),
            rejection: Some(rejection),
        }
    }

    /// Whether the key passed every check.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Human-readable explanation of the verdict.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The failed check, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }
}

impl From<Rejection> for ValidationResult {
    fn from(rejection: Rejection) -> Self {
        Self::rejected(rejection)
    }
}

/// Validate `candidate` against `policy`, reading the current time from `clock`.
///
/// Never fails: policy violations come back as a negative result.
pub fn validate_key<C: Clock + ?Sized>(
    policy: &KeyPolicy,
    candidate: &str,
    clock: &C,
) -> ValidationResult {
    match check_key(policy, candidate, clock) {
        Ok(()) => {
            info!("API key accepted: fingerprint={}", fingerprint(candidate));
            ValidationResult::valid()
        }
        Err(rejection) => {
            warn!(
                "API key rejected: {} (fingerprint={})",
                rejection,
                fingerprint(candidate)
            );
            ValidationResult::rejected(rejection)
        }
    }
}

/// Run the checks in order, stopping at the first failure.
pub fn check_key<C: Clock + ?Sized>(
    policy: &KeyPolicy,
    candidate: &str,
    clock: &C,
) -> Result<(), Rejection> {
    // 1. Something to check
    if candidate.is_empty() {
        return Err(Rejection::Empty);
    }

    // 2. Prefix
    if let Some(prefix) = policy.enforced_prefix() {
        if !candidate.starts_with(prefix) {
            return Err(Rejection::MissingPrefix {
                prefix: prefix.to_string(),
            });
        }
    }

    // 3. Length
    if let Some(expected) = policy.length() {
        let actual = candidate.chars().count();
        if actual != expected {
            return Err(Rejection::LengthMismatch { expected, actual });
        }
    }

    // 4. Character whitelist
    if !policy.allows_characters(candidate) {
        return Err(Rejection::InvalidCharacters);
    }

    // 5. Expiration
    if let Some(at) = policy.expiration() {
        if clock.has_passed(at) {
            return Err(Rejection::Expired { at });
        }
    }

    Ok(())
}
