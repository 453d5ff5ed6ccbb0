//! Compiled key policy.
//!
//! A [`KeyPolicy`] is the immutable, ready-to-use form of a
//! [`PolicyConfig`]: the allowed-characters pattern is compiled once and the
//! generation alphabet is split into characters.

use crate::config::PolicyConfig;
use crate::KeywardenError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Length used for generation when neither the policy nor the caller sets one.
pub const DEFAULT_KEY_LENGTH: usize = 32;

/// Default whitelist: ASCII letters, digits, `-` and `_`.
pub const DEFAULT_ALLOWED_CHARS_PATTERN: &str = r"^[a-zA-Z0-9-_]+$";

/// Default generation alphabet (64 characters).
pub const DEFAULT_GENERATION_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

static DEFAULT_ALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| {
    compile_allowed_chars(DEFAULT_ALLOWED_CHARS_PATTERN).expect("default pattern compiles")
});

/// Anchor `pattern` so it has to match the whole candidate.
fn compile_allowed_chars(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

/// Immutable policy keys are generated and judged against.
#[derive(Debug, Clone)]
pub struct KeyPolicy {
    prefix: String,
    length: Option<usize>,
    allowed_chars_pattern: String,
    allowed_chars: Regex,
    alphabet: Vec<char>,
    expiration: Option<DateTime<Utc>>,
    require_prefix: bool,
}

impl KeyPolicy {
    /// Compile a policy from configuration.
    ///
    /// # Errors
    /// * `ConfigError` - `allowed_chars_pattern` is not a valid regex
    ///
    /// A `length` that does not exceed the prefix length and an empty
    /// alphabet are accepted here; generation reports them.
    pub fn from_config(config: &PolicyConfig) -> Result<Self, KeywardenError> {
        let allowed_chars = compile_allowed_chars(&config.allowed_chars_pattern).map_err(|e| {
            KeywardenError::ConfigError(format!(
                "allowed_chars_pattern '{}' is not a valid regex: {}",
                config.allowed_chars_pattern, e
            ))
        })?;

        Ok(Self {
            prefix: config.prefix.clone(),
            length: config.length,
            allowed_chars_pattern: config.allowed_chars_pattern.clone(),
            allowed_chars,
            alphabet: config.generation_alphabet.chars().collect(),
            expiration: config.expiration,
            require_prefix: config.require_prefix,
        })
    }

    /// Configured prefix (may be empty).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Configured total length, if any.
    pub fn length(&self) -> Option<usize> {
        self.length
    }

    /// Length to generate when the caller does not override it.
    pub fn generation_length(&self) -> usize {
        self.length.unwrap_or(DEFAULT_KEY_LENGTH)
    }

    /// The allowed-characters pattern as configured (before anchoring).
    pub fn allowed_chars_pattern(&self) -> &str {
        &self.allowed_chars_pattern
    }

    /// Characters random key material is drawn from.
    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Expiration instant, if any.
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// Whether the prefix is mandatory on candidates.
    pub fn require_prefix(&self) -> bool {
        self.require_prefix
    }

    /// The prefix validation has to enforce, if any.
    ///
    /// `None` when the prefix is not required or is empty.
    pub fn enforced_prefix(&self) -> Option<&str> {
        if self.require_prefix && !self.prefix.is_empty() {
            Some(&self.prefix)
        } else {
            None
        }
    }

    /// Whether the whole candidate matches the allowed-characters pattern.
    pub fn allows_characters(&self, candidate: &str) -> bool {
        self.allowed_chars.is_match(candidate)
    }

    /// Whether keys are expired at `now`. The expiration instant itself is
    /// still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|expiration| expiration < now)
    }
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            length: None,
            allowed_chars_pattern: DEFAULT_ALLOWED_CHARS_PATTERN.to_string(),
            allowed_chars: DEFAULT_ALLOWED_CHARS.clone(),
            alphabet: DEFAULT_GENERATION_ALPHABET.chars().collect(),
            expiration: None,
            require_prefix: true,
        }
    }
}

impl TryFrom<&PolicyConfig> for KeyPolicy {
    type Error = KeywardenError;

    fn try_from(config: &PolicyConfig) -> Result<Self, Self::Error> {
        Self::from_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_policy() -> KeyPolicy {
        KeyPolicy::from_config(&PolicyConfig {
            prefix: "api_".to_string(),
            length: Some(12),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_matches_default_config() {
        let compiled = KeyPolicy::from_config(&PolicyConfig::default()).unwrap();
        let default = KeyPolicy::default();

        assert_eq!(compiled.prefix(), default.prefix());
        assert_eq!(compiled.length(), default.length());
        assert_eq!(compiled.alphabet(), default.alphabet());
        assert_eq!(compiled.allowed_chars_pattern(), default.allowed_chars_pattern());
        assert_eq!(compiled.require_prefix(), default.require_prefix());
    }

    #[test]
    fn test_default_alphabet_passes_default_pattern() {
        let policy = KeyPolicy::default();
        let alphabet: String = policy.alphabet().iter().collect();
        assert_eq!(alphabet.len(), 64);
        assert!(policy.allows_characters(&alphabet));
    }

    #[test]
    fn test_default_pattern_rejects_other_characters() {
        let policy = KeyPolicy::default();
        assert!(!policy.allows_characters("abc def"));
        assert!(!policy.allows_characters("abc.def"));
        assert!(!policy.allows_characters("schlüssel"));
        assert!(!policy.allows_characters(""));
    }

    #[test]
    fn test_unanchored_pattern_must_match_whole_key() {
        let policy = KeyPolicy::from_config(&PolicyConfig {
            allowed_chars_pattern: "[a-f0-9]+".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert!(policy.allows_characters("deadbeef"));
        assert!(!policy.allows_characters("deadbeefXYZ"));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let result = KeyPolicy::from_config(&PolicyConfig {
            allowed_chars_pattern: "(".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(KeywardenError::ConfigError(msg)) if msg.contains("(")));
    }

    #[test]
    fn test_enforced_prefix() {
        assert_eq!(api_policy().enforced_prefix(), Some("api_"));
        assert_eq!(KeyPolicy::default().enforced_prefix(), None);

        let optional = KeyPolicy::from_config(&PolicyConfig {
            prefix: "api_".to_string(),
            require_prefix: false,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(optional.enforced_prefix(), None);
    }

    #[test]
    fn test_generation_length_falls_back_to_default() {
        assert_eq!(api_policy().generation_length(), 12);
        assert_eq!(KeyPolicy::default().generation_length(), DEFAULT_KEY_LENGTH);
    }

    #[test]
    fn test_expiration_boundary() {
        let expiration = DateTime::parse_from_rfc3339("2025-12-31T23:59:59Z")
            .unwrap()
            .with_timezone(&Utc);
        let policy = KeyPolicy::from_config(&PolicyConfig {
            expiration: Some(expiration),
            ..Default::default()
        })
        .unwrap();

        assert!(!policy.is_expired_at(expiration - chrono::Duration::seconds(1)));
        assert!(!policy.is_expired_at(expiration));
        assert!(policy.is_expired_at(expiration + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_no_expiration_never_expires() {
        let far_future = Utc::now() + chrono::Duration::days(365 * 100);
        assert!(!KeyPolicy::default().is_expired_at(far_future));
    }
}
