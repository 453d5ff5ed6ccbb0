//! Random key generation.

use crate::keys::fingerprint::fingerprint;
use crate::policy::rules::KeyPolicy;
use crate::KeywardenError;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng};
use std::borrow::Cow;
use tracing::info;

/// Call-time overrides for key generation.
///
/// Unset fields fall back to the policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Total key length including the prefix.
    pub length: Option<usize>,
    /// Prefix to use instead of the policy prefix.
    pub prefix: Option<String>,
    /// Alphabet to draw from instead of the policy alphabet.
    pub alphabet: Option<String>,
}

impl GenerateOptions {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the total length.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Override the prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Override the alphabet.
    pub fn with_alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.alphabet = Some(alphabet.into());
        self
    }
}

/// Generate a key with the OS random number generator.
///
/// # Errors
/// * `InvalidArgument` - effective length does not exceed the prefix length
/// * `InvalidArgument` - effective alphabet is empty
pub fn generate_key(
    policy: &KeyPolicy,
    options: &GenerateOptions,
) -> Result<String, KeywardenError> {
    generate_key_with_rng(policy, options, &mut OsRng)
}

/// Generate a key drawing from `rng`.
pub fn generate_key_with_rng<R: Rng + CryptoRng + ?Sized>(
    policy: &KeyPolicy,
    options: &GenerateOptions,
    rng: &mut R,
) -> Result<String, KeywardenError> {
    let prefix = options.prefix.as_deref().unwrap_or(policy.prefix());
    let length = options
        .length
        .unwrap_or_else(|| policy.generation_length());
    let alphabet: Cow<'_, [char]> = match &options.alphabet {
        Some(chars) => Cow::Owned(chars.chars().collect()),
        None => Cow::Borrowed(policy.alphabet()),
    };

    let prefix_len = prefix.chars().count();
    if length <= prefix_len {
        return Err(KeywardenError::InvalidArgument(format!(
            "key length ({}) must be greater than prefix length ({})",
            length, prefix_len
        )));
    }
    if alphabet.is_empty() {
        return Err(KeywardenError::InvalidArgument(
            "generation alphabet cannot be empty".to_string(),
        ));
    }

    let random_len = length - prefix_len;
    let index = Uniform::new(0, alphabet.len());

    let mut key = String::with_capacity(prefix.len() + random_len);
    key.push_str(prefix);
    key.extend(
        index
            .sample_iter(&mut *rng)
            .take(random_len)
            .map(|i| alphabet[i]),
    );

    info!(
        "Generated API key: prefix='{}', length={}, fingerprint={}",
        prefix,
        length,
        fingerprint(&key)
    );

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn api_policy() -> KeyPolicy {
        KeyPolicy::from_config(&PolicyConfig {
            prefix: "api_".to_string(),
            length: Some(12),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_uses_policy_prefix_and_length() {
        let key = generate_key(&api_policy(), &GenerateOptions::new()).unwrap();
        assert!(key.starts_with("api_"));
        assert_eq!(key.chars().count(), 12);
    }

    #[test]
    fn test_default_policy_generates_32_chars() {
        let key = generate_key(&KeyPolicy::default(), &GenerateOptions::new()).unwrap();
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let options = GenerateOptions::new()
            .with_length(20)
            .with_prefix("sk_")
            .with_alphabet("x");
        let key = generate_key(&api_policy(), &options).unwrap();
        assert_eq!(key, format!("sk_{}", "x".repeat(17)));
    }

    #[test]
    fn test_random_part_uses_alphabet() {
        let options = GenerateOptions::new().with_length(500).with_alphabet("ab01");
        let key = generate_key(&api_policy(), &options).unwrap();
        assert!(key["api_".len()..].chars().all(|c| "ab01".contains(c)));
    }

    #[test]
    fn test_multibyte_prefix_counts_chars() {
        let options = GenerateOptions::new().with_prefix("schlüssel_").with_length(16);
        let key = generate_key(&KeyPolicy::default(), &options).unwrap();
        assert!(key.starts_with("schlüssel_"));
        assert_eq!(key.chars().count(), 16);
    }

    #[test]
    fn test_length_not_exceeding_prefix_fails() {
        let options = GenerateOptions::new().with_length(2);
        let result = generate_key(&api_policy(), &options);
        assert!(matches!(result, Err(KeywardenError::InvalidArgument(_))));

        let options = GenerateOptions::new().with_length(4);
        let result = generate_key(&api_policy(), &options);
        assert!(matches!(result, Err(KeywardenError::InvalidArgument(_))));
    }

    #[test]
    fn test_length_one_past_prefix_succeeds() {
        let options = GenerateOptions::new().with_length(5);
        let key = generate_key(&api_policy(), &options).unwrap();
        assert_eq!(key.len(), 5);
    }

    #[test]
    fn test_empty_alphabet_fails() {
        let options = GenerateOptions::new().with_alphabet("");
        let result = generate_key(&api_policy(), &options);
        assert!(matches!(result, Err(KeywardenError::InvalidArgument(msg)) if msg.contains("alphabet")));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let policy = api_policy();
        let a = generate_key_with_rng(&policy, &GenerateOptions::new(), &mut StdRng::seed_from_u64(7))
            .unwrap();
        let b = generate_key_with_rng(&policy, &GenerateOptions::new(), &mut StdRng::seed_from_u64(7))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_keys_differ_between_calls() {
        let policy = KeyPolicy::default();
        let a = generate_key(&policy, &GenerateOptions::new()).unwrap();
        let b = generate_key(&policy, &GenerateOptions::new()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_every_alphabet_character_is_reachable() {
        let options = GenerateOptions::new().with_length(4000).with_alphabet("abcd");
        let key = generate_key(&KeyPolicy::default(), &options).unwrap();
        for c in "abcd".chars() {
            assert!(key.contains(c), "character {:?} never drawn", c);
        }
    }
}
