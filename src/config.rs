//! Key policy configuration.
//!
//! [`PolicyConfig`] is the raw, serde-facing form of a key policy. It is
//! usually read once at startup through [`PolicyLoader`], which layers
//! configuration files and environment variables with the `config` crate,
//! and then compiled into a [`KeyPolicy`](crate::KeyPolicy).

use crate::policy::rules::{
    KeyPolicy, DEFAULT_ALLOWED_CHARS_PATTERN, DEFAULT_GENERATION_ALPHABET,
};
use crate::KeywardenError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Section name the policy is read from.
pub const DEFAULT_SECTION: &str = "api_key";

/// Environment variable prefix (`KEYWARDEN__API_KEY__LENGTH=40`).
pub const ENV_PREFIX: &str = "KEYWARDEN";

/// Separator between env prefix, section and field.
pub const ENV_SEPARATOR: &str = "__";

/// Policy settings as found in configuration.
///
/// Every field is optional in the source; absent fields take the
/// [`Default`] value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Leading substring of every key (e.g. "api_"). Empty means no prefix.
    pub prefix: String,

    /// Total key length including the prefix.
    /// Unset means any length is accepted and 32 is generated.
    pub length: Option<usize>,

    /// Regex every key must match in full.
    #[serde(alias = "allowed_chars_regex")]
    pub allowed_chars_pattern: String,

    /// Characters random key material is drawn from.
    #[serde(alias = "generation_chars")]
    pub generation_alphabet: String,

    /// Instant after which all keys are rejected.
    ///
    /// RFC 3339 (`2025-12-31T23:59:59Z`). Timestamps without an offset
    /// (`2025-12-31T23:59:59`) and plain dates are read as UTC.
    #[serde(alias = "expiration_date", deserialize_with = "deserialize_expiration")]
    pub expiration: Option<DateTime<Utc>>,

    /// Whether candidates must carry the prefix.
    pub require_prefix: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            length: None,
            allowed_chars_pattern: DEFAULT_ALLOWED_CHARS_PATTERN.to_string(),
            generation_alphabet: DEFAULT_GENERATION_ALPHABET.to_string(),
            expiration: None,
            require_prefix: true,
        }
    }
}

impl PolicyConfig {
    /// Load from `config/default.*`, `config/local.*` and `KEYWARDEN__API_KEY__*`.
    pub fn load() -> Result<Self, KeywardenError> {
        PolicyLoader::new().with_default_files().load()
    }

    /// Like [`load`](Self::load), plus `<config dir>/<namespace>/policy.*`
    /// from the user's platform config directory.
    pub fn discover(namespace: &str) -> Result<Self, KeywardenError> {
        PolicyLoader::new()
            .with_default_files()
            .with_user_config_dir(namespace)
            .load()
    }

    /// Check the configuration for errors that no call-time override can fix.
    ///
    /// Length and alphabet problems are deliberately left to generation time.
    pub fn validate(&self) -> Result<(), KeywardenError> {
        KeyPolicy::from_config(self).map(|_| ())
    }
}

/// Parse an expiration timestamp, reading offset-less forms as UTC.
pub fn parse_expiration(value: &str) -> Result<DateTime<Utc>, KeywardenError> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        });

    naive
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| {
            KeywardenError::ConfigError(format!("expiration '{}' is not a timestamp", value))
        })
}

fn deserialize_expiration<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_expiration(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

/// Layered configuration reader for [`PolicyConfig`].
///
/// Sources are applied in the order they are added; environment variables
/// always come last and win.
#[derive(Debug, Clone)]
pub struct PolicyLoader {
    section: String,
    files: Vec<(PathBuf, bool)>,
    env_enabled: bool,
    env_vars: Option<HashMap<String, String>>,
}

impl Default for PolicyLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyLoader {
    /// Loader reading the [`DEFAULT_SECTION`] from the process environment only.
    pub fn new() -> Self {
        Self {
            section: DEFAULT_SECTION.to_string(),
            files: Vec::new(),
            env_enabled: true,
            env_vars: None,
        }
    }

    /// Read the policy from another section.
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Add `config/default` and `config/local` (any supported format, both optional).
    pub fn with_default_files(mut self) -> Self {
        self.files.push((PathBuf::from("config/default"), false));
        self.files.push((PathBuf::from("config/local"), false));
        self
    }

    /// Add `<config dir>/<namespace>/policy` if a platform config dir exists.
    pub fn with_user_config_dir(mut self, namespace: &str) -> Self {
        if let Some(base) = dirs::config_dir() {
            self.files.push((base.join(namespace).join("policy"), false));
        }
        self
    }

    /// Add a configuration file that must exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push((path.into(), true));
        self
    }

    /// Add a configuration file that is skipped when missing.
    pub fn with_optional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push((path.into(), false));
        self
    }

    /// Read environment overrides from `vars` instead of the process environment.
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env_enabled = true;
        self.env_vars = Some(vars);
        self
    }

    /// Ignore environment variables entirely.
    pub fn without_env(mut self) -> Self {
        self.env_enabled = false;
        self.env_vars = None;
        self
    }

    /// Build the layered configuration and extract the policy section.
    ///
    /// A missing section yields [`PolicyConfig::default`].
    pub fn load(self) -> Result<PolicyConfig, KeywardenError> {
        let mut builder = config::Config::builder();

        for (path, required) in &self.files {
            builder = builder.add_source(config::File::from(path.as_path()).required(*required));
        }

        // Env values stay strings so "007" or "0123456789" survive intact;
        // numeric and boolean fields are converted during deserialization.
        if self.env_enabled {
            builder = builder.add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .source(self.env_vars),
            );
        }

        let settings = builder.build()?;
        let policy = match settings.get::<PolicyConfig>(&self.section) {
            Ok(policy) => policy,
            Err(config::ConfigError::NotFound(_)) => PolicyConfig::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            "Loaded key policy from section '{}' (prefix='{}', length={:?})",
            self.section,
            policy.prefix,
            policy.length
        );
        Ok(policy)
    }
}
