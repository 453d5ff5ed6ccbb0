//! # Keywarden
//!
//! **Policy-driven API key generation and validation for Rust.**
//!
//! Keywarden generates opaque token-style API keys and checks candidate keys
//! against a configurable policy: prefix, length, character whitelist and
//! expiration.
//!
//! ## Features
//!
//! - **CSPRNG generation**: key material is drawn uniformly from the OS RNG
//! - **Deterministic verdicts**: checks run in a fixed order and return one message
//! - **Layered configuration**: files and `KEYWARDEN__*` environment variables
//! - **Log-safe**: keys are logged only as a short SHA-256 fingerprint
//!
//! ## Quickstart
//!
//! ```
//! use keywarden::{KeyPolicyEngine, PolicyConfig};
//!
//! fn main() -> Result<(), keywarden::KeywardenError> {
//!     let config = PolicyConfig {
//!         prefix: "api_".to_string(),
//!         length: Some(12),
//!         ..Default::default()
//!     };
//!
//!     let engine = KeyPolicyEngine::new(config)?;
//!     let key = engine.generate_default()?;
//!
//!     let result = engine.validate(&key);
//!     assert!(result.is_valid());
//!
//!     let result = engine.validate("api_1234 678");
//!     assert_eq!(result.message(), "API key contains invalid characters");
//!     Ok(())
//! }
//! ```
//!
//! ## Validation order
//!
//! 1. empty key
//! 2. missing prefix (when required and non-empty)
//! 3. length mismatch (when a length is configured)
//! 4. characters outside `allowed_chars_pattern`
//! 5. policy expired
//!
//! The first failing check determines the message.
//!
//! ## Configuration
//!
//! - `prefix`: leading substring of every key
//! - `length`: total key length including the prefix (32 generated if unset)
//! - `allowed_chars_pattern`: regex the whole key must match
//! - `generation_alphabet`: characters keys are drawn from
//! - `expiration`: RFC 3339 instant after which every key is rejected
//! - `require_prefix`: whether validation enforces the prefix
//!
//! See [`PolicyConfig`] and [`PolicyLoader`].

#![deny(warnings)]
#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Policy layer
pub mod policy;

// Generation and validation
pub mod keys;

// Engine (main public API)
pub mod engine;

// Optional integrations
#[cfg(feature = "telemetry")]
pub mod telemetry;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use config::{PolicyConfig, PolicyLoader};
pub use engine::{ApiKeyService, KeyPolicyEngine};
pub use errors::KeywardenError;
pub use keys::generator::GenerateOptions;
pub use keys::validator::{Rejection, ValidationResult};
pub use policy::rules::KeyPolicy;

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
