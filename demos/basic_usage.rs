//! Basic key generation and validation example.
//!
//! This example loads a policy from `config/` and `KEYWARDEN__API_KEY__*`
//! environment variables, generates a key and validates a few candidates.
//!
//! # Running
//!
//! ```bash
//! export KEYWARDEN__API_KEY__PREFIX="api_"
//! export KEYWARDEN__API_KEY__LENGTH=40
//! cargo run --example basic_usage --features telemetry
//! ```

use keywarden::telemetry::{init_logging, LogFormat};
use keywarden::{GenerateOptions, KeyPolicyEngine, KeywardenError, PolicyConfig};

fn main() {
    if let Err(e) = init_logging("info", LogFormat::Pretty) {
        eprintln!("Logging setup failed: {}", e);
    }

    let config = match PolicyConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let engine = match KeyPolicyEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Invalid policy: {}", e);
            std::process::exit(1);
        }
    };

    // Generate with the policy settings.
    // The key is shown once here; logs only carry its fingerprint.
    let key = match engine.generate_default() {
        Ok(key) => key,
        Err(KeywardenError::InvalidArgument(reason)) => {
            eprintln!("Policy cannot generate keys: {}", reason);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Generation error: {}", e);
            std::process::exit(1);
        }
    };
    println!("Generated key: {}", key);

    let result = engine.validate(&key);
    println!("Validation (generated): {} (valid: {})", result.message(), result.is_valid());

    let result = engine.validate("invalid key");
    println!("Validation (invalid): {} (valid: {})", result.message(), result.is_valid());

    // Call-time overrides
    match engine.generate(&GenerateOptions::new().with_prefix("tmp_").with_length(16)) {
        Ok(key) => println!("Temporary key: {}", key),
        Err(e) => eprintln!("Override rejected: {}", e),
    }
}
