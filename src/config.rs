//! Keyward configuration.

use crate::KeywardError;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::time::Duration;

/// Default number of key characters between hyphens.
pub const DEFAULT_KEY_GROUP_SIZE: usize = 5;

/// Default lifetime of a cached validity answer.
pub const DEFAULT_VALIDITY_TTL: Duration = Duration::from_secs(60);

/// Default upper bound on cached validity answers.
pub const DEFAULT_VALIDITY_CACHE_CAPACITY: u64 = 10_000;

/// Configuration for issuing and verifying license credentials.
///
/// Key material is provisioned out of band. Issuance hosts carry both keys;
/// verification-only hosts carry just the public key.
#[derive(Debug, Clone)]
pub struct KeywardConfig {
    /// Ed25519 secret key, base64 of the 64-byte seed + public key form.
    /// SECURITY: never log this value.
    pub private_key_b64: Option<String>,

    /// Ed25519 public key, base64 of 32 bytes.
    pub public_key_b64: Option<String>,

    /// Product identifier echoed in activation responses (e.g., "desktop-app").
    pub product: String,

    /// Characters per hyphen-separated key group. Zero disables grouping.
    pub key_group_size: usize,

    /// How long a download-gating validity answer may be served from cache.
    pub validity_ttl: Duration,

    /// Most validity answers held at once; unknown keys are cached too.
    pub validity_cache_capacity: u64,
}

impl Default for KeywardConfig {
    fn default() -> Self {
        Self {
            private_key_b64: None,
            public_key_b64: None,
            product: String::new(),
            key_group_size: DEFAULT_KEY_GROUP_SIZE,
            validity_ttl: DEFAULT_VALIDITY_TTL,
            validity_cache_capacity: DEFAULT_VALIDITY_CACHE_CAPACITY,
        }
    }
}

impl KeywardConfig {
    /// Load configuration from `KEYWARD_*` environment variables.
    ///
    /// Unset numeric variables fall back to their defaults; set but
    /// unparseable ones are a configuration error.
    pub fn from_env() -> Result<Self, KeywardError> {
        let mut config = Self {
            private_key_b64: non_empty_var("KEYWARD_PRIVATE_KEY"),
            public_key_b64: non_empty_var("KEYWARD_PUBLIC_KEY"),
            product: non_empty_var("KEYWARD_PRODUCT").unwrap_or_default(),
            ..Self::default()
        };

        if let Some(raw) = non_empty_var("KEYWARD_KEY_GROUP_SIZE") {
            config.key_group_size = raw.parse().map_err(|_| {
                KeywardError::ConfigError(format!("KEYWARD_KEY_GROUP_SIZE is not a number: {}", raw))
            })?;
        }

        if let Some(raw) = non_empty_var("KEYWARD_VALIDITY_TTL_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                KeywardError::ConfigError(format!(
                    "KEYWARD_VALIDITY_TTL_SECS is not a number: {}",
                    raw
                ))
            })?;
            config.validity_ttl = Duration::from_secs(secs);
        }

        if let Some(raw) = non_empty_var("KEYWARD_VALIDITY_CACHE_CAPACITY") {
            config.validity_cache_capacity = raw.parse().map_err(|_| {
                KeywardError::ConfigError(format!(
                    "KEYWARD_VALIDITY_CACHE_CAPACITY is not a number: {}",
                    raw
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for obvious errors.
    ///
    /// Only checks shape (base64, decoded length). Whether the bytes form a
    /// usable Ed25519 key is decided by the signer.
    pub fn validate(&self) -> Result<(), KeywardError> {
        if let Some(private_key) = &self.private_key_b64 {
            check_key_length("private key", private_key, 64)?;
        }
        if let Some(public_key) = &self.public_key_b64 {
            check_key_length("public key", public_key, 32)?;
        }
        if self.private_key_b64.is_none() && self.public_key_b64.is_none() {
            return Err(KeywardError::ConfigError(
                "at least one of private_key_b64 or public_key_b64 must be set".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn check_key_length(label: &str, value: &str, expected: usize) -> Result<(), KeywardError> {
    let bytes = STANDARD
        .decode(value.trim())
        .map_err(|e| KeywardError::ConfigError(format!("{} is not valid base64: {}", label, e)))?;
    if bytes.len() != expected {
        return Err(KeywardError::ConfigError(format!(
            "{} must decode to {} bytes, got {}",
            label,
            expected,
            bytes.len()
        )));
    }
    Ok(())
}
