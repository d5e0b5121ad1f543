//! Shared test helpers for activation and credential tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::SigningKey;
use keyward::{KeywardConfig, LicenseManager, MemoryLicenseStore};

pub const ORDER_ID: &str = "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d";

/// Returns a deterministic Ed25519 signing key from a fixed seed.
pub fn test_signing_key() -> SigningKey {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    SigningKey::from_bytes(&seed)
}

/// Config carrying both halves of the test keypair.
pub fn test_config() -> KeywardConfig {
    let signing_key = test_signing_key();
    KeywardConfig {
        private_key_b64: Some(STANDARD.encode(signing_key.to_keypair_bytes())),
        public_key_b64: Some(STANDARD.encode(signing_key.verifying_key().to_bytes())),
        product: "desktop-app".to_string(),
        ..KeywardConfig::default()
    }
}

/// Config a client ships with: public key only.
pub fn verify_only_config() -> KeywardConfig {
    KeywardConfig {
        private_key_b64: None,
        ..test_config()
    }
}

/// Manager over a fresh in-memory store.
pub fn test_manager() -> LicenseManager<MemoryLicenseStore> {
    LicenseManager::new(test_config(), MemoryLicenseStore::new()).unwrap()
}
