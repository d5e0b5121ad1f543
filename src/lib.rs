//! # Keyward
//!
//! **Offline-verifiable license keys with single-device activation.**
//!
//! Keyward issues license keys that carry their own proof: each key is a
//! fixed 42-byte payload and its Ed25519 signature, encoded in a
//! human-typable Base32 alphabet. A client holding only the public key can
//! check a key without a network call; a server holding the license store
//! binds each key to one device.
//!
//! ## Features
//!
//! - **Self-verifying keys** - payload and signature travel together in the key
//! - **Typo-tolerant input** - case, spacing and dashes are ignored on decode
//! - **Device binding** - first activation wins, same-device retries replay
//! - **Lifetime licenses** - no version gate, no device limit
//! - **Race-safe activation** - the check-then-bind sequence runs under a row lock
//! - **Validity cache** - download gating answers cached briefly, dropped on status change
//!
//! ## Quickstart
//!
//! ```no_run
//! use keyward::{ActivationRequest, KeywardConfig, LicenseManager, MemoryLicenseStore};
//!
//! fn main() -> Result<(), keyward::KeywardError> {
//!     let config = KeywardConfig::from_env()?;
//!     let manager = LicenseManager::new(config, MemoryLicenseStore::new())?;
//!
//!     let license = manager.issue("9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d", 2)?;
//!     println!("key: {}", license.key_plain);
//!
//!     let outcome = manager.activate(&ActivationRequest::new(
//!         &license.key_plain,
//!         "2.1.0",
//!         Some("device-fingerprint"),
//!     ))?;
//!     println!("activated: {}", outcome.is_success());
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! Keyward protects against:
//! - **Forged keys** - a key not signed by the configured private key never activates
//! - **Key sharing** - a non-lifetime key binds to the first device that activates it
//! - **Activation races** - concurrent first activations produce exactly one winner
//!
//! Keyward does **not** prevent binary patching of the client, and lookups
//! are not rate limited.
//!
//! ## Configuration
//!
//! - `KEYWARD_PRIVATE_KEY` - base64 Ed25519 keypair (64 bytes), needed to issue
//! - `KEYWARD_PUBLIC_KEY` - base64 Ed25519 public key (32 bytes), needed to verify
//! - `KEYWARD_PRODUCT` - product name echoed in activation responses
//! - `KEYWARD_VALIDITY_CACHE_CAPACITY` - most download-gating answers held in memory
//!
//! See [`KeywardConfig`] for full documentation.

#![warn(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Codec layer
pub mod codec;

// Crypto layer
pub mod crypto;

// Domain model
pub mod license;

// Protocol layer
pub mod protocol;

// Policy layer
pub mod policy;

// Storage layer
pub mod store;

// Cache layer
pub mod cache;

// Manager (main public API)
pub mod manager;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use config::KeywardConfig;
pub use crypto::signer::LicenseSigner;
pub use errors::KeywardError;
pub use license::{License, LicenseStatus};
pub use manager::LicenseManager;
pub use protocol::bundle::CredentialBundle;
pub use protocol::models::{
    ActivationErrorCode, ActivationOutcome, ActivationRejection, ActivationRequest,
    ActivationResponse, ErrorResponse,
};
pub use store::{LicenseRepository, MemoryLicenseStore};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
