//! Keyward error types.
//!
//! These are the hard failures: malformed input, misconfiguration and
//! storage faults. Business outcomes of an activation attempt are not
//! errors; see [`crate::protocol::models::ActivationOutcome`].

use thiserror::Error;

/// Errors raised by the codecs, the signer and the license manager.
#[derive(Debug, Error)]
pub enum KeywardError {
    /// Configuration is invalid or key material is missing.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Binary payload has the wrong length or an unsupported version.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A UUID string could not be converted to 16 raw bytes.
    #[error("Invalid UUID: {0}")]
    InvalidUuid(String),

    /// Nothing to encode.
    #[error("Cannot encode empty input")]
    EmptyInput,

    /// Key contains a character outside the key alphabet.
    #[error("Invalid license key character: {0:?}")]
    InvalidKeyCharacter(char),

    /// Trailing bits after the last full byte were not zero.
    #[error("Invalid license key padding")]
    InvalidPadding,

    /// Decoded key is not a payload and signature pair.
    #[error("License key length mismatch: expected {expected} bytes, got {actual}")]
    BundleLength {
        /// Expected decoded length in bytes.
        expected: usize,
        /// Actual decoded length in bytes.
        actual: usize,
    },

    /// Signature does not verify against the embedded payload.
    #[error("License signature verification failed")]
    SignatureInvalid,

    /// App version string has no leading major number.
    #[error("Invalid app version: {0:?}")]
    InvalidAppVersion(String),

    /// No license with the given id.
    #[error("License not found: {0}")]
    NotFound(String),

    /// Repository failure.
    #[error("Storage error: {0}")]
    Storage(String),
}
