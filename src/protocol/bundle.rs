//! Credential bundle: payload ‖ signature, encoded as the human-facing key.

use crate::clock;
use crate::codec::{key, payload};
use crate::codec::payload::{LicensePayload, PAYLOAD_LEN};
use crate::config::DEFAULT_KEY_GROUP_SIZE;
use crate::crypto::signer::{LicenseSigner, SIGNATURE_LEN};
use crate::license::License;
use crate::KeywardError;
use chrono::{DateTime, Utc};

/// Decoded bundle length: 42-byte payload followed by a 64-byte signature.
pub const BUNDLE_LEN: usize = PAYLOAD_LEN + SIGNATURE_LEN;

/// Artifacts produced at issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    /// Human-facing license key.
    pub key: String,
    /// Signed payload bytes.
    pub payload: [u8; PAYLOAD_LEN],
    /// Detached signature over `payload`.
    pub signature: [u8; SIGNATURE_LEN],
}

/// Raw halves of a decoded key. Not yet verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBundle {
    /// Payload bytes as embedded in the key.
    pub payload: [u8; PAYLOAD_LEN],
    /// Signature bytes as embedded in the key.
    pub signature: [u8; SIGNATURE_LEN],
}

/// Produces and parses license keys.
#[derive(Debug, Clone)]
pub struct CredentialBundle {
    signer: LicenseSigner,
    group_size: usize,
}

impl CredentialBundle {
    /// Bundle with the default group size of five characters.
    pub fn new(signer: LicenseSigner) -> Self {
        Self::with_group_size(signer, DEFAULT_KEY_GROUP_SIZE)
    }

    /// Bundle with an explicit group size. Zero disables hyphenation.
    pub fn with_group_size(signer: LicenseSigner, group_size: usize) -> Self {
        Self { signer, group_size }
    }

    /// The signer this bundle signs and verifies with.
    pub fn signer(&self) -> &LicenseSigner {
        &self.signer
    }

    /// Characters per key group.
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Build, sign and encode the credential for `license`.
    ///
    /// # Errors
    /// * `InvalidUuid` - license or order id is malformed
    /// * `ConfigError` - no usable signing key
    pub fn create(
        &self,
        license: &License,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedCredential, KeywardError> {
        let payload = payload::encode(
            &license.id,
            &license.order_id,
            i64::from(license.max_major_version),
            clock::unix_seconds(issued_at),
        )?;
        let signature = self.signer.sign(&payload)?;

        let mut blob = Vec::with_capacity(BUNDLE_LEN);
        blob.extend_from_slice(&payload);
        blob.extend_from_slice(&signature);

        let key = key::encode(&blob, self.group_size)?;

        Ok(IssuedCredential {
            key,
            payload,
            signature,
        })
    }

    /// Split a key into its payload and signature halves.
    ///
    /// # Errors
    /// * `InvalidKeyCharacter` / `InvalidPadding` - not a well-formed key
    /// * `BundleLength` - decoded to anything other than 106 bytes
    pub fn decode(&self, license_key: &str) -> Result<DecodedBundle, KeywardError> {
        let blob = key::decode(license_key)?;
        if blob.len() != BUNDLE_LEN {
            return Err(KeywardError::BundleLength {
                expected: BUNDLE_LEN,
                actual: blob.len(),
            });
        }

        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&blob[..PAYLOAD_LEN]);
        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&blob[PAYLOAD_LEN..]);

        Ok(DecodedBundle { payload, signature })
    }

    /// Decode, verify and parse a key without touching any license store.
    ///
    /// This is the whole offline check a client performs.
    ///
    /// # Errors
    /// * any `decode` error
    /// * `SignatureInvalid` - signature does not cover the embedded payload
    /// * `InvalidPayload` - signed bytes are not a version 1 payload
    pub fn open(&self, license_key: &str) -> Result<LicensePayload, KeywardError> {
        let bundle = self.decode(license_key)?;
        if !self.signer.verify(&bundle.payload, &bundle.signature) {
            return Err(KeywardError::SignatureInvalid);
        }
        payload::decode(&bundle.payload)
    }

    /// Canonical form of a user-supplied key, as issued.
    pub fn canonical_key(&self, license_key: &str) -> String {
        key::canonicalize(license_key, self.group_size)
    }
}
