//! Ed25519 detached signatures over license payloads.
//!
//! Signing is an issuance-time operation and fails loudly when the secret
//! key is missing or malformed. Verification sits on the activation path
//! and fails closed: it answers `false` instead of returning an error.

use crate::config::KeywardConfig;
use crate::KeywardError;
use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

/// Ed25519 signature length in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Parse state of one configured key.
#[derive(Clone)]
enum KeySlot<K> {
    Missing,
    Invalid(String),
    Ready(K),
}

impl<K> std::fmt::Debug for KeySlot<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key bytes.
        match self {
            Self::Missing => f.write_str("Missing"),
            Self::Invalid(reason) => write!(f, "Invalid({})", reason),
            Self::Ready(_) => f.write_str("Ready"),
        }
    }
}

/// Signs and verifies license payloads with injected key material.
#[derive(Debug, Clone)]
pub struct LicenseSigner {
    signing: KeySlot<SigningKey>,
    verifying: KeySlot<VerifyingKey>,
}

impl LicenseSigner {
    /// Build a signer from base64 key material.
    ///
    /// Never fails: problems with either key are reported when that key is
    /// first needed.
    pub fn new(private_key_b64: Option<&str>, public_key_b64: Option<&str>) -> Self {
        Self {
            signing: private_key_b64.map_or(KeySlot::Missing, parse_signing_key),
            verifying: public_key_b64.map_or(KeySlot::Missing, parse_verifying_key),
        }
    }

    /// Build a signer from configuration.
    pub fn from_config(config: &KeywardConfig) -> Self {
        Self::new(
            config.private_key_b64.as_deref(),
            config.public_key_b64.as_deref(),
        )
    }

    /// Whether issuance is possible with this signer.
    pub fn can_sign(&self) -> bool {
        matches!(self.signing, KeySlot::Ready(_))
    }

    /// Produce a 64-byte detached signature.
    ///
    /// # Errors
    /// * `ConfigError` - no private key configured, or it is not a valid
    ///   64-byte Ed25519 secret key
    pub fn sign(&self, payload: &[u8]) -> Result<[u8; SIGNATURE_LEN], KeywardError> {
        match &self.signing {
            KeySlot::Ready(key) => Ok(key.sign(payload).to_bytes()),
            KeySlot::Missing => Err(KeywardError::ConfigError(
                "no license signing key configured".to_string(),
            )),
            KeySlot::Invalid(reason) => Err(KeywardError::ConfigError(format!(
                "license signing key unusable: {}",
                reason
            ))),
        }
    }

    /// Check a detached signature. Any failure is `false`.
    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        let KeySlot::Ready(key) = &self.verifying else {
            tracing::debug!("license verification without a usable public key");
            return false;
        };

        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };

        key.verify(payload, &signature).is_ok()
    }
}

fn parse_signing_key(b64: &str) -> KeySlot<SigningKey> {
    let bytes = match STANDARD.decode(b64.trim()) {
        Ok(bytes) => bytes,
        Err(e) => return KeySlot::Invalid(format!("invalid base64: {}", e)),
    };

    let Ok(keypair) = <[u8; 64]>::try_from(bytes.as_slice()) else {
        return KeySlot::Invalid(format!("expected 64 bytes, got {}", bytes.len()));
    };

    match SigningKey::from_keypair_bytes(&keypair) {
        Ok(key) => KeySlot::Ready(key),
        Err(_) => KeySlot::Invalid("public half does not match secret seed".to_string()),
    }
}

fn parse_verifying_key(b64: &str) -> KeySlot<VerifyingKey> {
    let bytes = match STANDARD.decode(b64.trim()) {
        Ok(bytes) => bytes,
        Err(e) => return KeySlot::Invalid(format!("invalid base64: {}", e)),
    };

    let Ok(raw) = <[u8; 32]>::try_from(bytes.as_slice()) else {
        return KeySlot::Invalid(format!("expected 32 bytes, got {}", bytes.len()));
    };

    match VerifyingKey::from_bytes(&raw) {
        Ok(key) => KeySlot::Ready(key),
        Err(_) => KeySlot::Invalid("not a valid Ed25519 point".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8032 test 1 seed (DO NOT USE IN PRODUCTION)
    const TEST_SEED: [u8; 32] = [
        0x9d, 0x61, 0xb1, 0x9d, 0xef, 0xfd, 0x5a, 0x60, 0xba, 0x84, 0x4a, 0xf4, 0x92, 0xec, 0x2c,
        0xc4, 0x44, 0x49, 0xc5, 0x69, 0x7b, 0x32, 0x69, 0x19, 0x70, 0x3b, 0xac, 0x03, 0x1c, 0xae,
        0x7f, 0x60,
    ];
    const TEST_PUBLIC_KEY_HEX: &str =
        "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    fn test_keys_b64() -> (String, String) {
        let signing_key = SigningKey::from_bytes(&TEST_SEED);
        (
            STANDARD.encode(signing_key.to_keypair_bytes()),
            STANDARD.encode(signing_key.verifying_key().to_bytes()),
        )
    }

    fn test_signer() -> LicenseSigner {
        let (private_b64, public_b64) = test_keys_b64();
        LicenseSigner::new(Some(&private_b64), Some(&public_b64))
    }

    #[test]
    fn test_public_key_matches_rfc_vector() {
        let (_, public_b64) = test_keys_b64();
        let bytes = STANDARD.decode(public_b64).unwrap();
        assert_eq!(hex::encode(bytes), TEST_PUBLIC_KEY_HEX);
    }

    #[test]
    fn test_sign_then_verify() {
        let signer = test_signer();
        let signature = signer.sign(b"payload").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signer.verify(b"payload", &signature));
    }

    #[test]
    fn test_rfc8032_empty_message_signature() {
        let signature = test_signer().sign(b"").unwrap();
        assert_eq!(
            hex::encode(signature),
            "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e06522490155\
             5fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b"
        );
    }

    #[test]
    fn test_every_bit_flip_fails() {
        let signer = test_signer();
        let payload = [0x42u8; 42];
        let signature = signer.sign(&payload).unwrap();

        for byte in 0..payload.len() {
            for bit in 0..8 {
                let mut tampered = payload;
                tampered[byte] ^= 1 << bit;
                assert!(!signer.verify(&tampered, &signature), "flip {byte}:{bit}");
            }
        }
    }

    #[test]
    fn test_verify_wrong_length_signature() {
        let signer = test_signer();
        assert!(!signer.verify(b"payload", &[0u8; 63]));
        assert!(!signer.verify(b"payload", &[]));
    }

    #[test]
    fn test_verify_without_public_key_is_false() {
        let (private_b64, _) = test_keys_b64();
        let signer = LicenseSigner::new(Some(&private_b64), None);
        let signature = signer.sign(b"payload").unwrap();
        assert!(!signer.verify(b"payload", &signature));
    }

    #[test]
    fn test_verify_with_malformed_public_key_is_false() {
        let signer = LicenseSigner::new(None, Some("@@not base64@@"));
        assert!(!signer.verify(b"payload", &[0u8; 64]));

        let signer = LicenseSigner::new(None, Some(&STANDARD.encode([1u8; 16])));
        assert!(!signer.verify(b"payload", &[0u8; 64]));
    }

    #[test]
    fn test_sign_without_private_key_errors() {
        let (_, public_b64) = test_keys_b64();
        let signer = LicenseSigner::new(None, Some(&public_b64));
        assert!(!signer.can_sign());
        assert!(matches!(
            signer.sign(b"payload"),
            Err(KeywardError::ConfigError(_))
        ));
    }

    #[test]
    fn test_sign_with_mismatched_keypair_errors() {
        let (private_b64, _) = test_keys_b64();
        let mut keypair = STANDARD.decode(private_b64).unwrap();
        keypair[63] ^= 0xff;
        let signer = LicenseSigner::new(Some(&STANDARD.encode(keypair)), None);
        assert!(matches!(
            signer.sign(b"payload"),
            Err(KeywardError::ConfigError(_))
        ));
    }

    #[test]
    fn test_debug_hides_key_material() {
        let rendered = format!("{:?}", test_signer());
        assert!(rendered.contains("Ready"));
        assert!(!rendered.contains("9d61"));
    }
}
