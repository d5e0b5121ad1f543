//! License Manager - the main public API for Keyward.
//!
//! The `LicenseManager` ties the pieces together:
//! - Issuance of signed credentials
//! - Device activation under a row lock
//! - Cached validity checks for download gating
//! - Status changes with synchronous cache invalidation

use crate::cache::validity::ValidityCache;
use crate::clock::{Clock, SystemClock};
use crate::codec::payload::{self, LicensePayload};
use crate::config::KeywardConfig;
use crate::crypto::digest::{hash_license_key, key_fragment};
use crate::crypto::signer::LicenseSigner;
use crate::license::{License, LicenseStatus};
use crate::policy::access::{apply_binding, evaluate, parse_app_major, ActivationDecision};
use crate::protocol::bundle::CredentialBundle;
use crate::protocol::models::{
    ActivationErrorCode, ActivationOutcome, ActivationRejection, ActivationRequest,
    ActivationResponse,
};
use crate::store::LicenseRepository;
use crate::KeywardError;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use uuid::Uuid;

/// Main license manager for Keyward.
///
/// Create one instance per process and share it; every method takes
/// `&self` and is safe to call concurrently.
pub struct LicenseManager<R: LicenseRepository> {
    config: KeywardConfig,
    clock: Arc<dyn Clock>,
    bundle: CredentialBundle,
    repository: R,
    validity: ValidityCache,
}

impl<R: LicenseRepository> LicenseManager<R> {
    /// Create a license manager with the given configuration and store.
    ///
    /// Uses the system clock for time operations.
    ///
    /// # Errors
    /// Returns an error if configuration validation fails.
    pub fn new(config: KeywardConfig, repository: R) -> Result<Self, KeywardError> {
        config.validate()?;
        Ok(Self::with_clock(config, repository, Arc::new(SystemClock)))
    }

    /// Create a license manager with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock(
        config: KeywardConfig,
        repository: R,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, KeywardError> {
        config.validate()?;
        Ok(Self::with_clock(config, repository, clock))
    }

    fn with_clock(config: KeywardConfig, repository: R, clock: Arc<dyn Clock>) -> Self {
        let signer = LicenseSigner::from_config(&config);
        let bundle = CredentialBundle::with_group_size(signer, config.key_group_size);
        let validity = ValidityCache::new(
            config.validity_ttl,
            config.validity_cache_capacity,
            clock.clone(),
        );

        Self {
            config,
            clock,
            bundle,
            repository,
            validity,
        }
    }

    /// Issue and store a new license for an order.
    ///
    /// # Errors
    /// - `InvalidUuid` - `order_id` is not a UUID
    /// - `ConfigError` - no usable signing key
    /// - `Storage` - the row could not be stored
    pub fn issue(&self, order_id: &str, max_major_version: i64) -> Result<License, KeywardError> {
        let order_id = payload::bytes_to_uuid(&payload::uuid_to_bytes(order_id)?);
        let mut license = License::new(Uuid::new_v4().to_string(), order_id, max_major_version);

        let credential = self.bundle.create(&license, self.clock.now_utc())?;
        let key_hash = hash_license_key(&credential.key);
        license.attach_credential(&credential, key_hash);

        self.repository.insert(license.clone())?;

        tracing::info!(
            license_id = %license.id,
            order_id = %license.order_id,
            max_major_version = license.max_major_version,
            key = %key_fragment(&license.key_plain),
            "license issued"
        );

        Ok(license)
    }

    /// Activate a license on a device.
    ///
    /// Business refusals come back as [`ActivationOutcome::Rejected`];
    /// `Err` is reserved for storage failures.
    pub fn activate(&self, request: &ActivationRequest) -> Result<ActivationOutcome, KeywardError> {
        let fragment = key_fragment(&request.license_key);

        // Version first: a malformed version never costs a lookup.
        let app_major = match parse_app_major(&request.app_version) {
            Ok(major) => major,
            Err(_) => {
                tracing::debug!(key = %fragment, app_version = %request.app_version, "activation rejected: bad app version");
                return Ok(ActivationOutcome::Rejected(ActivationRejection::new(
                    ActivationErrorCode::InvalidAppVersion,
                    format!("Invalid app version: {}", request.app_version),
                )));
            }
        };

        let Some(snapshot) = self.lookup(&request.license_key)? else {
            tracing::debug!(key = %fragment, "activation rejected: unknown key");
            return Ok(ActivationOutcome::Rejected(ActivationRejection::not_found()));
        };

        let key_verified = self.key_matches_license(&request.license_key, &snapshot);
        let device_id = request.device_id.as_deref();
        let now = self.clock.now_utc();

        let locked = self.repository.with_license_locked(&snapshot.id, |license| {
            let decision = evaluate(license, key_verified, app_major, device_id);
            if decision == ActivationDecision::Bind {
                apply_binding(license, device_id, now);
            }
            (decision, license.clone())
        })?;

        let Some((decision, license)) = locked else {
            return Ok(ActivationOutcome::Rejected(ActivationRejection::not_found()));
        };

        let outcome = match decision {
            ActivationDecision::Bind => {
                tracing::info!(
                    license_id = %license.id,
                    status = ?license.status,
                    key = %fragment,
                    lifetime = license.is_lifetime(),
                    activation_count = license.activation_count,
                    "license activated"
                );
                ActivationOutcome::Activated(self.project(&license, &request.app_version))
            }
            ActivationDecision::Replay => {
                tracing::debug!(
                    license_id = %license.id,
                    status = ?license.status,
                    key = %fragment,
                    "activation replayed for bound device"
                );
                ActivationOutcome::Replayed(self.project(&license, &request.app_version))
            }
            ActivationDecision::Reject(rejection) => {
                if !key_verified && license.status.allows_activation() {
                    tracing::warn!(
                        license_id = %license.id,
                        status = ?license.status,
                        key = %fragment,
                        "activation rejected: key failed verification"
                    );
                } else {
                    tracing::debug!(
                        license_id = %license.id,
                        status = ?license.status,
                        key = %fragment,
                        code = rejection.code.as_str(),
                        "activation rejected"
                    );
                }
                ActivationOutcome::Rejected(rejection)
            }
        };

        Ok(outcome)
    }

    /// Whether a key currently grants access (download gating).
    ///
    /// Answers are cached for the configured TTL; status changes through
    /// this manager invalidate them immediately.
    pub fn check_validity(&self, license_key: &str) -> Result<bool, KeywardError> {
        let key_hash = self.key_hash(license_key);
        if let Some(valid) = self.validity.get(&key_hash) {
            return Ok(valid);
        }

        let valid = match self.repository.find_by_key_hash(&key_hash)? {
            Some(license) => {
                license.status.allows_activation() && self.key_matches_license(license_key, &license)
            }
            None => false,
        };

        self.validity.put(&key_hash, valid);
        Ok(valid)
    }

    /// Verify a key with the public key alone, as an offline client would.
    ///
    /// # Errors
    /// - decode errors for malformed keys
    /// - `SignatureInvalid` - not signed by the configured key
    pub fn verify_offline(&self, license_key: &str) -> Result<LicensePayload, KeywardError> {
        self.bundle.open(license_key)
    }

    /// Change a license's status and drop its cached validity.
    ///
    /// # Errors
    /// - `NotFound` - no license with this id
    pub fn set_status(&self, license_id: &str, status: LicenseStatus) -> Result<(), KeywardError> {
        let updated = self.repository.with_license_locked(license_id, |license| {
            let previous = license.status;
            license.status = status;
            (
                previous,
                license.key_hash.clone(),
                key_fragment(&license.key_plain),
            )
        })?;

        let Some((previous, key_hash, fragment)) = updated else {
            return Err(KeywardError::NotFound(license_id.to_string()));
        };

        self.validity.invalidate(&key_hash);

        tracing::info!(
            license_id = %license_id,
            key = %fragment,
            from = ?previous,
            to = ?status,
            "license status changed"
        );
        Ok(())
    }

    /// Revoke a license.
    pub fn revoke(&self, license_id: &str) -> Result<(), KeywardError> {
        self.set_status(license_id, LicenseStatus::Revoked)
    }

    /// Mark a license refunded.
    pub fn refund(&self, license_id: &str) -> Result<(), KeywardError> {
        self.set_status(license_id, LicenseStatus::Refunded)
    }

    /// Mark a license expired.
    pub fn expire(&self, license_id: &str) -> Result<(), KeywardError> {
        self.set_status(license_id, LicenseStatus::Expired)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &KeywardConfig {
        &self.config
    }

    /// Get the backing repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Get the credential bundle.
    pub fn bundle(&self) -> &CredentialBundle {
        &self.bundle
    }

    fn key_hash(&self, license_key: &str) -> String {
        hash_license_key(&self.bundle.canonical_key(license_key))
    }

    fn lookup(&self, license_key: &str) -> Result<Option<License>, KeywardError> {
        self.repository.find_by_key_hash(&self.key_hash(license_key))
    }

    /// Pure check that `license_key` is the genuine credential for `license`:
    /// it decodes, its signature verifies, its payload is the one stored at
    /// issuance, and the ids embedded in it are the row's own.
    fn key_matches_license(&self, license_key: &str, license: &License) -> bool {
        let Ok(decoded) = self.bundle.decode(license_key) else {
            return false;
        };

        if !self.bundle.signer().verify(&decoded.payload, &decoded.signature) {
            return false;
        }

        let stored_matches = STANDARD
            .decode(&license.meta.payload)
            .map(|stored| stored == decoded.payload)
            .unwrap_or(false);
        if !stored_matches {
            return false;
        }

        match payload::decode(&decoded.payload) {
            Ok(embedded) => {
                embedded.license_id == license.id && embedded.order_id == license.order_id
            }
            Err(_) => false,
        }
    }

    fn project(&self, license: &License, app_version: &str) -> ActivationResponse {
        ActivationResponse::from_license(license, &self.config.product, app_version)
    }
}
