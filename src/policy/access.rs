//! Activation eligibility rules.
//!
//! Pure functions over a license row. The caller holds the row lock; this
//! module only decides and, for [`apply_binding`], mutates the row it is
//! handed.
//!
//! Rule order matters and is fixed:
//! 1. status must be active
//! 2. the key must have verified
//! 3. non-lifetime licenses gate on app major version
//! 4. a bound non-lifetime license only replays for the bound device

use crate::license::License;
use crate::protocol::models::{ActivationErrorCode, ActivationRejection};
use crate::KeywardError;
use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

/// What the activation flow should do with a locked license row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationDecision {
    /// Record a binding event.
    Bind,
    /// Same device as the existing binding; succeed without mutation.
    Replay,
    /// Refuse.
    Reject(ActivationRejection),
}

/// Leading major number of an app version such as `"v2.3.1"`.
///
/// # Errors
/// * `InvalidAppVersion` - no leading digits after an optional `v`
pub fn parse_app_major(app_version: &str) -> Result<u64, KeywardError> {
    let trimmed = app_version.trim();
    let unprefixed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let digits_end = unprefixed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unprefixed.len());

    unprefixed[..digits_end]
        .parse::<u64>()
        .map_err(|_| KeywardError::InvalidAppVersion(app_version.to_string()))
}

/// Decide whether a device may activate `license`.
pub fn evaluate(
    license: &License,
    key_verified: bool,
    app_major: u64,
    device_id: Option<&str>,
) -> ActivationDecision {
    if !license.status.allows_activation() {
        return ActivationDecision::Reject(ActivationRejection::new(
            ActivationErrorCode::LicenseNotActive,
            license.status.inactive_message(),
        ));
    }

    if !key_verified {
        return ActivationDecision::Reject(ActivationRejection::not_found());
    }

    if license.is_lifetime() {
        return ActivationDecision::Bind;
    }

    if app_major > u64::from(license.max_major_version) {
        return ActivationDecision::Reject(ActivationRejection::new(
            ActivationErrorCode::LicenseVersionNotAllowed,
            format!(
                "This license supports up to version {}.x of the app.",
                license.max_major_version
            ),
        ));
    }

    if license.is_activated() {
        let bound = license.device_id.as_deref().unwrap_or_default();
        if devices_match(bound, device_id.unwrap_or_default()) {
            return ActivationDecision::Replay;
        }
        return ActivationDecision::Reject(ActivationRejection::new(
            ActivationErrorCode::LicenseAlreadyActivated,
            "This license is already activated on another device.",
        ));
    }

    ActivationDecision::Bind
}

/// Record a binding event on a row that [`evaluate`] cleared with `Bind`.
///
/// Non-lifetime rows bind the device (an absent id binds as empty, keeping
/// `device_id` set whenever `activated_at` is). Lifetime rows never bind a
/// device and keep their first activation time.
pub fn apply_binding(license: &mut License, device_id: Option<&str>, now: DateTime<Utc>) {
    if license.is_lifetime() {
        license.device_id = None;
        license.activated_at.get_or_insert(now);
    } else {
        license.device_id = Some(device_id.unwrap_or_default().to_string());
        license.activated_at = Some(now);
    }
    license.activation_count = license.activation_count.saturating_add(1);
}

/// Timing-safe device id comparison.
pub fn devices_match(bound: &str, supplied: &str) -> bool {
    bound.as_bytes().ct_eq(supplied.as_bytes()).into()
}
