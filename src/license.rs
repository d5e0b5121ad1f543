//! License record and status.

use crate::codec::payload::clamp_major;
use crate::protocol::bundle::IssuedCredential;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel `max_major_version` for lifetime licenses.
pub const LIFETIME_MAJOR_VERSION: u8 = 255;

/// License status. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// Usable and activatable.
    Active,
    /// Withdrawn by an operator.
    Revoked,
    /// Past its term.
    Expired,
    /// Payment returned.
    Refunded,
}

impl LicenseStatus {
    /// Whether a license in this status may be activated or served.
    #[must_use]
    pub fn allows_activation(&self) -> bool {
        match self {
            Self::Active => true,
            Self::Revoked | Self::Expired | Self::Refunded => false,
        }
    }

    /// User-facing explanation for a license that cannot be activated.
    #[must_use]
    pub fn inactive_message(&self) -> &'static str {
        match self {
            Self::Refunded => "This license has been refunded and can no longer be activated.",
            Self::Revoked => "This license has been revoked.",
            Self::Expired => "This license has expired.",
            Self::Active => "This license is not active.",
        }
    }

    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
            Self::Refunded => "refunded",
        }
    }
}

/// Base64 copies of the exact bytes produced at issuance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseMeta {
    /// Standard base64 of the 42-byte payload.
    pub payload: String,
    /// Standard base64 of the 64-byte signature.
    pub signature: String,
}

/// A persisted license row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// License UUID.
    pub id: String,
    /// Originating order UUID.
    pub order_id: String,
    /// Current status.
    pub status: LicenseStatus,
    /// Highest app major version covered; 255 means lifetime.
    pub max_major_version: u8,
    /// First successful binding time.
    pub activated_at: Option<DateTime<Utc>>,
    /// Bound device, non-lifetime licenses only.
    pub device_id: Option<String>,
    /// Accepted binding events. Never decreases.
    pub activation_count: u32,
    /// Signed artifacts re-served on activation.
    pub meta: LicenseMeta,
    /// SHA-256 hex of the canonical key.
    pub key_hash: String,
    /// Human-facing key.
    pub key_plain: String,
}

impl License {
    /// A fresh, unactivated license without credentials.
    ///
    /// `max_major_version` is clamped to 1..=255 exactly as the payload
    /// encoder clamps it, so the row and its payload never disagree.
    pub fn new(id: impl Into<String>, order_id: impl Into<String>, max_major_version: i64) -> Self {
        Self {
            id: id.into(),
            order_id: order_id.into(),
            status: LicenseStatus::Active,
            max_major_version: clamp_major(max_major_version),
            activated_at: None,
            device_id: None,
            activation_count: 0,
            meta: LicenseMeta::default(),
            key_hash: String::new(),
            key_plain: String::new(),
        }
    }

    /// Attach issued credentials and the lookup hash of the key.
    pub fn attach_credential(&mut self, credential: &IssuedCredential, key_hash: String) {
        self.key_plain = credential.key.clone();
        self.key_hash = key_hash;
        self.meta = LicenseMeta {
            payload: STANDARD.encode(credential.payload),
            signature: STANDARD.encode(credential.signature),
        };
    }

    /// Lifetime licenses accept any major version and any number of devices.
    #[must_use]
    pub fn is_lifetime(&self) -> bool {
        self.max_major_version == LIFETIME_MAJOR_VERSION
    }

    /// Whether a device binding (or lifetime activation) has happened.
    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.activated_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_active_allows_activation() {
        assert!(LicenseStatus::Active.allows_activation());
        assert!(!LicenseStatus::Revoked.allows_activation());
        assert!(!LicenseStatus::Expired.allows_activation());
        assert!(!LicenseStatus::Refunded.allows_activation());
    }

    #[test]
    fn test_inactive_messages_are_distinct() {
        let messages = [
            LicenseStatus::Refunded.inactive_message(),
            LicenseStatus::Revoked.inactive_message(),
            LicenseStatus::Expired.inactive_message(),
        ];
        assert!(messages[0].contains("refunded"));
        assert!(messages[1].contains("revoked"));
        assert!(messages[2].contains("expired"));
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&LicenseStatus::Refunded).unwrap();
        assert_eq!(json, r#""refunded""#);
        let parsed: LicenseStatus = serde_json::from_str(r#""revoked""#).unwrap();
        assert_eq!(parsed, LicenseStatus::Revoked);
        assert_eq!(LicenseStatus::Expired.as_str(), "expired");
    }

    #[test]
    fn test_new_license_is_unbound() {
        let license = License::new("a", "b", 2);
        assert_eq!(license.status, LicenseStatus::Active);
        assert!(!license.is_activated());
        assert!(!license.is_lifetime());
        assert_eq!(license.activation_count, 0);
        assert!(license.device_id.is_none());
    }

    #[test]
    fn test_lifetime_sentinel() {
        assert!(License::new("a", "b", 255).is_lifetime());
        // Out-of-range majors clamp into the payload byte, landing on lifetime.
        assert!(License::new("a", "b", 999).is_lifetime());
        assert_eq!(License::new("a", "b", 0).max_major_version, 1);
    }
}
