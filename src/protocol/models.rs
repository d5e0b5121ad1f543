//! Activation request/response structs and typed outcomes.

use crate::license::{License, LicenseStatus};
use serde::{Deserialize, Serialize};

/// Activation request as received from the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRequest {
    /// License key exactly as the user typed it.
    pub license_key: String,
    /// Running app version, e.g. `"1.4.2"` or `"v2.0.0-beta.1"`.
    pub app_version: String,
    /// Opaque device identifier. Ignored for lifetime licenses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl ActivationRequest {
    /// Convenience constructor.
    pub fn new(
        license_key: impl Into<String>,
        app_version: impl Into<String>,
        device_id: Option<&str>,
    ) -> Self {
        Self {
            license_key: license_key.into(),
            app_version: app_version.into(),
            device_id: device_id.map(String::from),
        }
    }
}

/// Successful activation projection.
///
/// Carries the original signed artifacts so the client can verify offline
/// without another round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationResponse {
    /// License id.
    pub id: String,
    /// Human-facing license key.
    pub key: String,
    /// Order id.
    pub order_id: String,
    /// License status (always `active` on success).
    pub status: LicenseStatus,
    /// First activation time, unix seconds.
    pub activated_at: i64,
    /// Highest covered major version; 255 means lifetime.
    pub max_major_version: u8,
    /// Product identifier.
    pub product: String,
    /// App version from the request.
    pub app_version: String,
    /// Base64 payload as issued.
    pub payload: String,
    /// Base64 signature as issued.
    pub signature: String,
}

impl ActivationResponse {
    /// Project an activated license row.
    pub fn from_license(license: &License, product: &str, app_version: &str) -> Self {
        Self {
            id: license.id.clone(),
            key: license.key_plain.clone(),
            order_id: license.order_id.clone(),
            status: license.status,
            activated_at: license.activated_at.map(|t| t.timestamp()).unwrap_or_default(),
            max_major_version: license.max_major_version,
            product: product.to_string(),
            app_version: app_version.to_string(),
            payload: license.meta.payload.clone(),
            signature: license.meta.signature.clone(),
        }
    }
}

/// Activation failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationErrorCode {
    /// No license for the key, or the key failed verification.
    LicenseNotFound,
    /// License status is not `active`.
    LicenseNotActive,
    /// Bound to a different device.
    LicenseAlreadyActivated,
    /// App major version exceeds what the license covers.
    LicenseVersionNotAllowed,
    /// App version has no leading major number.
    InvalidAppVersion,
}

impl ActivationErrorCode {
    /// Wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LicenseNotFound => "LICENSE_NOT_FOUND",
            Self::LicenseNotActive => "LICENSE_NOT_ACTIVE",
            Self::LicenseAlreadyActivated => "LICENSE_ALREADY_ACTIVATED",
            Self::LicenseVersionNotAllowed => "LICENSE_VERSION_NOT_ALLOWED",
            Self::InvalidAppVersion => "INVALID_APP_VERSION",
        }
    }

    /// Suggested HTTP status for the boundary layer.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::LicenseNotFound => 404,
            Self::LicenseNotActive => 403,
            Self::LicenseAlreadyActivated => 409,
            Self::LicenseVersionNotAllowed => 403,
            Self::InvalidAppVersion => 422,
        }
    }
}

/// A rejected activation: machine code plus user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationRejection {
    /// Failure code.
    pub code: ActivationErrorCode,
    /// Human-readable explanation.
    pub message: String,
}

impl ActivationRejection {
    /// Build a rejection.
    pub fn new(code: ActivationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn not_found() -> Self {
        Self::new(ActivationErrorCode::LicenseNotFound, "License not found.")
    }

    /// Boundary body for this rejection.
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            error: self.message.clone(),
            error_code: self.code,
        }
    }
}

/// Failure body: `{success: false, error, error_code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Human-readable explanation.
    pub error: String,
    /// Machine-readable code.
    pub error_code: ActivationErrorCode,
}

/// Result of an activation attempt that reached a business decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// A binding event was recorded.
    Activated(ActivationResponse),
    /// Same device activated again; nothing changed.
    Replayed(ActivationResponse),
    /// A business rule refused the request.
    Rejected(ActivationRejection),
}

impl ActivationOutcome {
    /// Whether the client should treat this as success.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    /// Success projection, for either success variant.
    pub fn response(&self) -> Option<&ActivationResponse> {
        match self {
            Self::Activated(response) | Self::Replayed(response) => Some(response),
            Self::Rejected(_) => None,
        }
    }

    /// Failure code, if rejected.
    pub fn error_code(&self) -> Option<ActivationErrorCode> {
        match self {
            Self::Rejected(rejection) => Some(rejection.code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_device_id_optional() {
        let parsed: ActivationRequest =
            serde_json::from_str(r#"{"license_key":"AAAAA","app_version":"1.0.0"}"#).unwrap();
        assert_eq!(parsed.device_id, None);

        let json = serde_json::to_string(&ActivationRequest::new("K", "1", Some("dev-A"))).unwrap();
        assert!(json.contains(r#""device_id":"dev-A""#));
    }

    #[test]
    fn test_error_codes_serialize_screaming() {
        for code in [
            ActivationErrorCode::LicenseNotFound,
            ActivationErrorCode::LicenseNotActive,
            ActivationErrorCode::LicenseAlreadyActivated,
            ActivationErrorCode::LicenseVersionNotAllowed,
            ActivationErrorCode::InvalidAppVersion,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_error_response_shape() {
        let rejection = ActivationRejection::new(
            ActivationErrorCode::LicenseAlreadyActivated,
            "License already activated on another device.",
        );
        let value = serde_json::to_value(rejection.to_error_response()).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error_code"], "LICENSE_ALREADY_ACTIVATED");
        assert_eq!(value["error"], "License already activated on another device.");
        assert_eq!(rejection.code.http_status(), 409);
    }

    #[test]
    fn test_response_projection() {
        let mut license = License::new(
            "3f2504e0-4f89-41d3-9a0c-0305e82c3301",
            "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d",
            3,
        );
        license.activated_at = Some(chrono::DateTime::from_timestamp(1_736_942_400, 0).unwrap());
        license.key_plain = "AAAAA-BBBBB".to_string();
        license.meta.payload = "cGF5bG9hZA==".to_string();

        let response = ActivationResponse::from_license(&license, "desktop", "3.1.0");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "active");
        assert_eq!(value["activated_at"], 1_736_942_400);
        assert_eq!(value["max_major_version"], 3);
        assert_eq!(value["product"], "desktop");
        assert_eq!(value["app_version"], "3.1.0");
        assert_eq!(value["key"], "AAAAA-BBBBB");
        assert_eq!(value["payload"], "cGF5bG9hZA==");
    }

    #[test]
    fn test_outcome_accessors() {
        let rejected = ActivationOutcome::Rejected(ActivationRejection::not_found());
        assert!(!rejected.is_success());
        assert!(rejected.response().is_none());
        assert_eq!(rejected.error_code(), Some(ActivationErrorCode::LicenseNotFound));
    }
}
