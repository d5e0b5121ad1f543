//! Fixed-width binary license payload.
//!
//! Layout (42 bytes, big-endian):
//! ```text
//! offset len field
//!      0   1 format version (1)
//!      1  16 license UUID
//!     17  16 order UUID
//!     33   1 max major version, clamped to 1..=255
//!     34   8 issued_at, unix seconds (u64)
//! ```
//! No length prefixes, so verifiers need no shared schema code.

use crate::KeywardError;

/// The only defined payload format version.
pub const PAYLOAD_VERSION: u8 = 1;

/// Encoded payload length in bytes.
pub const PAYLOAD_LEN: usize = 42;

const LICENSE_ID_OFFSET: usize = 1;
const ORDER_ID_OFFSET: usize = 17;
const MAX_MAJOR_OFFSET: usize = 33;
const ISSUED_AT_OFFSET: usize = 34;

/// Decoded license payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicensePayload {
    /// Format version byte.
    pub version: u8,
    /// License id, canonical lowercase hyphenated form.
    pub license_id: String,
    /// Order id, canonical lowercase hyphenated form.
    pub order_id: String,
    /// Highest app major version the license covers (255 = lifetime).
    pub max_major_version: u8,
    /// Issue time, unix seconds.
    pub issued_at: u64,
}

/// Serialize license metadata into the 42-byte payload.
///
/// # Errors
/// * `InvalidUuid` - either id is not 32 hex digits once hyphens are removed
pub fn encode(
    license_id: &str,
    order_id: &str,
    max_major_version: i64,
    issued_at: u64,
) -> Result<[u8; PAYLOAD_LEN], KeywardError> {
    let mut buf = [0u8; PAYLOAD_LEN];
    buf[0] = PAYLOAD_VERSION;
    buf[LICENSE_ID_OFFSET..ORDER_ID_OFFSET].copy_from_slice(&uuid_to_bytes(license_id)?);
    buf[ORDER_ID_OFFSET..MAX_MAJOR_OFFSET].copy_from_slice(&uuid_to_bytes(order_id)?);
    buf[MAX_MAJOR_OFFSET] = clamp_major(max_major_version);
    buf[ISSUED_AT_OFFSET..].copy_from_slice(&issued_at.to_be_bytes());
    Ok(buf)
}

/// Parse a 42-byte payload.
///
/// # Errors
/// * `InvalidPayload` - wrong length or unsupported version
pub fn decode(bytes: &[u8]) -> Result<LicensePayload, KeywardError> {
    if bytes.len() != PAYLOAD_LEN {
        return Err(KeywardError::InvalidPayload(format!(
            "expected {} bytes, got {}",
            PAYLOAD_LEN,
            bytes.len()
        )));
    }

    let version = bytes[0];
    if version != PAYLOAD_VERSION {
        return Err(KeywardError::InvalidPayload(format!(
            "unsupported payload version {}",
            version
        )));
    }

    let mut license_id = [0u8; 16];
    license_id.copy_from_slice(&bytes[LICENSE_ID_OFFSET..ORDER_ID_OFFSET]);
    let mut order_id = [0u8; 16];
    order_id.copy_from_slice(&bytes[ORDER_ID_OFFSET..MAX_MAJOR_OFFSET]);
    let mut issued_at = [0u8; 8];
    issued_at.copy_from_slice(&bytes[ISSUED_AT_OFFSET..]);

    Ok(LicensePayload {
        version,
        license_id: bytes_to_uuid(&license_id),
        order_id: bytes_to_uuid(&order_id),
        max_major_version: bytes[MAX_MAJOR_OFFSET],
        issued_at: u64::from_be_bytes(issued_at),
    })
}

/// Clamp a major version into the single payload byte.
pub fn clamp_major(max_major_version: i64) -> u8 {
    max_major_version.clamp(1, 255) as u8
}

/// Convert a UUID string to its 16 raw bytes.
///
/// Hyphens are stripped; what remains must be exactly 32 hex digits.
pub fn uuid_to_bytes(uuid: &str) -> Result<[u8; 16], KeywardError> {
    let hex_digits: String = uuid.chars().filter(|&c| c != '-').collect();
    if hex_digits.len() != 32 {
        return Err(KeywardError::InvalidUuid(format!(
            "expected 32 hex digits, got {}",
            hex_digits.len()
        )));
    }

    let mut out = [0u8; 16];
    hex::decode_to_slice(&hex_digits, &mut out)
        .map_err(|e| KeywardError::InvalidUuid(e.to_string()))?;
    Ok(out)
}

/// Render 16 bytes as a lowercase 8-4-4-4-12 UUID string.
pub fn bytes_to_uuid(bytes: &[u8; 16]) -> String {
    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
