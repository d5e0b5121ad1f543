//! Human-readable license key codec.
//!
//! A Base32 variant over a 32-symbol alphabet without `I`, `O`, `0` and `1`.
//! Bits are packed five at a time, most significant bit first, across the
//! whole byte stream. The final partial group is zero-padded on the right.
//!
//! The exact packing order and padding policy are shared with independent
//! verifiers. Changing either invalidates every issued key.

use crate::KeywardError;
use once_cell::sync::Lazy;

/// Key alphabet. A symbol's index is its 5-bit value.
pub const ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Marker for bytes outside the alphabet in [`DECODE_MAP`].
const INVALID: u8 = 0xff;

/// ASCII byte to 5-bit value. Built once, never mutated.
static DECODE_MAP: Lazy<[u8; 256]> = Lazy::new(|| {
    let mut map = [INVALID; 256];
    for (value, &symbol) in ALPHABET.iter().enumerate() {
        map[symbol as usize] = value as u8;
    }
    map
});

/// Encode bytes as a hyphen-grouped key string.
///
/// `group_size` of zero disables grouping.
///
/// # Errors
/// * `EmptyInput` - `bytes` is empty
pub fn encode(bytes: &[u8], group_size: usize) -> Result<String, KeywardError> {
    if bytes.is_empty() {
        return Err(KeywardError::EmptyInput);
    }

    let mut symbols = String::with_capacity((bytes.len() * 8 + 4) / 5);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            symbols.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        symbols.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }

    Ok(group(&symbols, group_size))
}

/// Decode a key string back to bytes.
///
/// The input is normalized first, so case and separators do not matter.
///
/// # Errors
/// * `InvalidKeyCharacter` - a letter outside the alphabet (`I` or `O`)
/// * `InvalidPadding` - non-zero bits remain after the last full byte
pub fn decode(key: &str) -> Result<Vec<u8>, KeywardError> {
    let normalized = normalize(key);
    let mut out = Vec::with_capacity(normalized.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for symbol in normalized.bytes() {
        let value = DECODE_MAP[symbol as usize];
        if value == INVALID {
            return Err(KeywardError::InvalidKeyCharacter(symbol as char));
        }
        buffer = (buffer << 5) | u32::from(value);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    if buffer != 0 {
        return Err(KeywardError::InvalidPadding);
    }

    Ok(out)
}

/// Uppercase, then drop everything outside `[A-Z2-9]`.
pub fn normalize(key: &str) -> String {
    key.chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase() || ('2'..='9').contains(c))
        .collect()
}

/// Normalize and re-group a user-supplied key into its issued form.
pub fn canonicalize(key: &str, group_size: usize) -> String {
    group(&normalize(key), group_size)
}

fn group(symbols: &str, group_size: usize) -> String {
    if group_size == 0 {
        return symbols.to_string();
    }
    symbols
        .as_bytes()
        .chunks(group_size)
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_known_vectors() {
        // 0x00 -> 00000|000 -> "A", "A"
        assert_eq!(encode(&[0x00], 5).unwrap(), "AA");
        // 0xff -> 11111|111(00) -> '9' (31), 28 -> '6'
        assert_eq!(encode(&[0xff], 5).unwrap(), "96");
        // Five bytes pack into exactly eight symbols, no padding.
        assert_eq!(encode(&[0u8; 5], 4).unwrap(), "AAAA-AAAA");
    }

    #[test]
    fn test_encode_groups_without_edge_hyphens() {
        let key = encode(&[0xab; 10], 5).unwrap();
        assert_eq!(key.len(), 16 + 3);
        assert!(!key.starts_with('-'));
        assert!(!key.ends_with('-'));
        let groups: Vec<&str> = key.split('-').collect();
        assert_eq!(groups.len(), 4);
        assert!(groups.iter().all(|g| !g.is_empty() && g.len() <= 5));
    }

    #[test]
    fn test_encode_group_size_zero() {
        let key = encode(&[1, 2, 3, 4, 5], 0).unwrap();
        assert!(!key.contains('-'));
        assert_eq!(key.len(), 8);
    }

    #[test]
    fn test_encode_empty_fails() {
        assert!(matches!(encode(&[], 5), Err(KeywardError::EmptyInput)));
    }

    #[test]
    fn test_decode_is_case_and_separator_insensitive() {
        let bytes = b"license".to_vec();
        let key = encode(&bytes, 5).unwrap();
        let mangled = format!("  {} ", key.to_lowercase().replace('-', " _ "));
        assert_eq!(decode(&mangled).unwrap(), bytes);
    }

    #[test]
    fn test_decode_rejects_ambiguous_letters() {
        assert!(matches!(
            decode("AAIA"),
            Err(KeywardError::InvalidKeyCharacter('I'))
        ));
        assert!(matches!(
            decode("OAAA"),
            Err(KeywardError::InvalidKeyCharacter('O'))
        ));
    }

    #[test]
    fn test_decode_rejects_nonzero_padding() {
        // "96" is 0xff with zero padding; "97" sets a padding bit.
        assert_eq!(decode("96").unwrap(), vec![0xff]);
        assert!(matches!(decode("97"), Err(KeywardError::InvalidPadding)));
    }

    #[test]
    fn test_decode_rejects_truncated_key() {
        let key = encode(&[0x5a; 106], 5).unwrap();
        let normalized = normalize(&key);
        // Dropping the last symbol leaves the top five bits of 0x5a behind.
        let truncated = &normalized[..normalized.len() - 1];
        assert!(matches!(decode(truncated), Err(KeywardError::InvalidPadding)));
    }

    #[test]
    fn test_decode_empty_is_empty() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("---").unwrap().is_empty());
    }

    #[test]
    fn test_normalize_strips_and_uppercases() {
        assert_eq!(normalize("ab-cd 01 zz9!é"), "ABCDZZ9");
    }

    #[test]
    fn test_canonicalize_regroups() {
        assert_eq!(canonicalize("abcde fghjk-lm", 5), "ABCDE-FGHJK-LM");
    }

    #[test]
    fn test_full_bundle_length_key() {
        let key = encode(&[0x11; 106], 5).unwrap();
        assert_eq!(normalize(&key).len(), 170);
        assert_eq!(key.split('-').count(), 34);
    }

    proptest! {
        #[test]
        fn prop_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 1..=200)) {
            let key = encode(&bytes, 5).unwrap();
            prop_assert_eq!(decode(&key).unwrap(), bytes);
        }

        #[test]
        fn prop_encoded_symbols_in_alphabet(bytes in proptest::collection::vec(any::<u8>(), 1..=64)) {
            let key = encode(&bytes, 5).unwrap();
            prop_assert!(normalize(&key).bytes().all(|b| ALPHABET.contains(&b)));
        }

        #[test]
        fn prop_normalize_idempotent(s in ".{0,64}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(once.chars().all(|c| c.is_ascii_uppercase() || ('2'..='9').contains(&c)));
        }
    }
}
