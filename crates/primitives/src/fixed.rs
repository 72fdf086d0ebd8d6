//! Hex codecs and checksum formatting for the fixed-width byte types the
//! core moves around: 20-byte addresses and 32-byte hashes/slots.
//!
//! `alloy::primitives` already supplies `Address`, `B256`, and the
//! generic `FixedBytes<N>` this crate re-exports as `B160`; what's
//! missing is the EIP-55/EIP-1191 checksum algorithm spelled out in the
//! spec, which this module implements directly against Keccak-256
//! rather than relying on a third-party checksum helper.

use alloy::primitives::{keccak256, Address};

use crate::errors::FixedBytesError;

/// 20-byte container, distinct alias kept for symmetry with `B256` even
/// though it is structurally identical to `Address`.
pub type B160 = Address;

/// Parse a hex string (`0x`-prefixed or not) into exactly `N` bytes.
pub fn parse_hex_exact<const N: usize>(input: &str) -> Result<[u8; N], FixedBytesError> {
    let stripped = input.strip_prefix("0x").unwrap_or(input);
    if stripped.len() != N * 2 {
        return Err(FixedBytesError::WrongLength {
            expected: N * 2,
            actual: stripped.len(),
        });
    }
    let mut out = [0u8; N];
    for (i, chunk) in stripped.as_bytes().chunks(2).enumerate() {
        let hi = hex_digit(chunk[0]).ok_or(FixedBytesError::InvalidHex)?;
        let lo = hex_digit(chunk[1]).ok_or(FixedBytesError::InvalidHex)?;
        out[i] = (hi << 4) | lo;
    }
    Ok(out)
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Parse a 20-byte address from hex, rejecting a mismatched length or a
/// non-hex digit. Case is not enforced here; checksum validation is a
/// separate, opt-in step (`is_valid_checksum`).
pub fn parse_address(input: &str) -> Result<Address, FixedBytesError> {
    parse_hex_exact::<20>(input).map(Address::from)
}

/// Render `addr` as checksummed hex per EIP-55 (`chain_id = None`) or
/// EIP-1191 (`chain_id = Some(_)`).
///
/// The Keccak-256 preimage is the decimal `chain_id` followed by `"0x"`
/// followed by the 40 lowercase hex digits of the address when a chain
/// id is given, or just the 40 lowercase hex digits otherwise. Each
/// hex letter in the output is capitalized iff the corresponding nibble
/// of the hash is >= 8.
pub fn to_checksum(addr: &Address, chain_id: Option<u64>) -> String {
    let lower = hex::encode(addr.as_slice());
    let preimage = match chain_id {
        Some(id) => format!("{id}0x{lower}"),
        None => lower.clone(),
    };
    let hash = keccak256(preimage.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        if ch.is_ascii_digit() {
            out.push(ch);
            continue;
        }
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0F
        };
        if nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Validate that `input` is either all-lowercase/all-uppercase
/// (pre-EIP-55, accepted unconditionally) or matches the checksum for
/// the given `chain_id`.
pub fn is_valid_checksum(input: &str, chain_id: Option<u64>) -> bool {
    let body = input.strip_prefix("0x").unwrap_or(input);
    if body.len() != 40 {
        return false;
    }
    if body.chars().all(|c| !c.is_ascii_alphabetic() || c.is_ascii_lowercase())
        || body.chars().all(|c| !c.is_ascii_alphabetic() || c.is_ascii_uppercase())
    {
        return true;
    }
    let Ok(bytes) = parse_hex_exact::<20>(body) else {
        return false;
    };
    let addr = Address::from(bytes);
    to_checksum(&addr, chain_id) == format!("0x{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Canonical EIP-55 test vector.
    const VECTOR: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn eip55_checksum_matches_known_vector() {
        let addr = parse_address(VECTOR).unwrap();
        assert_eq!(to_checksum(&addr, None), VECTOR);
    }

    #[test]
    fn all_lower_and_all_upper_are_accepted() {
        let lower = VECTOR.to_ascii_lowercase();
        let upper = VECTOR.to_ascii_uppercase();
        assert!(is_valid_checksum(&lower, None));
        assert!(is_valid_checksum(&upper, None));
    }

    #[test]
    fn mismatched_case_checksum_is_rejected_when_wrong() {
        let mut mangled = VECTOR.to_string();
        // Flip the case of a single hex letter; checksum should now fail.
        let idx = mangled.find(|c: char| c.is_ascii_alphabetic()).unwrap();
        let c = mangled.as_bytes()[idx] as char;
        let flipped = if c.is_ascii_uppercase() {
            c.to_ascii_lowercase()
        } else {
            c.to_ascii_uppercase()
        };
        mangled.replace_range(idx..idx + 1, &flipped.to_string());
        assert!(!is_valid_checksum(&mangled, None));
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(parse_address("0x1234").is_err());
    }

    #[test]
    fn eip1191_checksum_differs_from_eip55() {
        let addr = parse_address(VECTOR).unwrap();
        let plain = to_checksum(&addr, None);
        let chain_30 = to_checksum(&addr, Some(30));
        assert_ne!(plain, chain_30);
    }
}
