//! Strkey codec for chain addresses.
//!
//! A strkey is a base32 rendering of `version byte || payload || CRC16`,
//! giving human-readable addresses with a stable leading letter per kind
//! (`G` for accounts, `C` for contracts) and a checksum that catches
//! transcription errors.

use thiserror::Error;

/// RFC 4648 base32 alphabet, no padding.
const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Raw payload length for account and contract keys.
pub const PAYLOAD_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum StrkeyError {
    #[error("strkey contains an invalid base32 character")]
    InvalidCharacter,

    #[error("strkey has invalid length {0}")]
    InvalidLength(usize),

    #[error("strkey checksum mismatch")]
    ChecksumMismatch,

    #[error("unknown strkey version byte {0:#04x}")]
    UnknownVersion(u8),
}

/// The leading version byte of a strkey, selecting the key kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VersionByte {
    /// An account public key. Encodes with a leading `G`.
    Account = 6 << 3,
    /// A contract identifier. Encodes with a leading `C`.
    Contract = 2 << 3,
}

impl TryFrom<u8> for VersionByte {
    type Error = StrkeyError;

    fn try_from(value: u8) -> Result<Self, StrkeyError> {
        match value {
            v if v == VersionByte::Account as u8 => Ok(VersionByte::Account),
            v if v == VersionByte::Contract as u8 => Ok(VersionByte::Contract),
            other => Err(StrkeyError::UnknownVersion(other)),
        }
    }
}

/// Encode a 32-byte payload as a strkey of the given kind.
pub fn encode(version: VersionByte, payload: &[u8; PAYLOAD_LEN]) -> String {
    let mut data = Vec::with_capacity(1 + PAYLOAD_LEN + 2);
    data.push(version as u8);
    data.extend_from_slice(payload);
    let crc = crc16_xmodem(&data);
    data.extend_from_slice(&crc.to_le_bytes());
    base32_encode(&data)
}

/// Decode a strkey back into its kind and 32-byte payload, verifying the
/// checksum.
pub fn decode(input: &str) -> Result<(VersionByte, [u8; PAYLOAD_LEN]), StrkeyError> {
    let data = base32_decode(input)?;
    if data.len() != 1 + PAYLOAD_LEN + 2 {
        return Err(StrkeyError::InvalidLength(data.len()));
    }

    let (body, checksum) = data.split_at(data.len() - 2);
    let expected = crc16_xmodem(body);
    if checksum != expected.to_le_bytes() {
        return Err(StrkeyError::ChecksumMismatch);
    }

    let version = VersionByte::try_from(body[0])?;
    let mut payload = [0u8; PAYLOAD_LEN];
    payload.copy_from_slice(&body[1..]);
    Ok((version, payload))
}

/// CRC16 with the XModem polynomial, as appended to every strkey.
fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 8 / 5 + 1);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for &byte in data {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1F) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1F) as usize] as char);
    }
    out
}

fn base32_decode(input: &str) -> Result<Vec<u8>, StrkeyError> {
    fn val(c: u8) -> Result<u32, StrkeyError> {
        match c {
            b'A'..=b'Z' => Ok((c - b'A') as u32),
            b'2'..=b'7' => Ok((c - b'2' + 26) as u32),
            _ => Err(StrkeyError::InvalidCharacter),
        }
    }

    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for c in input.bytes() {
        buffer = (buffer << 5) | val(c)?;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }
    // Leftover bits are encoder padding and must be zero.
    if bits > 0 && buffer & ((1 << bits) - 1) != 0 {
        return Err(StrkeyError::InvalidCharacter);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn contract_keys_start_with_c() {
        let encoded = encode(VersionByte::Contract, &[0u8; 32]);
        assert!(encoded.starts_with('C'), "got {encoded}");
    }

    #[test]
    fn account_keys_start_with_g() {
        let encoded = encode(VersionByte::Account, &[0u8; 32]);
        assert!(encoded.starts_with('G'), "got {encoded}");
    }

    #[test]
    fn encoded_length_is_56_chars() {
        // 35 bytes = 280 bits = exactly 56 base32 characters.
        let encoded = encode(VersionByte::Contract, &[0xAB; 32]);
        assert_eq!(encoded.len(), 56);
    }

    #[test]
    fn roundtrip_contract_key() {
        let payload: [u8; 32] = core::array::from_fn(|i| i as u8);
        let encoded = encode(VersionByte::Contract, &payload);
        let (version, decoded) = decode(&encoded).expect("should decode");
        assert_eq!(version, VersionByte::Contract);
        assert_eq!(decoded, payload);
    }

    #[test]
    fn tampered_checksum_is_rejected() {
        let payload = [7u8; 32];
        let mut encoded = encode(VersionByte::Account, &payload).into_bytes();
        // Flip one character in the middle of the payload region.
        encoded[20] = if encoded[20] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(encoded).unwrap();
        assert!(matches!(
            decode(&tampered),
            Err(StrkeyError::ChecksumMismatch)
        ));
    }

    #[test]
    fn lowercase_input_is_rejected() {
        let encoded = encode(VersionByte::Contract, &[3u8; 32]).to_lowercase();
        assert!(matches!(
            decode(&encoded),
            Err(StrkeyError::InvalidCharacter)
        ));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let encoded = encode(VersionByte::Contract, &[9u8; 32]);
        let err = decode(&encoded[..encoded.len() - 8]).unwrap_err();
        assert!(matches!(err, StrkeyError::InvalidLength(_)));
    }

    #[test]
    fn crc16_known_vector() {
        // CRC16/XMODEM of "123456789" is 0x31C3.
        assert_eq!(crc16_xmodem(b"123456789"), 0x31C3);
    }

    proptest! {
        #[test]
        fn roundtrip_arbitrary_payloads(payload in proptest::array::uniform32(any::<u8>())) {
            for version in [VersionByte::Account, VersionByte::Contract] {
                let encoded = encode(version, &payload);
                let (v, p) = decode(&encoded).expect("roundtrip must decode");
                prop_assert_eq!(v, version);
                prop_assert_eq!(p, payload);
            }
        }
    }
}
