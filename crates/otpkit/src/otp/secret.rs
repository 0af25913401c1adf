//! OTP key material.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use crate::otp::encoding::{Base32, Encoder};
use crate::otp::types::*;

/// Shared secret used as the HMAC key.
///
/// The buffer is zeroed when the value is dropped. Cloning yields an
/// independent copy that is wiped on its own drop.
#[derive(Clone)]
pub struct Secret {
    bytes: Vec<u8>,
}

impl Secret {
    /// Random 160-bit secret.
    pub fn generate() -> Self {
        Self::random(DEFAULT_SECRET_LEN)
    }

    /// Random secret of `len` bytes.
    pub fn generate_with_len(len: usize) -> OtpResult<Self> {
        if len == 0 {
            return Err(OtpError::new(
                OtpErrorKind::InvalidSecret,
                "Secret length must be at least 1 byte",
            ));
        }
        Ok(Self::random(len))
    }

    fn random(len: usize) -> Self {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Take ownership of explicit key bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> OtpResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(OtpError::new(
                OtpErrorKind::InvalidSecret,
                "Secret must not be empty",
            ));
        }
        Ok(Self { bytes })
    }

    /// Decode a Base32 secret.
    pub fn parse(text: &str) -> OtpResult<Self> {
        Self::parse_with(text, &Base32)
    }

    /// Decode a secret with an explicit codec.
    pub fn parse_with(text: &str, encoder: &dyn Encoder) -> OtpResult<Self> {
        if text.trim().is_empty() {
            return Err(OtpError::new(
                OtpErrorKind::InvalidSecret,
                "Secret must not be blank",
            ));
        }
        let bytes = encoder.decode(text)?;
        Self::from_bytes(bytes).map_err(|e| {
            e.with_detail(format!("{} input is shorter than one byte", encoder.scheme()))
        })
    }

    /// Encode with an explicit codec.
    pub fn encode_with(&self, encoder: &dyn Encoder) -> String {
        encoder.encode(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Never true for a constructed secret.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.bytes, &other.bytes)
    }
}

impl Eq for Secret {}

impl PartialEq<[u8]> for Secret {
    fn eq(&self, other: &[u8]) -> bool {
        constant_time_eq(&self.bytes, other)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED; {} bytes])", self.bytes.len())
    }
}

/// Base32 form of the key.
impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode_with(&Base32))
    }
}

impl FromStr for Secret {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut text = String::deserialize(deserializer)?;
        let parsed = Self::parse(&text).map_err(serde::de::Error::custom);
        text.zeroize();
        parsed
    }
}

/// Constant-time comparison (to prevent timing attacks on key and code checks).
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC_SECRET_B32: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    // ── Construction ─────────────────────────────────────────────

    #[test]
    fn generate_default_length() {
        let s = Secret::generate();
        assert_eq!(s.len(), DEFAULT_SECRET_LEN);
    }

    #[test]
    fn generate_custom_length() {
        assert_eq!(Secret::generate_with_len(32).unwrap().len(), 32);
        let err = Secret::generate_with_len(0).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidSecret);
    }

    #[test]
    fn generated_secrets_differ() {
        assert_ne!(Secret::generate(), Secret::generate());
    }

    #[test]
    fn from_bytes_rejects_empty() {
        assert!(Secret::from_bytes(Vec::new()).is_err());
        let s = Secret::from_bytes(b"12345678901234567890".to_vec()).unwrap();
        assert_eq!(s.as_bytes(), b"12345678901234567890");
    }

    #[test]
    fn parse_rfc_secret() {
        let s = Secret::parse(RFC_SECRET_B32).unwrap();
        assert_eq!(s.as_bytes(), b"12345678901234567890");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            Secret::parse("  ").unwrap_err().kind,
            OtpErrorKind::InvalidSecret
        );
        assert_eq!(
            Secret::parse("!!!").unwrap_err().kind,
            OtpErrorKind::InvalidEncoding
        );
        // One character is not enough for a byte.
        assert_eq!(
            Secret::parse("A").unwrap_err().kind,
            OtpErrorKind::InvalidSecret
        );
    }

    // ── String form ──────────────────────────────────────────────

    #[test]
    fn to_string_round_trip() {
        for _ in 0..16 {
            let s = Secret::generate_with_len(17).unwrap();
            let back = Secret::parse(&s.to_string()).unwrap();
            assert_eq!(back, s);
        }
        let rfc = Secret::parse(RFC_SECRET_B32).unwrap();
        assert_eq!(rfc.to_string(), RFC_SECRET_B32);
    }

    #[test]
    fn lowercase_parses_to_same_secret() {
        let upper: Secret = RFC_SECRET_B32.parse().unwrap();
        let lower: Secret = RFC_SECRET_B32.to_lowercase().parse().unwrap();
        assert_eq!(upper, lower);
    }

    // ── Other codecs ─────────────────────────────────────────────

    struct Hex;

    impl Encoder for Hex {
        fn scheme(&self) -> &'static str {
            "hex"
        }

        fn encode(&self, bytes: &[u8]) -> String {
            bytes.iter().map(|b| format!("{:02x}", b)).collect()
        }

        fn decode(&self, text: &str) -> OtpResult<Vec<u8>> {
            let text = text.trim();
            if text.len() % 2 != 0 || !text.is_ascii() {
                return Err(OtpError::new(OtpErrorKind::InvalidEncoding, "malformed hex"));
            }
            (0..text.len())
                .step_by(2)
                .map(|i| {
                    u8::from_str_radix(&text[i..i + 2], 16)
                        .map_err(|_| OtpError::new(OtpErrorKind::InvalidEncoding, "bad hex digit"))
                })
                .collect()
        }
    }

    #[test]
    fn parse_and_encode_with_custom_codec() {
        let hex = "3132333435363738393031323334353637383930";
        let s = Secret::parse_with(hex, &Hex).unwrap();
        assert_eq!(s.as_bytes(), b"12345678901234567890");
        assert_eq!(s.encode_with(&Hex), hex);
        assert_eq!(s.encode_with(&Base32), RFC_SECRET_B32);
        assert_eq!(Secret::parse_with(&s.encode_with(&Hex), &Hex).unwrap(), s);

        assert_eq!(
            Secret::parse_with("xyz", &Hex).unwrap_err().kind,
            OtpErrorKind::InvalidEncoding
        );
        assert_eq!(
            Secret::parse_with(" ", &Hex).unwrap_err().kind,
            OtpErrorKind::InvalidSecret
        );
    }

    // ── Equality / clone ─────────────────────────────────────────

    #[test]
    fn equality_is_content_based() {
        let a = Secret::from_bytes(vec![1, 2, 3]).unwrap();
        let b = Secret::from_bytes(vec![1, 2, 3]).unwrap();
        let c = Secret::from_bytes(vec![1, 2, 4]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a == *[1u8, 2, 3].as_slice());
    }

    #[test]
    fn clone_is_independent() {
        let a = Secret::generate();
        let b = a.clone();
        drop(a);
        assert_eq!(b.len(), DEFAULT_SECRET_LEN);
    }

    #[test]
    fn debug_redacts_key() {
        let s = Secret::parse(RFC_SECRET_B32).unwrap();
        let dbg = format!("{:?}", s);
        assert_eq!(dbg, "Secret([REDACTED; 20 bytes])");
        assert!(!dbg.contains(RFC_SECRET_B32));
    }

    // ── Serde ────────────────────────────────────────────────────

    #[test]
    fn serde_as_base32_string() {
        let s = Secret::parse(RFC_SECRET_B32).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, format!("\"{}\"", RFC_SECRET_B32));
        let back: Secret = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
        assert!(serde_json::from_str::<Secret>("\"not base32!\"").is_err());
    }

    // ── constant_time_eq ─────────────────────────────────────────

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
