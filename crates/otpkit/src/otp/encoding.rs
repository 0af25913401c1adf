//! String codecs for secret key material.
//!
//! [`Base32`] is the RFC 4648 §6 codec every authenticator app expects. The
//! [`Encoder`] trait lets callers plug in another representation when reading
//! or writing secrets.

use crate::otp::types::*;

const ALPHABET: base32::Alphabet = base32::Alphabet::Rfc4648 { padding: false };

/// A reversible byte-to-text representation.
pub trait Encoder: Send + Sync {
    /// Short scheme name, e.g. `"base32"`.
    fn scheme(&self) -> &'static str;

    fn encode(&self, bytes: &[u8]) -> String;

    fn decode(&self, text: &str) -> OtpResult<Vec<u8>>;
}

/// RFC 4648 Base32 (`A-Z2-7`), unpadded on output.
///
/// Decoding strips trailing `=`, accepts either case, and drops leftover bits
/// that do not fill a whole byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Base32;

impl Encoder for Base32 {
    fn scheme(&self) -> &'static str {
        "base32"
    }

    fn encode(&self, bytes: &[u8]) -> String {
        base32::encode(ALPHABET, bytes)
    }

    fn decode(&self, text: &str) -> OtpResult<Vec<u8>> {
        let unpadded = text.trim_end_matches('=');

        if let Some((pos, c)) = unpadded
            .char_indices()
            .find(|(_, c)| !is_base32_char(*c))
        {
            return Err(OtpError::new(
                OtpErrorKind::InvalidEncoding,
                format!("'{}' is not a Base32 character", c.escape_default()),
            )
            .with_detail(format!("position {}", pos)));
        }

        base32::decode(ALPHABET, &unpadded.to_ascii_uppercase()).ok_or_else(|| {
            OtpError::new(OtpErrorKind::InvalidEncoding, "Invalid Base32 input")
        })
    }
}

fn is_base32_char(c: char) -> bool {
    matches!(c, 'A'..='Z' | 'a'..='z' | '2'..='7')
}

/// Encode bytes with the default codec.
pub fn encode_base32(bytes: &[u8]) -> String {
    Base32.encode(bytes)
}

/// Decode text with the default codec.
pub fn decode_base32(text: &str) -> OtpResult<Vec<u8>> {
    Base32.decode(text)
}
