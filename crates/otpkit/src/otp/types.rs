//! Core types shared by the engine, the secret store and the URI model.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Defaults
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Number of digits in a code when nothing else is configured.
pub const DEFAULT_DIGITS: u32 = 6;
/// TOTP time-step in seconds when nothing else is configured.
pub const DEFAULT_PERIOD: u32 = 30;
/// Length of a freshly generated secret (160 bits, RFC 4226 §4 R6).
pub const DEFAULT_SECRET_LEN: usize = 20;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

lazy_static! {
    static ref STANDARD_ALGORITHM: Regex =
        Regex::new(r"(?i)SHA(1|256|512)").expect("static regex is valid");
}

/// Hash algorithm used for HMAC-based OTP.
///
/// Names are canonicalised to upper case, and any name containing one of the
/// standard SHA family names (`HmacSHA256`, `sha1`) collapses onto it. Anything
/// else is kept as a non-standard entry, which only computes if a provider is
/// registered for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
    /// Non-standard, defined by the IIJ SmartKey URI format.
    Md5,
    Other(String),
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Algorithm {
    /// Parse and canonicalise an algorithm name.
    pub fn parse(s: &str) -> Result<Self, OtpError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(OtpError::new(
                OtpErrorKind::InvalidInput,
                "Algorithm name must not be empty",
            ));
        }

        if let Some(m) = STANDARD_ALGORITHM.find(trimmed) {
            return Ok(match m.as_str().to_uppercase().as_str() {
                "SHA1" => Self::Sha1,
                "SHA256" => Self::Sha256,
                _ => Self::Sha512,
            });
        }

        Ok(match trimmed.to_uppercase() {
            name if name == "MD5" => Self::Md5,
            name => Self::Other(name),
        })
    }

    /// Canonical name, as written into `otpauth://` URIs.
    pub fn name(&self) -> &str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
            Self::Md5 => "MD5",
            Self::Other(name) => name,
        }
    }

    /// `true` for SHA1, SHA256 and SHA512.
    pub fn is_standard(&self) -> bool {
        matches!(self, Self::Sha1 | Self::Sha256 | Self::Sha512)
    }
}

impl FromStr for Algorithm {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Algorithm {
    type Error = OtpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> String {
        algorithm.name().to_string()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OTP type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Whether a configuration is time-based or counter-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpType {
    Totp,
    Hotp,
}

impl Default for OtpType {
    fn default() -> Self {
        Self::Totp
    }
}

impl fmt::Display for OtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totp => write!(f, "totp"),
            Self::Hotp => write!(f, "hotp"),
        }
    }
}

impl FromStr for OtpType {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "totp" => Ok(Self::Totp),
            "hotp" => Ok(Self::Hotp),
            other => Err(OtpError::new(
                OtpErrorKind::InvalidUri,
                format!("Unknown OTP type '{}', expected 'totp' or 'hotp'", other),
            )),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tolerance span
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Validation window, in counter steps or periods, around the base counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToleranceSpan {
    pub behind: u32,
    pub ahead: u32,
}

impl ToleranceSpan {
    pub const fn new(behind: u32, ahead: u32) -> Self {
        Self { behind, ahead }
    }

    /// Same tolerance on both sides.
    pub const fn symmetric(tolerance: u32) -> Self {
        Self::new(tolerance, tolerance)
    }

    /// Exact match only.
    pub const fn none() -> Self {
        Self::new(0, 0)
    }
}

impl Default for ToleranceSpan {
    fn default() -> Self {
        Self::symmetric(1)
    }
}

impl From<u32> for ToleranceSpan {
    fn from(tolerance: u32) -> Self {
        Self::symmetric(tolerance)
    }
}

impl From<(u32, u32)> for ToleranceSpan {
    fn from((behind, ahead): (u32, u32)) -> Self {
        Self::new(behind, ahead)
    }
}

impl fmt::Display for ToleranceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(-{}, +{})", self.behind, self.ahead)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Validation result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outcome of checking a code against a window of counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub matched: bool,
    /// Offset of the matching counter from the base counter
    /// (negative = behind, positive = ahead). Zero when nothing matched.
    pub resync: i64,
}

impl Validation {
    pub const fn matched(resync: i64) -> Self {
        Self {
            matched: true,
            resync,
        }
    }

    pub const fn no_match() -> Self {
        Self {
            matched: false,
            resync: 0,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtpErrorKind {
    /// Malformed scheme, host or path, or a missing/malformed query parameter.
    InvalidUri,
    /// A character outside the codec alphabet.
    InvalidEncoding,
    /// No keyed-hash provider is registered for the algorithm.
    UnsupportedAlgorithm,
    /// Empty or otherwise unusable key material.
    InvalidSecret,
    /// A code value that does not fit its digit width.
    InvalidCode,
    InvalidInput,
}

/// Crate-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpError {
    pub kind: OtpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for OtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for OtpError {}

impl OtpError {
    pub fn new(kind: OtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn unsupported_algorithm(algorithm: &Algorithm) -> Self {
        Self::new(
            OtpErrorKind::UnsupportedAlgorithm,
            format!("No keyed-hash provider registered for \"{}\"", algorithm),
        )
    }
}

impl From<OtpError> for String {
    fn from(e: OtpError) -> String {
        e.to_string()
    }
}

pub type OtpResult<T> = Result<T, OtpError>;
