//! Generated one-time codes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::otp::types::*;

/// A numeric OTP value with its digit width.
///
/// The string form is zero-padded to `digits`; two codes are equal when their
/// string forms are, regardless of expiration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CodeRepr", into = "CodeRepr")]
pub struct Code {
    value: u32,
    digits: u32,
    expires_at: Option<DateTime<Utc>>,
}

impl Code {
    pub fn new(value: u32, digits: u32) -> OtpResult<Self> {
        if digits == 0 {
            return Err(OtpError::new(
                OtpErrorKind::InvalidCode,
                "Digit width must be greater than zero",
            ));
        }
        if let Some(limit) = 10u64.checked_pow(digits) {
            if u64::from(value) >= limit {
                return Err(OtpError::new(
                    OtpErrorKind::InvalidCode,
                    format!("{} does not fit in {} digits", value, digits),
                ));
            }
        }
        Ok(Self {
            value,
            digits,
            expires_at: None,
        })
    }

    /// Attach the instant after which the code is no longer current.
    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Parse a digit string; the width is the string length.
    pub fn parse(text: &str) -> OtpResult<Self> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OtpError::new(
                OtpErrorKind::InvalidCode,
                format!("'{}' is not a valid numeric code", text),
            ));
        }
        let value = text.parse::<u32>().map_err(|e| {
            OtpError::new(OtpErrorKind::InvalidCode, format!("'{}' is out of range", text))
                .with_detail(e.to_string())
        })?;
        Self::new(value, text.len() as u32)
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn can_expire(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Counter-based codes never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }

    /// Time left before expiry, clamped at zero.
    pub fn expires_in(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|at| std::cmp::max(at - now, Duration::zero()))
    }

    /// Format with a space in the middle (e.g. "123 456").
    pub fn display_grouped(&self) -> String {
        let code = self.to_string();
        if code.len() <= 4 {
            return code;
        }
        let mid = code.len() / 2;
        format!("{} {}", &code[..mid], &code[mid..])
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0>width$}", self.value, width = self.digits as usize)
    }
}

impl FromStr for Code {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.digits == other.digits
    }
}

impl Eq for Code {}

impl Hash for Code {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.digits.hash(state);
    }
}

impl PartialEq<str> for Code {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for Code {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

#[derive(Serialize, Deserialize)]
struct CodeRepr {
    code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl From<Code> for CodeRepr {
    fn from(code: Code) -> Self {
        Self {
            code: code.to_string(),
            expires_at: code.expires_at,
        }
    }
}

impl TryFrom<CodeRepr> for Code {
    type Error = OtpError;

    fn try_from(repr: CodeRepr) -> Result<Self, Self::Error> {
        let code = Code::parse(&repr.code)?;
        Ok(match repr.expires_at {
            Some(at) => code.expiring_at(at),
            None => code,
        })
    }
}
