//! OTP configuration: the parameter bag behind an `otpauth://` URI.
//!
//! An [`OtpConfig`] is built from a URI or from the builder methods, turned
//! into an [`OtpEngine`] to compute codes, and checked against a vendor dialect
//! with [`OtpConfig::validate`]. Counter-based operations never mutate the
//! config; they return the counter the caller should persist.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::otp::code::Code;
use crate::otp::core::{next_counter, OtpEngine};
use crate::otp::encoding::Encoder;
use crate::otp::registry::HashRegistry;
use crate::otp::secret::Secret;
use crate::otp::types::*;
use crate::otp::uri::{self, UriFormat, Vendor};

/// Minimum secret length accepted by the Apple dialect.
pub const APPLE_MIN_SECRET_LEN: usize = 20;

/// All parameters of one OTP account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OtpConfig {
    pub otp_type: OtpType,
    /// Account name shown to the user.
    pub label: String,
    /// `issuer` query parameter. A DNS name under the Apple dialect.
    pub issuer: Option<String>,
    /// Label prefix before `:`, the issuer display name.
    pub issuer_label: Option<String>,
    pub secret: Secret,
    pub algorithm: Algorithm,
    pub digits: u32,
    /// HOTP moving factor; unused by TOTP.
    pub counter: u64,
    /// TOTP time-step in seconds; unused by HOTP.
    pub period: u32,
    /// Non-reserved query parameters, in URI order.
    pub custom: Vec<(String, String)>,
}

impl OtpConfig {
    fn with_type(otp_type: OtpType, label: impl Into<String>) -> Self {
        Self {
            otp_type,
            label: label.into(),
            issuer: None,
            issuer_label: None,
            secret: Secret::generate(),
            algorithm: Algorithm::default(),
            digits: DEFAULT_DIGITS,
            counter: 0,
            period: DEFAULT_PERIOD,
            custom: Vec::new(),
        }
    }

    /// TOTP account with a fresh random secret and default parameters.
    pub fn totp(label: impl Into<String>) -> Self {
        Self::with_type(OtpType::Totp, label)
    }

    /// HOTP account with a fresh random secret.
    pub fn hotp(label: impl Into<String>, counter: u64) -> Self {
        Self::with_type(OtpType::Hotp, label).with_counter(counter)
    }

    /// TOTP account shaped for the Apple dialect: 20-byte secret, issuer
    /// display name in the label, issuer domain in `issuer`.
    pub fn apple(
        account: impl Into<String>,
        issuer_name: impl Into<String>,
        issuer_domain: impl Into<String>,
    ) -> Self {
        Self::totp(account).with_apple_issuer(issuer_name, issuer_domain)
    }

    // ── Builder setters ──────────────────────────────────────────

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_issuer_label(mut self, issuer_label: impl Into<String>) -> Self {
        self.issuer_label = Some(issuer_label.into());
        self
    }

    /// Set the display name and the DNS issuer the way Apple expects them.
    pub fn with_apple_issuer(
        self,
        display_name: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        self.with_issuer_label(display_name).with_issuer(domain)
    }

    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secret = secret;
        self
    }

    /// Replace the secret with `len` random bytes.
    pub fn with_new_secret(mut self, len: usize) -> OtpResult<Self> {
        self.secret = Secret::generate_with_len(len)?;
        Ok(self)
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    pub fn with_counter(mut self, counter: u64) -> Self {
        self.counter = counter;
        self
    }

    /// Append a custom query parameter. Reserved keys are ignored.
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if uri::is_reserved_key(&key) {
            log::debug!("ignoring reserved key '{}' as custom parameter", key);
        } else {
            self.custom.push((key, value.into()));
        }
        self
    }

    /// First custom value stored under `key` (case-insensitive).
    pub fn custom_value(&self, key: &str) -> Option<&str> {
        self.custom
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    // ── URI ──────────────────────────────────────────────────────

    /// Parse an `otpauth://` or `apple-otpauth://` URI.
    pub fn parse_uri(text: &str) -> OtpResult<Self> {
        uri::parse_otpauth_uri(text)
    }

    /// Parse a URI whose secret uses a codec other than Base32.
    pub fn parse_uri_with(text: &str, encoder: &dyn Encoder) -> OtpResult<Self> {
        uri::parse_otpauth_uri_with(text, encoder)
    }

    pub fn to_uri(&self, format: UriFormat) -> String {
        uri::build_otpauth_uri(self, format)
    }

    // ── Validation ───────────────────────────────────────────────

    /// Check the config against a vendor dialect.
    ///
    /// Every rule is evaluated; an empty list means the config is valid.
    pub fn validate(&self, format: UriFormat) -> Vec<Violation> {
        let vendor = format.vendor;
        let mut violations = Vec::new();

        if self.label.trim().is_empty() {
            violations.push(Violation::required(
                "label",
                "is required and must be a display name for the account",
            ));
        }

        if matches!(vendor, Vendor::Apple | Vendor::Iij) && self.otp_type != OtpType::Totp {
            violations.push(Violation::required(
                "otp_type",
                format!("must be 'totp' for {}", vendor),
            ));
        }

        if vendor == Vendor::Apple {
            let dns_issuer = self.issuer.as_deref().map_or(false, uri::is_dns_name);
            if !dns_issuer {
                violations.push(Violation::required(
                    "issuer",
                    "is required and must be a valid DNS name",
                ));
            }
            if is_blank(&self.issuer_label) {
                violations.push(Violation::required(
                    "issuer_label",
                    "is required and must be a display name for the issuer",
                ));
            }
            if self.secret.len() < APPLE_MIN_SECRET_LEN {
                violations.push(Violation::required(
                    "secret",
                    format!("must be at least {} bytes long", APPLE_MIN_SECRET_LEN),
                ));
            }
        } else if !is_blank(&self.issuer_label) && self.issuer_label != self.issuer {
            violations.push(Violation::recommended(
                "issuer_label",
                "should be the same as 'issuer'",
            ));
        }

        if self.otp_type == OtpType::Totp {
            if vendor == Vendor::Yubico {
                if !matches!(self.period, 15 | 30 | 60) {
                    violations.push(Violation::required("period", "must be 15, 30 or 60"));
                }
            } else if self.period == 0 {
                violations.push(Violation::required("period", "must be greater than zero"));
            }
        }

        let (digits_ok, allowed) = match vendor {
            Vendor::Ibm => (matches!(self.digits, 6..=9), "6, 7, 8 or 9"),
            Vendor::Yubico => (matches!(self.digits, 6 | 7), "6 or 7"),
            _ => (matches!(self.digits, 6 | 8), "6 or 8"),
        };
        if !digits_ok {
            violations.push(Violation::required("digits", format!("must be {}", allowed)));
        }

        if !self.algorithm.is_standard() {
            if vendor == Vendor::Iij {
                if self.algorithm != Algorithm::Md5 {
                    violations.push(Violation::required(
                        "algorithm",
                        "must be SHA1, SHA256, SHA512 or MD5",
                    ));
                }
            } else {
                violations.push(Violation::required(
                    "algorithm",
                    "must be a standard algorithm (SHA1, SHA256 or SHA512)",
                ));
            }
        }

        violations
    }

    /// `true` when [`validate`](Self::validate) reports nothing, recommendations included.
    pub fn is_valid(&self, format: UriFormat) -> bool {
        self.validate(format).is_empty()
    }

    // ── Codes ────────────────────────────────────────────────────

    /// Engine computing codes for this config.
    pub fn engine(&self, registry: Arc<HashRegistry>) -> OtpResult<OtpEngine> {
        OtpEngine::from_config(self, registry)
    }

    /// Code for now (TOTP) or for the stored counter (HOTP), paired with the
    /// counter to persist afterwards. A HOTP counter of `u64::MAX` cannot
    /// advance and is reported as [`OtpErrorKind::InvalidInput`].
    pub fn generate_code(&self, registry: Arc<HashRegistry>) -> OtpResult<(Code, u64)> {
        self.generate_code_at(registry, Utc::now())
    }

    /// Like [`generate_code`](Self::generate_code) for an explicit instant.
    pub fn generate_code_at(
        &self,
        registry: Arc<HashRegistry>,
        at: DateTime<Utc>,
    ) -> OtpResult<(Code, u64)> {
        let engine = self.engine(registry)?;
        match self.otp_type {
            OtpType::Hotp => {
                let next = next_counter(self.counter)?;
                Ok((engine.generate_at_counter(self.counter)?, next))
            }
            OtpType::Totp => Ok((engine.generate_at(at)?, self.counter)),
        }
    }

    /// Validate `code` and return the counter to persist.
    ///
    /// With `resync_counter`, a matched HOTP code moves the counter one past
    /// the matched position. The counter is otherwise returned unchanged.
    pub fn validate_code(
        &self,
        code: &Code,
        tolerance: ToleranceSpan,
        resync_counter: bool,
        registry: Arc<HashRegistry>,
    ) -> OtpResult<(Validation, u64)> {
        self.validate_code_at(code, tolerance, resync_counter, registry, Utc::now())
    }

    /// Like [`validate_code`](Self::validate_code) for an explicit instant.
    pub fn validate_code_at(
        &self,
        code: &Code,
        tolerance: ToleranceSpan,
        resync_counter: bool,
        registry: Arc<HashRegistry>,
        at: DateTime<Utc>,
    ) -> OtpResult<(Validation, u64)> {
        let engine = self.engine(registry)?;
        let validation = engine.validate_at(code, tolerance, at)?;

        let counter = match self.otp_type {
            OtpType::Hotp if resync_counter && validation.matched => {
                let next = self
                    .counter
                    .checked_add_signed(validation.resync)
                    .and_then(|matched| matched.checked_add(1))
                    .unwrap_or(self.counter);
                log::debug!(
                    "HOTP counter resynchronized from {} to {} (offset {})",
                    self.counter,
                    next,
                    validation.resync
                );
                next
            }
            _ => self.counter,
        };

        Ok((validation, counter))
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl OtpEngine {
    /// Engine for a config: HOTP at the stored counter, or TOTP with its period.
    pub fn from_config(config: &OtpConfig, registry: Arc<HashRegistry>) -> OtpResult<Self> {
        let engine = match config.otp_type {
            OtpType::Hotp => OtpEngine::counter_based(config.secret.clone(), config.counter),
            OtpType::Totp => OtpEngine::time_based(config.secret.clone(), config.period)?,
        };
        Ok(engine
            .with_algorithm(config.algorithm.clone())
            .with_digits(config.digits)
            .with_registry(registry))
    }
}

/// Minimal Google-dialect URI.
impl fmt::Display for OtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri(UriFormat::default()))
    }
}

impl FromStr for OtpConfig {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_uri(s)
    }
}

impl TryFrom<String> for OtpConfig {
    type Error = OtpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_uri(&value)
    }
}

/// Full Google-dialect URI, so every field survives.
impl From<OtpConfig> for String {
    fn from(config: OtpConfig) -> String {
        config.to_uri(UriFormat::full(Vendor::Google))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Violations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One rule a config breaks under a vendor dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
    /// Recommendation rather than a hard requirement.
    pub optional: bool,
}

impl Violation {
    fn required(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            optional: false,
        }
    }

    fn recommended(field: &str, message: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::required(field, message)
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "(optional) ")?;
        }
        write!(f, "'{}' {}", self.field, self.message)
    }
}
