//! High-level orchestrator for applications that issue OTP accounts.
//!
//! [`OtpService`] holds one set of [`OtpOptions`] plus a shared
//! [`HashRegistry`] and turns `(secret, counter)` pairs into URIs and codes.
//! Nothing is stored; the caller owns secrets and counters.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::otp::code::Code;
use crate::otp::config::OtpConfig;
use crate::otp::core::OtpEngine;
use crate::otp::registry::HashRegistry;
use crate::otp::secret::Secret;
use crate::otp::types::*;
use crate::otp::uri::{UriFormat, Vendor};

/// Service settings, typically loaded from a JSON settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpOptions {
    /// Issuer display name.
    pub issuer: String,
    /// Issuer DNS name. When set, URIs use the Apple dialect.
    pub issuer_domain: Option<String>,
    pub algorithm: Algorithm,
    pub digits: u32,
    pub period: u32,
    #[serde(rename = "type")]
    pub otp_type: OtpType,
    pub uri_format: UriFormat,
    pub tolerance: ToleranceSpan,
    /// Extra query parameters added to every URI.
    pub custom_properties: BTreeMap<String, String>,
}

impl Default for OtpOptions {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            issuer_domain: None,
            algorithm: Algorithm::default(),
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
            otp_type: OtpType::default(),
            uri_format: UriFormat::default(),
            tolerance: ToleranceSpan::default(),
            custom_properties: BTreeMap::new(),
        }
    }
}

impl OtpOptions {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Self::default()
        }
    }

    /// Deserialise options from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> OtpResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            OtpError::new(OtpErrorKind::InvalidInput, format!("JSON deserialise: {}", e))
        })
    }

    /// Serialise options to pretty JSON.
    pub fn to_json(&self) -> OtpResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            OtpError::new(OtpErrorKind::InvalidInput, format!("JSON serialise: {}", e))
        })
    }

    fn check(&self) -> OtpResult<()> {
        if self.issuer.trim().is_empty() {
            return Err(OtpError::new(OtpErrorKind::InvalidInput, "Issuer must not be blank"));
        }
        if self.digits == 0 {
            return Err(OtpError::new(
                OtpErrorKind::InvalidInput,
                "Digit width must be greater than zero",
            ));
        }
        if self.otp_type == OtpType::Totp && self.period == 0 {
            return Err(OtpError::new(
                OtpErrorKind::InvalidInput,
                "TOTP period must be greater than zero",
            ));
        }
        Ok(())
    }

    fn has_issuer_domain(&self) -> bool {
        self.issuer_domain
            .as_deref()
            .map_or(false, |d| !d.trim().is_empty())
    }
}

/// Central OTP service.
#[derive(Debug, Clone)]
pub struct OtpService {
    options: OtpOptions,
    registry: Arc<HashRegistry>,
}

impl OtpService {
    /// Service using the default keyed-hash providers.
    pub fn new(options: OtpOptions) -> OtpResult<Self> {
        Self::with_registry(options, HashRegistry::shared())
    }

    pub fn with_registry(options: OtpOptions, registry: Arc<HashRegistry>) -> OtpResult<Self> {
        options.check()?;
        log::debug!(
            "OTP service for '{}' ({}, {} digits, {})",
            options.issuer,
            options.otp_type,
            options.digits,
            options.algorithm
        );
        Ok(Self { options, registry })
    }

    pub fn options(&self) -> &OtpOptions {
        &self.options
    }

    pub fn registry(&self) -> &Arc<HashRegistry> {
        &self.registry
    }

    /// Format used by [`create_uri`](Self::create_uri).
    pub fn uri_format(&self) -> UriFormat {
        if self.options.has_issuer_domain() {
            UriFormat {
                vendor: Vendor::Apple,
                ..self.options.uri_format
            }
        } else {
            self.options.uri_format
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Enrollment
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Account config for `username` with the service settings applied.
    pub fn account(&self, username: &str, secret: &Secret, counter: u64) -> OtpConfig {
        let opts = &self.options;
        let mut config = match opts.otp_type {
            OtpType::Totp => OtpConfig::totp(username),
            OtpType::Hotp => OtpConfig::hotp(username, counter),
        }
        .with_secret(secret.clone())
        .with_algorithm(opts.algorithm.clone())
        .with_digits(opts.digits)
        .with_period(opts.period)
        .with_counter(counter);

        config = match opts.issuer_domain.as_deref() {
            Some(domain) if opts.has_issuer_domain() => {
                config.with_apple_issuer(opts.issuer.as_str(), domain)
            }
            _ => config.with_issuer(opts.issuer.as_str()),
        };

        for (key, value) in &opts.custom_properties {
            config = config.with_custom(key.as_str(), value.as_str());
        }
        config
    }

    /// Enrollment URI for `username`.
    pub fn create_uri(&self, username: &str, secret: &Secret, counter: u64) -> String {
        self.account(username, secret, counter).to_uri(self.uri_format())
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Codes
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    fn engine(&self, secret: &Secret, counter: u64) -> OtpResult<OtpEngine> {
        let engine = match self.options.otp_type {
            OtpType::Hotp => OtpEngine::counter_based(secret.clone(), counter),
            OtpType::Totp => OtpEngine::time_based(secret.clone(), self.options.period)?,
        };
        Ok(engine
            .with_algorithm(self.options.algorithm.clone())
            .with_digits(self.options.digits)
            .with_registry(Arc::clone(&self.registry)))
    }

    /// Current code: at `counter` for HOTP, for now for TOTP.
    pub fn generate_code(&self, secret: &Secret, counter: u64) -> OtpResult<Code> {
        self.generate_code_at(secret, counter, Utc::now())
    }

    pub fn generate_code_at(
        &self,
        secret: &Secret,
        counter: u64,
        at: DateTime<Utc>,
    ) -> OtpResult<Code> {
        self.engine(secret, counter)?.generate_at(at)
    }

    /// Check a code with the configured tolerance.
    pub fn validate_code(&self, code: &Code, secret: &Secret, counter: u64) -> OtpResult<Validation> {
        self.validate_code_at(code, secret, counter, Utc::now())
    }

    pub fn validate_code_at(
        &self,
        code: &Code,
        secret: &Secret,
        counter: u64,
        at: DateTime<Utc>,
    ) -> OtpResult<Validation> {
        self.engine(secret, counter)?
            .validate_at(code, self.options.tolerance, at)
    }

    /// [`validate_code`](Self::validate_code) for user-typed input.
    pub fn validate_input(&self, input: &str, secret: &Secret, counter: u64) -> OtpResult<Validation> {
        let code = Code::parse(input.trim())?;
        self.validate_code(&code, secret, counter)
    }
}
