//! OTP engine: RFC 4226 (HOTP) and RFC 6238 (TOTP).
//!
//! One [`OtpEngine`] type covers both flavours: the shared state (secret,
//! algorithm, digit width, provider registry) lives in the struct and the
//! flavour-specific state in [`EngineKind`]. Computation is identical for both;
//! only the counter source differs.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::otp::code::Code;
use crate::otp::registry::{HashRegistry, KeyedHash};
use crate::otp::secret::{constant_time_eq, Secret};
use crate::otp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time-step helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute the time-step counter for a given unix timestamp.
///
/// `None` when `period` is zero.
pub fn time_step_at(unix_seconds: u64, period: u32) -> Option<u64> {
    unix_seconds.checked_div(u64::from(period))
}

/// Seconds remaining for a specific timestamp; `None` when `period` is zero.
pub fn seconds_remaining_at(unix_seconds: u64, period: u32) -> Option<u32> {
    let p = u64::from(period);
    let elapsed = unix_seconds.checked_rem(p)?;
    Some((p - elapsed) as u32)
}

/// Counter following `counter`; HOTP counters do not wrap.
pub(crate) fn next_counter(counter: u64) -> OtpResult<u64> {
    counter.checked_add(1).ok_or_else(|| {
        OtpError::new(
            OtpErrorKind::InvalidInput,
            "HOTP counter is exhausted and cannot advance",
        )
        .with_detail(counter.to_string())
    })
}

/// Instants before the epoch clamp to step zero.
fn unix_seconds(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or(0)
}

/// End of the time-step `counter`, i.e. `(counter + 1) * period` after the epoch.
fn step_expiry(counter: u64, period: u32) -> Option<DateTime<Utc>> {
    let secs = counter.checked_add(1)?.checked_mul(u64::from(period))?;
    Utc.timestamp_opt(i64::try_from(secs).ok()?, 0).single()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Dynamic truncation per RFC 4226 §5.3, yielding the 31-bit value.
fn truncate(hmac_result: &[u8]) -> OtpResult<u32> {
    let last = hmac_result.last().ok_or_else(|| {
        OtpError::new(OtpErrorKind::UnsupportedAlgorithm, "Keyed hash returned no output")
    })?;
    let offset = (last & 0x0f) as usize;
    let window = hmac_result.get(offset..offset + 4).ok_or_else(|| {
        OtpError::new(
            OtpErrorKind::UnsupportedAlgorithm,
            format!(
                "Keyed hash output of {} bytes is too short for offset {}",
                hmac_result.len(),
                offset
            ),
        )
    })?;
    Ok(((window[0] as u32 & 0x7f) << 24)
        | ((window[1] as u32) << 16)
        | ((window[2] as u32) << 8)
        | (window[3] as u32))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Counter source of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// HOTP: explicit counter, advanced by [`OtpEngine::generate`].
    Counter { counter: u64 },
    /// TOTP: counter is `floor(unix_time / period)`.
    Time { period: u32 },
}

/// HOTP/TOTP code generator and validator.
#[derive(Debug, Clone)]
pub struct OtpEngine {
    secret: Secret,
    algorithm: Algorithm,
    digits: u32,
    kind: EngineKind,
    registry: Arc<HashRegistry>,
}

impl OtpEngine {
    /// HOTP engine with SHA1, 6 digits and the default providers.
    pub fn counter_based(secret: Secret, counter: u64) -> Self {
        Self {
            secret,
            algorithm: Algorithm::Sha1,
            digits: DEFAULT_DIGITS,
            kind: EngineKind::Counter { counter },
            registry: HashRegistry::shared(),
        }
    }

    /// TOTP engine with SHA1, 6 digits and the default providers.
    pub fn time_based(secret: Secret, period: u32) -> OtpResult<Self> {
        if period == 0 {
            return Err(OtpError::new(
                OtpErrorKind::InvalidInput,
                "TOTP period must be greater than zero",
            ));
        }
        Ok(Self {
            secret,
            algorithm: Algorithm::Sha1,
            digits: DEFAULT_DIGITS,
            kind: EngineKind::Time { period },
            registry: HashRegistry::shared(),
        })
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// Resolve keyed hashes through `registry` instead of the defaults.
    pub fn with_registry(mut self, registry: Arc<HashRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Stored counter of a HOTP engine.
    pub fn counter(&self) -> Option<u64> {
        match self.kind {
            EngineKind::Counter { counter } => Some(counter),
            EngineKind::Time { .. } => None,
        }
    }

    /// Period of a TOTP engine.
    pub fn period(&self) -> Option<u32> {
        match self.kind {
            EngineKind::Counter { .. } => None,
            EngineKind::Time { period } => Some(period),
        }
    }

    // ── Counters ─────────────────────────────────────────────────

    /// Counter that `generate` and `validate` would use right now.
    pub fn current_counter(&self) -> u64 {
        self.counter_at(Utc::now())
    }

    /// Counter for an instant; HOTP engines ignore the instant.
    pub fn counter_at(&self, at: DateTime<Utc>) -> u64 {
        match self.kind {
            EngineKind::Counter { counter } => counter,
            // `time_based` rejects a zero period.
            EngineKind::Time { period } => time_step_at(unix_seconds(at), period).unwrap_or(0),
        }
    }

    // ── Compute ──────────────────────────────────────────────────

    /// Numeric OTP value for `counter`, not zero-padded.
    pub fn compute(&self, counter: u64) -> OtpResult<u32> {
        let provider = self.registry.require(&self.algorithm)?;
        self.compute_with(provider.as_ref(), counter)
    }

    fn compute_with(&self, provider: &dyn KeyedHash, counter: u64) -> OtpResult<u32> {
        if self.digits == 0 {
            return Err(OtpError::new(
                OtpErrorKind::InvalidInput,
                "Digit width must be greater than zero",
            ));
        }
        let hash = provider.mac(self.secret.as_bytes(), &counter.to_be_bytes())?;
        let value = truncate(&hash)?;
        Ok(match 10u64.checked_pow(self.digits) {
            Some(modulus) => (u64::from(value) % modulus) as u32,
            None => value,
        })
    }

    fn code_for(&self, provider: &dyn KeyedHash, counter: u64) -> OtpResult<Code> {
        let code = Code::new(self.compute_with(provider, counter)?, self.digits)?;
        Ok(match self.kind {
            EngineKind::Time { period } => match step_expiry(counter, period) {
                Some(at) => code.expiring_at(at),
                None => code,
            },
            EngineKind::Counter { .. } => code,
        })
    }

    // ── Generate ─────────────────────────────────────────────────

    /// Code for the current counter.
    ///
    /// A HOTP engine advances its counter by one afterwards; a TOTP engine
    /// is left untouched. A HOTP engine at `u64::MAX` fails with
    /// [`OtpErrorKind::InvalidInput`] and keeps its counter.
    pub fn generate(&mut self) -> OtpResult<Code> {
        let current = self.current_counter();
        let next = match self.kind {
            EngineKind::Counter { counter } => Some(next_counter(counter)?),
            EngineKind::Time { .. } => None,
        };
        let code = self.generate_at_counter(current)?;
        if let (EngineKind::Counter { counter }, Some(next)) = (&mut self.kind, next) {
            *counter = next;
        }
        Ok(code)
    }

    /// Code for an explicit counter. Never mutates the engine.
    pub fn generate_at_counter(&self, counter: u64) -> OtpResult<Code> {
        let provider = self.registry.require(&self.algorithm)?;
        self.code_for(provider.as_ref(), counter)
    }

    /// Code for an instant. Never mutates the engine.
    pub fn generate_at(&self, at: DateTime<Utc>) -> OtpResult<Code> {
        self.generate_at_counter(self.counter_at(at))
    }

    // ── Validate ─────────────────────────────────────────────────

    /// Check `code` around the current counter.
    pub fn validate(&self, code: &Code, tolerance: ToleranceSpan) -> OtpResult<Validation> {
        self.validate_at_counter(code, tolerance, self.current_counter())
    }

    /// Check `code` around the counter for an instant.
    pub fn validate_at(
        &self,
        code: &Code,
        tolerance: ToleranceSpan,
        at: DateTime<Utc>,
    ) -> OtpResult<Validation> {
        self.validate_at_counter(code, tolerance, self.counter_at(at))
    }

    /// Scan `base_counter - behind ..= base_counter + ahead` in ascending
    /// order; the first match wins. Counters below zero are skipped.
    pub fn validate_at_counter(
        &self,
        code: &Code,
        tolerance: ToleranceSpan,
        base_counter: u64,
    ) -> OtpResult<Validation> {
        let provider = self.registry.require(&self.algorithm)?;
        let expected = code.to_string();

        for i in -i64::from(tolerance.behind)..=i64::from(tolerance.ahead) {
            let Some(candidate) = base_counter.checked_add_signed(i) else {
                continue;
            };
            let generated = self.code_for(provider.as_ref(), candidate)?.to_string();
            if constant_time_eq(generated.as_bytes(), expected.as_bytes()) {
                if i != 0 {
                    log::debug!(
                        "OTP matched {} step(s) from base counter {}",
                        i,
                        base_counter
                    );
                }
                return Ok(Validation::matched(i));
            }
        }

        Ok(Validation::no_match())
    }
}
