//! `otpauth://` URI parsing and generation.
//!
//! Follows the Google Authenticator key-URI format
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//! with the vendor dialects listed in [`Vendor`].
//!
//! Format: `otpauth://totp/ISSUER:LABEL?secret=BASE32&issuer=ISSUER&algorithm=SHA1&digits=6&period=30`
//!
//! Emitted path segments and query values use strict RFC 3986 encoding, so a
//! space is always written as `%20`. Parsing accepts both `%20` and `+`.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::otp::config::OtpConfig;
use crate::otp::encoding::{Base32, Encoder};
use crate::otp::secret::Secret;
use crate::otp::types::*;

/// Query keys owned by the URI model; never stored as custom extras.
pub const RESERVED_KEYS: [&str; 6] = ["issuer", "digits", "counter", "secret", "period", "algorithm"];

/// Case-insensitive check against [`RESERVED_KEYS`].
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.iter().any(|r| r.eq_ignore_ascii_case(key))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  URI format
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Authenticator dialect a URI is written for or validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    #[default]
    Google,
    /// Built-in iOS/macOS password manager; `apple-otpauth` scheme.
    Apple,
    /// IBM Security Verify.
    Ibm,
    Yubico,
    /// IIJ SmartKey.
    Iij,
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Google => write!(f, "Google"),
            Self::Apple => write!(f, "Apple"),
            Self::Ibm => write!(f, "IBM"),
            Self::Yubico => write!(f, "Yubico"),
            Self::Iij => write!(f, "IIJ"),
        }
    }
}

/// Whether parameters equal to their defaults are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UriShape {
    /// Omit `algorithm`, `digits` and `period` when they hold the default.
    #[default]
    Minimal,
    /// Always write `algorithm`, `digits` and `period` (TOTP only).
    Full,
}

/// Vendor dialect plus output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UriFormat {
    pub vendor: Vendor,
    pub shape: UriShape,
}

impl UriFormat {
    pub const fn new(vendor: Vendor, shape: UriShape) -> Self {
        Self { vendor, shape }
    }

    pub const fn minimal(vendor: Vendor) -> Self {
        Self::new(vendor, UriShape::Minimal)
    }

    pub const fn full(vendor: Vendor) -> Self {
        Self::new(vendor, UriShape::Full)
    }

    pub fn is_full(&self) -> bool {
        self.shape == UriShape::Full
    }

    /// URI scheme written for this dialect.
    pub fn scheme(&self) -> &'static str {
        match self.vendor {
            Vendor::Apple => "apple-otpauth",
            _ => "otpauth",
        }
    }
}

impl From<Vendor> for UriFormat {
    fn from(vendor: Vendor) -> Self {
        Self::minimal(vendor)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn invalid_uri(msg: impl Into<String>) -> OtpError {
    OtpError::new(OtpErrorKind::InvalidUri, msg)
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> OtpResult<T> {
    value.trim().parse::<T>().map_err(|_| {
        invalid_uri(format!("'{}' must be a non-negative integer", key))
            .with_detail(value.to_string())
    })
}

fn parse_positive(key: &str, value: &str) -> OtpResult<u32> {
    match parse_number::<u32>(key, value)? {
        0 => Err(invalid_uri(format!("'{}' must be greater than zero", key))),
        n => Ok(n),
    }
}

/// Split a decoded label at the first `:` into `(issuer_label, label)`.
///
/// Empty parts are dropped, so `"Acme:"` and `":Acme"` both yield the label
/// `"Acme"` with no issuer label. A label that itself contains `:` and has no
/// issuer label does not survive a round trip: `"a:b"` is read back as issuer
/// label `"a"` and label `"b"`.
pub fn split_label(decoded: &str) -> (Option<String>, String) {
    match decoded.split_once(':') {
        Some((prefix, label)) => {
            let (prefix, label) = (prefix.trim(), label.trim());
            match (prefix.is_empty(), label.is_empty()) {
                (false, false) => (Some(prefix.to_string()), label.to_string()),
                (true, _) => (None, label.to_string()),
                (false, true) => (None, prefix.to_string()),
            }
        }
        None => (None, decoded.trim().to_string()),
    }
}

/// Parse an `otpauth://` or `apple-otpauth://` URI into an [`OtpConfig`].
pub fn parse_otpauth_uri(uri: &str) -> OtpResult<OtpConfig> {
    parse_otpauth_uri_with(uri, &Base32)
}

/// Like [`parse_otpauth_uri`], decoding the secret with `encoder`.
pub fn parse_otpauth_uri_with(uri: &str, encoder: &dyn Encoder) -> OtpResult<OtpConfig> {
    let url = url::Url::parse(uri.trim())
        .map_err(|e| invalid_uri(format!("Invalid URI: {}", e)))?;

    if url.scheme() != "otpauth" && url.scheme() != "apple-otpauth" {
        return Err(invalid_uri(format!(
            "Expected scheme 'otpauth' or 'apple-otpauth', got '{}'",
            url.scheme()
        )));
    }

    let otp_type: OtpType = url
        .host_str()
        .ok_or_else(|| invalid_uri("Missing OTP type"))?
        .parse()?;

    // Path is "/LABEL" or "/ISSUER:LABEL"; only the last segment counts.
    let raw_label = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .replace('+', " ");
    let (issuer_label, label) = split_label(&percent_decode_str(&raw_label).decode_utf8_lossy());

    let mut secret = None;
    let mut issuer = None;
    let mut algorithm = Algorithm::default();
    let mut digits = DEFAULT_DIGITS;
    let mut period = DEFAULT_PERIOD;
    let mut counter: Option<String> = None;
    let mut custom = Vec::new();

    for (key, value) in url.query_pairs() {
        match key.to_ascii_lowercase().as_str() {
            "secret" => secret = Some(value.into_owned()),
            "issuer" => issuer = Some(value.into_owned()),
            "algorithm" => {
                if !value.trim().is_empty() {
                    algorithm = Algorithm::parse(&value)?;
                }
            }
            "digits" => digits = parse_positive("digits", &value)?,
            "period" => period = parse_positive("period", &value)?,
            "counter" => counter = Some(value.into_owned()),
            _ => custom.push((key.into_owned(), value.into_owned())),
        }
    }

    let secret = secret.ok_or_else(|| invalid_uri("Missing 'secret' parameter"))?;
    let secret = Secret::parse_with(&secret, encoder)?;

    // TOTP ignores the counter, so a malformed one falls back to zero.
    let counter = match (otp_type, counter) {
        (OtpType::Hotp, Some(c)) => parse_number::<u64>("counter", &c)?,
        (OtpType::Hotp, None) => {
            return Err(invalid_uri("Missing 'counter' parameter, required for HOTP"))
        }
        (OtpType::Totp, c) => c.and_then(|c| c.trim().parse::<u64>().ok()).unwrap_or(0),
    };

    Ok(OtpConfig {
        otp_type,
        label,
        issuer,
        issuer_label,
        secret,
        algorithm,
        digits,
        counter,
        period,
        custom,
    })
}

/// Parse multiple URIs (one per line), skipping blanks and `#` comments.
pub fn parse_otpauth_uris(text: &str) -> Vec<OtpResult<OtpConfig>> {
    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(parse_otpauth_uri)
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// RFC 3986 unreserved characters pass through, everything else is escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn url_encode(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

/// Generate a URI for `config` in the given dialect and shape.
pub fn build_otpauth_uri(config: &OtpConfig, format: UriFormat) -> String {
    let label = url_encode(&config.label);
    let path = match &config.issuer_label {
        Some(il) if !il.trim().is_empty() => format!("{}:{}", url_encode(il), label),
        _ => label,
    };

    let mut params = vec![format!("secret={}", config.secret)];

    if config.otp_type == OtpType::Hotp {
        params.push(format!("counter={}", config.counter));
    }

    if let Some(issuer) = &config.issuer {
        params.push(format!("issuer={}", url_encode(issuer)));
    }

    if format.is_full() || config.algorithm != Algorithm::Sha1 {
        let name = if format.vendor == Vendor::Ibm && config.algorithm.is_standard() {
            format!("Hmac{}", config.algorithm)
        } else {
            config.algorithm.to_string()
        };
        params.push(format!("algorithm={}", url_encode(&name)));
    }

    if format.is_full() || config.digits != DEFAULT_DIGITS {
        params.push(format!("digits={}", config.digits));
    }

    if config.otp_type == OtpType::Totp && (format.is_full() || config.period != DEFAULT_PERIOD) {
        params.push(format!("period={}", config.period));
    }

    params.extend(
        config
            .custom
            .iter()
            .filter(|(key, _)| !is_reserved_key(key))
            .map(|(key, value)| format!("{}={}", url_encode(key), url_encode(value))),
    );

    format!(
        "{}://{}/{}?{}",
        format.scheme(),
        config.otp_type,
        path,
        params.join("&")
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Host names
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `true` when `name` is a DNS host name (not an IP literal).
///
/// Internationalized names are accepted in their ASCII (punycode) form.
pub fn is_dns_name(name: &str) -> bool {
    let domain = match url::Host::parse(name.trim()) {
        Ok(url::Host::Domain(d)) => d,
        _ => return false,
    };
    let domain = domain.strip_suffix('.').unwrap_or(&domain);
    !domain.is_empty()
        && domain.len() <= 253
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "JBSWY3DPEHPK3PXP";

    // ── Parse basic URIs ─────────────────────────────────────────

    #[test]
    fn parse_basic_totp() {
        let uri = "otpauth://totp/Example:alice@example.com?secret=JBSWY3DPEHPK3PXP&issuer=Example";
        let config = parse_otpauth_uri(uri).unwrap();
        assert_eq!(config.otp_type, OtpType::Totp);
        assert_eq!(config.label, "alice@example.com");
        assert_eq!(config.issuer_label.as_deref(), Some("Example"));
        assert_eq!(config.issuer.as_deref(), Some("Example"));
        assert_eq!(config.secret.to_string(), SECRET);
        assert_eq!(config.algorithm, Algorithm::Sha1);
        assert_eq!(config.digits, 6);
        assert_eq!(config.period, 30);
        assert_eq!(config.counter, 0);
        assert!(config.custom.is_empty());
    }

    #[test]
    fn parse_all_params() {
        let uri = "otpauth://totp/GitHub:user?secret=JBSWY3DPEHPK3PXP&algorithm=SHA256&digits=8&period=60&issuer=GitHub";
        let config = parse_otpauth_uri(uri).unwrap();
        assert_eq!(config.algorithm, Algorithm::Sha256);
        assert_eq!(config.digits, 8);
        assert_eq!(config.period, 60);
    }

    #[test]
    fn parse_hotp_with_counter() {
        let uri = "otpauth://hotp/TestLabel?secret=JBSWY3DPEHPK3PXP&counter=42";
        let config = parse_otpauth_uri(uri).unwrap();
        assert_eq!(config.otp_type, OtpType::Hotp);
        assert_eq!(config.counter, 42);
        assert_eq!(config.label, "TestLabel");
        assert!(config.issuer.is_none());
        assert!(config.issuer_label.is_none());
    }

    #[test]
    fn parse_host_and_keys_case_insensitive() {
        let uri = "otpauth://TOTP/acct?SECRET=JBSWY3DPEHPK3PXP&Digits=8&ISSUER=Acme";
        let config = parse_otpauth_uri(uri).unwrap();
        assert_eq!(config.otp_type, OtpType::Totp);
        assert_eq!(config.digits, 8);
        assert_eq!(config.issuer.as_deref(), Some("Acme"));
        assert!(config.custom.is_empty());
    }

    #[test]
    fn parse_apple_scheme() {
        let uri = "apple-otpauth://totp/ACME%20Co:john?secret=JBSWY3DPEHPK3PXP&issuer=acme.example";
        let config = parse_otpauth_uri(uri).unwrap();
        assert_eq!(config.issuer_label.as_deref(), Some("ACME Co"));
        assert_eq!(config.issuer.as_deref(), Some("acme.example"));
    }

    #[test]
    fn parse_hmac_prefixed_algorithm() {
        let uri = "otpauth://totp/a?secret=JBSWY3DPEHPK3PXP&algorithm=HmacSHA512";
        assert_eq!(parse_otpauth_uri(uri).unwrap().algorithm, Algorithm::Sha512);
        let uri = "otpauth://totp/a?secret=JBSWY3DPEHPK3PXP&algorithm=md5";
        assert_eq!(parse_otpauth_uri(uri).unwrap().algorithm, Algorithm::Md5);
    }

    // ── Labels ───────────────────────────────────────────────────

    #[test]
    fn parse_spaces_in_both_encodings() {
        let pct = parse_otpauth_uri("otpauth://totp/My%20Corp:my%20user?secret=JBSWY3DPEHPK3PXP").unwrap();
        let plus = parse_otpauth_uri("otpauth://totp/My+Corp:my+user?secret=JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(pct.issuer_label.as_deref(), Some("My Corp"));
        assert_eq!(pct.label, "my user");
        assert_eq!(pct, plus);
    }

    #[test]
    fn label_split_trims_and_drops_empty_prefix() {
        assert_eq!(split_label(" Acme : bob "), (Some("Acme".into()), "bob".into()));
        assert_eq!(split_label(":bob"), (None, "bob".into()));
        assert_eq!(split_label("Acme:"), (None, "Acme".into()));
        assert_eq!(split_label(" Acme : "), (None, "Acme".into()));
        assert_eq!(split_label("a:b:c"), (Some("a".into()), "b:c".into()));
        assert_eq!(split_label("plain"), (None, "plain".into()));
    }

    #[test]
    fn trailing_colon_label_stays_valid() {
        let config = parse_otpauth_uri("otpauth://totp/Acme:?secret=JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(config.label, "Acme");
        assert!(config.issuer_label.is_none());
        assert!(config.validate(UriFormat::default()).is_empty());
    }

    #[test]
    fn colon_in_plain_label_splits_on_reparse() {
        let config = OtpConfig::totp("a:b").with_secret(Secret::parse(SECRET).unwrap());
        let back = parse_otpauth_uri(&build_otpauth_uri(&config, UriFormat::default())).unwrap();
        assert_eq!(back.issuer_label.as_deref(), Some("a"));
        assert_eq!(back.label, "b");
    }

    #[test]
    fn label_is_last_path_segment() {
        let config = parse_otpauth_uri("otpauth://totp/ignored/Acme:bob?secret=JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(config.label, "bob");
        assert_eq!(config.issuer_label.as_deref(), Some("Acme"));
    }

    // ── Custom extras ────────────────────────────────────────────

    #[test]
    fn parse_keeps_custom_extras_in_order() {
        let uri = "otpauth://totp/a?secret=JBSWY3DPEHPK3PXP&image=https%3A%2F%2Fx.example%2Flogo.png&color=red";
        let config = parse_otpauth_uri(uri).unwrap();
        assert_eq!(
            config.custom,
            vec![
                ("image".to_string(), "https://x.example/logo.png".to_string()),
                ("color".to_string(), "red".to_string()),
            ]
        );
    }

    // ── Parse errors ─────────────────────────────────────────────

    fn kind(uri: &str) -> OtpErrorKind {
        parse_otpauth_uri(uri).unwrap_err().kind
    }

    #[test]
    fn parse_rejects_bad_structure() {
        assert_eq!(kind("https://example.com/a?secret=JBSWY3DPEHPK3PXP"), OtpErrorKind::InvalidUri);
        assert_eq!(kind("otpauth://motp/a?secret=JBSWY3DPEHPK3PXP"), OtpErrorKind::InvalidUri);
        assert_eq!(kind("not a url at all"), OtpErrorKind::InvalidUri);
        assert_eq!(kind("otpauth://totp/a?issuer=X"), OtpErrorKind::InvalidUri);
    }

    #[test]
    fn parse_requires_counter_for_hotp() {
        assert_eq!(kind("otpauth://hotp/a?secret=JBSWY3DPEHPK3PXP"), OtpErrorKind::InvalidUri);
        assert_eq!(
            kind("otpauth://hotp/a?secret=JBSWY3DPEHPK3PXP&counter=-1"),
            OtpErrorKind::InvalidUri
        );
    }

    #[test]
    fn parse_rejects_bad_numbers() {
        for q in ["digits=0", "digits=six", "period=0", "period=-30"] {
            let uri = format!("otpauth://totp/a?secret=JBSWY3DPEHPK3PXP&{}", q);
            assert_eq!(kind(&uri), OtpErrorKind::InvalidUri, "accepted {}", q);
        }
        assert_eq!(
            kind("otpauth://hotp/a?secret=JBSWY3DPEHPK3PXP&counter=x"),
            OtpErrorKind::InvalidUri
        );
    }

    #[test]
    fn totp_tolerates_malformed_counter() {
        for q in ["counter=abc", "counter=-1", "counter="] {
            let uri = format!("otpauth://totp/a?secret=JBSWY3DPEHPK3PXP&{}", q);
            let config = parse_otpauth_uri(&uri).unwrap();
            assert_eq!(config.counter, 0, "for {}", q);
            assert!(config.custom.is_empty());
        }
        let config = parse_otpauth_uri("otpauth://totp/a?secret=JBSWY3DPEHPK3PXP&counter=7").unwrap();
        assert_eq!(config.counter, 7);
    }

    #[test]
    fn parse_propagates_secret_errors() {
        assert_eq!(kind("otpauth://totp/a?secret=not!base32"), OtpErrorKind::InvalidEncoding);
        assert_eq!(kind("otpauth://totp/a?secret="), OtpErrorKind::InvalidSecret);
    }

    // ── Generate ─────────────────────────────────────────────────

    fn sample() -> OtpConfig {
        OtpConfig::totp("alice@example.com")
            .with_secret(Secret::parse(SECRET).unwrap())
            .with_issuer("Example")
    }

    #[test]
    fn build_minimal_omits_defaults() {
        let uri = build_otpauth_uri(&sample(), UriFormat::default());
        assert_eq!(
            uri,
            "otpauth://totp/alice%40example.com?secret=JBSWY3DPEHPK3PXP&issuer=Example"
        );
    }

    #[test]
    fn build_full_writes_everything() {
        let uri = build_otpauth_uri(&sample(), UriFormat::full(Vendor::Google));
        assert!(uri.ends_with("&issuer=Example&algorithm=SHA1&digits=6&period=30"));
    }

    #[test]
    fn build_non_default_params() {
        let config = sample()
            .with_algorithm(Algorithm::Sha512)
            .with_digits(8)
            .with_period(60);
        let uri = build_otpauth_uri(&config, UriFormat::default());
        assert!(uri.contains("algorithm=SHA512"));
        assert!(uri.contains("digits=8"));
        assert!(uri.contains("period=60"));
    }

    #[test]
    fn build_hotp_has_counter_but_no_period() {
        let config = OtpConfig::hotp("user", 99).with_secret(Secret::parse(SECRET).unwrap());
        let uri = build_otpauth_uri(&config, UriFormat::full(Vendor::Google));
        assert!(uri.starts_with("otpauth://hotp/user?secret=JBSWY3DPEHPK3PXP&counter=99"));
        assert!(!uri.contains("period="));
    }

    #[test]
    fn build_issuer_label_and_spaces() {
        let config = sample().with_issuer_label("My Corp").with_label("my user");
        let uri = build_otpauth_uri(&config, UriFormat::default());
        assert!(uri.starts_with("otpauth://totp/My%20Corp:my%20user?"));
        assert!(!uri.contains('+'));
    }

    #[test]
    fn build_apple_scheme() {
        let uri = build_otpauth_uri(&sample(), UriFormat::minimal(Vendor::Apple));
        assert!(uri.starts_with("apple-otpauth://totp/"));
    }

    #[test]
    fn build_ibm_prefixes_standard_algorithms() {
        let ibm = UriFormat::full(Vendor::Ibm);
        assert!(build_otpauth_uri(&sample(), ibm).contains("algorithm=HmacSHA1"));
        let md5 = sample().with_algorithm(Algorithm::Md5);
        assert!(build_otpauth_uri(&md5, ibm).contains("algorithm=MD5"));
    }

    #[test]
    fn build_strips_reserved_custom_keys() {
        let mut config = sample().with_custom("image", "a b");
        config.custom.push(("Secret".into(), "leak".into()));
        let uri = build_otpauth_uri(&config, UriFormat::default());
        assert!(uri.ends_with("&image=a%20b"));
        assert!(!uri.contains("leak"));
    }

    // ── Roundtrip ────────────────────────────────────────────────

    #[test]
    fn parse_build_roundtrip() {
        let original = "otpauth://totp/GitHub:user%40mail.com?secret=JBSWY3DPEHPK3PXP&issuer=GitHub&algorithm=SHA256&digits=8&period=60";
        let config = parse_otpauth_uri(original).unwrap();
        let rebuilt = build_otpauth_uri(&config, UriFormat::default());
        assert_eq!(parse_otpauth_uri(&rebuilt).unwrap(), config);
    }

    // ── Multi-line parse ─────────────────────────────────────────

    #[test]
    fn parse_uris_multi_line() {
        let text = "\
otpauth://totp/A:a?secret=AAAA
# comment
otpauth://totp/B:b?secret=BBBB

otpauth://hotp/C:c?secret=CCCC
";
        let results = parse_otpauth_uris(text);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(results[2].is_err());
    }

    // ── Host names ───────────────────────────────────────────────

    #[test]
    fn dns_names() {
        for good in ["example.com", "acme.example", "localhost", "a-b.c0.example", "example.com."] {
            assert!(is_dns_name(good), "rejected {}", good);
        }
        for bad in ["", "ACME Co", "1.2.3.4", "[::1]", "-bad.example", "a..b", "under_score.example"] {
            assert!(!is_dns_name(bad), "accepted {}", bad);
        }
    }

    // ── Format ───────────────────────────────────────────────────

    #[test]
    fn format_defaults_and_serde() {
        assert_eq!(UriFormat::default(), UriFormat::minimal(Vendor::Google));
        assert_eq!(UriFormat::from(Vendor::Iij).vendor, Vendor::Iij);
        let json = serde_json::to_string(&UriFormat::full(Vendor::Yubico)).unwrap();
        assert_eq!(json, r#"{"vendor":"yubico","shape":"full"}"#);
        let back: UriFormat = serde_json::from_str(r#"{"vendor":"apple"}"#).unwrap();
        assert_eq!(back, UriFormat::minimal(Vendor::Apple));
    }
}
