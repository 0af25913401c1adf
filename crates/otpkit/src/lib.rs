//! # otpkit – HOTP / TOTP one-time passwords
//!
//! Counter-based and time-based one-time password crate:
//!
//! - **RFC 4226 / 6238** – HOTP & TOTP generation and windowed validation with
//!   SHA-1, SHA-256, SHA-512 and pluggable keyed-hash providers
//! - **Base32 secrets** – RFC 4648 codec, zeroed on drop
//! - **otpauth:// URIs** – Parsing & generation for the Google, Apple, IBM,
//!   Yubico and IIJ dialects, with per-vendor validation
//! - **Service** – JSON-configurable enrollment and code checking

pub mod otp;
