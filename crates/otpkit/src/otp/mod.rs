//! OTP crate: sub-modules.

pub mod types;
pub mod encoding;
pub mod secret;
pub mod registry;
pub mod code;
pub mod core;
pub mod uri;
pub mod config;
pub mod service;

// Re-export top-level items for convenience.
pub use types::*;
pub use encoding::{Base32, Encoder};
pub use secret::Secret;
pub use registry::{HashRegistry, KeyedHash, Provider};
pub use code::Code;
pub use self::core::{EngineKind, OtpEngine};
pub use uri::{UriFormat, UriShape, Vendor};
pub use config::{OtpConfig, Violation};
pub use service::{OtpOptions, OtpService};
