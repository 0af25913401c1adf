//! Keyed-hash providers, looked up by [`Algorithm`].
//!
//! A [`HashRegistry`] is an ordinary value owned by the caller and handed to
//! engines through an `Arc`. [`HashRegistry::with_defaults`] registers
//! HMAC-SHA1, HMAC-SHA256, HMAC-SHA512 and the IIJ HMAC-MD5 extension.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::otp::types::*;

/// A keyed hash (MAC) over a message.
pub trait KeyedHash: Send + Sync {
    fn mac(&self, key: &[u8], message: &[u8]) -> OtpResult<Vec<u8>>;
}

impl<F> KeyedHash for F
where
    F: Fn(&[u8], &[u8]) -> OtpResult<Vec<u8>> + Send + Sync,
{
    fn mac(&self, key: &[u8], message: &[u8]) -> OtpResult<Vec<u8>> {
        self(key, message)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Built-in HMAC providers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn key_error(e: hmac::digest::InvalidLength) -> OtpError {
    OtpError::new(OtpErrorKind::InvalidSecret, format!("HMAC key rejected: {}", e))
}

pub fn hmac_sha1(key: &[u8], message: &[u8]) -> OtpResult<Vec<u8>> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(key_error)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub fn hmac_sha256(key: &[u8], message: &[u8]) -> OtpResult<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(key_error)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub fn hmac_sha512(key: &[u8], message: &[u8]) -> OtpResult<Vec<u8>> {
    let mut mac = Hmac::<Sha512>::new_from_slice(key).map_err(key_error)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub fn hmac_md5(key: &[u8], message: &[u8]) -> OtpResult<Vec<u8>> {
    let mut mac = Hmac::<Md5>::new_from_slice(key).map_err(key_error)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub type Provider = Arc<dyn KeyedHash>;

/// Algorithm → keyed-hash provider map, safe to share between threads.
pub struct HashRegistry {
    providers: RwLock<HashMap<Algorithm, Provider>>,
}

impl HashRegistry {
    /// Registry without any provider.
    pub fn empty() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Registry seeded with SHA1, SHA256, SHA512 and MD5.
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.register(Algorithm::Sha1, hmac_sha1);
        registry.register(Algorithm::Sha256, hmac_sha256);
        registry.register(Algorithm::Sha512, hmac_sha512);
        registry.register(Algorithm::Md5, hmac_md5);
        registry
    }

    /// `with_defaults` wrapped for sharing between engines.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::with_defaults())
    }

    /// Add or replace the provider for `algorithm`.
    pub fn register(&self, algorithm: Algorithm, provider: impl KeyedHash + 'static) {
        log::trace!("hash registry: registering provider for {}", algorithm);
        self.write().insert(algorithm, Arc::new(provider));
    }

    /// Remove the provider for `algorithm`, returning whether one existed.
    pub fn unregister(&self, algorithm: &Algorithm) -> bool {
        log::trace!("hash registry: removing provider for {}", algorithm);
        self.write().remove(algorithm).is_some()
    }

    pub fn get(&self, algorithm: &Algorithm) -> Option<Provider> {
        self.read().get(algorithm).cloned()
    }

    /// Like [`get`](Self::get), but a missing provider is an error.
    pub fn require(&self, algorithm: &Algorithm) -> OtpResult<Provider> {
        self.get(algorithm).ok_or_else(|| {
            log::warn!("no keyed-hash provider registered for {}", algorithm);
            OtpError::unsupported_algorithm(algorithm)
        })
    }

    pub fn is_registered(&self, algorithm: &Algorithm) -> bool {
        self.read().contains_key(algorithm)
    }

    /// Drop every provider, defaults included.
    pub fn clear(&self) {
        log::trace!("hash registry: clearing all providers");
        self.write().clear();
    }

    /// Registered algorithms, sorted by name.
    pub fn registered(&self) -> Vec<Algorithm> {
        let mut algorithms: Vec<Algorithm> = self.read().keys().cloned().collect();
        algorithms.sort_by(|a, b| a.name().cmp(b.name()));
        algorithms
    }

    // A poisoned lock only means another thread panicked mid-insert; the map
    // itself is still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Algorithm, Provider>> {
        self.providers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Algorithm, Provider>> {
        self.providers.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for HashRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for HashRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRegistry")
            .field("algorithms", &self.registered())
            .finish()
    }
}
