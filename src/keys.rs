//! Key material and key providers
//!
//! The engine never derives or stores keys on its own; a [`KeyProvider`]
//! hands it an opaque 256-bit secret per call.

use crate::config::VeilConfig;
use crate::error::{Result, VeilError};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key length in bytes for both supported ciphers
pub const KEY_LEN: usize = 32;

/// Opaque 256-bit symmetric key, wiped on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a key from a slice, which must be exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            VeilError::Validation(format!(
                "Invalid key length: {}, expected {}",
                bytes.len(),
                KEY_LEN
            ))
        })?;
        Ok(Self(array))
    }

    /// Generate a fresh random key
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Source of key material for sealing and opening
pub trait KeyProvider: Send + Sync {
    /// Return the key to use for the current call
    fn provide_key(&self) -> Result<EncryptionKey>;
}

/// Always returns the same caller-supplied key
pub struct StaticKeyProvider {
    key: EncryptionKey,
}

impl StaticKeyProvider {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }
}

impl KeyProvider for StaticKeyProvider {
    fn provide_key(&self) -> Result<EncryptionKey> {
        Ok(self.key.clone())
    }
}

/// Generates one random key from the OS RNG at construction
///
/// Data sealed under this provider is unreadable once it is dropped.
pub struct RandomKeyProvider {
    key: EncryptionKey,
}

impl RandomKeyProvider {
    pub fn new() -> Self {
        Self {
            key: EncryptionKey::generate(&mut OsRng),
        }
    }
}

impl Default for RandomKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyProvider for RandomKeyProvider {
    fn provide_key(&self) -> Result<EncryptionKey> {
        Ok(self.key.clone())
    }
}

/// Derives a key from a passphrase by iterated SHA-256
///
/// `h0 = SHA256(salt || passphrase)`, then `h = SHA256(h || salt)` for each
/// remaining iteration.
pub struct PassphraseKeyProvider {
    passphrase: String,
    salt: Vec<u8>,
    iterations: u32,
}

impl PassphraseKeyProvider {
    pub fn new(passphrase: impl Into<String>, salt: impl Into<Vec<u8>>, iterations: u32) -> Self {
        Self {
            passphrase: passphrase.into(),
            salt: salt.into(),
            iterations,
        }
    }

    /// Build a provider using the configured `keyDerivationIterations`
    pub fn from_config(
        passphrase: impl Into<String>,
        salt: impl Into<Vec<u8>>,
        config: &VeilConfig,
    ) -> Self {
        Self::new(passphrase, salt, config.key_derivation_iterations)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Drop for PassphraseKeyProvider {
    fn drop(&mut self) {
        self.passphrase.zeroize();
    }
}

impl KeyProvider for PassphraseKeyProvider {
    fn provide_key(&self) -> Result<EncryptionKey> {
        if self.iterations == 0 {
            return Err(VeilError::Validation(
                "Key derivation iterations must be >= 1".to_string(),
            ));
        }
        if self.salt.is_empty() {
            return Err(VeilError::Validation(
                "Key derivation salt cannot be empty".to_string(),
            ));
        }

        let mut hasher = Sha256::new();
        hasher.update(&self.salt);
        hasher.update(self.passphrase.as_bytes());
        let mut digest: [u8; KEY_LEN] = hasher.finalize().into();

        for _ in 1..self.iterations {
            let mut hasher = Sha256::new();
            hasher.update(digest);
            hasher.update(&self.salt);
            digest = hasher.finalize().into();
        }

        let key = EncryptionKey::from_bytes(digest);
        digest.zeroize();
        Ok(key)
    }
}
