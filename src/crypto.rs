//! Authenticated encryption for sealed attribute payloads
//!
//! Every seal draws a fresh nonce from the caller's cryptographic RNG; there
//! is no API for supplying a nonce. The cipher identifier travels with the
//! record and `open` dispatches on it directly.
//!
//! Wire layout of a sealed record: `[nonce][tag (16 bytes)][ciphertext]`.
//! The nonce length is fixed by the cipher: 16 bytes for AES-256-GCM,
//! 12 bytes for ChaCha20-Poly1305.

use crate::error::{Result, VeilError};
use crate::keys::EncryptionKey;
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20poly1305::ChaCha20Poly1305;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

/// AES-256-GCM with a 128-bit nonce
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Authentication tag length shared by both ciphers
pub const TAG_LEN: usize = 16;

/// Supported AEAD ciphers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherId {
    /// AES-256-GCM with a 16-byte nonce
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    /// ChaCha20-Poly1305 with a 12-byte nonce
    #[default]
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl CipherId {
    pub fn nonce_len(self) -> usize {
        match self {
            CipherId::Aes256Gcm => 16,
            CipherId::ChaCha20Poly1305 => 12,
        }
    }

    /// Wire name, also bound into every record as associated data
    pub fn as_str(self) -> &'static str {
        match self {
            CipherId::Aes256Gcm => "aes-256-gcm",
            CipherId::ChaCha20Poly1305 => "chacha20-poly1305",
        }
    }
}

impl fmt::Display for CipherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherId {
    type Err = VeilError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "aes-256-gcm" => Ok(CipherId::Aes256Gcm),
            "chacha20-poly1305" => Ok(CipherId::ChaCha20Poly1305),
            other => Err(VeilError::Validation(format!("Unknown cipher '{}'", other))),
        }
    }
}

/// A sealed payload
///
/// Only produced by [`seal`] or parsed from the wire via
/// [`SealedRecord::from_bytes`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedRecord {
    cipher: CipherId,
    nonce: Vec<u8>,
    tag: [u8; TAG_LEN],
    ciphertext: Vec<u8>,
}

impl SealedRecord {
    pub fn cipher(&self) -> CipherId {
        self.cipher
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn tag(&self) -> &[u8; TAG_LEN] {
        &self.tag
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Encode as `[nonce][tag][ciphertext]`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.nonce.len() + TAG_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse a wire blob produced under `cipher`
    pub fn from_bytes(cipher: CipherId, bytes: &[u8]) -> Result<Self> {
        let nonce_len = cipher.nonce_len();
        if bytes.len() < nonce_len + TAG_LEN {
            return Err(VeilError::Validation(format!(
                "Sealed record too short for {}: {} bytes, need at least {}",
                cipher,
                bytes.len(),
                nonce_len + TAG_LEN
            )));
        }

        let (nonce, rest) = bytes.split_at(nonce_len);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);
        let mut tag_bytes = [0u8; TAG_LEN];
        tag_bytes.copy_from_slice(tag);

        Ok(Self {
            cipher,
            nonce: nonce.to_vec(),
            tag: tag_bytes,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Base64 (standard alphabet) of the wire bytes
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    pub fn from_base64(cipher: CipherId, encoded: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| VeilError::Validation(format!("Invalid sealed record encoding: {}", e)))?;
        Self::from_bytes(cipher, &bytes)
    }
}

/// Seal `plaintext` under `key` with a fresh random nonce
pub fn seal<R>(
    plaintext: &[u8],
    key: &EncryptionKey,
    cipher: CipherId,
    rng: &mut R,
) -> Result<SealedRecord>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut nonce = vec![0u8; cipher.nonce_len()];
    rng.fill_bytes(&mut nonce);

    let aad = cipher.as_str().as_bytes();
    let mut buffer = plaintext.to_vec();

    let tag = match cipher {
        CipherId::Aes256Gcm => Aes256Gcm16::new_from_slice(key.as_bytes())
            .map_err(|e| VeilError::Encryption(format!("Invalid key for {}: {}", cipher, e)))?
            .encrypt_in_place_detached(GenericArray::from_slice(&nonce), aad, &mut buffer),
        CipherId::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|e| VeilError::Encryption(format!("Invalid key for {}: {}", cipher, e)))?
            .encrypt_in_place_detached(GenericArray::from_slice(&nonce), aad, &mut buffer),
    }
    .map_err(|e| {
        buffer.zeroize();
        VeilError::Encryption(format!("{} seal failed: {}", cipher, e))
    })?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);

    Ok(SealedRecord {
        cipher,
        nonce,
        tag: tag_bytes,
        ciphertext: buffer,
    })
}

/// Open a sealed record, verifying its tag
///
/// On any verification failure the working buffer is wiped and only the
/// error is returned.
pub fn open(record: &SealedRecord, key: &EncryptionKey) -> Result<Vec<u8>> {
    let cipher = record.cipher;
    let aad = cipher.as_str().as_bytes();
    let mut buffer = record.ciphertext.clone();
    let tag = GenericArray::from_slice(&record.tag);

    let outcome = match cipher {
        CipherId::Aes256Gcm => Aes256Gcm16::new_from_slice(key.as_bytes())
            .map_err(|e| VeilError::Encryption(format!("Invalid key for {}: {}", cipher, e)))?
            .decrypt_in_place_detached(
                GenericArray::from_slice(&record.nonce),
                aad,
                &mut buffer,
                tag,
            ),
        CipherId::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|e| VeilError::Encryption(format!("Invalid key for {}: {}", cipher, e)))?
            .decrypt_in_place_detached(
                GenericArray::from_slice(&record.nonce),
                aad,
                &mut buffer,
                tag,
            ),
    };

    if outcome.is_err() {
        buffer.zeroize();
        tracing::warn!(cipher = %cipher, "Sealed record failed authentication");
        return Err(VeilError::Authentication(format!(
            "{} tag verification failed",
            cipher
        )));
    }

    Ok(buffer)
}
