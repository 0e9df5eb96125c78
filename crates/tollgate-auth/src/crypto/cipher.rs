//! Symmetric encryption for values that must be obscured at rest or in
//! transit, such as the login session cookie.
//!
//! Ciphertexts are `base64url(nonce || ciphertext || tag)` without padding,
//! so they can be placed in cookies and query strings unchanged.

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Nonce size for AES-GCM (96 bits)
const NONCE_SIZE: usize = 12;

/// Errors raised by [`SymmetricCipher`].
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// Nothing to encrypt.
    #[error("Plaintext is empty")]
    EmptyPlaintext,

    /// Nothing to decrypt.
    #[error("Ciphertext is empty")]
    EmptyCiphertext,

    /// The key length does not fit the algorithm.
    #[error("Invalid key for {algorithm}: expected {expected} bytes, got {actual}")]
    InvalidKey {
        /// Algorithm the key was used with.
        algorithm: CipherAlgorithm,
        /// Required key length in bytes.
        expected: usize,
        /// Supplied key length in bytes.
        actual: usize,
    },

    /// The ciphertext is not in the expected encoding.
    #[error("Malformed ciphertext: {0}")]
    Malformed(String),

    /// Authentication failed: wrong key, wrong algorithm, or tampered data.
    #[error("Decryption failed")]
    Decryption,

    /// The AEAD primitive rejected the input.
    #[error("Encryption failed")]
    Encryption,
}

impl From<CipherError> for AuthError {
    fn from(err: CipherError) -> Self {
        AuthError::cipher(err.to_string())
    }
}

/// Supported symmetric algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherAlgorithm {
    /// AES-128 in GCM mode (16-byte key).
    Aes128Gcm,
    /// AES-256 in GCM mode (32-byte key).
    Aes256Gcm,
}

impl CipherAlgorithm {
    /// Required key length in bytes.
    #[must_use]
    pub fn key_len(self) -> usize {
        match self {
            Self::Aes128Gcm => 16,
            Self::Aes256Gcm => 32,
        }
    }

    /// Picks the algorithm matching a key length, if any.
    #[must_use]
    pub fn for_key_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(Self::Aes128Gcm),
            32 => Some(Self::Aes256Gcm),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aes128Gcm => "aes-128-gcm",
            Self::Aes256Gcm => "aes-256-gcm",
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherAlgorithm {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes-128-gcm" | "aes128gcm" => Ok(Self::Aes128Gcm),
            "aes-256-gcm" | "aes256gcm" => Ok(Self::Aes256Gcm),
            other => Err(CipherError::Malformed(format!("unknown algorithm '{other}'"))),
        }
    }
}

/// Stateless encrypt/decrypt primitive.
pub struct SymmetricCipher;

impl SymmetricCipher {
    /// Encrypts `plaintext` with a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Fails on empty plaintext or a key that does not fit `algorithm`.
    pub fn encrypt(
        plaintext: &str,
        algorithm: CipherAlgorithm,
        key: &[u8],
    ) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Err(CipherError::EmptyPlaintext);
        }
        check_key(algorithm, key)?;

        let mut nonce = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = match algorithm {
            CipherAlgorithm::Aes128Gcm => seal::<Aes128Gcm>(key, &nonce, plaintext.as_bytes())?,
            CipherAlgorithm::Aes256Gcm => seal::<Aes256Gcm>(key, &nonce, plaintext.as_bytes())?,
        };

        let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    /// Decrypts a value produced by [`SymmetricCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Fails on empty or malformed input, a key that does not fit
    /// `algorithm`, or any authentication failure.
    pub fn decrypt(
        ciphertext: &str,
        algorithm: CipherAlgorithm,
        key: &[u8],
    ) -> Result<String, CipherError> {
        if ciphertext.is_empty() {
            return Err(CipherError::EmptyCiphertext);
        }
        check_key(algorithm, key)?;

        let raw = URL_SAFE_NO_PAD
            .decode(ciphertext.as_bytes())
            .map_err(|e| CipherError::Malformed(format!("invalid base64: {e}")))?;
        if raw.len() <= NONCE_SIZE {
            return Err(CipherError::Malformed("ciphertext too short".to_string()));
        }
        let (nonce, sealed) = raw.split_at(NONCE_SIZE);

        let plain = match algorithm {
            CipherAlgorithm::Aes128Gcm => open::<Aes128Gcm>(key, nonce, sealed)?,
            CipherAlgorithm::Aes256Gcm => open::<Aes256Gcm>(key, nonce, sealed)?,
        };

        String::from_utf8(plain)
            .map_err(|e| CipherError::Malformed(format!("invalid UTF-8 in plaintext: {e}")))
    }
}

fn check_key(algorithm: CipherAlgorithm, key: &[u8]) -> Result<(), CipherError> {
    if key.len() != algorithm.key_len() {
        return Err(CipherError::InvalidKey {
            algorithm,
            expected: algorithm.key_len(),
            actual: key.len(),
        });
    }
    Ok(())
}

fn seal<C>(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: KeyInit + Aead + AeadCore<NonceSize = U12>,
{
    let cipher = C::new_from_slice(key).map_err(|_| CipherError::Encryption)?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CipherError::Encryption)
}

fn open<C>(key: &[u8], nonce: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: KeyInit + Aead + AeadCore<NonceSize = U12>,
{
    let cipher = C::new_from_slice(key).map_err(|_| CipherError::Decryption)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CipherError::Decryption)
}
