//! Symmetric authenticated encryption for topic traffic.
//!
//! Uses XChaCha20-Poly1305 with a random 24-byte nonce per message. The
//! extended nonce makes random nonces safe for the lifetime of a group key.

#![forbid(unsafe_code)]

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use rand_core::{OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::utils::constant_time_compare_array;

/// Length of a topic (group) key.
pub const TOPIC_KEY_LEN: usize = 32;
/// Length of the random nonce prefixed to every sealed blob.
pub const NONCE_LEN: usize = 24;
/// Length of the Poly1305 authentication tag.
pub const TAG_LEN: usize = 16;
/// Bytes added by [`SecretBox::seal`] on top of the plaintext.
pub const SEAL_OVERHEAD: usize = NONCE_LEN + TAG_LEN;

/// The shared symmetric key of a topic.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct TopicKey([u8; TOPIC_KEY_LEN]);

impl TopicKey {
    /// Generate a new cryptographically secure topic key.
    pub fn generate() -> Self {
        let mut key = [0u8; TOPIC_KEY_LEN];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn from_bytes(bytes: [u8; TOPIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; TOPIC_KEY_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: TOPIC_KEY_LEN,
                got: bytes.len(),
            })?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; TOPIC_KEY_LEN] {
        &self.0
    }
}

impl PartialEq for TopicKey {
    fn eq(&self, other: &Self) -> bool {
        constant_time_compare_array(&self.0, &other.0)
    }
}

impl Eq for TopicKey {}

impl std::fmt::Debug for TopicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TopicKey(..)")
    }
}

/// AEAD cipher keyed with a [`TopicKey`].
#[derive(Clone)]
pub struct SecretBox {
    aead: XChaCha20Poly1305,
}

impl SecretBox {
    pub fn new(key: &TopicKey) -> Self {
        Self {
            aead: XChaCha20Poly1305::new(Key::from_slice(key.as_bytes())),
        }
    }

    /// Encrypt with a fresh random nonce.
    ///
    /// Returns: nonce(24) || ciphertext+tag
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        getrandom::getrandom(&mut nonce).map_err(|_| CryptoError::Rng)?;

        let ct = self
            .aead
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ct.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ct);
        Ok(out)
    }

    /// Decrypt a blob produced by [`SecretBox::seal`].
    ///
    /// Expects: nonce(24) || ciphertext+tag
    pub fn open(&self, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if blob.len() < SEAL_OVERHEAD {
            return Err(CryptoError::DecryptionFailed);
        }
        let (nonce, ct) = blob.split_at(NONCE_LEN);
        self.aead
            .decrypt(XNonce::from_slice(nonce), ct)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl std::fmt::Debug for SecretBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretBox(..)")
    }
}
