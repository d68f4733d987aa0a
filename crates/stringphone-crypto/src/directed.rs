//! Directed (sender to recipient) encryption.
//!
//! A box in the NaCl sense: X25519 between the sender's secret and the
//! recipient's public key, HKDF-SHA256 over the shared secret, then
//! XChaCha20-Poly1305 with a random nonce. Both ends derive the same key, so
//! the recipient opens with its own secret and the sender's public key.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use rand_core::OsRng;
use sha2::Sha256;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::error::CryptoError;
use crate::symmetric::{NONCE_LEN, SEAL_OVERHEAD, TOPIC_KEY_LEN};

/// Length of an X25519 public key.
pub const ENCRYPTION_KEY_LEN: usize = 32;
/// Size of a boxed topic key: nonce(24) || key(32) || tag(16).
pub const BOXED_TOPIC_KEY_LEN: usize = SEAL_OVERHEAD + TOPIC_KEY_LEN;

const BOX_INFO: &[u8] = b"stringphone_box_v1";

/// An X25519 keypair used to receive (and send) directed ciphertexts.
///
/// Fresh per protocol engine instance; never persisted.
pub struct EncryptionKeypair {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl EncryptionKeypair {
    pub fn generate() -> Self {
        Self::from_secret(StaticSecret::random_from_rng(OsRng))
    }

    /// Rebuild a keypair from raw secret bytes. Intended for tests and
    /// fixtures; production code should call [`EncryptionKeypair::generate`].
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self::from_secret(StaticSecret::from(bytes))
    }

    fn from_secret(secret: StaticSecret) -> Self {
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_key(&self) -> [u8; ENCRYPTION_KEY_LEN] {
        self.public.to_bytes()
    }

    /// Encrypt `plaintext` so that only the holder of `recipient_public`'s
    /// secret can open it.
    ///
    /// Returns: nonce(24) || ciphertext+tag
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        recipient_public: &[u8; ENCRYPTION_KEY_LEN],
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = self.shared_cipher(recipient_public)?;

        let mut nonce = [0u8; NONCE_LEN];
        getrandom::getrandom(&mut nonce).map_err(|_| CryptoError::Rng)?;

        let ct = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ct.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ct);
        Ok(out)
    }

    /// Open a ciphertext produced by the holder of `sender_public`.
    ///
    /// Every failure, including a degenerate sender key, is reported as
    /// [`CryptoError::DecryptionFailed`].
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        sender_public: &[u8; ENCRYPTION_KEY_LEN],
    ) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < SEAL_OVERHEAD {
            return Err(CryptoError::DecryptionFailed);
        }
        let cipher = self
            .shared_cipher(sender_public)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        let (nonce, ct) = ciphertext.split_at(NONCE_LEN);
        cipher
            .decrypt(XNonce::from_slice(nonce), ct)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    fn shared_cipher(
        &self,
        peer_public: &[u8; ENCRYPTION_KEY_LEN],
    ) -> Result<XChaCha20Poly1305, CryptoError> {
        let peer = X25519PublicKey::from(*peer_public);
        let shared = self.secret.diffie_hellman(&peer);
        if !shared.was_contributory() {
            return Err(CryptoError::InvalidPublicKey);
        }

        // Salt with both public keys in a fixed order so either side derives
        // the same key.
        let own = self.public.to_bytes();
        let (lo, hi) = if own <= *peer_public {
            (own, *peer_public)
        } else {
            (*peer_public, own)
        };
        let mut salt = [0u8; 2 * ENCRYPTION_KEY_LEN];
        salt[..ENCRYPTION_KEY_LEN].copy_from_slice(&lo);
        salt[ENCRYPTION_KEY_LEN..].copy_from_slice(&hi);

        let hk = Hkdf::<Sha256>::new(Some(&salt[..]), shared.as_bytes());
        let mut key = [0u8; 32];
        hk.expand(BOX_INFO, &mut key)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(XChaCha20Poly1305::new(Key::from_slice(&key)))
    }
}

impl std::fmt::Debug for EncryptionKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKeypair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
