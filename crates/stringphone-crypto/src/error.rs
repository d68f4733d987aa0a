//! Crypto error types.

use thiserror::Error;

/// Errors raised by the primitives in this crate.
///
/// Decryption failures are deliberately a single variant: callers must not be
/// able to tell a wrong key from a corrupted ciphertext.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("RNG failed")]
    Rng,
}
