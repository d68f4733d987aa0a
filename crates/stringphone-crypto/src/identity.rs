//! Identity module for participant signing keys.
//!
//! A participant is identified by an Ed25519 keypair. The private half never
//! leaves this struct except as the 32-byte seed, which the embedding
//! application may persist to keep the same identity across restarts.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand_core::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::hash::{derive_participant_id, PARTICIPANT_ID_LEN};

/// Length of an Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;
/// Length of an Ed25519 private seed.
pub const SEED_LEN: usize = 32;
/// Length of an Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// A participant's signing identity.
///
/// Key material is zeroized when the Identity is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Identity {
    #[zeroize(skip)] // SigningKey zeroizes itself on drop
    sign_key: SigningKey,
}

impl Identity {
    /// Generate a new random identity using a secure random source.
    pub fn generate() -> Self {
        Self {
            sign_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministically rebuild an identity from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        Self {
            sign_key: SigningKey::from_bytes(seed),
        }
    }

    /// Like [`Identity::from_seed`] but for unsized input, e.g. decoded hex.
    pub fn from_slice(seed: &[u8]) -> Result<Self, CryptoError> {
        let seed: [u8; SEED_LEN] = seed.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: SEED_LEN,
            got: seed.len(),
        })?;
        Ok(Self::from_seed(&seed))
    }

    /// The private seed. Treat the result as secret.
    pub fn seed(&self) -> [u8; SEED_LEN] {
        self.sign_key.to_bytes()
    }

    /// The Ed25519 public key bytes.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.sign_key.verifying_key().to_bytes()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.sign_key.verifying_key()
    }

    /// The participant identifier derived from the public key.
    pub fn id(&self) -> [u8; PARTICIPANT_ID_LEN] {
        derive_participant_id(&self.public_key())
    }

    /// Sign a message using Ed25519.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        let signature: Signature = self.sign_key.sign(message);
        signature.to_bytes()
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("public_key", &self.verifying_key())
            .finish_non_exhaustive()
    }
}

/// Parse 32 bytes as an Ed25519 public key, rejecting invalid points.
pub fn parse_verifying_key(bytes: &[u8; PUBLIC_KEY_LEN]) -> Result<VerifyingKey, CryptoError> {
    VerifyingKey::from_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)
}

/// Verify an Ed25519 signature with strict verification.
pub fn verify_signature(
    key: &VerifyingKey,
    message: &[u8],
    signature: &[u8; SIGNATURE_LEN],
) -> Result<(), CryptoError> {
    let sig = Signature::from_bytes(signature);
    key.verify_strict(message, &sig)
        .map_err(|_| CryptoError::InvalidSignature)
}
