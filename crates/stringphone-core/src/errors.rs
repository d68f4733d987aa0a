//! Error types for the protocol engine.
//!
//! The two handshake signals (an introduction arriving at a bootstrapped
//! device, a reply arriving at a pending one) are not errors here; they are
//! variants of [`crate::Decoded`].

use stringphone_crypto::CryptoError;
use thiserror::Error;

use crate::message::MessageKind;
use crate::types::ParticipantId;

/// Unified error type for protocol operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopicError {
    /// Structurally invalid frame. Always safe to drop.
    #[error("malformed message: {0}")]
    MalformedMessage(&'static str),

    /// An accessor or operation was used on the wrong variant.
    #[error("wrong message type: expected {expected}, found {found}")]
    WrongMessageType {
        expected: MessageKind,
        found: MessageKind,
    },

    /// The operation needs the topic key, which is not known yet.
    #[error("topic key is unknown, discovery must complete first")]
    MissingTopicKey,

    /// Sender is not in the trust store.
    #[error("verification key for participant {0} not found")]
    UntrustedKey(ParticipantId),

    #[error("signature verification failed")]
    BadSignature,

    /// Symmetric or directed decryption failed. Never split further.
    #[error("decryption failed")]
    Decryption,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid participant id: {0}")]
    InvalidParticipantId(String),

    /// Any other primitive failure (RNG, encryption).
    #[error("crypto error: {0}")]
    Crypto(CryptoError),
}

impl From<CryptoError> for TopicError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::DecryptionFailed => TopicError::Decryption,
            CryptoError::InvalidSignature => TopicError::BadSignature,
            CryptoError::InvalidPublicKey => TopicError::InvalidPublicKey,
            other => TopicError::Crypto(other),
        }
    }
}

impl TopicError {
    /// Whether a remote party can cause this error by sending bytes.
    ///
    /// `false` means the caller misused the API or skipped a handshake step.
    pub fn is_wire_triggerable(&self) -> bool {
        matches!(
            self,
            TopicError::MalformedMessage(_)
                | TopicError::UntrustedKey(_)
                | TopicError::BadSignature
                | TopicError::Decryption
                | TopicError::InvalidPublicKey
        )
    }
}
