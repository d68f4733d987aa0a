//! Cryptographic primitives used by the stringphone protocol.
//!
//! Every primitive is pinned to a concrete algorithm so that the wire sizes
//! of the protocol are fixed:
//!
//! | Purpose | Algorithm | Sizes |
//! |---|---|---|
//! | Identity signatures | Ed25519 | 32 B key, 64 B signature |
//! | Participant ID | SHA-256 prefix | 16 B |
//! | Group (topic) encryption | XChaCha20-Poly1305 | 24 B nonce, 16 B tag |
//! | Directed encryption | X25519 + HKDF-SHA256 + XChaCha20-Poly1305 | 72 B for a 32 B key |

#![forbid(unsafe_code)]

pub mod error;
pub mod hash;
pub mod identity;
pub mod symmetric;
pub mod directed;
pub mod utils;

#[cfg(test)]
mod proptests;

pub use directed::EncryptionKeypair;
pub use error::CryptoError;
pub use identity::Identity;
pub use symmetric::{SecretBox, TopicKey};
