//! stringphone core - confidential, authenticated group messaging over an
//! untrusted broadcast channel.
//!
//! This crate implements:
//! - The wire codec for the three message variants
//! - The participant trust store
//! - The per-device protocol engine ([`Topic`]) with its Pending and
//!   Bootstrapped states and the introduction/reply handshake
//!
//! It performs no I/O. Moving frames between participants is the job of the
//! embedding application.

#![forbid(unsafe_code)]

// Wire format
pub mod message;
pub mod types;

// Protocol engine
pub mod topic;
pub mod trust;

// Supporting modules
pub mod errors;
pub mod harness;

#[cfg(test)]
mod proptests;

pub use errors::TopicError;
pub use message::{Introduction, IntroductionReply, Message, MessageKind, SimpleMessage};
pub use topic::{DecodeOptions, Decoded, DropReason, MessageInfo, Topic, TopicState};
pub use trust::TrustStore;
pub use types::ParticipantId;

pub use stringphone_crypto::{Identity, TopicKey};
