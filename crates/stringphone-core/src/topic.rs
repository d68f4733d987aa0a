//! The protocol engine.
//!
//! A [`Topic`] is one participant's view of a group channel. It owns the
//! participant's signing identity, a fresh encryption keypair, the topic key
//! (once known) and the trust store.
//!
//! A topic is either *Pending* (no topic key) or *Bootstrapped*. The only
//! transition is Pending to Bootstrapped, through a successful
//! [`Topic::parse_reply`], or by supplying the key at construction. It never
//! goes back.
//!
//! # Discovery
//!
//! ```text
//! joiner (Pending)                           member (Bootstrapped)
//!   construct_introduction()  ---- i ---->   decode() => Decoded::Introduction
//!                                            add_participant(joiner key)
//!   decode() => Decoded::IntroductionReply <--- r ----  construct_reply()
//!   add_participant(member key)
//!   parse_reply() => true
//! ```

use bytes::Bytes;
use ed25519_dalek::VerifyingKey;
use stringphone_crypto::directed::{EncryptionKeypair, BOXED_TOPIC_KEY_LEN, ENCRYPTION_KEY_LEN};
use stringphone_crypto::identity::{verify_signature, PUBLIC_KEY_LEN};
use stringphone_crypto::{CryptoError, Identity, SecretBox, TopicKey};
use tracing::{debug, info, warn};

use crate::errors::TopicError;
use crate::message::{Introduction, IntroductionReply, Message, MessageKind, SimpleMessage};
use crate::trust::TrustStore;
use crate::types::ParticipantId;

/// Whether the topic key is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicState {
    Pending,
    Bootstrapped,
}

/// Policy knobs for [`Topic::decode_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Skip the trust store lookup and signature verification. Only sound when
    /// the transport already authenticates senders.
    pub naive: bool,
    /// Drop simple messages from untrusted senders instead of failing with
    /// [`TopicError::UntrustedKey`].
    pub ignore_untrusted: bool,
}

impl DecodeOptions {
    pub fn naive() -> Self {
        Self {
            naive: true,
            ..Self::default()
        }
    }

    pub fn ignore_untrusted() -> Self {
        Self {
            ignore_untrusted: true,
            ..Self::default()
        }
    }
}

/// Why a frame produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// We sent it; the channel echoed it back.
    OwnMessage,
    /// Sender not trusted and `ignore_untrusted` was set.
    UntrustedSender,
    /// A handshake message that means nothing in our current state.
    NotActionable,
}

/// Outcome of [`Topic::decode`].
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A verified (unless naive) and decrypted message.
    Plaintext(Vec<u8>),
    /// A join request. Decide whether to trust the sender, then answer with
    /// [`Topic::reply_to`].
    Introduction(Introduction),
    /// A topic key delivery. Decide whether to trust the sender, then pass it
    /// to [`Topic::accept_reply`].
    IntroductionReply(IntroductionReply),
    /// Nothing to do.
    Dropped(DropReason),
}

impl Decoded {
    pub fn into_plaintext(self) -> Option<Vec<u8>> {
        match self {
            Decoded::Plaintext(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Decoded::Dropped(_))
    }
}

/// Identity fields of a frame, for trust decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    pub kind: MessageKind,
    pub participant_id: ParticipantId,
    /// The sender's signing key. Carried by introductions and replies; for
    /// simple messages only known if the sender is already trusted.
    pub participant_key: Option<[u8; PUBLIC_KEY_LEN]>,
    pub encryption_key: Option<[u8; ENCRYPTION_KEY_LEN]>,
    pub recipient_id: Option<ParticipantId>,
}

struct GroupKey {
    key: TopicKey,
    secret_box: SecretBox,
}

impl GroupKey {
    fn new(key: TopicKey) -> Self {
        let secret_box = SecretBox::new(&key);
        Self { key, secret_box }
    }
}

/// One participant's protocol state for a topic.
///
/// Not internally synchronized: share it behind a mutex or keep it on a
/// single task.
pub struct Topic {
    identity: Identity,
    id: ParticipantId,
    encryption: EncryptionKeypair,
    group: Option<GroupKey>,
    participants: TrustStore,
}

impl Topic {
    /// A Pending topic with an empty trust store.
    pub fn new(identity: Identity) -> Self {
        let id = ParticipantId::from_bytes(identity.id());
        Self {
            identity,
            id,
            encryption: EncryptionKeypair::generate(),
            group: None,
            participants: TrustStore::new(),
        }
    }

    /// Start Bootstrapped with a known topic key.
    pub fn with_topic_key(mut self, key: TopicKey) -> Self {
        self.group = Some(GroupKey::new(key));
        self
    }

    /// Replace the trust store with a pre-seeded one.
    pub fn with_participants(mut self, participants: TrustStore) -> Self {
        self.participants = participants;
        self
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Our public signing key.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.identity.public_key()
    }

    /// Our ephemeral public encryption key.
    pub fn encryption_public_key(&self) -> [u8; ENCRYPTION_KEY_LEN] {
        self.encryption.public_key()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn has_topic_key(&self) -> bool {
        self.group.is_some()
    }

    pub fn state(&self) -> TopicState {
        if self.has_topic_key() {
            TopicState::Bootstrapped
        } else {
            TopicState::Pending
        }
    }

    /// The topic key, once known. Lets the application persist it.
    pub fn topic_key(&self) -> Option<&TopicKey> {
        self.group.as_ref().map(|g| &g.key)
    }

    // ------------------------------------------------------------------
    // Participants
    // ------------------------------------------------------------------

    pub fn add_participant(&mut self, public_key: &[u8; PUBLIC_KEY_LEN]) -> Result<ParticipantId, TopicError> {
        self.participants.add(public_key)
    }

    /// Removing an unknown participant is a no-op returning `None`.
    pub fn remove_participant(&mut self, id: &ParticipantId) -> Option<VerifyingKey> {
        self.participants.remove(id)
    }

    pub fn participants(&self) -> &TrustStore {
        &self.participants
    }

    // ------------------------------------------------------------------
    // Discovery
    // ------------------------------------------------------------------

    /// Announce ourselves: our signing key and encryption key.
    pub fn construct_introduction(&self) -> Message {
        Message::Introduction(Introduction::new(
            self.identity.public_key(),
            self.encryption.public_key(),
        ))
    }

    /// Extract identity fields from any frame without touching state.
    pub fn get_message_info(&self, frame: &[u8]) -> Result<MessageInfo, TopicError> {
        let message = Message::parse(frame)?;
        Ok(self.message_info(&message))
    }

    pub fn message_info(&self, message: &Message) -> MessageInfo {
        let participant_id = message.sender_id();
        match message {
            Message::Simple(_) => MessageInfo {
                kind: MessageKind::Simple,
                participant_id,
                participant_key: self.participants.get(&participant_id).map(|k| k.to_bytes()),
                encryption_key: None,
                recipient_id: None,
            },
            Message::Introduction(intro) => MessageInfo {
                kind: MessageKind::Introduction,
                participant_id,
                participant_key: Some(*intro.signing_key()),
                encryption_key: Some(*intro.encryption_key()),
                recipient_id: None,
            },
            Message::Reply(reply) => MessageInfo {
                kind: MessageKind::Reply,
                participant_id,
                participant_key: Some(*reply.signing_key()),
                encryption_key: Some(*reply.encryption_key()),
                recipient_id: Some(*reply.recipient_id()),
            },
        }
    }

    /// Answer an introduction frame with the topic key.
    ///
    /// This grants the introduced party **full read access** to the topic.
    /// The engine does not check that the introduction's encryption key
    /// belongs to its signing key; the two fields are only co-located in the
    /// frame. Call this only after deciding to trust the sender.
    pub fn construct_reply(&self, introduction: &[u8]) -> Result<Message, TopicError> {
        let message = Message::parse(introduction)?;
        self.reply_to(message.as_introduction()?)
    }

    /// Like [`Topic::construct_reply`] for an already-parsed introduction.
    pub fn reply_to(&self, introduction: &Introduction) -> Result<Message, TopicError> {
        let group = self.group.as_ref().ok_or(TopicError::MissingTopicKey)?;

        let boxed = self
            .encryption
            .encrypt(group.key.as_bytes(), introduction.encryption_key())?;
        let encrypted_topic_key: [u8; BOXED_TOPIC_KEY_LEN] = boxed
            .as_slice()
            .try_into()
            .map_err(|_| TopicError::Crypto(CryptoError::EncryptionFailed))?;

        let recipient = introduction.sender_id();
        debug!(recipient = %recipient, "constructed introduction reply");

        Ok(Message::Reply(IntroductionReply::new(
            recipient,
            encrypted_topic_key,
            self.encryption.public_key(),
            self.identity.public_key(),
        )))
    }

    /// Install the topic key from a reply frame.
    ///
    /// Returns `Ok(false)` without touching state when we already have a
    /// key or the reply is addressed to someone else.
    pub fn parse_reply(&mut self, reply: &[u8]) -> Result<bool, TopicError> {
        let message = Message::parse(reply)?;
        self.accept_reply(message.as_reply()?)
    }

    /// Like [`Topic::parse_reply`] for an already-parsed reply.
    pub fn accept_reply(&mut self, reply: &IntroductionReply) -> Result<bool, TopicError> {
        if self.has_topic_key() {
            debug!(sender = %reply.sender_id(), "ignoring reply, topic key already known");
            return Ok(false);
        }
        if !reply.is_addressed_to(&self.id) {
            debug!(recipient = %reply.recipient_id(), "ignoring reply addressed to another participant");
            return Ok(false);
        }

        let plaintext = self
            .encryption
            .decrypt(reply.encrypted_topic_key(), reply.encryption_key())
            .map_err(|_| {
                warn!(sender = %reply.sender_id(), "could not open topic key from reply");
                TopicError::Decryption
            })?;
        let key = TopicKey::from_slice(&plaintext).map_err(|_| TopicError::Decryption)?;

        self.group = Some(GroupKey::new(key));
        info!(sender = %reply.sender_id(), participant = %self.id, "topic key installed");
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Encoding / decoding
    // ------------------------------------------------------------------

    /// Encrypt and sign `plaintext` for the topic.
    pub fn encode(&self, plaintext: &[u8]) -> Result<Message, TopicError> {
        let group = self.group.as_ref().ok_or(TopicError::MissingTopicKey)?;

        let ciphertext = Bytes::from(group.secret_box.seal(plaintext)?);

        let mut signed = Vec::with_capacity(ParticipantId::LEN + ciphertext.len());
        signed.extend_from_slice(self.id.as_bytes());
        signed.extend_from_slice(&ciphertext);
        let signature = self.identity.sign(&signed);

        Ok(Message::Simple(SimpleMessage::new(signature, self.id, ciphertext)))
    }

    /// Decode a frame with default options (verify, fail on untrusted).
    pub fn decode(&self, frame: &[u8]) -> Result<Decoded, TopicError> {
        self.decode_with(frame, DecodeOptions::default())
    }

    /// Decode a frame.
    ///
    /// Our own frames are dropped. Introductions and replies are surfaced as
    /// [`Decoded::Introduction`] and [`Decoded::IntroductionReply`] when they
    /// call for a handshake step in our current state, and dropped otherwise.
    pub fn decode_with(&self, frame: &[u8], options: DecodeOptions) -> Result<Decoded, TopicError> {
        let message = Message::parse(frame)?;

        if message.sender_id().ct_eq(&self.id) {
            return Ok(Decoded::Dropped(DropReason::OwnMessage));
        }

        match message {
            Message::Introduction(intro) => {
                if self.has_topic_key() {
                    debug!(sender = %intro.sender_id(), "received introduction");
                    Ok(Decoded::Introduction(intro))
                } else {
                    Ok(Decoded::Dropped(DropReason::NotActionable))
                }
            }
            Message::Reply(reply) => {
                if self.has_topic_key() {
                    Ok(Decoded::Dropped(DropReason::NotActionable))
                } else {
                    debug!(sender = %reply.sender_id(), "received introduction reply");
                    Ok(Decoded::IntroductionReply(reply))
                }
            }
            Message::Simple(simple) => self.decode_simple(&simple, options),
        }
    }

    fn decode_simple(&self, message: &SimpleMessage, options: DecodeOptions) -> Result<Decoded, TopicError> {
        let group = self.group.as_ref().ok_or(TopicError::MissingTopicKey)?;
        let sender = message.sender_id();

        if !options.naive {
            let Some(key) = self.participants.get(sender) else {
                if options.ignore_untrusted {
                    debug!(sender = %sender, "dropping message from untrusted participant");
                    return Ok(Decoded::Dropped(DropReason::UntrustedSender));
                }
                return Err(TopicError::UntrustedKey(*sender));
            };

            verify_signature(key, &message.signed_data(), message.signature()).map_err(|_| {
                warn!(sender = %sender, "signature verification failed");
                TopicError::BadSignature
            })?;
        }

        let plaintext = group.secret_box.open(message.ciphertext()).map_err(|_| {
            warn!(sender = %sender, "decryption failed");
            TopicError::Decryption
        })?;

        Ok(Decoded::Plaintext(plaintext))
    }
}

impl std::fmt::Debug for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("participants", &self.participants.len())
            .finish_non_exhaustive()
    }
}
