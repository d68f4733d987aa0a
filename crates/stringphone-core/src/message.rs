//! Wire codec.
//!
//! Every frame starts with a one-byte tag followed by fixed-width fields:
//!
//! | Variant | Tag | Layout after tag | Length |
//! |---|---|---|---|
//! | introduction | `i` | signing_pubkey(32) ‖ encryption_pubkey(32) | 65 |
//! | reply | `r` | recipient_id(16) ‖ boxed_topic_key(72) ‖ encryption_pubkey(32) ‖ signing_pubkey(32) | 153 |
//! | simple | `m` | signature(64) ‖ sender_id(16) ‖ ciphertext(≥0) | ≥81 |
//!
//! [`Message::parse`] is the only way in; it validates the tag and length once
//! and produces a variant that carries only its own fields.

use std::fmt;

use bytes::Bytes;
use stringphone_crypto::directed::{BOXED_TOPIC_KEY_LEN, ENCRYPTION_KEY_LEN};
use stringphone_crypto::identity::{PUBLIC_KEY_LEN, SIGNATURE_LEN};

use crate::errors::TopicError;
use crate::types::ParticipantId;

pub const TAG_SIMPLE: u8 = b'm';
pub const TAG_INTRODUCTION: u8 = b'i';
pub const TAG_REPLY: u8 = b'r';

const TAG_LEN: usize = 1;
const ID_LEN: usize = ParticipantId::LEN;

pub const INTRODUCTION_LEN: usize = TAG_LEN + PUBLIC_KEY_LEN + ENCRYPTION_KEY_LEN;
pub const REPLY_LEN: usize =
    TAG_LEN + ID_LEN + BOXED_TOPIC_KEY_LEN + ENCRYPTION_KEY_LEN + PUBLIC_KEY_LEN;
pub const SIMPLE_MIN_LEN: usize = TAG_LEN + SIGNATURE_LEN + ID_LEN;

/// The three frame variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Simple,
    Introduction,
    Reply,
}

impl MessageKind {
    pub fn tag(self) -> u8 {
        match self {
            MessageKind::Simple => TAG_SIMPLE,
            MessageKind::Introduction => TAG_INTRODUCTION,
            MessageKind::Reply => TAG_REPLY,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            TAG_SIMPLE => Some(MessageKind::Simple),
            TAG_INTRODUCTION => Some(MessageKind::Introduction),
            TAG_REPLY => Some(MessageKind::Reply),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Simple => "simple",
            MessageKind::Introduction => "introduction",
            MessageKind::Reply => "reply",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordinary, signed and encrypted topic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleMessage {
    signature: [u8; SIGNATURE_LEN],
    sender_id: ParticipantId,
    ciphertext: Bytes,
}

impl SimpleMessage {
    pub fn new(signature: [u8; SIGNATURE_LEN], sender_id: ParticipantId, ciphertext: Bytes) -> Self {
        Self {
            signature,
            sender_id,
            ciphertext,
        }
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.signature
    }

    pub fn sender_id(&self) -> &ParticipantId {
        &self.sender_id
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// The bytes covered by the signature: sender_id ‖ ciphertext.
    pub fn signed_data(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ID_LEN + self.ciphertext.len());
        out.extend_from_slice(self.sender_id.as_bytes());
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// signature ‖ sender_id ‖ ciphertext, i.e. the frame without its tag.
    pub fn signed_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SIGNATURE_LEN + ID_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.signed_data());
        out
    }

    fn parse(frame: &[u8]) -> Result<Self, TopicError> {
        if frame.len() < SIMPLE_MIN_LEN {
            return Err(TopicError::MalformedMessage("simple message too short"));
        }
        let signature = field::<SIGNATURE_LEN>(frame, TAG_LEN)?;
        let sender_id = ParticipantId::from_bytes(field::<ID_LEN>(frame, TAG_LEN + SIGNATURE_LEN)?);
        let ciphertext = Bytes::copy_from_slice(&frame[SIMPLE_MIN_LEN..]);
        Ok(Self::new(signature, sender_id, ciphertext))
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.push(TAG_SIMPLE);
        out.extend_from_slice(&self.signed_payload());
    }
}

/// A join request advertising the sender's signing and encryption keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Introduction {
    signing_key: [u8; PUBLIC_KEY_LEN],
    encryption_key: [u8; ENCRYPTION_KEY_LEN],
}

impl Introduction {
    pub fn new(signing_key: [u8; PUBLIC_KEY_LEN], encryption_key: [u8; ENCRYPTION_KEY_LEN]) -> Self {
        Self {
            signing_key,
            encryption_key,
        }
    }

    pub fn signing_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.signing_key
    }

    pub fn encryption_key(&self) -> &[u8; ENCRYPTION_KEY_LEN] {
        &self.encryption_key
    }

    pub fn sender_id(&self) -> ParticipantId {
        ParticipantId::from_public_key(&self.signing_key)
    }

    fn parse(frame: &[u8]) -> Result<Self, TopicError> {
        if frame.len() != INTRODUCTION_LEN {
            return Err(TopicError::MalformedMessage("introduction has wrong length"));
        }
        Ok(Self::new(
            field::<PUBLIC_KEY_LEN>(frame, TAG_LEN)?,
            field::<ENCRYPTION_KEY_LEN>(frame, TAG_LEN + PUBLIC_KEY_LEN)?,
        ))
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.push(TAG_INTRODUCTION);
        out.extend_from_slice(&self.signing_key);
        out.extend_from_slice(&self.encryption_key);
    }
}

/// Delivers the topic key, boxed to one requester's encryption key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntroductionReply {
    recipient_id: ParticipantId,
    encrypted_topic_key: [u8; BOXED_TOPIC_KEY_LEN],
    encryption_key: [u8; ENCRYPTION_KEY_LEN],
    signing_key: [u8; PUBLIC_KEY_LEN],
}

impl IntroductionReply {
    pub fn new(
        recipient_id: ParticipantId,
        encrypted_topic_key: [u8; BOXED_TOPIC_KEY_LEN],
        encryption_key: [u8; ENCRYPTION_KEY_LEN],
        signing_key: [u8; PUBLIC_KEY_LEN],
    ) -> Self {
        Self {
            recipient_id,
            encrypted_topic_key,
            encryption_key,
            signing_key,
        }
    }

    pub fn recipient_id(&self) -> &ParticipantId {
        &self.recipient_id
    }

    pub fn encrypted_topic_key(&self) -> &[u8; BOXED_TOPIC_KEY_LEN] {
        &self.encrypted_topic_key
    }

    /// The replier's encryption key.
    pub fn encryption_key(&self) -> &[u8; ENCRYPTION_KEY_LEN] {
        &self.encryption_key
    }

    /// The replier's signing key.
    pub fn signing_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.signing_key
    }

    pub fn sender_id(&self) -> ParticipantId {
        ParticipantId::from_public_key(&self.signing_key)
    }

    pub fn is_addressed_to(&self, id: &ParticipantId) -> bool {
        self.recipient_id.ct_eq(id)
    }

    fn parse(frame: &[u8]) -> Result<Self, TopicError> {
        if frame.len() != REPLY_LEN {
            return Err(TopicError::MalformedMessage("reply has wrong length"));
        }
        let mut offset = TAG_LEN;
        let recipient_id = ParticipantId::from_bytes(field::<ID_LEN>(frame, offset)?);
        offset += ID_LEN;
        let encrypted_topic_key = field::<BOXED_TOPIC_KEY_LEN>(frame, offset)?;
        offset += BOXED_TOPIC_KEY_LEN;
        let encryption_key = field::<ENCRYPTION_KEY_LEN>(frame, offset)?;
        offset += ENCRYPTION_KEY_LEN;
        let signing_key = field::<PUBLIC_KEY_LEN>(frame, offset)?;

        Ok(Self::new(recipient_id, encrypted_topic_key, encryption_key, signing_key))
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.push(TAG_REPLY);
        out.extend_from_slice(self.recipient_id.as_bytes());
        out.extend_from_slice(&self.encrypted_topic_key);
        out.extend_from_slice(&self.encryption_key);
        out.extend_from_slice(&self.signing_key);
    }
}

/// A parsed wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Simple(SimpleMessage),
    Introduction(Introduction),
    Reply(IntroductionReply),
}

impl Message {
    /// Classify and parse a raw frame.
    pub fn parse(frame: &[u8]) -> Result<Self, TopicError> {
        let tag = *frame
            .first()
            .ok_or(TopicError::MalformedMessage("empty frame"))?;
        match MessageKind::from_tag(tag) {
            Some(MessageKind::Simple) => SimpleMessage::parse(frame).map(Message::Simple),
            Some(MessageKind::Introduction) => Introduction::parse(frame).map(Message::Introduction),
            Some(MessageKind::Reply) => IntroductionReply::parse(frame).map(Message::Reply),
            None => Err(TopicError::MalformedMessage("unknown message tag")),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Simple(_) => MessageKind::Simple,
            Message::Introduction(_) => MessageKind::Introduction,
            Message::Reply(_) => MessageKind::Reply,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        match self {
            Message::Simple(m) => m.write(&mut out),
            Message::Introduction(m) => m.write(&mut out),
            Message::Reply(m) => m.write(&mut out),
        }
        out
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            Message::Simple(m) => SIMPLE_MIN_LEN + m.ciphertext.len(),
            Message::Introduction(_) => INTRODUCTION_LEN,
            Message::Reply(_) => REPLY_LEN,
        }
    }

    /// The sender's identifier. Defined for every variant; derived from the
    /// signing key for introductions and replies.
    pub fn sender_id(&self) -> ParticipantId {
        match self {
            Message::Simple(m) => *m.sender_id(),
            Message::Introduction(m) => m.sender_id(),
            Message::Reply(m) => m.sender_id(),
        }
    }

    pub fn signature(&self) -> Result<&[u8; SIGNATURE_LEN], TopicError> {
        self.as_simple().map(SimpleMessage::signature)
    }

    pub fn ciphertext(&self) -> Result<&[u8], TopicError> {
        self.as_simple().map(SimpleMessage::ciphertext)
    }

    pub fn signed_payload(&self) -> Result<Vec<u8>, TopicError> {
        self.as_simple().map(SimpleMessage::signed_payload)
    }

    /// The sender's public signing key (introduction and reply only).
    pub fn sender_key(&self) -> Result<&[u8; PUBLIC_KEY_LEN], TopicError> {
        match self {
            Message::Introduction(m) => Ok(m.signing_key()),
            Message::Reply(m) => Ok(m.signing_key()),
            Message::Simple(_) => Err(self.wrong_type(MessageKind::Introduction)),
        }
    }

    /// The sender's public encryption key (introduction and reply only).
    pub fn encryption_key(&self) -> Result<&[u8; ENCRYPTION_KEY_LEN], TopicError> {
        match self {
            Message::Introduction(m) => Ok(m.encryption_key()),
            Message::Reply(m) => Ok(m.encryption_key()),
            Message::Simple(_) => Err(self.wrong_type(MessageKind::Introduction)),
        }
    }

    pub fn recipient_id(&self) -> Result<&ParticipantId, TopicError> {
        self.as_reply().map(IntroductionReply::recipient_id)
    }

    pub fn encrypted_topic_key(&self) -> Result<&[u8; BOXED_TOPIC_KEY_LEN], TopicError> {
        self.as_reply().map(IntroductionReply::encrypted_topic_key)
    }

    pub fn as_simple(&self) -> Result<&SimpleMessage, TopicError> {
        match self {
            Message::Simple(m) => Ok(m),
            _ => Err(self.wrong_type(MessageKind::Simple)),
        }
    }

    pub fn as_introduction(&self) -> Result<&Introduction, TopicError> {
        match self {
            Message::Introduction(m) => Ok(m),
            _ => Err(self.wrong_type(MessageKind::Introduction)),
        }
    }

    pub fn as_reply(&self) -> Result<&IntroductionReply, TopicError> {
        match self {
            Message::Reply(m) => Ok(m),
            _ => Err(self.wrong_type(MessageKind::Reply)),
        }
    }

    fn wrong_type(&self, expected: MessageKind) -> TopicError {
        TopicError::WrongMessageType {
            expected,
            found: self.kind(),
        }
    }
}

impl From<Message> for Vec<u8> {
    fn from(message: Message) -> Self {
        message.to_bytes()
    }
}

impl TryFrom<&[u8]> for Message {
    type Error = TopicError;

    fn try_from(frame: &[u8]) -> Result<Self, Self::Error> {
        Message::parse(frame)
    }
}

/// Copy `N` bytes starting at `offset`, failing instead of reading past the end.
fn field<const N: usize>(frame: &[u8], offset: usize) -> Result<[u8; N], TopicError> {
    frame
        .get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or(TopicError::MalformedMessage("field out of bounds"))
}
