use std::fmt;
use std::str::FromStr;

use stringphone_crypto::hash::{derive_participant_id, PARTICIPANT_ID_LEN};
use stringphone_crypto::utils::constant_time_compare_array;

use crate::errors::TopicError;

/// 16-byte participant identifier: sha256(signing_pubkey)[..16].
///
/// Never secret. Rendered as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId([u8; PARTICIPANT_ID_LEN]);

impl ParticipantId {
    pub const LEN: usize = PARTICIPANT_ID_LEN;

    pub fn from_bytes(bytes: [u8; PARTICIPANT_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_public_key(signing_pubkey: &[u8; 32]) -> Self {
        Self(derive_participant_id(signing_pubkey))
    }

    pub fn as_bytes(&self) -> &[u8; PARTICIPANT_ID_LEN] {
        &self.0
    }

    /// Constant-time equality, for comparisons against our own identity.
    pub fn ct_eq(&self, other: &ParticipantId) -> bool {
        constant_time_compare_array(&self.0, &other.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({})", hex::encode(self.0))
    }
}

impl FromStr for ParticipantId {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| TopicError::InvalidParticipantId(e.to_string()))?;
        let arr: [u8; PARTICIPANT_ID_LEN] = bytes.as_slice().try_into().map_err(|_| {
            TopicError::InvalidParticipantId(format!(
                "expected {} bytes, got {}",
                PARTICIPANT_ID_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for ParticipantId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
