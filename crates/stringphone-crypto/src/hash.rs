use sha2::{Digest, Sha256};

/// Length of a participant identifier in bytes.
pub const PARTICIPANT_ID_LEN: usize = 16;

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(data);
    let out = h.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}

/// Participant identifier: the leading 16 bytes of sha256(signing_pubkey).
pub fn derive_participant_id(signing_pubkey: &[u8]) -> [u8; PARTICIPANT_ID_LEN] {
    let digest = sha256(signing_pubkey);
    let mut id = [0u8; PARTICIPANT_ID_LEN];
    id.copy_from_slice(&digest[..PARTICIPANT_ID_LEN]);
    id
}
