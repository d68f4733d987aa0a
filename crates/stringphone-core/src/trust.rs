//! Participant trust store.
//!
//! Maps participant identifiers to their Ed25519 verification keys. Entries
//! are only ever added by an explicit application call; the engine never
//! trusts anyone on its own, not even after a successful handshake.

use std::collections::HashMap;

use ed25519_dalek::VerifyingKey;
use stringphone_crypto::identity::parse_verifying_key;
use tracing::debug;

use crate::errors::TopicError;
use crate::types::ParticipantId;

#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    participants: HashMap<ParticipantId, VerifyingKey>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw public keys, failing on the first invalid one.
    pub fn from_public_keys<'a, I>(keys: I) -> Result<Self, TopicError>
    where
        I: IntoIterator<Item = &'a [u8; 32]>,
    {
        let mut store = Self::new();
        for key in keys {
            store.add(key)?;
        }
        Ok(store)
    }

    /// Trust `public_key`, inserting or overwriting its entry.
    ///
    /// Returns the identifier the key is stored under.
    pub fn add(&mut self, public_key: &[u8; 32]) -> Result<ParticipantId, TopicError> {
        let key = parse_verifying_key(public_key).map_err(|_| TopicError::InvalidPublicKey)?;
        Ok(self.insert(key))
    }

    /// Trust an already-parsed verification key.
    pub fn insert(&mut self, key: VerifyingKey) -> ParticipantId {
        let id = ParticipantId::from_public_key(key.as_bytes());
        if self.participants.insert(id, key).is_none() {
            debug!(participant = %id, "participant trusted");
        }
        id
    }

    /// Stop trusting `id`. Removing an unknown id is a no-op returning `None`.
    pub fn remove(&mut self, id: &ParticipantId) -> Option<VerifyingKey> {
        let removed = self.participants.remove(id);
        if removed.is_some() {
            debug!(participant = %id, "participant removed");
        }
        removed
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&VerifyingKey> {
        self.participants.get(id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &VerifyingKey)> {
        self.participants.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ParticipantId> {
        self.participants.keys()
    }
}

impl FromIterator<VerifyingKey> for TrustStore {
    fn from_iter<T: IntoIterator<Item = VerifyingKey>>(iter: T) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}

impl Extend<VerifyingKey> for TrustStore {
    fn extend<T: IntoIterator<Item = VerifyingKey>>(&mut self, iter: T) {
        for key in iter {
            self.insert(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stringphone_crypto::Identity;

    #[test]
    fn test_add_and_lookup() {
        let identity = Identity::generate();
        let mut store = TrustStore::new();

        let id = store.add(&identity.public_key()).unwrap();

        assert_eq!(id.as_bytes(), &identity.id());
        assert_eq!(store.get(&id), Some(&identity.verifying_key()));
        assert!(store.contains(&id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_overwrites() {
        let identity = Identity::generate();
        let mut store = TrustStore::new();

        store.add(&identity.public_key()).unwrap();
        store.add(&identity.public_key()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let identity = Identity::generate();
        let mut store = TrustStore::new();
        let id = store.add(&identity.public_key()).unwrap();

        assert_eq!(store.remove(&id), Some(identity.verifying_key()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut store = TrustStore::new();
        assert_eq!(store.remove(&ParticipantId::from_bytes([7; 16])), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalid_key_rejected() {
        let mut store = TrustStore::new();
        // y = 2 is not on the curve.
        let mut bad = [0u8; 32];
        bad[0] = 2;
        assert_eq!(store.add(&bad), Err(TopicError::InvalidPublicKey));
        assert!(store.is_empty());
    }

    #[test]
    fn test_from_iterators() {
        let a = Identity::generate();
        let b = Identity::generate();

        let store: TrustStore = [a.verifying_key(), b.verifying_key()].into_iter().collect();
        assert_eq!(store.len(), 2);

        let keys = [a.public_key(), b.public_key()];
        let store = TrustStore::from_public_keys(keys.iter()).unwrap();
        assert!(store.contains(&ParticipantId::from_bytes(a.id())));
        assert!(store.contains(&ParticipantId::from_bytes(b.id())));
    }
}
