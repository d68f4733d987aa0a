#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::directed::EncryptionKeypair;
    use crate::hash::derive_participant_id;
    use crate::identity::{verify_signature, Identity};
    use crate::symmetric::{SecretBox, TopicKey};

    proptest! {
        #[test]
        fn test_identity_signature_round_trip(
            seed in any::<[u8; 32]>(),
            message in any::<Vec<u8>>()
        ) {
            let identity = Identity::from_seed(&seed);
            let sig = identity.sign(&message);
            prop_assert!(verify_signature(&identity.verifying_key(), &message, &sig).is_ok());
        }

        #[test]
        fn test_signature_bit_flip_rejected(
            seed in any::<[u8; 32]>(),
            message in any::<Vec<u8>>(),
            bit in 0usize..512
        ) {
            let identity = Identity::from_seed(&seed);
            let mut sig = identity.sign(&message);
            sig[bit / 8] ^= 1 << (bit % 8);
            prop_assert!(verify_signature(&identity.verifying_key(), &message, &sig).is_err());
        }

        #[test]
        fn test_participant_id_determinism(seed in any::<[u8; 32]>()) {
            let a = Identity::from_seed(&seed);
            let b = Identity::from_seed(&seed);
            prop_assert_eq!(a.id(), b.id());
            prop_assert_eq!(a.id(), derive_participant_id(&a.public_key()));
        }

        #[test]
        fn test_secret_box_round_trip(
            key in any::<[u8; 32]>(),
            plaintext in any::<Vec<u8>>()
        ) {
            let sbox = SecretBox::new(&TopicKey::from_bytes(key));
            let sealed = sbox.seal(&plaintext).unwrap();
            prop_assert_eq!(sbox.open(&sealed).unwrap(), plaintext);
        }

        #[test]
        fn test_directed_round_trip(
            sender_secret in any::<[u8; 32]>(),
            recipient_secret in any::<[u8; 32]>(),
            payload in any::<Vec<u8>>()
        ) {
            let sender = EncryptionKeypair::from_secret_bytes(sender_secret);
            let recipient = EncryptionKeypair::from_secret_bytes(recipient_secret);

            let ct = sender.encrypt(&payload, &recipient.public_key()).unwrap();
            let pt = recipient.decrypt(&ct, &sender.public_key()).unwrap();
            prop_assert_eq!(pt, payload);
        }

        #[test]
        fn test_secret_box_never_panics_on_garbage(
            key in any::<[u8; 32]>(),
            blob in any::<Vec<u8>>()
        ) {
            let sbox = SecretBox::new(&TopicKey::from_bytes(key));
            let _ = sbox.open(&blob);
        }
    }
}
