//! Property-based tests for the protocol engine.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use stringphone_crypto::{Identity, TopicKey};

    use crate::errors::TopicError;
    use crate::harness::{run_discovery_flow, trusted_pair};
    use crate::message::{Message, SIMPLE_MIN_LEN};
    use crate::topic::{DecodeOptions, Decoded, DropReason, Topic};

    fn topic_with(key: &TopicKey) -> Topic {
        Topic::new(Identity::generate()).with_topic_key(key.clone())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn property_naive_round_trip(key in any::<[u8; 32]>(), payload in any::<Vec<u8>>()) {
            let key = TopicKey::from_bytes(key);
            let sender = topic_with(&key);
            let receiver = topic_with(&key);

            let frame = sender.encode(&payload).unwrap().to_bytes();
            prop_assert_eq!(
                receiver.decode_with(&frame, DecodeOptions::naive()),
                Ok(Decoded::Plaintext(payload))
            );
        }

        #[test]
        fn property_self_drop(payload in any::<Vec<u8>>()) {
            let topic = topic_with(&TopicKey::generate());
            let frame = topic.encode(&payload).unwrap().to_bytes();
            prop_assert_eq!(topic.decode(&frame), Ok(Decoded::Dropped(DropReason::OwnMessage)));
        }

        #[test]
        fn property_untrusted_rejection(payload in any::<Vec<u8>>()) {
            let key = TopicKey::generate();
            let sender = topic_with(&key);
            let receiver = topic_with(&key);
            let frame = sender.encode(&payload).unwrap().to_bytes();

            prop_assert_eq!(receiver.decode(&frame), Err(TopicError::UntrustedKey(sender.id())));
            prop_assert_eq!(
                receiver.decode_with(&frame, DecodeOptions::ignore_untrusted()),
                Ok(Decoded::Dropped(DropReason::UntrustedSender))
            );
        }

        #[test]
        fn property_trust_symmetry(a_msg in any::<Vec<u8>>(), b_msg in any::<Vec<u8>>()) {
            let (a, b) = trusted_pair().unwrap();

            let to_b = a.encode(&a_msg).unwrap().to_bytes();
            let to_a = b.encode(&b_msg).unwrap().to_bytes();
            prop_assert_eq!(b.decode(&to_b), Ok(Decoded::Plaintext(a_msg)));
            prop_assert_eq!(a.decode(&to_a), Ok(Decoded::Plaintext(b_msg)));
        }

        #[test]
        fn property_discovery_end_to_end(payload in any::<Vec<u8>>()) {
            let mut member = topic_with(&TopicKey::generate());
            let mut joiner = Topic::new(Identity::generate());

            run_discovery_flow(&mut member, &mut joiner).unwrap();

            let to_joiner = member.encode(&payload).unwrap().to_bytes();
            let to_member = joiner.encode(&payload).unwrap().to_bytes();
            prop_assert_eq!(joiner.decode(&to_joiner), Ok(Decoded::Plaintext(payload.clone())));
            prop_assert_eq!(member.decode(&to_member), Ok(Decoded::Plaintext(payload)));
        }

        #[test]
        fn property_tamper_rejection(payload in any::<Vec<u8>>(), bit in any::<prop::sample::Index>()) {
            let (a, b) = trusted_pair().unwrap();
            let mut frame = a.encode(&payload).unwrap().to_bytes();

            // Flip a bit in the signature (bytes 1..65) or the ciphertext (81..).
            let candidates: Vec<usize> = (1..65).chain(SIMPLE_MIN_LEN..frame.len()).collect();
            let byte = candidates[bit.index(candidates.len())];
            frame[byte] ^= 1 << (bit.index(8));

            match b.decode(&frame) {
                Err(TopicError::BadSignature) | Err(TopicError::Decryption) => {}
                other => prop_assert!(false, "tampered frame accepted: {:?}", other),
            }
        }

        #[test]
        fn property_short_simple_frames_are_malformed(rest in prop::collection::vec(any::<u8>(), 0..SIMPLE_MIN_LEN - 1)) {
            let topic = topic_with(&TopicKey::generate());
            let mut frame = vec![b'm'];
            frame.extend_from_slice(&rest);
            prop_assert!(matches!(topic.decode(&frame), Err(TopicError::MalformedMessage(_))));
        }

        #[test]
        fn property_unknown_tags_are_malformed(tag in any::<u8>(), rest in any::<Vec<u8>>()) {
            prop_assume!(tag != b'm' && tag != b'i' && tag != b'r');
            let topic = topic_with(&TopicKey::generate());
            let mut frame = vec![tag];
            frame.extend_from_slice(&rest);
            prop_assert!(matches!(topic.decode(&frame), Err(TopicError::MalformedMessage(_))));
        }

        #[test]
        fn property_arbitrary_bytes_never_panic(frame in any::<Vec<u8>>()) {
            let pending = Topic::new(Identity::generate());
            let bootstrapped = topic_with(&TopicKey::generate());
            let _ = pending.decode(&frame);
            let _ = bootstrapped.decode(&frame);
            let _ = bootstrapped.decode_with(&frame, DecodeOptions::naive());
            let _ = bootstrapped.get_message_info(&frame);
        }

        #[test]
        fn property_codec_reserialization(frame in any::<Vec<u8>>()) {
            if let Ok(message) = Message::parse(&frame) {
                prop_assert_eq!(message.to_bytes(), frame);
            }
        }
    }
}
