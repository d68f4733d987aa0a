//! Fuzzing target for the decode policy path.

#![no_main]
use libfuzzer_sys::fuzz_target;
use stringphone_core::{DecodeOptions, Identity, Topic, TopicKey};

fuzz_target!(|data: &[u8]| {
    let pending = Topic::new(Identity::from_seed(&[1; 32]));
    let bootstrapped =
        Topic::new(Identity::from_seed(&[2; 32])).with_topic_key(TopicKey::from_bytes([3; 32]));

    let _ = pending.decode(data);
    let _ = bootstrapped.decode(data);
    let _ = bootstrapped.decode_with(data, DecodeOptions::naive());
});
