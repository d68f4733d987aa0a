//! Fuzzing target for the wire codec.

#![no_main]
use libfuzzer_sys::fuzz_target;
use stringphone_core::Message;

fuzz_target!(|data: &[u8]| {
    // Must never panic; anything that parses must re-serialize byte for byte.
    if let Ok(message) = Message::parse(data) {
        assert_eq!(message.to_bytes(), data);
    }
});
