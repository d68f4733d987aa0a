//! Property-based tests for configuration parsing

use proptest::prelude::*;

use crate::config::{decode_hex_array, Config};

proptest! {
    #[test]
    fn prop_topic_key_hex_round_trip(bytes in any::<[u8; 32]>()) {
        let mut config = Config::default();
        config.topic.key = hex::encode(bytes);

        let key = config.topic_key().unwrap().unwrap();
        prop_assert_eq!(key.as_bytes(), &bytes);
    }

    #[test]
    fn prop_wrong_length_rejected(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assume!(bytes.len() != 32);
        prop_assert!(decode_hex_array::<32>("key", &hex::encode(&bytes)).is_err());
    }

    #[test]
    fn prop_arbitrary_key_strings_never_panic(s in "\\PC*") {
        let mut config = Config::default();
        config.topic.key = s;
        let _ = config.validate();
    }

    #[test]
    fn prop_arbitrary_toml_never_panics(s in "\\PC*") {
        let _ = toml::from_str::<Config>(&s).map(|c| c.validate());
    }
}
