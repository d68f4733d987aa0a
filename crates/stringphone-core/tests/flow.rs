//! Discovery flow through the public API.

use stringphone_core::{harness::run_discovery_flow, Identity, Topic, TopicKey, TopicState};

#[test]
fn test_discovery_flow() {
    let mut member = Topic::new(Identity::generate()).with_topic_key(TopicKey::generate());
    let mut joiner = Topic::new(Identity::generate());

    run_discovery_flow(&mut member, &mut joiner).expect("discovery flow should succeed");
    assert_eq!(joiner.state(), TopicState::Bootstrapped);
}
