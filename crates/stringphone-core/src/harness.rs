//! Test harness for the discovery handshake.
//!
//! Drives two [`Topic`]s through the full introduction/reply exchange the
//! way an application would, trusting every peer it sees. Used by the
//! integration tests and the CLI simulation.

use stringphone_crypto::{Identity, TopicKey};

use crate::errors::TopicError;
use crate::topic::{Decoded, Topic, TopicState};

/// Failure of a scripted flow.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Topic(#[from] TopicError),

    #[error("unexpected outcome at {step}: {outcome}")]
    Unexpected { step: &'static str, outcome: String },
}

fn unexpected(step: &'static str, outcome: impl std::fmt::Debug) -> FlowError {
    FlowError::Unexpected {
        step,
        outcome: format!("{outcome:?}"),
    }
}

/// Run discovery between a Bootstrapped `member` and a Pending `joiner`.
///
/// 1. Joiner broadcasts an introduction
/// 2. Member decodes it, trusts the joiner, and replies
/// 3. Joiner decodes the reply, trusts the member, and installs the key
///
/// On success both sides trust each other and share the topic key.
pub fn run_discovery_flow(member: &mut Topic, joiner: &mut Topic) -> Result<(), FlowError> {
    let intro = joiner.construct_introduction().to_bytes();

    let introduction = match member.decode(&intro)? {
        Decoded::Introduction(intro) => intro,
        other => return Err(unexpected("member decoding introduction", other)),
    };
    member.add_participant(introduction.signing_key())?;
    let reply = member.reply_to(&introduction)?.to_bytes();

    let reply = match joiner.decode(&reply)? {
        Decoded::IntroductionReply(reply) => reply,
        other => return Err(unexpected("joiner decoding reply", other)),
    };
    joiner.add_participant(reply.signing_key())?;

    if !joiner.accept_reply(&reply)? {
        return Err(unexpected("joiner accepting reply", joiner.state()));
    }
    if joiner.state() != TopicState::Bootstrapped {
        return Err(unexpected("joiner state", joiner.state()));
    }
    Ok(())
}

/// Two Bootstrapped topics sharing a fresh key and trusting each other.
pub fn trusted_pair() -> Result<(Topic, Topic), TopicError> {
    let key = TopicKey::generate();
    let mut a = Topic::new(Identity::generate()).with_topic_key(key.clone());
    let mut b = Topic::new(Identity::generate()).with_topic_key(key);
    a.add_participant(&b.public_key())?;
    b.add_participant(&a.public_key())?;
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_flow() {
        let mut member = Topic::new(Identity::generate()).with_topic_key(TopicKey::generate());
        let mut joiner = Topic::new(Identity::generate());

        run_discovery_flow(&mut member, &mut joiner).expect("discovery should succeed");

        assert_eq!(joiner.topic_key(), member.topic_key());
        assert!(member.participants().contains(&joiner.id()));
        assert!(joiner.participants().contains(&member.id()));
    }

    #[test]
    fn test_discovery_flow_needs_bootstrapped_member() {
        let mut member = Topic::new(Identity::generate());
        let mut joiner = Topic::new(Identity::generate());

        let err = run_discovery_flow(&mut member, &mut joiner).unwrap_err();
        assert!(matches!(err, FlowError::Unexpected { .. }));
    }

    #[test]
    fn test_trusted_pair() {
        let (a, b) = trusted_pair().unwrap();
        let frame = a.encode(b"hi").unwrap().to_bytes();
        assert_eq!(b.decode(&frame).unwrap().into_plaintext(), Some(b"hi".to_vec()));
    }
}
