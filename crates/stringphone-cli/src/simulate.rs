//! In-process group simulation.
//!
//! Devices share a [`tokio::sync::broadcast`] channel that stands in for a
//! pub/sub topic: every frame reaches every device, including its sender.
//! Device 0 starts Bootstrapped and answers every introduction. The others
//! start Pending, introduce themselves, and once they hold the topic key
//! broadcast their own messages. Every device trusts each peer whose
//! signing key it sees in a handshake frame.

use std::time::Duration;

use stringphone_core::{Decoded, Identity, MessageKind, ParticipantId, Topic, TopicError, TopicKey};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Simulation errors
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("a simulation needs at least two participants, got {0}")]
    TooFewParticipants(usize),

    #[error(transparent)]
    Topic(#[from] TopicError),

    #[error("device task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    /// Number of devices, including the bootstrapped one
    pub participants: usize,
    /// Messages each device broadcasts once it has the topic key
    pub messages: usize,
    /// Wall-clock limit for the whole run
    pub timeout: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            participants: 3,
            messages: 3,
            timeout: Duration::from_secs(10),
        }
    }
}

/// What one device saw.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub index: usize,
    pub id: ParticipantId,
    pub bootstrapped: bool,
    pub delivered: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub devices: Vec<DeviceReport>,
    /// Plaintexts each device must decode: (participants - 1) * messages
    pub expected_per_device: usize,
}

impl SimulationReport {
    /// Every device bootstrapped and decoded every peer message.
    pub fn is_complete(&self) -> bool {
        self.devices.iter().all(|d| {
            d.bootstrapped && d.delivered == self.expected_per_device && d.rejected == 0
        })
    }
}

/// Run a simulation to completion or until the timeout elapses.
pub async fn run(config: SimulationConfig) -> Result<SimulationReport, SimulationError> {
    if config.participants < 2 {
        return Err(SimulationError::TooFewParticipants(config.participants));
    }

    let peers = config.participants - 1;
    let expected = peers * config.messages;
    // introductions + replies + group messages; sized so no receiver lags
    let capacity = 2 * peers + config.participants * config.messages + 1;
    let (tx, _) = broadcast::channel(capacity);
    let deadline = Instant::now() + config.timeout;
    let key = TopicKey::generate();

    // Subscribe everyone before the first frame is sent.
    let devices: Vec<Device> = (0..config.participants)
        .map(|index| {
            let mut topic = Topic::new(Identity::generate());
            if index == 0 {
                topic = topic.with_topic_key(key.clone());
            }
            Device {
                index,
                topic,
                founder: index == 0,
                tx: tx.clone(),
                rx: tx.subscribe(),
                backlog: Vec::new(),
                delivered: 0,
                rejected: 0,
                replied: 0,
            }
        })
        .collect();
    drop(tx);

    info!(
        participants = config.participants,
        messages = config.messages,
        "starting simulation"
    );

    let mut tasks = JoinSet::new();
    for device in devices {
        tasks.spawn(device.run(config.messages, peers, expected, deadline));
    }

    let mut reports = Vec::with_capacity(config.participants);
    while let Some(result) = tasks.join_next().await {
        reports.push(result??);
    }
    reports.sort_by_key(|r| r.index);

    Ok(SimulationReport {
        devices: reports,
        expected_per_device: expected,
    })
}

struct Device {
    index: usize,
    topic: Topic,
    founder: bool,
    tx: broadcast::Sender<Vec<u8>>,
    rx: broadcast::Receiver<Vec<u8>>,
    /// Group frames that arrived before we had the topic key.
    backlog: Vec<Vec<u8>>,
    delivered: usize,
    rejected: usize,
    replied: usize,
}

impl Device {
    async fn run(
        mut self,
        messages: usize,
        peers: usize,
        expected: usize,
        deadline: Instant,
    ) -> Result<DeviceReport, SimulationError> {
        if self.topic.has_topic_key() {
            self.broadcast_messages(messages)?;
        } else {
            let intro = self.topic.construct_introduction().to_bytes();
            self.send(intro);
        }

        while !self.is_done(peers, expected) {
            let frame = match timeout_at(deadline, self.rx.recv()).await {
                Err(_) => {
                    warn!(device = self.index, delivered = self.delivered, "timed out");
                    break;
                }
                Ok(Err(RecvError::Lagged(skipped))) => {
                    warn!(device = self.index, skipped, "receiver lagged");
                    continue;
                }
                Ok(Err(RecvError::Closed)) => break,
                Ok(Ok(frame)) => frame,
            };
            self.handle(&frame, messages)?;
        }

        Ok(DeviceReport {
            index: self.index,
            id: self.topic.id(),
            bootstrapped: self.topic.has_topic_key(),
            delivered: self.delivered,
            rejected: self.rejected,
        })
    }

    fn is_done(&self, peers: usize, expected: usize) -> bool {
        self.topic.has_topic_key()
            && self.delivered >= expected
            && (!self.founder || self.replied >= peers)
    }

    fn handle(&mut self, frame: &[u8], messages: usize) -> Result<(), SimulationError> {
        let info = match self.topic.get_message_info(frame) {
            Ok(info) => info,
            Err(e) => {
                warn!(device = self.index, error = %e, "unparseable frame");
                self.rejected += 1;
                return Ok(());
            }
        };

        if info.kind != MessageKind::Simple && info.participant_id != self.topic.id() {
            if let Some(key) = info.participant_key {
                if !self.topic.participants().contains(&info.participant_id) {
                    self.topic.add_participant(&key)?;
                }
            }
        }

        if info.kind == MessageKind::Simple && !self.topic.has_topic_key() {
            self.backlog.push(frame.to_vec());
            return Ok(());
        }

        match self.topic.decode(frame) {
            Ok(Decoded::Plaintext(_)) => self.delivered += 1,
            Ok(Decoded::Introduction(intro)) => {
                if self.founder {
                    let reply = self.topic.reply_to(&intro)?.to_bytes();
                    self.send(reply);
                    self.replied += 1;
                }
            }
            Ok(Decoded::IntroductionReply(reply)) => match self.topic.accept_reply(&reply) {
                Ok(true) => {
                    info!(device = self.index, participant = %self.topic.id(), "bootstrapped");
                    self.broadcast_messages(messages)?;
                    for queued in std::mem::take(&mut self.backlog) {
                        self.handle(&queued, messages)?;
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(device = self.index, error = %e, "reply rejected");
                    self.rejected += 1;
                }
            },
            Ok(Decoded::Dropped(reason)) => {
                debug!(device = self.index, ?reason, "frame dropped");
            }
            Err(e) => {
                warn!(device = self.index, error = %e, "frame rejected");
                self.rejected += 1;
            }
        }
        Ok(())
    }

    fn broadcast_messages(&self, messages: usize) -> Result<(), SimulationError> {
        for n in 0..messages {
            let text = format!("device {} message {}", self.index, n);
            let frame = self.topic.encode(text.as_bytes())?.to_bytes();
            self.send(frame);
        }
        Ok(())
    }

    fn send(&self, frame: Vec<u8>) {
        if self.tx.send(frame).is_err() {
            debug!(device = self.index, "no receivers left");
        }
    }
}
