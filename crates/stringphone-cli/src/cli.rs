//! CLI command definitions and argument parsing

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use stringphone_core::{Decoded, DropReason, Identity, Topic, TopicKey};
use tracing::debug;

use crate::config::{CliOverrides, Config};
use crate::simulate::{self, SimulationConfig};
use crate::{identity, ExitCode};

/// stringphone - confidential group messaging over an untrusted broadcast channel
#[derive(Parser, Debug)]
#[command(name = "stringphone")]
#[command(version, about = "Confidential, authenticated group messaging over an untrusted broadcast channel")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug mode (protocol-level tracing)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true, env = "STRINGPHONE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Signing seed file (overrides config)
    #[arg(long, global = true)]
    pub seed: Option<PathBuf>,

    /// Hex topic key (overrides config)
    #[arg(long = "topic-key", global = true, env = "STRINGPHONE_TOPIC_KEY")]
    pub topic_key: Option<String>,

    /// Trust a participant's hex signing key (can be specified multiple times)
    #[arg(long = "trust", global = true)]
    pub trust: Vec<String>,

    /// Skip trust lookup and signature verification when decoding
    #[arg(long, global = true)]
    pub naive: bool,

    /// Drop frames from untrusted senders instead of failing
    #[arg(long, global = true)]
    pub ignore_untrusted: bool,
}

impl Cli {
    /// Collect flags that override config file values
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            seed_path: self.seed.clone(),
            topic_key: self.topic_key.clone(),
            participants: if self.trust.is_empty() {
                None
            } else {
                Some(self.trust.clone())
            },
            naive: self.naive.then_some(true),
            ignore_untrusted: self.ignore_untrusted.then_some(true),
            verbose: self.verbose.then_some(true),
            debug: self.debug.then_some(true),
        }
    }

    /// Execute the CLI command with a resolved configuration
    pub async fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        match self.command {
            Commands::Keygen { action } => action.execute(),
            Commands::Identity => show_identity(&config),
            Commands::Encode(args) => args.execute(&config),
            Commands::Decode { frame } => decode(&config, &frame),
            Commands::Inspect { frame } => inspect(&config, &frame),
            Commands::Simulate(args) => args.execute().await,
            Commands::Config { action } => action.execute(self.config.as_deref(), &config),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate keys
    Keygen {
        #[command(subcommand)]
        action: KeygenAction,
    },
    /// Show the participant id and public signing key
    Identity,
    /// Encrypt and sign a message, printing the hex frame
    Encode(EncodeArgs),
    /// Decode a hex frame with the configured key and trust store
    Decode {
        /// Hex-encoded frame
        frame: String,
    },
    /// Show the identity fields of a hex frame without decrypting it
    Inspect {
        /// Hex-encoded frame
        frame: String,
    },
    /// Run a group of devices on an in-process broadcast channel
    Simulate(SimulateArgs),
    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Key generation subcommands
#[derive(Subcommand, Debug)]
pub enum KeygenAction {
    /// Print a fresh hex topic key
    Topic,
    /// Generate a signing seed
    Seed {
        /// Write the seed to this file instead of printing it
        #[arg(long)]
        out: Option<PathBuf>,
        /// Overwrite an existing seed file
        #[arg(long)]
        force: bool,
    },
}

impl KeygenAction {
    fn execute(self) -> anyhow::Result<ExitCode> {
        match self {
            KeygenAction::Topic => {
                println!("{}", hex::encode(TopicKey::generate().as_bytes()));
                Ok(ExitCode::Success)
            }
            KeygenAction::Seed { out: None, .. } => {
                println!("{}", hex::encode(Identity::generate().seed()));
                Ok(ExitCode::Success)
            }
            KeygenAction::Seed {
                out: Some(path),
                force,
            } => {
                if path.exists() && !force {
                    eprintln!(
                        "Error: {} already exists (use --force to overwrite)",
                        path.display()
                    );
                    return Ok(ExitCode::InvalidInput);
                }
                let identity = Identity::generate();
                identity::save(&identity, &path)
                    .with_context(|| format!("writing seed to {}", path.display()))?;
                print_identity(&identity);
                Ok(ExitCode::Success)
            }
        }
    }
}

/// Arguments for the encode command
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Hex-encoded plaintext
    #[arg(required_unless_present = "text")]
    pub payload: Option<String>,

    /// UTF-8 plaintext
    #[arg(long, conflicts_with = "payload")]
    pub text: Option<String>,
}

impl EncodeArgs {
    fn execute(self, config: &Config) -> anyhow::Result<ExitCode> {
        let plaintext = match (self.payload, self.text) {
            (_, Some(text)) => text.into_bytes(),
            (Some(payload), None) => match hex::decode(payload.trim()) {
                Ok(bytes) => bytes,
                Err(e) => {
                    eprintln!("Error: invalid plaintext hex: {e}");
                    return Ok(ExitCode::InvalidInput);
                }
            },
            (None, None) => {
                eprintln!("Error: nothing to encode");
                return Ok(ExitCode::InvalidInput);
            }
        };

        let topic = build_topic(config)?;
        match topic.encode(&plaintext) {
            Ok(message) => {
                println!("{}", hex::encode(message.to_bytes()));
                Ok(ExitCode::Success)
            }
            Err(e) => {
                eprintln!("Error: {e}");
                Ok(ExitCode::from(&e))
            }
        }
    }
}

/// Arguments for the simulate command
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of devices, including the one that starts with the topic key
    #[arg(long, default_value_t = 3)]
    pub participants: usize,

    /// Messages each device broadcasts once bootstrapped
    #[arg(long, default_value_t = 3)]
    pub messages: usize,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

impl SimulateArgs {
    async fn execute(self) -> anyhow::Result<ExitCode> {
        let report = match simulate::run(SimulationConfig {
            participants: self.participants,
            messages: self.messages,
            timeout: Duration::from_secs(self.timeout),
        })
        .await
        {
            Ok(report) => report,
            Err(simulate::SimulationError::TooFewParticipants(n)) => {
                eprintln!("Error: need at least two participants, got {n}");
                return Ok(ExitCode::InvalidInput);
            }
            Err(e) => return Err(e.into()),
        };

        for device in &report.devices {
            println!(
                "device {:>3}  {}  bootstrapped={}  delivered={}/{}  rejected={}",
                device.index,
                device.id,
                device.bootstrapped,
                device.delivered,
                report.expected_per_device,
                device.rejected
            );
        }

        if report.is_complete() {
            println!("all {} devices converged", report.devices.len());
            Ok(ExitCode::Success)
        } else {
            eprintln!("simulation did not converge");
            Ok(ExitCode::SimulationFailed)
        }
    }
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the config file path in use
    Path,
    /// Print the effective configuration after overrides
    Show,
    /// Write a commented sample configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigAction {
    fn execute(self, custom: Option<&std::path::Path>, config: &Config) -> anyhow::Result<ExitCode> {
        let path = custom.map(|p| p.to_path_buf()).or_else(Config::default_path);

        match self {
            ConfigAction::Path => match path {
                Some(path) => {
                    println!("{}", path.display());
                    Ok(ExitCode::Success)
                }
                None => {
                    eprintln!("Error: no config directory available on this platform");
                    Ok(ExitCode::GeneralError)
                }
            },
            ConfigAction::Show => {
                print!("{}", config.to_toml_string()?);
                Ok(ExitCode::Success)
            }
            ConfigAction::Init { force } => {
                let Some(path) = path else {
                    eprintln!("Error: no config directory available on this platform");
                    return Ok(ExitCode::GeneralError);
                };
                if path.exists() && !force {
                    eprintln!(
                        "Error: {} already exists (use --force to overwrite)",
                        path.display()
                    );
                    return Ok(ExitCode::InvalidInput);
                }
                Config::write_sample(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("wrote {}", path.display());
                Ok(ExitCode::Success)
            }
        }
    }
}

fn load_identity(config: &Config) -> anyhow::Result<Identity> {
    let path = config.identity.resolved_seed_path();
    debug!(path = ?path, "loading identity");
    identity::load_or_create(path.as_deref()).context("loading identity")
}

/// A topic for the configured identity, trust store, and key.
fn build_topic(config: &Config) -> anyhow::Result<Topic> {
    let mut topic = Topic::new(load_identity(config)?).with_participants(config.trust_store()?);
    if let Some(key) = config.topic_key()? {
        topic = topic.with_topic_key(key);
    }
    Ok(topic)
}

fn parse_frame(frame: &str) -> Option<Vec<u8>> {
    match hex::decode(frame.trim()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            eprintln!("Error: invalid frame hex: {e}");
            None
        }
    }
}

fn print_identity(identity: &Identity) {
    println!("participant id: {}", hex::encode(identity.id()));
    println!("public key:     {}", hex::encode(identity.public_key()));
}

fn show_identity(config: &Config) -> anyhow::Result<ExitCode> {
    print_identity(&load_identity(config)?);
    Ok(ExitCode::Success)
}

fn drop_reason(reason: DropReason) -> &'static str {
    match reason {
        DropReason::OwnMessage => "own message",
        DropReason::UntrustedSender => "untrusted sender",
        DropReason::NotActionable => "handshake message not actionable in this state",
    }
}

fn decode(config: &Config, frame: &str) -> anyhow::Result<ExitCode> {
    let Some(frame) = parse_frame(frame) else {
        return Ok(ExitCode::InvalidInput);
    };
    let topic = build_topic(config)?;

    match topic.decode_with(&frame, config.decode.into()) {
        Ok(Decoded::Plaintext(plaintext)) => {
            println!("plaintext: {}", hex::encode(&plaintext));
            if let Ok(text) = std::str::from_utf8(&plaintext) {
                println!("text:      {text}");
            }
        }
        Ok(Decoded::Introduction(intro)) => {
            println!("introduction from {}", intro.sender_id());
            println!("signing key:    {}", hex::encode(intro.signing_key()));
            println!("encryption key: {}", hex::encode(intro.encryption_key()));
        }
        Ok(Decoded::IntroductionReply(reply)) => {
            println!("introduction reply from {}", reply.sender_id());
            println!("recipient:   {}", reply.recipient_id());
            println!("signing key: {}", hex::encode(reply.signing_key()));
        }
        Ok(Decoded::Dropped(reason)) => {
            println!("dropped: {}", drop_reason(reason));
        }
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::from(&e));
        }
    }
    Ok(ExitCode::Success)
}

fn inspect(config: &Config, frame: &str) -> anyhow::Result<ExitCode> {
    let Some(frame) = parse_frame(frame) else {
        return Ok(ExitCode::InvalidInput);
    };
    let topic = build_topic(config)?;

    let info = match topic.get_message_info(&frame) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::from(&e));
        }
    };

    let trusted = topic.participants().contains(&info.participant_id);
    println!("kind:           {}", info.kind);
    println!("participant id: {}", info.participant_id);
    println!("trusted:        {trusted}");
    if let Some(key) = info.participant_key {
        println!("signing key:    {}", hex::encode(key));
    }
    if let Some(key) = info.encryption_key {
        println!("encryption key: {}", hex::encode(key));
    }
    if let Some(recipient) = info.recipient_id {
        println!("recipient:      {recipient}");
    }
    Ok(ExitCode::Success)
}
