//! Configuration management for the stringphone CLI
//!
//! Configuration is stored in TOML format. Every section is optional and
//! falls back to its defaults; command-line flags override file values.
//!
//! # Configuration File Locations
//!
//! - Unix: `~/.config/stringphone/config.toml`
//! - macOS: `~/Library/Application Support/io.stringphone.stringphone/config.toml`
//! - Windows: `%APPDATA%\stringphone\config\config.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stringphone_core::{DecodeOptions, TopicKey, TrustStore};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// CLI configuration
///
/// # Example TOML
///
/// ```toml
/// [identity]
/// seed_path = ""  # Empty = default location
///
/// [topic]
/// key = ""  # hex group key; empty = start Pending
/// participants = []  # hex signing public keys trusted at startup
///
/// [decode]
/// naive = false
/// ignore_untrusted = false
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Identity configuration
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Topic key and initial trust
    #[serde(default)]
    pub topic: TopicConfig,

    /// Decode policy
    #[serde(default)]
    pub decode: DecodeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Path to the hex signing seed (empty = default location)
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

impl IdentityConfig {
    /// The configured seed path, or the platform default.
    pub fn resolved_seed_path(&self) -> Option<PathBuf> {
        match &self.seed_path {
            Some(path) if !path.as_os_str().is_empty() => Some(path.clone()),
            _ => crate::identity::default_seed_path(),
        }
    }
}

/// Topic configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Hex-encoded 32-byte group key (empty = Pending)
    #[serde(default)]
    pub key: String,

    /// Hex-encoded Ed25519 public keys trusted at startup
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Decode policy
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Skip signature verification and trust lookup
    #[serde(default)]
    pub naive: bool,

    /// Drop frames from untrusted senders instead of failing
    #[serde(default)]
    pub ignore_untrusted: bool,
}

impl From<DecodeConfig> for DecodeOptions {
    fn from(config: DecodeConfig) -> Self {
        DecodeOptions {
            naive: config.naive,
            ignore_untrusted: config.ignore_untrusted,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = custom_path {
            Self::load(path)
        } else {
            Self::load_default()
        }
    }

    /// Get default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "stringphone", "stringphone")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the commented sample configuration to `path`
    pub fn write_sample(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::sample_toml())?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        self.topic_key()?;
        self.trust_store()?;
        Ok(())
    }

    /// The configured topic key, if any.
    pub fn topic_key(&self) -> Result<Option<TopicKey>, ConfigError> {
        let key = self.topic.key.trim();
        if key.is_empty() {
            return Ok(None);
        }
        let bytes = decode_hex_array::<32>("topic key", key)?;
        Ok(Some(TopicKey::from_bytes(bytes)))
    }

    /// A trust store seeded with the configured participants.
    pub fn trust_store(&self) -> Result<TrustStore, ConfigError> {
        let mut store = TrustStore::new();
        for entry in &self.topic.participants {
            let key = decode_hex_array::<32>("participant key", entry.trim())?;
            store.add(&key).map_err(|e| {
                ConfigError::ValidationError(format!("Invalid participant key '{entry}': {e}"))
            })?;
        }
        Ok(store)
    }

    /// Generate a sample configuration file content
    pub fn sample_toml() -> &'static str {
        r#"# stringphone configuration

[identity]
# Path to the hex signing seed (empty = default location)
# seed_path = ""

[topic]
# Hex-encoded 32-byte group key. Leave empty to start Pending and
# obtain the key through an introduction.
key = ""
# Hex-encoded Ed25519 public keys trusted at startup
participants = []

[decode]
# Skip signature verification. Only safe if the channel authenticates senders.
naive = false
# Drop frames from untrusted senders instead of failing
ignore_untrusted = false

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
level = "warn"
"#
    }
}

/// Decode a fixed-length hex value, naming `what` in the error.
pub fn decode_hex_array<const N: usize>(what: &str, value: &str) -> Result<[u8; N], ConfigError> {
    let bytes = hex::decode(value)
        .map_err(|e| ConfigError::ValidationError(format!("Invalid {what} hex '{value}': {e}")))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        ConfigError::ValidationError(format!(
            "Invalid {what} length: expected {N} bytes, got {len}"
        ))
    })
}

/// CLI configuration overrides
///
/// This struct captures CLI flags that can override config file values.
/// Command-line arguments take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Seed path override
    pub seed_path: Option<PathBuf>,
    /// Topic key override
    pub topic_key: Option<String>,
    /// Extra trusted participants
    pub participants: Option<Vec<String>>,
    /// Naive decode override
    pub naive: Option<bool>,
    /// Ignore-untrusted override
    pub ignore_untrusted: Option<bool>,
    /// Verbose flag override
    pub verbose: Option<bool>,
    /// Debug flag override
    pub debug: Option<bool>,
}

impl Config {
    /// Apply CLI overrides to configuration
    ///
    /// CLI arguments take precedence over config file values. Participants
    /// given on the command line are added to the configured ones.
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(ref path) = overrides.seed_path {
            self.identity.seed_path = Some(path.clone());
        }
        if let Some(ref key) = overrides.topic_key {
            self.topic.key = key.clone();
        }
        if let Some(ref participants) = overrides.participants {
            self.topic.participants.extend(participants.iter().cloned());
        }
        if let Some(naive) = overrides.naive {
            self.decode.naive = naive;
        }
        if let Some(ignore) = overrides.ignore_untrusted {
            self.decode.ignore_untrusted = ignore;
        }
        if let Some(true) = overrides.verbose {
            self.logging.level = "info".to_string();
        }
        if let Some(true) = overrides.debug {
            self.logging.level = "debug".to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stringphone_core::Identity;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.identity.seed_path.is_none());
        assert!(config.topic.key.is_empty());
        assert!(config.topic.participants.is_empty());
        assert!(!config.decode.naive);
        assert!(!config.decode.ignore_untrusted);
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
        assert!(config.topic_key().unwrap().is_none());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_validate_bad_topic_key_hex() {
        let mut config = Config::default();
        config.topic.key = "zz".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_short_topic_key() {
        let mut config = Config::default();
        config.topic.key = "00".repeat(16);

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("expected 32 bytes, got 16"));
    }

    #[test]
    fn test_validate_invalid_participant() {
        let mut config = Config::default();
        // y = 2 does not decode to a curve point.
        config.topic.participants = vec![format!("02{}", "00".repeat(31))];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Invalid participant key"));
    }

    #[test]
    fn test_topic_key_and_trust_store() {
        let key = TopicKey::generate();
        let peer = Identity::generate();

        let mut config = Config::default();
        config.topic.key = hex::encode(key.as_bytes());
        config.topic.participants = vec![hex::encode(peer.public_key())];

        assert_eq!(config.topic_key().unwrap(), Some(key));
        let store = config.trust_store().unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(&stringphone_core::ParticipantId::from_bytes(peer.id())).is_some());
    }

    #[test]
    fn test_render_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.topic.key = "11".repeat(32);
        config.decode.ignore_untrusted = true;
        std::fs::write(&config_path, config.to_toml_string().unwrap()).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.topic.key, config.topic.key);
        assert!(loaded.decode.ignore_untrusted);
        assert_eq!(loaded.logging.level, config.logging.level);
    }

    #[test]
    fn test_cli_overrides() {
        let peer = Identity::generate();
        let mut config = Config::default();
        config.topic.participants = vec![hex::encode(Identity::generate().public_key())];

        let overrides = CliOverrides {
            seed_path: Some(PathBuf::from("/tmp/seed")),
            topic_key: Some("22".repeat(32)),
            participants: Some(vec![hex::encode(peer.public_key())]),
            naive: Some(true),
            debug: Some(true),
            ..Default::default()
        };

        let config = config.with_overrides(&overrides);

        assert_eq!(config.identity.seed_path, Some(PathBuf::from("/tmp/seed")));
        assert_eq!(config.topic.key, "22".repeat(32));
        assert_eq!(config.topic.participants.len(), 2);
        assert!(config.decode.naive);
        assert!(!config.decode.ignore_untrusted);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_verbose_override() {
        let overrides = CliOverrides {
            verbose: Some(true),
            ..Default::default()
        };
        assert_eq!(Config::default().with_overrides(&overrides).logging.level, "info");
    }

    #[test]
    fn test_toml_parsing_partial() {
        let toml_content = r#"
[decode]
naive = true

[logging]
level = "debug"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();

        assert!(config.decode.naive);
        assert!(!config.decode.ignore_untrusted);
        assert_eq!(config.logging.level, "debug");
        assert!(config.topic.key.is_empty());
    }

    #[test]
    fn test_sample_toml_is_valid() {
        let config: Config = toml::from_str(Config::sample_toml()).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_seed_path_uses_default() {
        let config = IdentityConfig {
            seed_path: Some(PathBuf::new()),
        };
        assert_eq!(config.resolved_seed_path(), crate::identity::default_seed_path());
    }

    #[test]
    fn test_write_sample() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        Config::write_sample(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.logging.level, "warn");
    }

    #[test]
    fn test_load_from_custom_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        std::fs::write(&config_path, "[logging]\nlevel = \"trace\"\n").unwrap();

        let config = Config::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        std::fs::write(&config_path, "[topic]\nkey = \"abc\"\n").unwrap();

        assert!(matches!(
            Config::load(&config_path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_decode_config_into_options() {
        let options: DecodeOptions = DecodeConfig {
            naive: false,
            ignore_untrusted: true,
        }
        .into();
        assert_eq!(options, DecodeOptions::ignore_untrusted());
    }
}
