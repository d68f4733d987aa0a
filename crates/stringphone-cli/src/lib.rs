//! stringphone CLI - drive the group protocol from a terminal
//!
//! This crate provides a command-line interface for:
//! - Generating topic keys and signing seeds
//! - Encoding and decoding hex frames with a configured identity
//! - Inspecting frames without decrypting them
//! - Simulating a group of devices on an in-process broadcast bus

pub mod cli;
pub mod config;
pub mod identity;
pub mod simulate;

#[cfg(test)]
mod proptests;

pub use cli::Cli;
pub use config::{CliOverrides, Config};

use stringphone_core::TopicError;

/// Exit codes for CLI operations
///
/// Exit codes provide machine-readable status for scripting:
/// - 0: Success - operation completed successfully
/// - 1: General error - unspecified error occurred
/// - 2: Invalid input - bad arguments, hex, or configuration
/// - 3: Untrusted - frame came from a participant not in the trust store
/// - 4: Rejected - frame was malformed or failed verification/decryption
/// - 5: Missing key - the topic key is required but not configured
/// - 6: Simulation failed - a simulated device did not bootstrap or decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Invalid input provided (exit code 2)
    InvalidInput = 2,
    /// Sender not trusted (exit code 3)
    Untrusted = 3,
    /// Frame rejected (exit code 4)
    Rejected = 4,
    /// Topic key missing (exit code 5)
    MissingKey = 5,
    /// Simulation did not converge (exit code 6)
    SimulationFailed = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&TopicError> for ExitCode {
    fn from(err: &TopicError) -> Self {
        match err {
            TopicError::UntrustedKey(_) => ExitCode::Untrusted,
            TopicError::MissingTopicKey => ExitCode::MissingKey,
            TopicError::InvalidPublicKey | TopicError::InvalidParticipantId(_) => {
                ExitCode::InvalidInput
            }
            TopicError::Crypto(_) => ExitCode::GeneralError,
            _ => ExitCode::Rejected,
        }
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Get the exit code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::InvalidInput => "INVALID_INPUT",
            ExitCode::Untrusted => "UNTRUSTED",
            ExitCode::Rejected => "REJECTED",
            ExitCode::MissingKey => "MISSING_KEY",
            ExitCode::SimulationFailed => "SIMULATION_FAILED",
        }
    }

    /// Get a human-readable description of the exit code
    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::InvalidInput => "Invalid arguments, hex, or configuration",
            ExitCode::Untrusted => "Frame sender is not a trusted participant",
            ExitCode::Rejected => "Frame was malformed or failed verification",
            ExitCode::MissingKey => "Topic key required but not configured",
            ExitCode::SimulationFailed => "Not every simulated device converged",
        }
    }
}

#[cfg(test)]
mod exit_code_tests {
    use super::*;
    use stringphone_core::ParticipantId;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as i32, 0);
        assert_eq!(ExitCode::GeneralError as i32, 1);
        assert_eq!(ExitCode::InvalidInput as i32, 2);
        assert_eq!(ExitCode::Untrusted as i32, 3);
        assert_eq!(ExitCode::Rejected as i32, 4);
        assert_eq!(ExitCode::MissingKey as i32, 5);
        assert_eq!(ExitCode::SimulationFailed as i32, 6);
    }

    #[test]
    fn test_exit_code_names() {
        assert_eq!(ExitCode::Success.name(), "SUCCESS");
        assert_eq!(ExitCode::Untrusted.name(), "UNTRUSTED");
        assert_eq!(ExitCode::SimulationFailed.name(), "SIMULATION_FAILED");
    }

    #[test]
    fn test_exit_code_descriptions() {
        for code in [
            ExitCode::Success,
            ExitCode::GeneralError,
            ExitCode::InvalidInput,
            ExitCode::Untrusted,
            ExitCode::Rejected,
            ExitCode::MissingKey,
            ExitCode::SimulationFailed,
        ] {
            assert!(!code.description().is_empty());
        }
    }

    #[test]
    fn test_exit_code_from_topic_error() {
        let untrusted = TopicError::UntrustedKey(ParticipantId::from_bytes([1; 16]));
        assert_eq!(ExitCode::from(&untrusted), ExitCode::Untrusted);
        assert_eq!(ExitCode::from(&TopicError::MissingTopicKey), ExitCode::MissingKey);
        assert_eq!(ExitCode::from(&TopicError::BadSignature), ExitCode::Rejected);
        assert_eq!(ExitCode::from(&TopicError::Decryption), ExitCode::Rejected);
        assert_eq!(
            ExitCode::from(&TopicError::MalformedMessage("too short")),
            ExitCode::Rejected
        );
        assert_eq!(ExitCode::from(&TopicError::InvalidPublicKey), ExitCode::InvalidInput);
    }
}
