//! Signing identity persistence
//!
//! The Ed25519 seed is kept as a single line of hex in a file that only the
//! owner can read. The participant id is derived from it on load.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use stringphone_core::Identity;
use stringphone_crypto::identity::SEED_LEN;
use thiserror::Error;
use tracing::info;

/// Identity management errors
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("No seed path configured and no default location available")]
    NoPath,

    #[error("Seed file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed data: {0}")]
    InvalidSeed(String),
}

/// Default seed location in the platform data directory.
pub fn default_seed_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "stringphone", "stringphone")
        .map(|dirs| dirs.data_dir().join("identity.seed"))
}

/// Parse a hex seed, tolerating surrounding whitespace.
pub fn parse_seed(contents: &str) -> Result<Identity, IdentityError> {
    let bytes = hex::decode(contents.trim()).map_err(|e| IdentityError::InvalidSeed(e.to_string()))?;
    if bytes.len() != SEED_LEN {
        return Err(IdentityError::InvalidSeed(format!(
            "expected {SEED_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Identity::from_slice(&bytes).map_err(|e| IdentityError::InvalidSeed(e.to_string()))
}

/// Load the identity stored at `path`.
pub fn load(path: &Path) -> Result<Identity, IdentityError> {
    if !path.exists() {
        return Err(IdentityError::NotFound(path.to_path_buf()));
    }
    parse_seed(&fs::read_to_string(path)?)
}

/// Write `identity`'s seed to `path`, replacing any existing file.
pub fn save(identity: &Identity, path: &Path) -> Result<(), IdentityError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Write atomically using a temp file
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    writeln!(file, "{}", hex::encode(identity.seed()))?;
    file.sync_all()?;
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&temp_path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&temp_path, perms)?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Load the identity at `path`, generating and saving a new one if absent.
pub fn load_or_create(path: Option<&Path>) -> Result<Identity, IdentityError> {
    let path = path.ok_or(IdentityError::NoPath)?;
    match load(path) {
        Ok(identity) => Ok(identity),
        Err(IdentityError::NotFound(_)) => {
            let identity = Identity::generate();
            save(&identity, path)?;
            info!(
                path = %path.display(),
                participant = %hex::encode(identity.id()),
                "generated new identity"
            );
            Ok(identity)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("identity.seed");

        let identity = Identity::generate();
        save(&identity, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.public_key(), identity.public_key());
        assert!(!path.with_extension("tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_seed_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("identity.seed");
        save(&Identity::generate(), &path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_load_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.seed");
        assert!(matches!(load(&path), Err(IdentityError::NotFound(_))));
    }

    #[test]
    fn test_load_or_create_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("identity.seed");

        let first = load_or_create(Some(&path)).unwrap();
        let second = load_or_create(Some(&path)).unwrap();
        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn test_load_or_create_without_path() {
        assert!(matches!(load_or_create(None), Err(IdentityError::NoPath)));
    }

    #[test]
    fn test_parse_seed_rejects_garbage() {
        assert!(matches!(parse_seed("not hex"), Err(IdentityError::InvalidSeed(_))));
        assert!(matches!(parse_seed("abcd"), Err(IdentityError::InvalidSeed(_))));
    }

    #[test]
    fn test_parse_seed_matches_from_seed() {
        let seed = [9u8; SEED_LEN];
        let parsed = parse_seed(&format!("  {}\n", hex::encode(seed))).unwrap();
        assert_eq!(parsed.public_key(), Identity::from_seed(&seed).public_key());
    }
}
