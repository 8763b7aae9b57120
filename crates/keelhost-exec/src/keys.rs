//! SSH key resolution

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::debug;

/// Where the SSH private key comes from
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Key file on disk
    Path(PathBuf),
    /// Base64-encoded key in the named environment variable
    Env(String),
}

impl KeySource {
    /// Resolve to a key file usable by the SSH client
    ///
    /// `Env` keys are decoded and written to a 0600 temp file that is
    /// removed when the returned [`ResolvedKey`] is dropped.
    ///
    /// # Errors
    /// Returns `KeyError` if the file is missing or too permissive, or the
    /// environment variable is unset or not valid base64
    pub fn resolve(&self) -> Result<ResolvedKey, KeyError> {
        match self {
            KeySource::Path(path) => {
                check_permissions(path)?;
                Ok(ResolvedKey::Path(path.clone()))
            }
            KeySource::Env(var) => {
                let encoded = env::var(var).map_err(|_| KeyError::EnvNotSet(var.clone()))?;
                let decoded = decode(&encoded)?;
                Ok(ResolvedKey::Temp(write_temp_key(&decoded)?))
            }
        }
    }
}

/// Resolved key file
#[derive(Debug)]
pub enum ResolvedKey {
    /// Caller-owned key file
    Path(PathBuf),
    /// Temp file, deleted on drop
    Temp(TempPath),
}

impl ResolvedKey {
    /// Path handed to the SSH library
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ResolvedKey::Path(p) => p,
            ResolvedKey::Temp(p) => p,
        }
    }
}

/// Key resolution errors
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("environment variable {0} not set")]
    EnvNotSet(String),

    #[error("invalid base64 encoding")]
    InvalidBase64,

    #[error("key file permissions too open: {0} (should be 600)")]
    BadPermissions(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn decode(input: &str) -> Result<Vec<u8>, KeyError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|_| KeyError::InvalidBase64)
}

fn check_permissions(path: &Path) -> Result<(), KeyError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)?.permissions().mode();

    // group/other bits must be clear
    if mode & 0o077 != 0 {
        return Err(KeyError::BadPermissions(path.display().to_string()));
    }

    Ok(())
}

fn write_temp_key(key: &[u8]) -> Result<TempPath, KeyError> {
    use std::io::Write;

    // Fresh 0600 file with a random name; never reuses an existing path
    let mut file = tempfile::Builder::new()
        .prefix("keelhost_ssh_key_")
        .tempfile()?;
    file.write_all(key)?;
    file.flush()?;

    let path = file.into_temp_path();
    debug!(path = %path.display(), "wrote temporary SSH key");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_var() {
        let source = KeySource::Env("KEELHOST_TEST_KEY_THAT_IS_NOT_SET".to_string());
        assert!(matches!(source.resolve(), Err(KeyError::EnvNotSet(_))));
    }

    #[test]
    fn test_missing_key_file() {
        let source = KeySource::Path(PathBuf::from("/nonexistent/keelhost/id_ed25519"));
        assert!(matches!(source.resolve(), Err(KeyError::Io(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("not base64!!"), Err(KeyError::InvalidBase64)));
        assert_eq!(decode(" aGk= \n").unwrap(), b"hi");
    }

    #[test]
    fn test_temp_key_is_private_and_fresh() {
        use std::os::unix::fs::PermissionsExt;

        let stale = env::temp_dir().join(format!("keelhost_ssh_key_{}", std::process::id()));
        fs::write(&stale, b"stale").unwrap();
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o644)).unwrap();

        let path = write_temp_key(b"secret").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();

        assert_ne!(path.to_path_buf(), stale);
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read(&path).unwrap(), b"secret");
        assert_eq!(fs::read(&stale).unwrap(), b"stale");
        fs::remove_file(&stale).unwrap();
    }

    #[test]
    fn test_temp_key_removed_on_drop() {
        let key = ResolvedKey::Temp(write_temp_key(b"secret").unwrap());
        let path = key.path().to_path_buf();
        assert!(path.exists());

        drop(key);
        assert!(!path.exists());
    }
}
