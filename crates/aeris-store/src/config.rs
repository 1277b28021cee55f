//! Storage configuration.

use crate::error::{StoreError, StoreResult};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Explicit configuration for a durable store, validated before any I/O.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory under which all blob paths are resolved.
    pub root: PathBuf,
    /// Required credential/identity reference. Absence is a startup-time
    /// fatal access error, not a deferred failure.
    pub credentials: PathBuf,
    /// Per-call timeout budget for reads and writes.
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>, credentials: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), credentials: credentials.into(), timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the configuration eagerly.
    pub fn validate(&self) -> StoreResult<()> {
        if self.credentials.as_os_str().is_empty() {
            return Err(StoreError::Access(
                "storage credentials reference is not set".to_string(),
            ));
        }
        if !self.credentials.is_file() {
            return Err(StoreError::Access(format!(
                "storage credentials not found at {}",
                self.credentials.display()
            )));
        }
        if self.timeout.is_zero() {
            return Err(StoreError::Access("store timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_requires_credentials_file() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::new(temp.path(), temp.path().join("missing-key.json"));
        assert!(matches!(config.validate(), Err(StoreError::Access(_))));
    }

    #[test]
    fn test_validate_accepts_existing_credentials() {
        let temp = TempDir::new().unwrap();
        let key = temp.path().join("key.json");
        std::fs::write(&key, b"{}").unwrap();
        let config = StoreConfig::new(temp.path(), &key);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_credentials() {
        let config = StoreConfig::new("/tmp/store", "");
        assert!(matches!(config.validate(), Err(StoreError::Access(_))));
    }
}
