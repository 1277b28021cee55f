//! Directory-rooted store backend.

use crate::config::StoreConfig;
use crate::error::{map_io, StoreError, StoreResult};
use crate::ObjectStore;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing::debug;

/// Filesystem-backed blob store rooted at a directory.
///
/// Writes go through a temporary file in the destination directory followed
/// by a rename, so a concurrent reader observes either the previous blob or
/// the new one. Read-after-write consistency holds for a fixed path.
pub struct LocalDirStore {
    root: PathBuf,
    timeout: Duration,
}

impl LocalDirStore {
    /// Opens the store, validating configuration before any blob I/O.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.root)
            .map_err(|e| map_io(&config.root.to_string_lossy(), &e))?;
        debug!(root = %config.root.display(), "opened local store");
        Ok(Self { root: config.root.clone(), timeout: config.timeout })
    }

    /// Resolves a logical blob path against the root, rejecting escapes.
    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        let rel = Path::new(path);
        if rel.is_absolute()
            || rel.components().any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(StoreError::Access(format!("path escapes store root: {path}")));
        }
        Ok(self.root.join(rel))
    }

    /// Runs a blocking filesystem operation under the per-call timeout budget.
    fn with_deadline<T: Send + 'static>(
        &self,
        path: &str,
        op: impl FnOnce() -> std::io::Result<T> + Send + 'static,
    ) -> StoreResult<T> {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(op());
        });
        match rx.recv_timeout(self.timeout) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_io(path, &e)),
            Err(_) => Err(StoreError::Timeout {
                path: path.to_string(),
                budget_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

impl ObjectStore for LocalDirStore {
    fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        let full = self.resolve(path)?;
        self.with_deadline(path, move || std::fs::read(&full))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        let full = self.resolve(path)?;
        let bytes = bytes.to_vec();
        self.with_deadline(path, move || {
            let dir = full.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)?;
            // Temp file lands in the destination directory so the final
            // rename stays on one filesystem and is atomic.
            let tmp = tempfile::NamedTempFile::new_in(dir)?;
            std::fs::write(tmp.path(), &bytes)?;
            tmp.persist(&full).map_err(|e| e.error)?;
            Ok(())
        })
    }

    fn exists(&self, path: &str) -> StoreResult<bool> {
        let full = self.resolve(path)?;
        Ok(full.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(temp: &TempDir) -> LocalDirStore {
        let key = temp.path().join("key.json");
        std::fs::write(&key, b"{}").unwrap();
        let config = StoreConfig::new(temp.path().join("store"), key);
        LocalDirStore::open(&config).unwrap()
    }

    #[test]
    fn test_read_after_write() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.write("weights/model/model.json", b"blob-v1").unwrap();
        assert_eq!(store.read("weights/model/model.json").unwrap(), b"blob-v1");
    }

    #[test]
    fn test_write_replaces_previous_blob() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.write("weights/model/model.json", b"blob-v1").unwrap();
        store.write("weights/model/model.json", b"blob-v2").unwrap();
        assert_eq!(store.read("weights/model/model.json").unwrap(), b"blob-v2");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(matches!(store.read("nope.json"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_path_escape_rejected() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(matches!(store.read("../outside"), Err(StoreError::Access(_))));
        assert!(matches!(store.write("/abs/path", b"x"), Err(StoreError::Access(_))));
    }

    #[test]
    fn test_open_fails_without_credentials() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::new(temp.path().join("store"), temp.path().join("missing"));
        assert!(matches!(LocalDirStore::open(&config), Err(StoreError::Access(_))));
    }

    #[test]
    fn test_no_temp_files_left_after_write() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.write("a/b.json", b"payload").unwrap();
        let entries: Vec<_> = std::fs::read_dir(temp.path().join("store/a"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("b.json")]);
    }

    #[test]
    fn test_exists() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(!store.exists("a.json").unwrap());
        store.write("a.json", b"x").unwrap();
        assert!(store.exists("a.json").unwrap());
    }
}
