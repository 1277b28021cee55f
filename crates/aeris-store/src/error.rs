//! Error types for the storage layer.

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested path does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Credentials are missing or invalid, or the path is not permitted.
    /// Fatal; never retried.
    #[error("access denied: {0}")]
    Access(String),

    /// Network/storage backend hiccup. Safe to retry.
    #[error("transient I/O error: {0}")]
    TransientIo(String),

    /// The per-call timeout budget was exceeded. Treated as retryable.
    #[error("timed out after {budget_ms}ms: {path}")]
    Timeout { path: String, budget_ms: u64 },
}

impl StoreError {
    /// Whether the retry policy may act on this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::TransientIo(_) | StoreError::Timeout { .. })
    }
}

/// Result type alias for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Maps a filesystem error for `path` into the store taxonomy.
pub(crate) fn map_io(path: &str, err: &std::io::Error) -> StoreError {
    match err.kind() {
        std::io::ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
        std::io::ErrorKind::PermissionDenied => {
            StoreError::Access(format!("{path}: {err}"))
        }
        _ => StoreError::TransientIo(format!("{path}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(StoreError::TransientIo("reset".to_string()).is_retryable());
        assert!(StoreError::Timeout { path: "a".to_string(), budget_ms: 10 }.is_retryable());
        assert!(!StoreError::NotFound("a".to_string()).is_retryable());
        assert!(!StoreError::Access("a".to_string()).is_retryable());
    }

    #[test]
    fn test_map_io_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(map_io("p", &err), StoreError::NotFound(_)));
    }

    #[test]
    fn test_map_io_permission_denied() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(map_io("p", &err), StoreError::Access(_)));
    }
}
