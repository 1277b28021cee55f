use aeris_store::StoreError;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    /// Malformed or unexpected table shape. Fatal.
    #[error("schema error: {0}")]
    Schema(String),

    /// Too few rows for the requested fold count. Fatal.
    #[error("insufficient data: need at least {required} rows, got {got}")]
    InsufficientData { required: usize, got: usize },

    /// A candidate configuration is not valid for the model family.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Model-level failure (degenerate input, predict before fit).
    #[error("model error: {0}")]
    Model(String),

    /// The run was externally cancelled. Terminal.
    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] serde_json::Error),
}

impl TrainingError {
    /// Whether the orchestrator's retry budget may act on this failure.
    /// Only transient storage hiccups qualify; everything else is fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrainingError::Store(e) if e.is_retryable())
    }

    /// Short stable name for the originating error kind, for operator triage.
    pub fn kind(&self) -> &'static str {
        match self {
            TrainingError::Schema(_) => "schema",
            TrainingError::InsufficientData { .. } => "insufficient_data",
            TrainingError::InvalidParams(_) => "invalid_params",
            TrainingError::Model(_) => "model",
            TrainingError::Cancelled => "cancelled",
            TrainingError::Store(StoreError::NotFound(_)) => "not_found",
            TrainingError::Store(StoreError::Access(_)) => "access",
            TrainingError::Store(StoreError::TransientIo(_)) => "transient_io",
            TrainingError::Store(StoreError::Timeout { .. }) => "timeout",
            TrainingError::Codec(_) => "schema",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_store_errors_are_retryable() {
        assert!(TrainingError::Store(StoreError::TransientIo("x".to_string())).is_retryable());
        assert!(
            TrainingError::Store(StoreError::Timeout { path: "p".to_string(), budget_ms: 1 })
                .is_retryable()
        );
        assert!(!TrainingError::Store(StoreError::NotFound("x".to_string())).is_retryable());
        assert!(!TrainingError::Store(StoreError::Access("x".to_string())).is_retryable());
        assert!(!TrainingError::Schema("bad".to_string()).is_retryable());
        assert!(!TrainingError::InsufficientData { required: 3, got: 2 }.is_retryable());
        assert!(!TrainingError::Cancelled.is_retryable());
    }
}
