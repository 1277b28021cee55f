use crate::graph::GraphError;
use crate::notify::NotifyError;
use aeris_store::StoreError;
use aeris_training::TrainingError;
use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Errors surfaced by the orchestration layer. Training failures and
/// notification failures stay distinct classes end to end.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
