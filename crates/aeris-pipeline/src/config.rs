//! Pipeline configuration.
//!
//! All knobs live in one explicit structure handed to components at
//! construction time; required fields are validated eagerly, before any I/O.

use crate::error::{PipelineError, PipelineResult};
use crate::retry::RetryPolicy;
use aeris_store::{StoreConfig, StoreError};
use aeris_training::{search, HyperparameterGrid};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TABLE_PATH: &str = "processed/train/feature_eng_data.json";
pub const DEFAULT_MODEL_PATH: &str = "weights/model/model.json";
pub const DEFAULT_SUBJECT: &str = "Training job completed";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub store: StoreConfig,
    pub table_path: String,
    pub model_path: String,
    pub folds: usize,
    pub workers: usize,
    pub grid: HyperparameterGrid,
    pub retry: RetryPolicy,
    pub recipient: String,
    pub subject: String,
}

impl PipelineConfig {
    /// Defaults mirroring the production layout: fixed table and model
    /// paths, the standard estimator grid, folds = 3, one retry.
    pub fn new(store: StoreConfig, recipient: &str) -> Self {
        Self {
            store,
            table_path: DEFAULT_TABLE_PATH.to_string(),
            model_path: DEFAULT_MODEL_PATH.to_string(),
            folds: search::DEFAULT_FOLDS,
            workers: search::DEFAULT_WORKERS,
            grid: HyperparameterGrid::new().with_ints("n_estimators", [100, 200]),
            retry: RetryPolicy::default(),
            recipient: recipient.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    /// Builds configuration from `AERIS_*` environment variables.
    ///
    /// `AERIS_STORE_ROOT` and `AERIS_CREDENTIALS` are required; the
    /// credentials check itself happens in `validate`.
    pub fn from_env() -> PipelineResult<Self> {
        let root = read_env("AERIS_STORE_ROOT")?
            .ok_or_else(|| PipelineError::Config("AERIS_STORE_ROOT is not set".to_string()))?;
        let credentials = read_env("AERIS_CREDENTIALS")?.ok_or_else(|| {
            PipelineError::Store(StoreError::Access(
                "AERIS_CREDENTIALS is not set; configure the storage service key".to_string(),
            ))
        })?;

        let mut config = Self::new(
            StoreConfig::new(PathBuf::from(root), PathBuf::from(credentials)),
            &read_env("AERIS_RECIPIENT")?.unwrap_or_else(|| "ops@aeris.dev".to_string()),
        );
        if let Some(path) = read_env("AERIS_TABLE_PATH")? {
            config.table_path = path;
        }
        if let Some(path) = read_env("AERIS_MODEL_PATH")? {
            config.model_path = path;
        }
        if let Some(folds) = read_env("AERIS_FOLDS")? {
            config.folds = parse_usize("AERIS_FOLDS", &folds)?;
        }
        if let Some(workers) = read_env("AERIS_WORKERS")? {
            config.workers = parse_usize("AERIS_WORKERS", &workers)?;
        }
        if let Some(retries) = read_env("AERIS_RETRIES")? {
            config.retry.max_retries = parse_usize("AERIS_RETRIES", &retries)? as u32;
        }
        if let Some(timeout) = read_env("AERIS_STORE_TIMEOUT_SECS")? {
            let secs = parse_usize("AERIS_STORE_TIMEOUT_SECS", &timeout)? as u64;
            config.store = config.store.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Validates bounds and the credential reference before any I/O.
    pub fn validate(&self) -> PipelineResult<()> {
        self.store.validate()?;
        if self.table_path.trim().is_empty() {
            return Err(PipelineError::Config("table path must not be empty".to_string()));
        }
        if self.model_path.trim().is_empty() {
            return Err(PipelineError::Config("model path must not be empty".to_string()));
        }
        if self.folds < 2 {
            return Err(PipelineError::Config(format!(
                "folds must be >= 2, got {}",
                self.folds
            )));
        }
        if self.workers < 1 {
            return Err(PipelineError::Config("workers must be >= 1".to_string()));
        }
        if self.grid.is_empty() {
            return Err(PipelineError::Config("hyperparameter grid is empty".to_string()));
        }
        if self.recipient.trim().is_empty() {
            return Err(PipelineError::Config("notification recipient is empty".to_string()));
        }
        Ok(())
    }
}

fn read_env(name: &str) -> PipelineResult<Option<String>> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(PipelineError::Config(format!("{name}: {e}"))),
    }
}

fn parse_usize(name: &str, value: &str) -> PipelineResult<usize> {
    value
        .parse()
        .map_err(|_| PipelineError::Config(format!("{name} must be a number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config(temp: &TempDir) -> PipelineConfig {
        let key = temp.path().join("key.json");
        std::fs::write(&key, b"{}").unwrap();
        PipelineConfig::new(StoreConfig::new(temp.path().join("store"), key), "ops@example.com")
    }

    #[test]
    fn test_defaults_match_production_layout() {
        let temp = TempDir::new().unwrap();
        let config = valid_config(&temp);
        assert_eq!(config.table_path, "processed/train/feature_eng_data.json");
        assert_eq!(config.model_path, "weights/model/model.json");
        assert_eq!(config.folds, 3);
        assert_eq!(config.retry.max_retries, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_is_access_error() {
        let temp = TempDir::new().unwrap();
        let config = PipelineConfig::new(
            StoreConfig::new(temp.path(), temp.path().join("missing-key")),
            "ops@example.com",
        );
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Store(StoreError::Access(_)))
        ));
    }

    #[test]
    fn test_bounds_validated() {
        let temp = TempDir::new().unwrap();

        let mut config = valid_config(&temp);
        config.folds = 1;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let mut config = valid_config(&temp);
        config.workers = 0;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let mut config = valid_config(&temp);
        config.recipient = "".to_string();
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let mut config = valid_config(&temp);
        config.grid = HyperparameterGrid::new();
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }
}
