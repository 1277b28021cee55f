//! The training job state machine.

use crate::cancel::CancelToken;
use crate::dataset;
use crate::error::{TrainingError, TrainingResult};
use crate::grid::{HyperparameterGrid, ParamSet};
use crate::model::ModelFamily;
use crate::persist;
use crate::search::{self, SearchOptions};
use aeris_store::ObjectStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{error, info};

/// Lifecycle states of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Loading,
    Searching,
    Saving,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct JobOptions {
    /// Logical path of the input table.
    pub table_path: String,
    /// Logical path the model artifact is written to, overwritten each run.
    pub model_path: String,
    pub folds: usize,
    pub workers: usize,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            table_path: "processed/train/feature_eng_data.json".to_string(),
            model_path: "weights/model/model.json".to_string(),
            folds: search::DEFAULT_FOLDS,
            workers: search::DEFAULT_WORKERS,
        }
    }
}

/// Summary of a completed run, for observability and notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub state: JobState,
    pub duration_ms: u64,
    pub rows: usize,
    pub features: usize,
    pub params: ParamSet,
    pub cv_score: f64,
    pub model_path: String,
    pub finished_at: DateTime<Utc>,
}

/// Orchestrates dataset load, grid search, and model persistence.
///
/// `run` is the single entry point; re-invoking after a success performs a
/// fresh, independent run and overwrites the previously persisted artifact.
pub struct TrainingJob {
    store: Arc<dyn ObjectStore>,
    family: Arc<dyn ModelFamily>,
    grid: HyperparameterGrid,
    options: JobOptions,
    state: Mutex<JobState>,
}

impl TrainingJob {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        family: Arc<dyn ModelFamily>,
        grid: HyperparameterGrid,
        options: JobOptions,
    ) -> Self {
        Self { store, family, grid, options, state: Mutex::new(JobState::Pending) }
    }

    /// Current lifecycle state, for observers.
    pub fn state(&self) -> JobState {
        *self.state.lock().unwrap()
    }

    fn transition(&self, next: JobState) {
        let mut state = self.state.lock().unwrap();
        info!(from = ?*state, to = ?next, "training job transition");
        *state = next;
    }

    fn fail(&self, err: TrainingError) -> TrainingError {
        self.transition(JobState::Failed);
        error!(kind = err.kind(), error = %err, "training job failed");
        err
    }

    fn check_cancelled(&self, cancel: &CancelToken) -> TrainingResult<()> {
        if cancel.is_cancelled() {
            return Err(TrainingError::Cancelled);
        }
        Ok(())
    }

    /// Runs the full load -> search -> save sequence, timing the run.
    pub fn run(&self, cancel: &CancelToken) -> TrainingResult<TrainingReport> {
        let started = Instant::now();
        self.transition(JobState::Loading);
        if let Err(e) = self.check_cancelled(cancel) {
            return Err(self.fail(e));
        }
        let data = match dataset::load(self.store.as_ref(), &self.options.table_path) {
            Ok(d) => d,
            Err(e) => return Err(self.fail(e)),
        };

        self.transition(JobState::Searching);
        let search_options = SearchOptions {
            folds: self.options.folds,
            workers: self.options.workers,
            cancel: cancel.clone(),
        };
        let result = match search::search(&data, self.family.as_ref(), &self.grid, &search_options)
        {
            Ok(r) => r,
            Err(e) => return Err(self.fail(e)),
        };

        self.transition(JobState::Saving);
        if let Err(e) = self.check_cancelled(cancel) {
            return Err(self.fail(e));
        }
        if let Err(e) =
            persist::save(self.store.as_ref(), self.family.name(), &result, &self.options.model_path)
        {
            return Err(self.fail(e));
        }

        self.transition(JobState::Succeeded);
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(duration_ms, params = %result.params, "training job succeeded");
        Ok(TrainingReport {
            state: JobState::Succeeded,
            duration_ms,
            rows: data.rows(),
            features: data.n_features(),
            params: result.params,
            cv_score: result.score,
            model_path: self.options.model_path.clone(),
            finished_at: Utc::now(),
        })
    }
}
