//! The two-node pipeline orchestrator.
//!
//! Executes `run_training -> notify` as a validated dependency graph.
//! `notify` runs only after training succeeds, exactly once, with no retry;
//! the training node gets the configured retry budget for transient storage
//! failures. Triggering is manual only and each trigger is an independent
//! run with no shared state beyond the artifact store.

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::graph::{NodeSpec, PipelineGraph};
use crate::notify::{Notification, Notifier};
use aeris_store::ObjectStore;
use aeris_training::{
    CancelToken, JobOptions, ModelFamily, TrainingError, TrainingJob, TrainingReport,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const TRAINING_NODE: &str = "run_training";
pub const NOTIFY_NODE: &str = "notify";

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Succeeded,
    Failed,
}

/// What happened to the notification node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Training failed, so delivery was never attempted.
    Skipped,
    Delivered,
    /// Delivery failed; flagged separately and never conflated with a
    /// training failure.
    Failed(String),
}

/// Record of one triggered run.
#[derive(Debug)]
pub struct PipelineRun {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub state: RunState,
    /// Attempts made on the training node, including retries.
    pub training_attempts: u32,
    pub report: Option<TrainingReport>,
    pub training_error: Option<TrainingError>,
    pub notification: NotificationStatus,
}

impl PipelineRun {
    /// Originating error kind for operator triage, if the run failed.
    pub fn error_kind(&self) -> Option<&'static str> {
        self.training_error.as_ref().map(TrainingError::kind)
    }
}

pub struct PipelineOrchestrator {
    store: Arc<dyn ObjectStore>,
    family: Arc<dyn ModelFamily>,
    notifier: Arc<dyn Notifier>,
    config: PipelineConfig,
    /// Single-run-at-a-time discipline lives here, not in the storage layer.
    run_guard: tokio::sync::Mutex<()>,
}

impl PipelineOrchestrator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        family: Arc<dyn ModelFamily>,
        notifier: Arc<dyn Notifier>,
        config: PipelineConfig,
    ) -> Self {
        Self { store, family, notifier, config, run_guard: tokio::sync::Mutex::new(()) }
    }

    /// Triggers one pipeline run.
    pub async fn trigger(&self) -> PipelineResult<PipelineRun> {
        self.trigger_with_cancel(CancelToken::new()).await
    }

    /// Triggers one pipeline run that can be cancelled externally.
    ///
    /// Returns `Ok` with a FAILED run when a node fails; `Err` is reserved
    /// for orchestration-level problems (invalid graph or configuration).
    pub async fn trigger_with_cancel(&self, cancel: CancelToken) -> PipelineResult<PipelineRun> {
        let _guard = self.run_guard.lock().await;
        self.config.validate()?;

        let graph = PipelineGraph::new(&[
            NodeSpec::root(TRAINING_NODE),
            NodeSpec::after(NOTIFY_NODE, TRAINING_NODE),
        ])?;
        let order = graph.execution_order()?;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(run_id = %run_id, nodes = ?order, "pipeline run triggered");

        let mut attempts = 0;
        let mut report = None;
        let mut training_error = None;
        let mut notification = NotificationStatus::Skipped;

        for node in &order {
            match node.as_str() {
                TRAINING_NODE => {
                    match self.run_training(&cancel, &mut attempts).await {
                        Ok(r) => report = Some(r),
                        Err(e) => {
                            training_error = Some(e);
                            break;
                        }
                    }
                }
                NOTIFY_NODE => {
                    // Exactly one delivery attempt, no retry.
                    let r = report.as_ref().expect("notify is gated on training success");
                    notification = match self.notifier.notify(&self.build_message(r)).await {
                        Ok(()) => NotificationStatus::Delivered,
                        Err(e) => {
                            warn!(run_id = %run_id, error = %e, "notification delivery failed");
                            NotificationStatus::Failed(e.to_string())
                        }
                    };
                }
                other => unreachable!("unknown pipeline node: {other}"),
            }
        }

        let state = if training_error.is_none() { RunState::Succeeded } else { RunState::Failed };
        info!(run_id = %run_id, state = ?state, attempts, "pipeline run finished");
        Ok(PipelineRun {
            run_id,
            started_at,
            finished_at: Utc::now(),
            state,
            training_attempts: attempts,
            report,
            training_error,
            notification,
        })
    }

    /// Runs the training node under the retry policy. Only failures the
    /// policy classifies retryable consume the budget; everything else
    /// fails the node immediately.
    async fn run_training(
        &self,
        cancel: &CancelToken,
        attempts: &mut u32,
    ) -> Result<TrainingReport, TrainingError> {
        loop {
            *attempts += 1;
            let job = TrainingJob::new(
                self.store.clone(),
                self.family.clone(),
                self.config.grid.clone(),
                JobOptions {
                    table_path: self.config.table_path.clone(),
                    model_path: self.config.model_path.clone(),
                    folds: self.config.folds,
                    workers: self.config.workers,
                },
            );
            let token = cancel.clone();
            let result = tokio::task::spawn_blocking(move || job.run(&token))
                .await
                .unwrap_or_else(|join| {
                    Err(TrainingError::Model(format!("training task aborted: {join}")))
                });

            match result {
                Ok(report) => return Ok(report),
                Err(e) if self.config.retry.should_retry(*attempts - 1, &e) => {
                    warn!(
                        attempt = *attempts,
                        error = %e,
                        backoff_ms = self.config.retry.backoff.as_millis() as u64,
                        "training attempt failed; retrying"
                    );
                    tokio::time::sleep(self.config.retry.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn build_message(&self, report: &TrainingReport) -> Notification {
        Notification {
            recipient: self.config.recipient.clone(),
            subject: self.config.subject.clone(),
            body: format!(
                "The training job has completed successfully in {} ms. \
                 Best configuration {} with CV score {:.6}; model written to {}.",
                report.duration_ms, report.params, report.cv_score, report.model_path
            ),
        }
    }
}
