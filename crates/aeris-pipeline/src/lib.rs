//! Aeris Pipeline
//!
//! Orchestration for the train-then-notify pipeline:
//! - A validated two-node dependency graph (`run_training` -> `notify`)
//! - A retry policy applied to transient storage failures only
//! - The notification capability boundary
//! - Explicit, eagerly validated pipeline configuration

pub mod config;
pub mod error;
pub mod graph;
pub mod notify;
pub mod orchestrator;
pub mod retry;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use graph::{GraphError, NodeSpec, PipelineGraph};
pub use notify::{LogNotifier, Notification, Notifier, NotifyError};
pub use orchestrator::{NotificationStatus, PipelineOrchestrator, PipelineRun, RunState};
pub use retry::RetryPolicy;
