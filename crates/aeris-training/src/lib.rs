//! Aeris Training
//!
//! Training primitives for the air-quality regression pipeline:
//! - Loading a stored feature table into a `Dataset`
//! - Exhaustive hyperparameter grid search with k-fold cross-validation
//! - Persisting the winning fitted model as a storage artifact
//! - The `TrainingJob` state machine tying the stages together

pub mod cancel;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod job;
pub mod model;
pub mod persist;
pub mod search;
pub mod table;

pub use cancel::CancelToken;
pub use dataset::{load, Dataset, RAW_TARGET, TRANSFORMED_TARGET_CANDIDATES};
pub use error::{TrainingError, TrainingResult};
pub use grid::{HyperparameterGrid, ParamSet, ParamValue};
pub use job::{JobOptions, JobState, TrainingJob, TrainingReport};
pub use model::{ModelFamily, Regressor, StumpForestFamily};
pub use persist::{load_artifact, save, PersistedModel};
pub use search::{cross_validate, search, SearchOptions, SearchResult};
pub use table::{Column, Table};
