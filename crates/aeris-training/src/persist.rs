//! Model persistence.

use crate::error::TrainingResult;
use crate::grid::ParamSet;
use crate::search::SearchResult;
use aeris_store::ObjectStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// The serialized artifact written to the model path: the fitted model state
/// plus the winning configuration and score for provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedModel {
    pub family: String,
    pub params: ParamSet,
    pub cv_score: f64,
    pub trained_at: DateTime<Utc>,
    pub model: serde_json::Value,
}

/// Serializes the fitted model and writes it to the store. The model object
/// is not mutated; the write is atomic create-or-replace. Store failures
/// propagate untouched — retrying is the caller's decision.
pub fn save(
    store: &dyn ObjectStore,
    family: &str,
    result: &SearchResult,
    path: &str,
) -> TrainingResult<()> {
    let artifact = PersistedModel {
        family: family.to_string(),
        params: result.params.clone(),
        cv_score: result.score,
        trained_at: Utc::now(),
        model: serde_json::from_slice(&result.model.to_bytes()?)?,
    };
    store.write(path, &serde_json::to_vec(&artifact)?)?;
    info!(path, params = %result.params, "model artifact persisted");
    Ok(())
}

/// Reads a persisted artifact back, for preflight checks and inspection.
pub fn load_artifact(store: &dyn ObjectStore, path: &str) -> TrainingResult<PersistedModel> {
    let bytes = store.read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{HyperparameterGrid, ParamValue};
    use crate::model::StumpForestFamily;
    use crate::search::{search, SearchOptions};
    use crate::table::{Column, Table};
    use aeris_store::{FailKind, MemoryStore, StoreError};
    use crate::error::TrainingError;
    use crate::model::ModelFamily;

    fn search_result() -> crate::search::SearchResult {
        let f1: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let y = f1.clone();
        let dataset = crate::dataset::from_table(&Table::new(vec![
            Column { name: "f1".to_string(), values: f1 },
            Column { name: "pm25".to_string(), values: y.clone() },
            Column { name: "pm25_boxcox".to_string(), values: y },
        ]))
        .unwrap();
        let grid = HyperparameterGrid::new().with_ints("n_estimators", [5]);
        search(&dataset, &StumpForestFamily::default(), &grid, &SearchOptions::default()).unwrap()
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = MemoryStore::new();
        let result = search_result();
        save(&store, "stump-forest", &result, "weights/model/model.json").unwrap();

        let artifact = load_artifact(&store, "weights/model/model.json").unwrap();
        assert_eq!(artifact.family, "stump-forest");
        assert_eq!(artifact.params.get("n_estimators"), Some(ParamValue::Int(5)));
        assert_eq!(artifact.cv_score, result.score);
    }

    #[test]
    fn test_save_propagates_store_failure() {
        let store = MemoryStore::new();
        store.set_write_failure(Some(FailKind::Transient));
        let result = search_result();
        let err = save(&store, "stump-forest", &result, "weights/model/model.json").unwrap_err();
        assert!(matches!(err, TrainingError::Store(StoreError::TransientIo(_))));
    }

    #[test]
    fn test_save_does_not_mutate_model() {
        let store = MemoryStore::new();
        let result = search_result();
        let before = result.model.to_bytes().unwrap();
        save(&store, StumpForestFamily::default().name(), &result, "m.json").unwrap();
        assert_eq!(result.model.to_bytes().unwrap(), before);
    }
}
